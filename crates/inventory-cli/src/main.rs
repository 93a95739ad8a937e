// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;
mod session;

use anyhow::{Context, Result, anyhow};
use config::Config;
use inventory_app::{AppState, TabKind, export_csv_file};
use inventory_db::Store;
use inventory_tui::AppRuntime;
use runtime::DbRuntime;
use session::Session;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::info;

const DEMO_SEED: u64 = 7;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `inventory --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let session_path = Session::default_path()?;
    let mut session = Session::load(&session_path)
        .with_context(|| format!("delete {} to reset saved settings", session_path.display()))?;

    let location = if options.demo {
        None
    } else {
        Some(resolve_db_location(&options, &config, &session))
    };

    if options.print_db_path {
        let path = match &location {
            None => PathBuf::from(":memory:"),
            Some(DbLocation::Known { path, .. }) => path.clone(),
            Some(DbLocation::Ask) => inventory_db::default_db_path()?,
        };
        println!("{}", path.display());
        return Ok(());
    }

    logging::init_logging(config.log_level(), &config.log_file()?)?;

    let db_path = match location {
        None => None,
        Some(DbLocation::Known { path, source }) => {
            info!(path = %path.display(), source = source.as_str(), "database location");
            Some(path)
        }
        Some(DbLocation::Ask) => {
            let suggested = inventory_db::default_db_path()?;
            let stdin = io::stdin();
            let path = session::prompt_db_location(&mut stdin.lock(), &mut io::stdout(), &suggested)?;
            Some(path)
        }
    };

    let store = match &db_path {
        None => {
            let store = Store::open_memory()?;
            store.bootstrap()?;
            store.seed_demo_data(DEMO_SEED)?;
            store
        }
        Some(path) => {
            let store = Store::open(path).with_context(|| {
                format!(
                    "open database {} -- if this path is wrong, set [storage].db_path, {} or --db",
                    path.display(),
                    inventory_db::DB_PATH_ENV
                )
            })?;
            store.bootstrap()?;
            store
        }
    };

    if options.check_only {
        for (table, rows) in store.table_counts()? {
            println!("{table}: {rows}");
        }
        return Ok(());
    }

    if let Some((tab, path)) = &options.export_csv {
        let model = runtime::export_model(&store, *tab, session.view.filter)?;
        let rows = export_csv_file(model.as_ref(), path)?;
        println!("exported {rows} rows to {}", path.display());
        return Ok(());
    }

    let mut state = AppState {
        active_tab: session.view.last_tab,
        filter_hidden: session.view.filter_hidden,
        ..AppState::default()
    };
    let mut runtime = DbRuntime::new(&store, session.view.filter)?;
    let summary = inventory_tui::run_app(&mut state, &mut runtime)?;

    session.view.width = summary.width;
    session.view.height = summary.height;
    session.view.last_tab = state.active_tab;
    session.view.filter_hidden = state.filter_hidden;
    session.view.filter = runtime.filter();
    if let Some(path) = db_path {
        session.database.location = Some(path.display().to_string());
    }
    session.save(&session_path)?;
    info!("session saved");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DbSource {
    Flag,
    Config,
    Env,
    Session,
}

impl DbSource {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "--db",
            Self::Config => "config",
            Self::Env => inventory_db::DB_PATH_ENV,
            Self::Session => "session",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DbLocation {
    Known { path: PathBuf, source: DbSource },
    Ask,
}

fn resolve_db_location(options: &CliOptions, config: &Config, session: &Session) -> DbLocation {
    pick_db_location(
        options.db_path.clone(),
        config.db_path(),
        inventory_db::env_db_path(),
        session.db_location(),
    )
}

fn pick_db_location(
    flag: Option<PathBuf>,
    config: Option<PathBuf>,
    env: Option<PathBuf>,
    session: Option<PathBuf>,
) -> DbLocation {
    [
        (flag, DbSource::Flag),
        (config, DbSource::Config),
        (env, DbSource::Env),
        (session, DbSource::Session),
    ]
    .into_iter()
    .find_map(|(path, source)| path.map(|path| DbLocation::Known { path, source }))
    .unwrap_or(DbLocation::Ask)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    db_path: Option<PathBuf>,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    export_csv: Option<(TabKind, PathBuf)>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        db_path: None,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        export_csv: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--db" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--db requires a database path"))?;
                inventory_db::validate_db_path(value.as_ref())?;
                options.db_path = Some(PathBuf::from(value.as_ref()));
            }
            "--export-csv" => {
                let tab = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export-csv requires a tab and a file path"))?;
                let tab = TabKind::parse(tab.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown tab {:?}; expected one of main, print, item_types, places, persons",
                        tab.as_ref()
                    )
                })?;
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow!("--export-csv requires a file path after the tab"))?;
                options.export_csv = Some((tab, PathBuf::from(path.as_ref())));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("inventory");
    println!("  --config <path>             Use a specific config path");
    println!("  --db <path>                 Open this database file");
    println!("  --print-config-path         Print resolved config path");
    println!("  --print-path                Print resolved database path");
    println!("  --print-example-config      Print a config template");
    println!("  --demo                      Launch with seeded demo data (in-memory)");
    println!("  --check                     Open and validate the database, print row counts");
    println!("  --export-csv <tab> <path>   Write one tab as CSV using the saved filter");
    println!("  --help                      Show this help");
}
