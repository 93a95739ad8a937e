// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use inventory_app::{InventoryViewFilter, TabKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings remembered between runs. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub view: ViewSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub width: u16,
    pub height: u16,
    pub last_tab: TabKind,
    pub filter_hidden: bool,
    pub filter: InventoryViewFilter,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            last_tab: TabKind::Main,
            filter_hidden: false,
            filter: InventoryViewFilter::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub location: Option<String>,
}

impl Session {
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::config::config_dir()?.join("session.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read session file {}", path.display()))?;
        let session = toml::from_str(&raw)
            .with_context(|| format!("parse session file {}", path.display()))?;
        debug!(path = %path.display(), "loaded session");
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create session directory {}", parent.display()))?;
        }
        let raw = toml::to_string(self).context("encode session settings")?;
        fs::write(path, raw).with_context(|| format!("write session file {}", path.display()))?;
        debug!(path = %path.display(), "saved session");
        Ok(())
    }

    pub fn db_location(&self) -> Option<PathBuf> {
        self.database
            .location
            .as_deref()
            .filter(|location| !location.trim().is_empty())
            .map(PathBuf::from)
    }
}

/// Asks for a database file on `output`, reading one line from `input`. An
/// empty answer accepts `suggested`.
pub fn prompt_db_location<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    suggested: &Path,
) -> Result<PathBuf> {
    write!(
        output,
        "Database file [{}]: ",
        suggested.display()
    )
    .context("write database prompt")?;
    output.flush().context("flush database prompt")?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("read database location")?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(suggested.to_path_buf());
    }
    inventory_db::validate_db_path(answer)?;
    info!(location = answer, "database location chosen");
    Ok(PathBuf::from(answer))
}

#[cfg(test)]
mod tests {
    use super::{Session, ViewSettings, prompt_db_location};
    use anyhow::Result;
    use inventory_app::{InventoryViewFilter, PlaceId, TabKind};
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    #[test]
    fn missing_session_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let session = Session::load(&temp.path().join("session.toml"))?;
        assert_eq!(session, Session::default());
        assert_eq!(session.view.last_tab, TabKind::Main);
        assert!(session.view.filter.active);
        assert_eq!(session.db_location(), None);
        Ok(())
    }

    #[test]
    fn session_survives_save_and_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("session.toml");
        let session = Session {
            view: ViewSettings {
                width: 120,
                height: 40,
                last_tab: TabKind::Places,
                filter_hidden: true,
                filter: InventoryViewFilter {
                    use_place: true,
                    place_id: Some(PlaceId::new(3)),
                    ..InventoryViewFilter::default()
                },
            },
            database: super::DatabaseSettings {
                location: Some("/data/inventory.sqlite".to_owned()),
            },
        };

        session.save(&path)?;
        let loaded = Session::load(&path)?;
        assert_eq!(loaded, session);
        assert_eq!(
            loaded.db_location(),
            Some(PathBuf::from("/data/inventory.sqlite"))
        );
        Ok(())
    }

    #[test]
    fn partial_session_fills_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("session.toml");
        std::fs::write(&path, "[view]\nwidth = 80\n")?;
        let session = Session::load(&path)?;
        assert_eq!(session.view.width, 80);
        assert_eq!(session.view.last_tab, TabKind::Main);
        assert!(!session.view.filter_hidden);
        Ok(())
    }

    #[test]
    fn corrupt_session_reports_path() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("session.toml");
        std::fs::write(&path, "[view\n")?;
        let error = Session::load(&path).expect_err("corrupt session should fail");
        assert!(error.to_string().contains("parse session file"));
        Ok(())
    }

    #[test]
    fn empty_prompt_answer_accepts_suggestion() -> Result<()> {
        let mut input = Cursor::new("\n");
        let mut output = Vec::new();
        let chosen = prompt_db_location(&mut input, &mut output, Path::new("/d/inv.sqlite"))?;
        assert_eq!(chosen, PathBuf::from("/d/inv.sqlite"));
        assert_eq!(String::from_utf8(output)?, "Database file [/d/inv.sqlite]: ");
        Ok(())
    }

    #[test]
    fn prompt_answer_is_validated() -> Result<()> {
        let mut output = Vec::new();
        let chosen = prompt_db_location(
            &mut Cursor::new("  /srv/stock.sqlite \n"),
            &mut output,
            Path::new("/d/inv.sqlite"),
        )?;
        assert_eq!(chosen, PathBuf::from("/srv/stock.sqlite"));

        let error = prompt_db_location(
            &mut Cursor::new("https://host/db\n"),
            &mut output,
            Path::new("/d/inv.sqlite"),
        )
        .expect_err("URI answer should fail");
        assert!(error.to_string().contains("looks like a URI"));
        Ok(())
    }
}
