// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod demo;
mod history;
mod inventory;
mod reference;

pub use history::HistoryModel;
pub use inventory::{FilterControls, InventoryModel, PrintableInventoryModel};
pub use reference::ReferenceModel;

use demo::{DEMO_ITEM_TYPES, DEMO_PLACES, DemoData};

use anyhow::{Context, Result, anyhow, bail};
use inventory_app::{DataError, DataResult, ItemId, ItemTypeId, LookupKind, PlaceId};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info};

pub const APP_NAME: &str = "inventory";
pub const DB_PATH_ENV: &str = "INVENTORY_DB_PATH";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("item_types", &["id", "name"]),
    ("places", &["id", "name"]),
    ("persons", &["id", "name"]),
    (
        "items",
        &[
            "id",
            "item_type_id",
            "name",
            "inventory_number",
            "place_id",
            "active",
            "note",
        ],
    ),
    (
        "history",
        &["id", "item_id", "changed_at", "field", "old_value", "new_value"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_items_item_type_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_items_item_type_id ON items (item_type_id);",
    },
    RequiredIndex {
        name: "idx_items_place_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_items_place_id ON items (place_id);",
    },
    RequiredIndex {
        name: "idx_history_item_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_history_item_id ON history (item_id, changed_at);",
    },
];

const HISTORY_TRIGGERS: [&str; 6] = [
    "trg_items_history_item_type",
    "trg_items_history_name",
    "trg_items_history_inventory_number",
    "trg_items_history_place",
    "trg_items_history_active",
    "trg_items_history_note",
];

const DEMO_ITEM_COUNT: usize = 40;
const DEMO_PERSON_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewItem {
    pub item_type_id: Option<ItemTypeId>,
    pub name: String,
    pub inventory_number: String,
    pub place_id: Option<PlaceId>,
    pub active: bool,
    pub note: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("created inventory schema");
        }

        ensure_required_indexes(&self.conn)?;
        ensure_history_triggers(&self.conn)?;
        Ok(())
    }

    /// Fills an empty database with a deterministic sample inventory.
    pub fn seed_demo_data(&self, seed: u64) -> Result<()> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .context("count existing items")?;
        if existing > 0 {
            bail!("refusing to seed demo data into a database that already has {existing} items");
        }

        let mut demo = DemoData::new(seed);
        let item_types = DEMO_ITEM_TYPES
            .iter()
            .map(|name| Ok(ItemTypeId::new(self.insert_lookup(LookupKind::ItemTypes, name)?)))
            .collect::<Result<Vec<_>>>()?;
        let places = DEMO_PLACES
            .iter()
            .map(|name| Ok(PlaceId::new(self.insert_lookup(LookupKind::Places, name)?)))
            .collect::<Result<Vec<_>>>()?;
        let mut persons = BTreeSet::new();
        while persons.len() < DEMO_PERSON_COUNT {
            persons.insert(demo.person_name());
        }
        for name in &persons {
            self.insert_lookup(LookupKind::Persons, name)?;
        }

        for _ in 0..DEMO_ITEM_COUNT {
            let item = demo.item();
            self.insert_item(&NewItem {
                item_type_id: item_types.get(item.type_index).copied(),
                name: item.name,
                inventory_number: item.inventory_number,
                place_id: places.get(item.place_index).copied(),
                active: item.active,
                note: item.note,
            })?;
        }

        info!(seed, items = DEMO_ITEM_COUNT, "seeded demo data");
        Ok(())
    }

    pub fn insert_lookup(&self, kind: LookupKind, name: &str) -> Result<i64> {
        self.conn
            .execute(
                &format!("INSERT INTO {} (name) VALUES (?)", kind.table()),
                params![name],
            )
            .with_context(|| format!("insert {} {name:?}", kind.entity()))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_item(&self, item: &NewItem) -> Result<ItemId> {
        self.conn
            .execute(
                "
                INSERT INTO items (
                  item_type_id, name, inventory_number, place_id, active, note
                ) VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    item.item_type_id.map(ItemTypeId::get),
                    item.name,
                    item.inventory_number,
                    item.place_id.map(PlaceId::get),
                    item.active,
                    item.note,
                ],
            )
            .with_context(|| format!("insert item {:?}", item.name))?;
        Ok(ItemId::new(self.conn.last_insert_rowid()))
    }

    /// Row counts per required table, in schema order.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        REQUIRED_SCHEMA
            .iter()
            .map(|(table, _)| {
                let count = self
                    .conn
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get::<_, i64>(0)
                    })
                    .with_context(|| format!("count rows in {table}"))?;
                Ok((*table, count))
            })
            .collect()
    }
}

/// Suggested location for a new database file.
pub fn default_db_path() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DB_PATH_ENV} to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("inventory.sqlite"))
}

pub fn env_db_path() -> Option<PathBuf> {
    env::var_os(DB_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

/// Maps rusqlite failures onto [`DataError::Store`] with a short context.
pub(crate) trait StoreResultExt<T> {
    fn store_context<F>(self, context: F) -> DataResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> StoreResultExt<T> for rusqlite::Result<T> {
    fn store_context<F>(self, context: F) -> DataResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|error| DataError::store(context(), error.to_string()))
    }
}

pub(crate) fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

pub(crate) fn checked_row_id(entity: &'static str, raw: Option<i64>) -> DataResult<i64> {
    match raw {
        Some(id) if id > 0 => Ok(id),
        Some(id) => Err(DataError::invalid_record(
            entity,
            format!("id {id} is not positive"),
        )),
        None => Err(DataError::invalid_record(entity, "id is null")),
    }
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point --db at an inventory database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing = schema_object_names(conn, "index")?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn ensure_history_triggers(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("sql/triggers.sql"))
        .context("ensure history triggers")?;

    let existing = schema_object_names(conn, "trigger")?;
    let missing = HISTORY_TRIGGERS
        .iter()
        .copied()
        .filter(|name| !existing.contains(*name))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!("database is missing history triggers: {}", missing.join(", "));
    }
    debug!(triggers = HISTORY_TRIGGERS.len(), "history triggers in place");
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn schema_object_names(conn: &Connection, kind: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = ?
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .with_context(|| format!("prepare {kind} names query"))?;
    let rows = stmt
        .query_map(params![kind], |row| row.get::<_, String>(0))
        .with_context(|| format!("query {kind} names"))?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect {kind} names"))
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

pub(crate) fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

#[cfg(test)]
mod tests {
    use super::{checked_row_id, is_foreign_key_violation, parse_datetime};
    use anyhow::Result;
    use inventory_app::DataError;
    use rusqlite::Connection;
    use time::macros::datetime;

    #[test]
    fn parse_datetime_accepts_trigger_and_legacy_formats() -> Result<()> {
        assert_eq!(
            parse_datetime("2026-02-19T12:34:56Z")?,
            datetime!(2026-02-19 12:34:56 UTC)
        );
        assert_eq!(
            parse_datetime("2026-02-19 12:34:56")?,
            datetime!(2026-02-19 12:34:56 UTC)
        );
        assert!(parse_datetime("yesterday").is_err());
        Ok(())
    }

    #[test]
    fn checked_row_id_rejects_null_and_zero() {
        assert_eq!(checked_row_id("place", Some(3)), Ok(3));
        assert!(matches!(
            checked_row_id("place", Some(0)),
            Err(DataError::InvalidRecord { entity: "place", .. })
        ));
        assert!(checked_row_id("place", None).is_err());
    }

    #[test]
    fn foreign_key_failures_are_recognized() -> Result<()> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            CREATE TABLE parent (id INTEGER PRIMARY KEY);
            CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER REFERENCES parent (id));
            INSERT INTO parent (id) VALUES (1);
            INSERT INTO child (parent_id) VALUES (1);
            ",
        )?;

        let error = conn
            .execute("DELETE FROM parent WHERE id = 1", [])
            .expect_err("referenced parent should not delete");
        assert!(is_foreign_key_violation(&error));

        let other = conn
            .execute("INSERT INTO missing_table VALUES (1)", [])
            .expect_err("missing table should fail");
        assert!(!is_foreign_key_violation(&other));
        Ok(())
    }
}
