// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::mpsc::Receiver;

use inventory_app::{
    CellEditor, CellValue, ChangeNotifier, DataError, DataResult, LookupKind, ModelEvent,
    ReferenceList, RowRemoval, SortDirection, SortOrder, TableModel,
};
use rusqlite::params;
use tracing::{debug, info, warn};

use crate::{Store, StoreResultExt, checked_row_id, is_foreign_key_violation};

const NAME_HEADER: &str = "Name";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    id: i64,
    name: String,
}

/// Single-column list over one lookup table, held fully in memory.
pub struct ReferenceModel<'s> {
    store: &'s Store,
    kind: LookupKind,
    entries: Vec<Entry>,
    direction: SortDirection,
    notifier: ChangeNotifier,
}

impl<'s> ReferenceModel<'s> {
    pub fn load(store: &'s Store, kind: LookupKind) -> DataResult<Self> {
        let mut model = Self {
            store,
            kind,
            entries: Vec::new(),
            direction: SortDirection::Asc,
            notifier: ChangeNotifier::new(),
        };
        model.entries = model.fetch()?;
        Ok(model)
    }

    pub fn kind(&self) -> LookupKind {
        self.kind
    }

    pub fn update_list(&mut self) -> DataResult<()> {
        self.entries = self.fetch()?;
        self.notifier.notify(ModelEvent::Reset);
        Ok(())
    }

    /// Creates one record per non-blank line and returns how many were added.
    /// Lines already written stay committed if a later one fails.
    pub fn add_multiline<I, S>(&mut self, lines: I) -> DataResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sql = format!("INSERT INTO {} (name) VALUES (?)", self.kind.table());
        let mut added = 0usize;
        for line in lines {
            let name = line.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            self.store
                .raw_connection()
                .execute(&sql, params![name])
                .store_context(|| format!("add {} {name:?}", self.kind.entity()))?;
            added += 1;
        }
        info!(table = self.kind.table(), added, "added lines");
        self.update_list()?;
        Ok(added)
    }

    fn fetch(&self) -> DataResult<Vec<Entry>> {
        let table = self.kind.table();
        let entity = self.kind.entity();
        let sql = format!(
            "SELECT id, name FROM {table} ORDER BY name {}, id ASC",
            self.direction.sql()
        );
        let mut stmt = self
            .store
            .raw_connection()
            .prepare(&sql)
            .store_context(|| format!("prepare {table} query"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, String>(1)?))
            })
            .store_context(|| format!("query {table}"))?;
        let raw = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .store_context(|| format!("collect {table}"))?;

        let entries = raw
            .into_iter()
            .map(|(id, name)| {
                Ok(Entry {
                    id: checked_row_id(entity, id)?,
                    name,
                })
            })
            .collect::<DataResult<Vec<_>>>()?;
        debug!(table, rows = entries.len(), "reloaded reference list");
        Ok(entries)
    }

    fn out_of_range(&self, row: usize) -> DataError {
        DataError::invalid_record(
            self.kind.entity(),
            format!("row {row} is outside 0..{}", self.entries.len()),
        )
    }
}

impl ReferenceList for ReferenceModel<'_> {
    fn kind(&self) -> LookupKind {
        self.kind
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn name_at(&self, row: usize) -> Option<&str> {
        self.entries.get(row).map(|entry| entry.name.as_str())
    }

    fn id_at(&self, row: usize) -> Option<i64> {
        self.entries.get(row).map(|entry| entry.id)
    }

    fn index_of(&self, id: i64) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }
}

impl TableModel for ReferenceModel<'_> {
    fn title(&self) -> &str {
        self.kind.title()
    }

    fn row_count(&self) -> usize {
        self.entries.len()
    }

    fn column_count(&self) -> usize {
        1
    }

    fn header(&self, column: usize) -> Option<&str> {
        (column == 0).then_some(NAME_HEADER)
    }

    fn cell_value(&self, row: usize, column: usize) -> Option<CellValue> {
        if column != 0 {
            return None;
        }
        self.entries
            .get(row)
            .map(|entry| CellValue::text(entry.name.clone()))
    }

    fn cell_editor(&self, row: usize, column: usize) -> CellEditor {
        if column == 0 && row < self.entries.len() {
            CellEditor::Text
        } else {
            CellEditor::ReadOnly
        }
    }

    fn set_cell_value(&mut self, row: usize, column: usize, value: CellValue) -> DataResult<bool> {
        if column != 0 {
            return Ok(false);
        }
        let Some(entry) = self.entries.get(row) else {
            return Ok(false);
        };
        let id = entry.id;
        let name = value.display();
        self.store
            .raw_connection()
            .execute(
                &format!("UPDATE {} SET name = ? WHERE id = ?", self.kind.table()),
                params![name, id],
            )
            .store_context(|| format!("rename {} {id}", self.kind.entity()))?;

        if let Some(entry) = self.entries.get_mut(row) {
            entry.name = name;
        }
        self.notifier.notify(ModelEvent::CellChanged { row, column });
        Ok(true)
    }

    fn insert_row(&mut self) -> DataResult<Option<usize>> {
        let conn = self.store.raw_connection();
        conn.execute(
            &format!("INSERT INTO {} (name) VALUES ('')", self.kind.table()),
            [],
        )
        .store_context(|| format!("insert blank {}", self.kind.entity()))?;
        let id = conn.last_insert_rowid();

        self.entries.push(Entry {
            id,
            name: String::new(),
        });
        let row = self.entries.len() - 1;
        self.notifier.notify(ModelEvent::RowsInserted {
            first: row,
            count: 1,
        });
        info!(table = self.kind.table(), id, "inserted blank record");
        Ok(Some(row))
    }

    fn remove_row(&mut self, row: usize) -> DataResult<RowRemoval> {
        let id = self.id_at(row).ok_or_else(|| self.out_of_range(row))?;
        let result = self.store.raw_connection().execute(
            &format!("DELETE FROM {} WHERE id = ?", self.kind.table()),
            params![id],
        );
        match result {
            Ok(_) => {
                self.entries.remove(row);
                self.notifier.notify(ModelEvent::RowsRemoved {
                    first: row,
                    count: 1,
                });
                info!(table = self.kind.table(), id, "removed record");
                Ok(RowRemoval::Removed)
            }
            Err(error) if is_foreign_key_violation(&error) => {
                warn!(table = self.kind.table(), id, "removal blocked by references");
                Ok(RowRemoval::Blocked)
            }
            Err(error) => Err(DataError::store(
                format!("remove {} {id}", self.kind.entity()),
                error.to_string(),
            )),
        }
    }

    fn sort_by(&mut self, column: usize, direction: SortDirection) -> DataResult<bool> {
        if column != 0 {
            return Ok(false);
        }
        self.direction = direction;
        self.update_list()?;
        Ok(true)
    }

    fn sort_order(&self) -> Option<SortOrder> {
        Some(SortOrder {
            column: 0,
            direction: self.direction,
        })
    }

    fn update(&mut self) -> DataResult<()> {
        self.update_list()
    }

    fn subscribe(&mut self) -> Receiver<ModelEvent> {
        self.notifier.subscribe()
    }
}
