// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::mpsc::Receiver;

use inventory_app::{
    CellValue, ChangeNotifier, DataError, DataResult, History, HistoryId, ItemId, ModelEvent,
    TableModel,
};
use rusqlite::params;
use tracing::debug;

use crate::{Store, StoreResultExt, checked_row_id, parse_datetime};

const HEADERS: [&str; 4] = ["Time", "Field", "Old value", "New value"];

/// Read-only change log of a single item.
pub struct HistoryModel<'s> {
    store: &'s Store,
    item_id: ItemId,
    rows: Vec<History>,
    notifier: ChangeNotifier,
}

impl<'s> HistoryModel<'s> {
    pub fn load(store: &'s Store, item_id: ItemId) -> DataResult<Self> {
        let rows = fetch(store, item_id)?;
        Ok(Self {
            store,
            item_id,
            rows,
            notifier: ChangeNotifier::new(),
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn entries(&self) -> &[History] {
        &self.rows
    }
}

fn fetch(store: &Store, item_id: ItemId) -> DataResult<Vec<History>> {
    let mut stmt = store
        .raw_connection()
        .prepare(
            "
            SELECT id, changed_at, field, old_value, new_value
            FROM history
            WHERE item_id = ?
            ORDER BY changed_at ASC, id ASC
            ",
        )
        .store_context(|| "prepare history query".to_owned())?;
    let rows = stmt
        .query_map(params![item_id.get()], |row| {
            Ok((
                row.get::<_, Option<i64>>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .store_context(|| format!("query history of item {}", item_id.get()))?;
    let raw = rows
        .collect::<rusqlite::Result<Vec<_>>>()
        .store_context(|| format!("collect history of item {}", item_id.get()))?;

    let entries = raw
        .into_iter()
        .map(|(id, changed_at, field, old_value, new_value)| {
            let id = checked_row_id("history", id)?;
            let changed_at = parse_datetime(&changed_at).map_err(|error| {
                DataError::invalid_record("history", format!("entry {id}: {error}"))
            })?;
            Ok(History {
                id: HistoryId::new(id),
                item_id,
                changed_at,
                field,
                old_value,
                new_value,
            })
        })
        .collect::<DataResult<Vec<_>>>()?;
    debug!(item = item_id.get(), rows = entries.len(), "loaded history");
    Ok(entries)
}

impl TableModel for HistoryModel<'_> {
    fn title(&self) -> &str {
        "history"
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        HEADERS.len()
    }

    fn header(&self, column: usize) -> Option<&str> {
        HEADERS.get(column).copied()
    }

    fn cell_value(&self, row: usize, column: usize) -> Option<CellValue> {
        let entry = self.rows.get(row)?;
        match column {
            0 => Some(CellValue::Timestamp(entry.changed_at)),
            1 => Some(CellValue::text(entry.field.clone())),
            2 => Some(CellValue::text(entry.old_value.clone())),
            3 => Some(CellValue::text(entry.new_value.clone())),
            _ => None,
        }
    }

    fn update(&mut self) -> DataResult<()> {
        self.rows = fetch(self.store, self.item_id)?;
        self.notifier.notify(ModelEvent::Reset);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<ModelEvent> {
        self.notifier.subscribe()
    }
}
