// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Item table models for the main and print tabs.
//!
//! Both models re-run the same filtered query; sorting is pushed into the
//! `ORDER BY` clause so it survives filter changes and refreshes.

use std::sync::mpsc::Receiver;

use inventory_app::{
    CellEditor, CellValue, ChangeNotifier, DataError, DataResult, FilterValue, InventoryField,
    InventoryViewFilter, Item, ItemId, ItemType, ItemTypeId, LookupKind, ModelEvent, Place,
    PlaceId, RowRemoval, SortDirection, SortOrder, TableModel,
};
use rusqlite::{Row, params, params_from_iter};
use tracing::{debug, info, warn};

use crate::{Store, StoreResultExt, checked_row_id, is_foreign_key_violation};

const ITEM_SELECT: &str = "
    SELECT i.id, i.item_type_id, t.name, i.name, i.inventory_number,
           i.place_id, p.name, i.active, i.note
    FROM items i
    LEFT JOIN item_types t ON t.id = i.item_type_id
    LEFT JOIN places p ON p.id = i.place_id
";

const PRINT_HEADERS: [&str; 7] = [
    "#",
    "Item type",
    "Name",
    "Inventory number",
    "Place",
    "Status",
    "Note",
];

/// Shared filtered and sorted fetch of item rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemQuery {
    filter: InventoryViewFilter,
    sort: Option<(InventoryField, SortDirection)>,
}

impl ItemQuery {
    fn with_filter<F>(&mut self, change: F)
    where
        F: FnOnce(&mut InventoryViewFilter),
    {
        change(&mut self.filter);
    }

    fn fetch(&self, store: &Store) -> DataResult<Vec<Item>> {
        let mut clauses = Vec::new();
        let mut values: Vec<i64> = Vec::new();

        if self.filter.use_item_type {
            match self.filter.item_type_id {
                Some(id) => {
                    clauses.push("i.item_type_id = ?");
                    values.push(id.get());
                }
                None => clauses.push("i.item_type_id IS NULL"),
            }
        }
        if self.filter.use_place {
            match self.filter.place_id {
                Some(id) => {
                    clauses.push("i.place_id = ?");
                    values.push(id.get());
                }
                None => clauses.push("i.place_id IS NULL"),
            }
        }
        if self.filter.use_activity {
            clauses.push("i.active = ?");
            values.push(i64::from(self.filter.active));
        }

        let mut sql = ITEM_SELECT.to_owned();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        match self.sort {
            Some((field, direction)) => {
                sql.push_str(&format!(
                    " ORDER BY {} {}, i.id ASC",
                    order_expression(field),
                    direction.sql()
                ));
            }
            None => sql.push_str(" ORDER BY i.id ASC"),
        }

        let conn = store.raw_connection();
        let mut stmt = conn
            .prepare(&sql)
            .store_context(|| "prepare items query".to_owned())?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), read_item_row)
            .store_context(|| "query items".to_owned())?;
        let raw = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .store_context(|| "collect items".to_owned())?;
        let items = raw
            .into_iter()
            .map(RawItem::into_item)
            .collect::<DataResult<Vec<_>>>()?;
        debug!(rows = items.len(), filtered = self.filter.is_any_enabled(), "reloaded items");
        Ok(items)
    }
}

/// Filter setters shared by the item models. Every change re-fetches once;
/// switching a group never touches its value.
pub trait FilterControls {
    fn refilter<F>(&mut self, change: F) -> DataResult<()>
    where
        F: FnOnce(&mut InventoryViewFilter);

    fn set_filter(&mut self, filter: InventoryViewFilter) -> DataResult<()> {
        self.refilter(|current| *current = filter)
    }

    fn set_place_filter(&mut self, place: Option<PlaceId>) -> DataResult<()> {
        self.refilter(|filter| filter.place_id = place)
    }

    fn switch_place_filter(&mut self, on: bool) -> DataResult<()> {
        self.refilter(|filter| filter.use_place = on)
    }

    fn set_item_type_filter(&mut self, item_type: Option<ItemTypeId>) -> DataResult<()> {
        self.refilter(|filter| filter.item_type_id = item_type)
    }

    fn switch_item_type_filter(&mut self, on: bool) -> DataResult<()> {
        self.refilter(|filter| filter.use_item_type = on)
    }

    fn set_written_off_filter(&mut self, written_off: bool) -> DataResult<()> {
        self.refilter(|filter| filter.active = !written_off)
    }

    fn switch_written_off_filter(&mut self, on: bool) -> DataResult<()> {
        self.refilter(|filter| filter.use_activity = on)
    }

    fn set_filter_value(&mut self, value: FilterValue) -> DataResult<()> {
        match value {
            FilterValue::ItemType(item_type) => self.set_item_type_filter(item_type),
            FilterValue::Place(place) => self.set_place_filter(place),
            FilterValue::WrittenOff(written_off) => self.set_written_off_filter(written_off),
        }
    }
}

fn fetch_one(store: &Store, id: ItemId) -> DataResult<Item> {
    let sql = format!("{ITEM_SELECT} WHERE i.id = ?");
    let raw = store
        .raw_connection()
        .query_row(&sql, params![id.get()], read_item_row)
        .store_context(|| format!("reload item {}", id.get()))?;
    raw.into_item()
}

fn order_expression(field: InventoryField) -> &'static str {
    match field {
        InventoryField::ItemType => "COALESCE(t.name, '')",
        InventoryField::Name => "i.name",
        InventoryField::InventoryNumber => "i.inventory_number",
        InventoryField::Place => "COALESCE(p.name, '')",
        InventoryField::Active => "i.active",
        InventoryField::Note => "i.note",
    }
}

struct RawItem {
    id: Option<i64>,
    item_type_id: Option<i64>,
    item_type_name: Option<String>,
    name: String,
    inventory_number: String,
    place_id: Option<i64>,
    place_name: Option<String>,
    active: bool,
    note: String,
}

impl RawItem {
    fn into_item(self) -> DataResult<Item> {
        let id = checked_row_id("item", self.id)?;
        let item_type = self.item_type_id.map(|raw| ItemType {
            id: ItemTypeId::new(raw),
            name: self.item_type_name.unwrap_or_default(),
        });
        let place = self.place_id.map(|raw| Place {
            id: PlaceId::new(raw),
            name: self.place_name.unwrap_or_default(),
        });
        Ok(Item {
            id: ItemId::new(id),
            item_type,
            name: self.name,
            inventory_number: self.inventory_number,
            place,
            active: self.active,
            note: self.note,
        })
    }
}

fn read_item_row(row: &Row<'_>) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        id: row.get(0)?,
        item_type_id: row.get(1)?,
        item_type_name: row.get(2)?,
        name: row.get(3)?,
        inventory_number: row.get(4)?,
        place_id: row.get(5)?,
        place_name: row.get(6)?,
        active: row.get(7)?,
        note: row.get(8)?,
    })
}

fn field_value(item: &Item, field: InventoryField) -> CellValue {
    match field {
        InventoryField::ItemType => match &item.item_type {
            Some(value) => CellValue::Reference {
                id: value.id.get(),
                label: value.name.clone(),
            },
            None => CellValue::Empty,
        },
        InventoryField::Name => CellValue::text(item.name.clone()),
        InventoryField::InventoryNumber => CellValue::text(item.inventory_number.clone()),
        InventoryField::Place => match &item.place {
            Some(value) => CellValue::Reference {
                id: value.id.get(),
                label: value.name.clone(),
            },
            None => CellValue::Empty,
        },
        InventoryField::Active => CellValue::Flag(item.active),
        InventoryField::Note => CellValue::text(item.note.clone()),
    }
}

/// Accepts the spellings a user is likely to type into the active column.
pub(crate) fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "1" | "true" | "active" => Some(true),
        "no" | "n" | "0" | "false" | "written off" | "inactive" => Some(false),
        _ => None,
    }
}

/// Editable, filterable item list for the main tab.
pub struct InventoryModel<'s> {
    store: &'s Store,
    query: ItemQuery,
    rows: Vec<Item>,
    notifier: ChangeNotifier,
}

impl<'s> InventoryModel<'s> {
    pub fn load(store: &'s Store, filter: InventoryViewFilter) -> DataResult<Self> {
        let query = ItemQuery { filter, sort: None };
        let rows = query.fetch(store)?;
        Ok(Self {
            store,
            query,
            rows,
            notifier: ChangeNotifier::new(),
        })
    }

    pub fn filter(&self) -> InventoryViewFilter {
        self.query.filter
    }

    pub fn item(&self, row: usize) -> Option<&Item> {
        self.rows.get(row)
    }

    pub fn id_at(&self, row: usize) -> Option<ItemId> {
        self.rows.get(row).map(|item| item.id)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.rows.iter().position(|item| item.id == id)
    }

    /// Filter values that keep a freshly inserted row visible.
    fn insert_defaults(&self) -> (Option<i64>, Option<i64>, bool) {
        let filter = self.query.filter;
        let item_type = filter
            .use_item_type
            .then_some(filter.item_type_id)
            .flatten()
            .map(ItemTypeId::get);
        let place = filter
            .use_place
            .then_some(filter.place_id)
            .flatten()
            .map(PlaceId::get);
        let active = if filter.use_activity {
            filter.active
        } else {
            true
        };
        (item_type, place, active)
    }

    fn write_field(&self, id: ItemId, field: InventoryField, value: CellValue) -> DataResult<()> {
        let conn = self.store.raw_connection();
        let context = || format!("update {} of item {}", field.history_name(), id.get());
        match field {
            InventoryField::Name | InventoryField::InventoryNumber | InventoryField::Note => {
                let column = match field {
                    InventoryField::Name => "name",
                    InventoryField::InventoryNumber => "inventory_number",
                    _ => "note",
                };
                conn.execute(
                    &format!("UPDATE items SET {column} = ? WHERE id = ?"),
                    params![value.display(), id.get()],
                )
                .store_context(context)?;
            }
            InventoryField::Active => {
                let active = match &value {
                    CellValue::Flag(flag) => *flag,
                    CellValue::Text(text) => parse_flag(text).ok_or_else(|| {
                        DataError::invalid_record("item", format!("unrecognized status {text:?}"))
                    })?,
                    other => {
                        return Err(DataError::invalid_record(
                            "item",
                            format!("status cannot be set from {other:?}"),
                        ));
                    }
                };
                conn.execute(
                    "UPDATE items SET active = ? WHERE id = ?",
                    params![active, id.get()],
                )
                .store_context(context)?;
            }
            InventoryField::ItemType | InventoryField::Place => {
                let column = if field == InventoryField::Place {
                    "place_id"
                } else {
                    "item_type_id"
                };
                let reference = match &value {
                    CellValue::Reference { .. } | CellValue::Empty => value.reference_id(),
                    other => {
                        return Err(DataError::invalid_record(
                            "item",
                            format!("{} cannot be set from {other:?}", field.history_name()),
                        ));
                    }
                };
                conn.execute(
                    &format!("UPDATE items SET {column} = ? WHERE id = ?"),
                    params![reference, id.get()],
                )
                .store_context(context)?;
            }
        }
        Ok(())
    }
}

impl TableModel for InventoryModel<'_> {
    fn title(&self) -> &str {
        "inventory"
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        InventoryField::ALL.len()
    }

    fn header(&self, column: usize) -> Option<&str> {
        InventoryField::from_column(column).map(InventoryField::header)
    }

    fn cell_value(&self, row: usize, column: usize) -> Option<CellValue> {
        let field = InventoryField::from_column(column)?;
        self.rows.get(row).map(|item| field_value(item, field))
    }

    fn cell_editor(&self, row: usize, column: usize) -> CellEditor {
        if row >= self.rows.len() {
            return CellEditor::ReadOnly;
        }
        match InventoryField::from_column(column) {
            Some(InventoryField::ItemType) => CellEditor::Reference(LookupKind::ItemTypes),
            Some(InventoryField::Place) => CellEditor::Reference(LookupKind::Places),
            Some(InventoryField::Active) => CellEditor::Flag,
            Some(_) => CellEditor::Text,
            None => CellEditor::ReadOnly,
        }
    }

    fn set_cell_value(&mut self, row: usize, column: usize, value: CellValue) -> DataResult<bool> {
        let Some(field) = InventoryField::from_column(column) else {
            return Ok(false);
        };
        let Some(id) = self.id_at(row) else {
            return Ok(false);
        };

        self.write_field(id, field, value)?;
        let refreshed = fetch_one(self.store, id)?;
        if let Some(slot) = self.rows.get_mut(row) {
            *slot = refreshed;
        }
        info!(item = id.get(), field = field.history_name(), "updated item");
        self.notifier.notify(ModelEvent::CellChanged { row, column });
        Ok(true)
    }

    fn insert_row(&mut self) -> DataResult<Option<usize>> {
        let (item_type, place, active) = self.insert_defaults();
        let conn = self.store.raw_connection();
        conn.execute(
            "INSERT INTO items (item_type_id, place_id, active) VALUES (?, ?, ?)",
            params![item_type, place, active],
        )
        .store_context(|| "insert blank item".to_owned())?;
        let id = ItemId::new(conn.last_insert_rowid());

        let item = fetch_one(self.store, id)?;
        self.rows.push(item);
        let row = self.rows.len() - 1;
        self.notifier.notify(ModelEvent::RowsInserted {
            first: row,
            count: 1,
        });
        info!(item = id.get(), "inserted blank item");
        Ok(Some(row))
    }

    fn remove_row(&mut self, row: usize) -> DataResult<RowRemoval> {
        let id = self.id_at(row).ok_or_else(|| {
            DataError::invalid_record(
                "item",
                format!("row {row} is outside 0..{}", self.rows.len()),
            )
        })?;
        let result = self
            .store
            .raw_connection()
            .execute("DELETE FROM items WHERE id = ?", params![id.get()]);
        match result {
            Ok(_) => {
                self.rows.remove(row);
                self.notifier.notify(ModelEvent::RowsRemoved {
                    first: row,
                    count: 1,
                });
                info!(item = id.get(), "removed item");
                Ok(RowRemoval::Removed)
            }
            Err(error) if is_foreign_key_violation(&error) => {
                warn!(item = id.get(), "item removal blocked by references");
                Ok(RowRemoval::Blocked)
            }
            Err(error) => Err(DataError::store(
                format!("remove item {}", id.get()),
                error.to_string(),
            )),
        }
    }

    fn sort_by(&mut self, column: usize, direction: SortDirection) -> DataResult<bool> {
        let Some(field) = InventoryField::from_column(column) else {
            return Ok(false);
        };
        self.query.sort = Some((field, direction));
        self.update()?;
        Ok(true)
    }

    fn sort_order(&self) -> Option<SortOrder> {
        let (field, direction) = self.query.sort?;
        let column = InventoryField::ALL.iter().position(|entry| *entry == field)?;
        Some(SortOrder { column, direction })
    }

    fn update(&mut self) -> DataResult<()> {
        self.rows = self.query.fetch(self.store)?;
        self.notifier.notify(ModelEvent::Reset);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<ModelEvent> {
        self.notifier.subscribe()
    }
}

impl FilterControls for InventoryModel<'_> {
    fn refilter<F>(&mut self, change: F) -> DataResult<()>
    where
        F: FnOnce(&mut InventoryViewFilter),
    {
        self.query.with_filter(change);
        self.update()
    }
}

/// Read-only item list laid out for printing.
pub struct PrintableInventoryModel<'s> {
    store: &'s Store,
    query: ItemQuery,
    rows: Vec<Item>,
    notifier: ChangeNotifier,
}

impl<'s> PrintableInventoryModel<'s> {
    pub fn load(store: &'s Store, filter: InventoryViewFilter) -> DataResult<Self> {
        let query = ItemQuery { filter, sort: None };
        let rows = query.fetch(store)?;
        Ok(Self {
            store,
            query,
            rows,
            notifier: ChangeNotifier::new(),
        })
    }

    pub fn filter(&self) -> InventoryViewFilter {
        self.query.filter
    }
}

impl FilterControls for PrintableInventoryModel<'_> {
    fn refilter<F>(&mut self, change: F) -> DataResult<()>
    where
        F: FnOnce(&mut InventoryViewFilter),
    {
        self.query.with_filter(change);
        self.update()
    }
}

impl TableModel for PrintableInventoryModel<'_> {
    fn title(&self) -> &str {
        "print"
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        PRINT_HEADERS.len()
    }

    fn header(&self, column: usize) -> Option<&str> {
        PRINT_HEADERS.get(column).copied()
    }

    fn cell_value(&self, row: usize, column: usize) -> Option<CellValue> {
        let item = self.rows.get(row)?;
        if column == 0 {
            return Some(CellValue::text((row + 1).to_string()));
        }
        let field = InventoryField::from_column(column - 1)?;
        Some(match field {
            InventoryField::Active => {
                CellValue::text(if item.active { "active" } else { "written off" })
            }
            other => field_value(item, other),
        })
    }

    fn sort_by(&mut self, column: usize, direction: SortDirection) -> DataResult<bool> {
        let Some(field) = column
            .checked_sub(1)
            .and_then(InventoryField::from_column)
        else {
            return Ok(false);
        };
        self.query.sort = Some((field, direction));
        self.update()?;
        Ok(true)
    }

    fn sort_order(&self) -> Option<SortOrder> {
        let (field, direction) = self.query.sort?;
        let column = InventoryField::ALL.iter().position(|entry| *entry == field)? + 1;
        Some(SortOrder { column, direction })
    }

    fn update(&mut self) -> DataResult<()> {
        self.rows = self.query.fetch(self.store)?;
        self.notifier.notify(ModelEvent::Reset);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<ModelEvent> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag(" written off "), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
