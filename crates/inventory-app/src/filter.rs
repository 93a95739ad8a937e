// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::{ItemTypeId, LookupKind, PlaceId, ReferenceList};

/// Inclusion criteria for the item list. A disabled group keeps its value so
/// switching it back on restores the previous selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryViewFilter {
    pub use_place: bool,
    pub place_id: Option<PlaceId>,
    pub use_item_type: bool,
    pub item_type_id: Option<ItemTypeId>,
    pub use_activity: bool,
    pub active: bool,
}

impl Default for InventoryViewFilter {
    fn default() -> Self {
        Self {
            use_place: false,
            place_id: None,
            use_item_type: false,
            item_type_id: None,
            use_activity: false,
            active: true,
        }
    }
}

impl InventoryViewFilter {
    pub fn is_any_enabled(&self) -> bool {
        self.use_place || self.use_item_type || self.use_activity
    }

    pub fn switch(&mut self, kind: FilterKind, on: bool) {
        match kind {
            FilterKind::ItemType => self.use_item_type = on,
            FilterKind::Place => self.use_place = on,
            FilterKind::Activity => self.use_activity = on,
        }
    }

    pub fn is_enabled(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::ItemType => self.use_item_type,
            FilterKind::Place => self.use_place,
            FilterKind::Activity => self.use_activity,
        }
    }

    pub fn written_off(&self) -> bool {
        !self.active
    }

    pub fn set_value(&mut self, value: FilterValue) {
        match value {
            FilterValue::ItemType(id) => self.item_type_id = id,
            FilterValue::Place(id) => self.place_id = id,
            FilterValue::WrittenOff(written_off) => self.active = !written_off,
        }
    }
}

/// A new value for one filter group. Its switch is left as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
    ItemType(Option<ItemTypeId>),
    Place(Option<PlaceId>),
    WrittenOff(bool),
}

impl FilterValue {
    pub const fn kind(self) -> FilterKind {
        match self {
            Self::ItemType(_) => FilterKind::ItemType,
            Self::Place(_) => FilterKind::Place,
            Self::WrittenOff(_) => FilterKind::Activity,
        }
    }
}

/// Id after `current` in `list`: empty goes to the first row and the last row
/// wraps to empty. Ids no longer listed restart at the first row.
pub fn next_lookup_id(list: &dyn ReferenceList, current: Option<i64>) -> Option<i64> {
    match current.and_then(|id| list.index_of(id)) {
        Some(row) => list.id_at(row + 1),
        None => list.id_at(0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    ItemType,
    Place,
    Activity,
}

impl FilterKind {
    pub const ALL: [Self; 3] = [Self::ItemType, Self::Place, Self::Activity];

    pub const fn label(self) -> &'static str {
        match self {
            Self::ItemType => "item type",
            Self::Place => "place",
            Self::Activity => "status",
        }
    }
}

/// Owned copy of a reference list, detached from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSnapshot {
    kind: LookupKind,
    entries: Vec<(i64, String)>,
}

impl LookupSnapshot {
    pub fn new(kind: LookupKind, entries: Vec<(i64, String)>) -> Self {
        Self { kind, entries }
    }

    pub fn capture(list: &dyn ReferenceList) -> Self {
        let entries = (0..list.len())
            .filter_map(|row| Some((list.id_at(row)?, list.name_at(row)?.to_owned())))
            .collect();
        Self {
            kind: list.kind(),
            entries,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, name)| name.as_str())
    }
}

impl ReferenceList for LookupSnapshot {
    fn kind(&self) -> LookupKind {
        self.kind
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn name_at(&self, row: usize) -> Option<&str> {
        self.entries.get(row).map(|(_, name)| name.as_str())
    }

    fn id_at(&self, row: usize) -> Option<i64> {
        self.entries.get(row).map(|(id, _)| *id)
    }

    fn index_of(&self, id: i64) -> Option<usize> {
        self.entries.iter().position(|(entry, _)| *entry == id)
    }
}

/// Editable state behind the filter dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDialogState {
    pub use_item_type: bool,
    pub item_type_row: Option<usize>,
    pub use_place: bool,
    pub place_row: Option<usize>,
    pub use_activity: bool,
    pub written_off: bool,
    pub focus: FilterKind,
    item_type_rows: usize,
    place_rows: usize,
}

impl FilterDialogState {
    pub fn new(item_types: &dyn ReferenceList, places: &dyn ReferenceList) -> Self {
        Self {
            use_item_type: false,
            item_type_row: first_row(item_types),
            use_place: false,
            place_row: first_row(places),
            use_activity: false,
            written_off: false,
            focus: FilterKind::ItemType,
            item_type_rows: item_types.len(),
            place_rows: places.len(),
        }
    }

    pub fn filter(
        &self,
        item_types: &dyn ReferenceList,
        places: &dyn ReferenceList,
    ) -> InventoryViewFilter {
        InventoryViewFilter {
            use_item_type: self.use_item_type,
            item_type_id: self
                .item_type_row
                .and_then(|row| item_types.id_at(row))
                .and_then(ItemTypeId::checked),
            use_place: self.use_place,
            place_id: self
                .place_row
                .and_then(|row| places.id_at(row))
                .and_then(PlaceId::checked),
            use_activity: self.use_activity,
            active: !self.written_off,
        }
    }

    /// Seeds every group from the record, enabled or not, so a disabled
    /// group comes back with its saved value. Ids missing from the lists
    /// leave the current row alone. An empty value on a disabled group does
    /// too.
    pub fn set_filter(
        &mut self,
        filter: &InventoryViewFilter,
        item_types: &dyn ReferenceList,
        places: &dyn ReferenceList,
    ) {
        self.use_item_type = filter.use_item_type;
        self.item_type_row = seed_row(
            self.item_type_row,
            filter.item_type_id.map(ItemTypeId::get),
            filter.use_item_type,
            item_types,
        );

        self.use_place = filter.use_place;
        self.place_row = seed_row(
            self.place_row,
            filter.place_id.map(PlaceId::get),
            filter.use_place,
            places,
        );

        self.use_activity = filter.use_activity;
        self.written_off = filter.written_off();
    }

    pub fn focus_next(&mut self) {
        self.focus = rotate(self.focus, 1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = rotate(self.focus, -1);
    }

    pub fn toggle_focused(&mut self) {
        match self.focus {
            FilterKind::ItemType => self.use_item_type = !self.use_item_type,
            FilterKind::Place => self.use_place = !self.use_place,
            FilterKind::Activity => self.use_activity = !self.use_activity,
        }
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    fn move_selection(&mut self, delta: isize) {
        match self.focus {
            FilterKind::ItemType => {
                self.item_type_row = step_row(self.item_type_row, self.item_type_rows, delta);
            }
            FilterKind::Place => {
                self.place_row = step_row(self.place_row, self.place_rows, delta);
            }
            FilterKind::Activity => self.written_off = !self.written_off,
        }
    }
}

fn seed_row(
    current: Option<usize>,
    id: Option<i64>,
    enabled: bool,
    list: &dyn ReferenceList,
) -> Option<usize> {
    match id {
        Some(id) => list.index_of(id).or(current),
        None if enabled => None,
        None => current,
    }
}

fn first_row(list: &dyn ReferenceList) -> Option<usize> {
    if list.is_empty() { None } else { Some(0) }
}

fn step_row(current: Option<usize>, len: usize, delta: isize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let Some(current) = current else {
        return Some(if delta < 0 { len - 1 } else { 0 });
    };
    let next = current as isize + delta;
    Some(next.clamp(0, len as isize - 1) as usize)
}

fn rotate(kind: FilterKind, delta: isize) -> FilterKind {
    let all = FilterKind::ALL;
    let current = all.iter().position(|entry| *entry == kind).unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(all.len() as isize) as usize;
    all[next]
}
