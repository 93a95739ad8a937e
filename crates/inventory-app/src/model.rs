// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupValue<Id> {
    pub id: Id,
    pub name: String,
}

pub type Place = LookupValue<PlaceId>;
pub type ItemType = LookupValue<ItemTypeId>;
pub type Person = LookupValue<PersonId>;

/// The three small reference tables items are constrained by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKind {
    ItemTypes,
    Places,
    Persons,
}

impl LookupKind {
    pub const ALL: [Self; 3] = [Self::ItemTypes, Self::Places, Self::Persons];

    pub const fn table(self) -> &'static str {
        match self {
            Self::ItemTypes => "item_types",
            Self::Places => "places",
            Self::Persons => "persons",
        }
    }

    pub const fn entity(self) -> &'static str {
        match self {
            Self::ItemTypes => "item type",
            Self::Places => "place",
            Self::Persons => "person",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::ItemTypes => "item types",
            Self::Places => "places",
            Self::Persons => "persons",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub item_type: Option<ItemType>,
    pub name: String,
    pub inventory_number: String,
    pub place: Option<Place>,
    pub active: bool,
    pub note: String,
}

impl Item {
    pub fn item_type_name(&self) -> &str {
        self.item_type
            .as_ref()
            .map(|value| value.name.as_str())
            .unwrap_or("")
    }

    pub fn place_name(&self) -> &str {
        self.place
            .as_ref()
            .map(|value| value.name.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub id: HistoryId,
    pub item_id: ItemId,
    pub changed_at: OffsetDateTime,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Columns of the main inventory table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryField {
    ItemType,
    Name,
    InventoryNumber,
    Place,
    Active,
    Note,
}

impl InventoryField {
    pub const ALL: [Self; 6] = [
        Self::ItemType,
        Self::Name,
        Self::InventoryNumber,
        Self::Place,
        Self::Active,
        Self::Note,
    ];

    pub fn from_column(column: usize) -> Option<Self> {
        Self::ALL.get(column).copied()
    }

    pub const fn header(self) -> &'static str {
        match self {
            Self::ItemType => "Item type",
            Self::Name => "Name",
            Self::InventoryNumber => "Inventory number",
            Self::Place => "Place",
            Self::Active => "Active",
            Self::Note => "Note",
        }
    }

    /// Name recorded in the history log when this field changes.
    pub const fn history_name(self) -> &'static str {
        match self {
            Self::ItemType => "item type",
            Self::Name => "name",
            Self::InventoryNumber => "inventory number",
            Self::Place => "place",
            Self::Active => "active",
            Self::Note => "note",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Main,
    Print,
    ItemTypes,
    Places,
    Persons,
}

impl TabKind {
    pub const ALL: [Self; 5] = [
        Self::Main,
        Self::Print,
        Self::ItemTypes,
        Self::Places,
        Self::Persons,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Print => "print",
            Self::ItemTypes => "item types",
            Self::Places => "places",
            Self::Persons => "persons",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Print => "print",
            Self::ItemTypes => "item_types",
            Self::Places => "places",
            Self::Persons => "persons",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "main" => Some(Self::Main),
            "print" => Some(Self::Print),
            "item_types" | "types" => Some(Self::ItemTypes),
            "places" => Some(Self::Places),
            "persons" => Some(Self::Persons),
            _ => None,
        }
    }

    pub const fn lookup_kind(self) -> Option<LookupKind> {
        match self {
            Self::ItemTypes => Some(LookupKind::ItemTypes),
            Self::Places => Some(LookupKind::Places),
            Self::Persons => Some(LookupKind::Persons),
            Self::Main | Self::Print => None,
        }
    }

    pub const fn is_lookup(self) -> bool {
        self.lookup_kind().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub column: usize,
    pub direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::{InventoryField, LookupKind, SortDirection, TabKind};

    #[test]
    fn inventory_fields_keep_fixed_column_order() {
        let headers = InventoryField::ALL
            .iter()
            .map(|field| field.header())
            .collect::<Vec<_>>();
        assert_eq!(
            headers,
            vec![
                "Item type",
                "Name",
                "Inventory number",
                "Place",
                "Active",
                "Note"
            ]
        );
        assert_eq!(InventoryField::from_column(3), Some(InventoryField::Place));
        assert_eq!(InventoryField::from_column(6), None);
    }

    #[test]
    fn tab_parse_round_trips_storage_names() {
        for tab in TabKind::ALL {
            assert_eq!(TabKind::parse(tab.as_str()), Some(tab));
        }
        assert_eq!(TabKind::parse("dashboard"), None);
    }

    #[test]
    fn only_reference_tabs_map_to_lookup_kinds() {
        assert_eq!(TabKind::Main.lookup_kind(), None);
        assert_eq!(TabKind::Print.lookup_kind(), None);
        assert_eq!(
            TabKind::Places.lookup_kind(),
            Some(LookupKind::Places)
        );
        assert_eq!(LookupKind::Persons.table(), "persons");
    }

    #[test]
    fn sort_direction_flips() {
        assert_eq!(SortDirection::Asc.flipped(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.sql(), "DESC");
    }
}
