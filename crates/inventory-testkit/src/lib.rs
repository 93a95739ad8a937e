// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use inventory_app::LookupKind;
use std::path::PathBuf;

const ITEM_TYPES: [&str; 10] = [
    "Chair",
    "Desk",
    "Cabinet",
    "Monitor",
    "Laptop",
    "Printer",
    "Projector",
    "Phone",
    "Shelf",
    "Whiteboard",
];

const PLACES: [&str; 8] = [
    "Reception",
    "Room 101",
    "Room 102",
    "Room 204",
    "Conference hall",
    "Laboratory",
    "Storage",
    "Server room",
];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const BRANDS: [&str; 10] = [
    "Acme", "Northwind", "Contoso", "Globex", "Initech", "Umbrella", "Vandelay", "Hooli",
    "Stark", "Wayne",
];

const NOTE_WORDS: [&str; 16] = [
    "scratched",
    "left",
    "corner",
    "spare",
    "cable",
    "missing",
    "checked",
    "label",
    "replaced",
    "battery",
    "loaned",
    "returned",
    "warranty",
    "until",
    "spring",
    "repaired",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeItem {
    pub type_name: String,
    pub name: String,
    pub inventory_number: String,
    pub place_name: String,
    pub active: bool,
    pub note: String,
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator of plausible inventory fixtures.
#[derive(Debug, Clone)]
pub struct InventoryFaker {
    rng: DeterministicRng,
    seed: u64,
    next_number: u32,
}

impl InventoryFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
            next_number: 1000 + (normalized % 9000) as u32,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn person_name(&mut self) -> String {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        format!("{first} {last}")
    }

    pub fn lookup_name(&mut self, kind: LookupKind) -> String {
        match kind {
            LookupKind::ItemTypes => self.pick(&ITEM_TYPES).to_owned(),
            LookupKind::Places => self.pick(&PLACES).to_owned(),
            LookupKind::Persons => self.person_name(),
        }
    }

    /// Inventory numbers are unique per faker instance.
    pub fn inventory_number(&mut self) -> String {
        let number = self.next_number;
        self.next_number += 1;
        format!("INV-{number:05}")
    }

    pub fn item(&mut self) -> FakeItem {
        let type_name = self.pick(&ITEM_TYPES).to_owned();
        let place_name = self.pick(&PLACES).to_owned();
        self.item_in(&type_name, &place_name)
    }

    pub fn item_in(&mut self, type_name: &str, place_name: &str) -> FakeItem {
        let brand = self.pick(&BRANDS);
        let model = 100 + self.rng.int_n(900);
        let active = self.rng.int_n(5) != 0;
        let note = if self.rng.int_n(3) == 0 {
            self.sentence(2, 5)
        } else {
            String::new()
        };
        FakeItem {
            type_name: type_name.to_owned(),
            name: format!("{brand} {type_name} {model}"),
            inventory_number: self.inventory_number(),
            place_name: place_name.to_owned(),
            active,
            note,
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let span = max_words.saturating_sub(min_words) + 1;
        let count = min_words + self.rng.int_n(span);
        let words = (0..count)
            .map(|_| self.pick(&NOTE_WORDS))
            .collect::<Vec<_>>()
            .join(" ");
        let mut chars = words.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("inventory.sqlite");
    Ok((dir, db_path))
}

#[cfg(test)]
mod tests {
    use super::{ITEM_TYPES, InventoryFaker, PLACES, temp_db_path};
    use inventory_app::LookupKind;
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_yields_same_items() {
        let mut left = InventoryFaker::new(42);
        let mut right = InventoryFaker::new(42);
        assert_eq!(left.item(), right.item());
        assert_eq!(left.person_name(), right.person_name());
    }

    #[test]
    fn item_in_uses_requested_lookups() {
        let mut faker = InventoryFaker::new(3);
        let item = faker.item_in("Desk", "Storage");
        assert_eq!(item.type_name, "Desk");
        assert_eq!(item.place_name, "Storage");
        assert!(item.name.contains("Desk"));
        assert!(item.inventory_number.starts_with("INV-"));
    }

    #[test]
    fn inventory_numbers_do_not_repeat() {
        let mut faker = InventoryFaker::new(7);
        let numbers = (0..50)
            .map(|_| faker.inventory_number())
            .collect::<BTreeSet<_>>();
        assert_eq!(numbers.len(), 50);
    }

    #[test]
    fn lookup_names_come_from_fixture_lists() {
        let mut faker = InventoryFaker::new(9);
        let item_type = faker.lookup_name(LookupKind::ItemTypes);
        let place = faker.lookup_name(LookupKind::Places);
        let person = faker.lookup_name(LookupKind::Persons);
        assert!(ITEM_TYPES.contains(&item_type.as_str()));
        assert!(PLACES.contains(&place.as_str()));
        assert!(person.contains(' '));
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(InventoryFaker::new(0).seed(), 1);
    }

    #[test]
    fn temp_db_path_lives_in_temp_dir() -> anyhow::Result<()> {
        let (dir, path) = temp_db_path()?;
        assert!(path.starts_with(dir.path()));
        Ok(())
    }
}
