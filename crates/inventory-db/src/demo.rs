// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Sample inventory for `--demo`. Same seed, same rows.

pub(crate) const DEMO_ITEM_TYPES: [&str; 8] = [
    "Chair",
    "Desk",
    "Cabinet",
    "Monitor",
    "Laptop",
    "Printer",
    "Phone",
    "Shelf",
];

pub(crate) const DEMO_PLACES: [&str; 6] = [
    "Reception",
    "Room 101",
    "Room 204",
    "Conference hall",
    "Storage",
    "Server room",
];

const FIRST_NAMES: [&str; 8] = [
    "Avery", "Jordan", "Riley", "Morgan", "Casey", "Quinn", "Rowan", "Hayden",
];
const LAST_NAMES: [&str; 8] = [
    "Walker", "Hill", "Evans", "Gray", "Reed", "Turner", "Price", "Brooks",
];
const VENDORS: [&str; 6] = ["Acme", "Northwind", "Contoso", "Globex", "Initech", "Hooli"];
const NOTES: [&str; 5] = [
    "Scratched top",
    "Spare cable in drawer",
    "Loaned out",
    "Battery replaced",
    "Under warranty",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DemoItem {
    pub type_index: usize,
    pub place_index: usize,
    pub name: String,
    pub inventory_number: String,
    pub active: bool,
    pub note: String,
}

/// Splitmix64 stream; good enough to spread sample rows around.
#[derive(Debug, Clone)]
pub(crate) struct DemoData {
    state: u64,
    serial: u32,
}

impl DemoData {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed,
            serial: 1000 + (seed % 9000) as u32,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, list: &[&'a str]) -> &'a str {
        list[self.below(list.len())]
    }

    pub fn person_name(&mut self) -> String {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        format!("{first} {last}")
    }

    pub fn item(&mut self) -> DemoItem {
        let type_index = self.below(DEMO_ITEM_TYPES.len());
        let place_index = self.below(DEMO_PLACES.len());
        let vendor = self.pick(&VENDORS);
        let model = 100 + self.below(900);
        let active = self.below(5) != 0;
        let note = if self.below(3) == 0 {
            self.pick(&NOTES).to_owned()
        } else {
            String::new()
        };
        let serial = self.serial;
        self.serial += 1;
        DemoItem {
            type_index,
            place_index,
            name: format!("{vendor} {} {model}", DEMO_ITEM_TYPES[type_index]),
            inventory_number: format!("INV-{serial:05}"),
            active,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEMO_ITEM_TYPES, DEMO_PLACES, DemoData};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_rows() {
        let mut left = DemoData::new(7);
        let mut right = DemoData::new(7);
        for _ in 0..10 {
            assert_eq!(left.item(), right.item());
        }
        assert_eq!(left.person_name(), right.person_name());
    }

    #[test]
    fn items_stay_within_lists_and_numbers_are_unique() {
        let mut demo = DemoData::new(0);
        let items = (0..200).map(|_| demo.item()).collect::<Vec<_>>();
        assert!(items.iter().all(|item| item.type_index < DEMO_ITEM_TYPES.len()));
        assert!(items.iter().all(|item| item.place_index < DEMO_PLACES.len()));
        let numbers = items
            .iter()
            .map(|item| item.inventory_number.as_str())
            .collect::<BTreeSet<_>>();
        assert_eq!(numbers.len(), items.len());
        assert!(items.iter().any(|item| !item.active));
    }
}
