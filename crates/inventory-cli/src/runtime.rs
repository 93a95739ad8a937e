// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use inventory_app::{
    FilterKind, FilterValue, InventoryViewFilter, LookupKind, LookupSnapshot, TabKind, TableModel,
    TableProjection,
};
use inventory_db::{
    FilterControls, HistoryModel, InventoryModel, PrintableInventoryModel, ReferenceModel, Store,
};
use tracing::info;

/// Owns one model per tab, all borrowing the same store.
pub struct DbRuntime<'a> {
    store: &'a Store,
    inventory: InventoryModel<'a>,
    printable: PrintableInventoryModel<'a>,
    item_types: ReferenceModel<'a>,
    places: ReferenceModel<'a>,
    persons: ReferenceModel<'a>,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, filter: InventoryViewFilter) -> Result<Self> {
        Ok(Self {
            store,
            inventory: InventoryModel::load(store, filter).context("load inventory")?,
            printable: PrintableInventoryModel::load(store, filter)
                .context("load printable inventory")?,
            item_types: ReferenceModel::load(store, LookupKind::ItemTypes)
                .context("load item types")?,
            places: ReferenceModel::load(store, LookupKind::Places).context("load places")?,
            persons: ReferenceModel::load(store, LookupKind::Persons).context("load persons")?,
        })
    }

    fn reference(&mut self, kind: LookupKind) -> &mut ReferenceModel<'a> {
        match kind {
            LookupKind::ItemTypes => &mut self.item_types,
            LookupKind::Places => &mut self.places,
            LookupKind::Persons => &mut self.persons,
        }
    }
}

impl inventory_tui::AppRuntime for DbRuntime<'_> {
    fn model(&mut self, tab: TabKind) -> &mut dyn TableModel {
        match tab {
            TabKind::Main => &mut self.inventory,
            TabKind::Print => &mut self.printable,
            TabKind::ItemTypes => &mut self.item_types,
            TabKind::Places => &mut self.places,
            TabKind::Persons => &mut self.persons,
        }
    }

    fn filter(&self) -> InventoryViewFilter {
        self.inventory.filter()
    }

    fn apply_filter(&mut self, filter: InventoryViewFilter) -> Result<()> {
        self.inventory.set_filter(filter)?;
        self.printable.set_filter(filter)?;
        info!(?filter, "inventory filter set");
        Ok(())
    }

    fn switch_filter(&mut self, kind: FilterKind, on: bool) -> Result<()> {
        match kind {
            FilterKind::ItemType => {
                self.inventory.switch_item_type_filter(on)?;
                self.printable.switch_item_type_filter(on)?;
            }
            FilterKind::Place => {
                self.inventory.switch_place_filter(on)?;
                self.printable.switch_place_filter(on)?;
            }
            FilterKind::Activity => {
                self.inventory.switch_written_off_filter(on)?;
                self.printable.switch_written_off_filter(on)?;
            }
        }
        Ok(())
    }

    fn set_filter_value(&mut self, value: FilterValue) -> Result<()> {
        self.inventory.set_filter_value(value)?;
        self.printable.set_filter_value(value)?;
        info!(?value, "inventory filter value set");
        Ok(())
    }

    /// Refreshes the list first so the snapshot sees rows added on other tabs.
    fn lookup_snapshot(&mut self, kind: LookupKind) -> Result<LookupSnapshot> {
        let list = self.reference(kind);
        list.update_list()
            .with_context(|| format!("load {}", kind.title()))?;
        Ok(LookupSnapshot::capture(list))
    }

    fn add_multiline(&mut self, tab: TabKind, lines: &[String]) -> Result<usize> {
        let kind = tab
            .lookup_kind()
            .ok_or_else(|| anyhow!("the {} tab has no name list", tab.label()))?;
        let added = self.reference(kind).add_multiline(lines)?;
        Ok(added)
    }

    fn history(&mut self, row: usize) -> Result<Option<TableProjection>> {
        let Some(item_id) = self.inventory.id_at(row) else {
            return Ok(None);
        };
        let history = HistoryModel::load(self.store, item_id)
            .with_context(|| format!("load history of item {}", item_id.get()))?;
        let mut projection = TableProjection::capture(&history);
        if let Some(item) = self.inventory.item(row) {
            projection.title = format!("history: {}", item.name);
        }
        Ok(Some(projection))
    }
}

/// Model behind a tab for headless export, loaded with `filter`.
pub fn export_model<'a>(
    store: &'a Store,
    tab: TabKind,
    filter: InventoryViewFilter,
) -> Result<Box<dyn TableModel + 'a>> {
    let model: Box<dyn TableModel + 'a> = match tab {
        TabKind::Main => Box::new(InventoryModel::load(store, filter)?),
        TabKind::Print => Box::new(PrintableInventoryModel::load(store, filter)?),
        TabKind::ItemTypes | TabKind::Places | TabKind::Persons => {
            let kind = tab
                .lookup_kind()
                .ok_or_else(|| anyhow!("the {} tab has no name list", tab.label()))?;
            Box::new(ReferenceModel::load(store, kind)?)
        }
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::{DbRuntime, export_model};
    use anyhow::Result;
    use inventory_app::{
        CellValue, FilterKind, FilterValue, InventoryViewFilter, ItemTypeId, LookupKind, PlaceId, ReferenceList,
        RowRemoval, TabKind, write_csv,
    };
    use inventory_db::{NewItem, Store};
    use inventory_tui::AppRuntime;

    fn seeded_store() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let chair = ItemTypeId::checked(store.insert_lookup(LookupKind::ItemTypes, "Chair")?);
        let lab = PlaceId::checked(store.insert_lookup(LookupKind::Places, "Lab")?);
        store.insert_lookup(LookupKind::Places, "Office")?;
        store.insert_item(&NewItem {
            item_type_id: chair,
            name: "Stool".to_owned(),
            inventory_number: "INV-1".to_owned(),
            place_id: lab,
            active: true,
            note: String::new(),
        })?;
        store.insert_item(&NewItem {
            item_type_id: chair,
            name: "Bench".to_owned(),
            inventory_number: "INV-2".to_owned(),
            place_id: None,
            active: false,
            note: String::new(),
        })?;
        Ok(store)
    }

    #[test]
    fn filter_changes_reach_both_item_models() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store, InventoryViewFilter::default())?;
        assert_eq!(runtime.model(TabKind::Main).row_count(), 2);

        runtime.switch_filter(FilterKind::Activity, true)?;
        assert_eq!(runtime.model(TabKind::Main).row_count(), 1);
        assert_eq!(runtime.model(TabKind::Print).row_count(), 1);
        assert!(runtime.filter().use_activity);

        runtime.apply_filter(InventoryViewFilter {
            use_place: true,
            place_id: Some(PlaceId::new(999)),
            ..InventoryViewFilter::default()
        })?;
        assert_eq!(runtime.model(TabKind::Main).row_count(), 0);
        assert_eq!(runtime.model(TabKind::Print).row_count(), 0);
        Ok(())
    }

    #[test]
    fn value_changes_wait_for_the_switch() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store, InventoryViewFilter::default())?;
        let office = runtime
            .lookup_snapshot(LookupKind::Places)?
            .names()
            .position(|name| name == "Office")
            .expect("office row");
        let office = runtime
            .lookup_snapshot(LookupKind::Places)?
            .id_at(office)
            .and_then(PlaceId::checked);

        runtime.set_filter_value(FilterValue::Place(office))?;
        assert_eq!(runtime.model(TabKind::Main).row_count(), 2);
        assert_eq!(runtime.filter().place_id, office);

        runtime.switch_filter(FilterKind::Place, true)?;
        assert_eq!(runtime.model(TabKind::Main).row_count(), 0);
        assert_eq!(runtime.model(TabKind::Print).row_count(), 0);

        runtime.set_filter_value(FilterValue::WrittenOff(true))?;
        runtime.switch_filter(FilterKind::Place, false)?;
        runtime.switch_filter(FilterKind::Activity, true)?;
        assert_eq!(runtime.model(TabKind::Print).row_count(), 1);
        assert_eq!(runtime.filter().place_id, office);
        Ok(())
    }

    #[test]
    fn multiline_lands_in_matching_list() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store, InventoryViewFilter::default())?;
        let added = runtime.add_multiline(
            TabKind::Persons,
            &["Riley".to_owned(), " ".to_owned(), "Quinn".to_owned()],
        )?;
        assert_eq!(added, 2);
        assert_eq!(runtime.model(TabKind::Persons).row_count(), 2);

        let error = runtime
            .add_multiline(TabKind::Main, &["x".to_owned()])
            .expect_err("main tab has no name list");
        assert!(error.to_string().contains("no name list"));
        Ok(())
    }

    #[test]
    fn lookup_snapshot_sees_fresh_rows() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store, InventoryViewFilter::default())?;
        store.insert_lookup(LookupKind::Places, "Attic")?;
        let places = runtime.lookup_snapshot(LookupKind::Places)?;
        assert_eq!(places.len(), 3);
        assert!(places.names().any(|name| name == "Attic"));
        Ok(())
    }

    #[test]
    fn history_follows_item_edits() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store, InventoryViewFilter::default())?;
        let row = (0..runtime.model(TabKind::Main).row_count())
            .find(|row| {
                runtime
                    .model(TabKind::Main)
                    .cell_value(*row, 1)
                    .is_some_and(|value| value.display() == "Stool")
            })
            .expect("stool row");
        runtime.model(TabKind::Main).set_cell_value(
            row,
            1,
            CellValue::text("Bar stool"),
        )?;

        let row = (0..runtime.model(TabKind::Main).row_count())
            .find(|row| {
                runtime
                    .model(TabKind::Main)
                    .cell_value(*row, 1)
                    .is_some_and(|value| value.display() == "Bar stool")
            })
            .expect("renamed row");
        let history = runtime.history(row)?.expect("history for existing row");
        assert_eq!(history.title, "history: Bar stool");
        assert_eq!(history.row_count(), 1);
        assert_eq!(history.cell(0, 2), Some("Stool"));
        assert_eq!(history.cell(0, 3), Some("Bar stool"));

        assert!(runtime.history(99)?.is_none());
        Ok(())
    }

    #[test]
    fn referenced_place_removal_is_blocked() -> Result<()> {
        let store = seeded_store()?;
        let mut runtime = DbRuntime::new(&store, InventoryViewFilter::default())?;
        let places = runtime.lookup_snapshot(LookupKind::Places)?;
        let lab_row = places
            .names()
            .position(|name| name == "Lab")
            .expect("lab row");
        assert_eq!(
            runtime.model(TabKind::Places).remove_row(lab_row)?,
            RowRemoval::Blocked
        );
        Ok(())
    }

    #[test]
    fn export_model_covers_every_tab() -> Result<()> {
        let store = seeded_store()?;
        for tab in TabKind::ALL {
            let model = export_model(&store, tab, InventoryViewFilter::default())?;
            let mut out = Vec::new();
            let rows = write_csv(model.as_ref(), &mut out)?;
            assert_eq!(rows, model.row_count(), "tab {}", tab.as_str());
        }
        Ok(())
    }
}
