// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Tabular model contract shared by every view in the application.
//!
//! Each concrete model owns its rows, answers indexed cell lookups, and
//! forwards edits to the store. Views never read the store directly; they
//! subscribe to a model and re-capture a [`TableProjection`] whenever a
//! [`ModelEvent`] arrives.

use std::sync::mpsc::{self, Receiver, Sender};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::{DataResult, LookupKind, SortDirection, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Text(String),
    Reference { id: i64, label: String },
    Flag(bool),
    Timestamp(OffsetDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(value) => value.clone(),
            Self::Reference { label, .. } => label.clone(),
            Self::Flag(true) => "yes".to_owned(),
            Self::Flag(false) => "no".to_owned(),
            Self::Timestamp(value) => format_timestamp(*value),
        }
    }

    pub fn reference_id(&self) -> Option<i64> {
        match self {
            Self::Reference { id, .. } if *id > 0 => Some(*id),
            _ => None,
        }
    }
}

/// How the view should edit a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEditor {
    ReadOnly,
    Text,
    Flag,
    Reference(LookupKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRemoval {
    Removed,
    /// The store refused the delete, usually because other rows reference it.
    Blocked,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    Reset,
    RowsInserted { first: usize, count: usize },
    RowsRemoved { first: usize, count: usize },
    CellChanged { row: usize, column: usize },
}

pub trait TableModel {
    fn title(&self) -> &str;
    fn row_count(&self) -> usize;
    fn column_count(&self) -> usize;
    fn header(&self, column: usize) -> Option<&str>;
    fn cell_value(&self, row: usize, column: usize) -> Option<CellValue>;

    fn cell_editor(&self, _row: usize, _column: usize) -> CellEditor {
        CellEditor::ReadOnly
    }

    fn set_cell_value(&mut self, _row: usize, _column: usize, _value: CellValue) -> DataResult<bool> {
        Ok(false)
    }

    fn insert_row(&mut self) -> DataResult<Option<usize>> {
        Ok(None)
    }

    fn remove_row(&mut self, _row: usize) -> DataResult<RowRemoval> {
        Ok(RowRemoval::Unsupported)
    }

    fn sort_by(&mut self, _column: usize, _direction: SortDirection) -> DataResult<bool> {
        Ok(false)
    }

    fn sort_order(&self) -> Option<SortOrder> {
        None
    }

    fn update(&mut self) -> DataResult<()>;

    fn subscribe(&mut self) -> Receiver<ModelEvent>;
}

/// Lookup lists that translate between row positions and record ids.
pub trait ReferenceList {
    fn kind(&self) -> LookupKind;
    fn len(&self) -> usize;
    fn name_at(&self, row: usize) -> Option<&str>;
    fn id_at(&self, row: usize) -> Option<i64>;
    fn index_of(&self, id: i64) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fan-out of model events to every live subscriber.
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    subscribers: Vec<Sender<ModelEvent>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn notify(&mut self, event: ModelEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableProjection {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub sort: Option<SortOrder>,
}

impl TableProjection {
    pub fn capture(model: &dyn TableModel) -> Self {
        let column_count = model.column_count();
        let columns = (0..column_count)
            .map(|column| model.header(column).unwrap_or_default().to_owned())
            .collect();
        let rows = (0..model.row_count())
            .map(|row| {
                (0..column_count)
                    .map(|column| {
                        model
                            .cell_value(row, column)
                            .map(|value| value.display())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self {
            title: model.title().to_owned(),
            columns,
            rows,
            sort: model.sort_order(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }

    /// Character width of the widest header or cell per column.
    pub fn content_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(column, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(&format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| value.to_string())
}
