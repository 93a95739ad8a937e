// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use inventory_app::{
    AppCommand, AppEvent, AppState, CellEditor, CellValue, ExportError, FilterDialogState,
    FilterKind, FilterValue, InventoryViewFilter, ItemTypeId, LookupKind, LookupSnapshot,
    ModelEvent, PlaceId, ReferenceList, RowRemoval, SortDirection, TabKind, TableModel,
    TableProjection, ToolbarAction, export_csv_file, next_lookup_id,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const APP_TITLE: &str = "inventory";
const HALF_PAGE_ROWS: isize = 10;
const FULL_PAGE_ROWS: isize = 20;
const MAX_COLUMN_WIDTH: usize = 48;
const SORT_MARK_ASC: &str = "▲";
const SORT_MARK_DESC: &str = "▼";
const NONE_OPTION: &str = "(none)";

pub const REMOVE_BLOCKED_MESSAGE: &str =
    "Cannot remove record. Probably, there are items that are using it.";
pub const MULTILINE_FAILED_MESSAGE: &str = "Adding of lines failed!";

/// Everything the controller needs from the data layer. Models stay owned by
/// the runtime; the controller borrows one at a time.
pub trait AppRuntime {
    fn model(&mut self, tab: TabKind) -> &mut dyn TableModel;
    fn filter(&self) -> InventoryViewFilter;
    fn apply_filter(&mut self, filter: InventoryViewFilter) -> Result<()>;
    fn switch_filter(&mut self, kind: FilterKind, on: bool) -> Result<()>;
    /// Changes one group's value; its switch stays as it is.
    fn set_filter_value(&mut self, value: FilterValue) -> Result<()>;
    fn lookup_snapshot(&mut self, kind: LookupKind) -> Result<LookupSnapshot>;
    fn add_multiline(&mut self, tab: TabKind, lines: &[String]) -> Result<usize>;
    /// Change log of the item shown at `row` of the main tab.
    fn history(&mut self, row: usize) -> Result<Option<TableProjection>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

/// Terminal geometry at exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitSummary {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterDialogUi {
    dialog: FilterDialogState,
    item_types: LookupSnapshot,
    places: LookupSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReferencePickerUi {
    row: usize,
    column: usize,
    options: LookupSnapshot,
    // 0 is the "(none)" entry; list rows start at 1.
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CellEditorUi {
    row: usize,
    column: usize,
    header: String,
    input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Message {
        kind: MessageKind,
        title: String,
        body: String,
    },
    History {
        projection: TableProjection,
        scroll: usize,
    },
    Multiline {
        tab: TabKind,
        text: String,
    },
    CsvPath {
        input: String,
    },
    Filter(FilterDialogUi),
    ReferencePicker(ReferencePickerUi),
    CellEditor(CellEditorUi),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct FilterBar {
    filter: InventoryViewFilter,
    item_type: String,
    place: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct TableCursor {
    row: usize,
    column: usize,
}

#[derive(Debug, Default)]
struct ViewData {
    projection: TableProjection,
    column_widths: Vec<u16>,
    cursor: TableCursor,
    model_events: Option<Receiver<ModelEvent>>,
    filter_bar: FilterBar,
    overlay: Option<Overlay>,
    help_visible: bool,
    status_token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    MoveColumn(isize),
    JumpFirstRow,
    JumpLastRow,
    JumpFirstColumn,
    JumpLastColumn,
    CycleSort,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<ExitSummary> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = bind_active_tab(state, runtime, &mut view_data) {
        emit_status(
            state,
            &mut view_data,
            &internal_tx,
            format!("load failed: {error:#}"),
        );
    }
    refresh_filter_bar(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);
        sync_model_events(state, runtime, &mut view_data);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    let summary = terminal
        .size()
        .map(|size| ExitSummary {
            width: size.width,
            height: size.height,
        })
        .unwrap_or_default();

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result.map(|()| summary)
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    arm_status_clear(view_data, internal_tx);
}

fn arm_status_clear(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn show_message(
    view_data: &mut ViewData,
    kind: MessageKind,
    title: impl Into<String>,
    body: impl Into<String>,
) {
    view_data.overlay = Some(Overlay::Message {
        kind,
        title: title.into(),
        body: body.into(),
    });
}

fn show_error(view_data: &mut ViewData, title: &str, error: &anyhow::Error) {
    warn!(error = format!("{error:#}"), "{title}");
    show_message(view_data, MessageKind::Error, title, format!("{error:#}"));
}

/// Points the view at the active tab's model: refresh it, subscribe to its
/// changes and reset the cursor.
fn bind_active_tab<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    let tab = state.active_tab;
    view_data.model_events = None;
    view_data.cursor = TableCursor::default();

    let model = runtime.model(tab);
    model
        .update()
        .with_context(|| format!("load {} tab", tab.label()))?;
    view_data.model_events = Some(model.subscribe());
    view_data.projection = TableProjection::capture(model);
    view_data.column_widths = column_widths(&view_data.projection);
    debug!(
        tab = tab.as_str(),
        rows = view_data.projection.row_count(),
        "bound tab"
    );
    Ok(())
}

/// Re-captures the bound model if it reported any change.
fn sync_model_events<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> bool {
    let Some(rx) = &view_data.model_events else {
        return false;
    };
    let mut changed = false;
    while let Ok(event) = rx.try_recv() {
        debug!(?event, "model event");
        changed = true;
    }
    if changed {
        recapture(state, runtime, view_data);
    }
    changed
}

fn recapture<R: AppRuntime>(state: &AppState, runtime: &mut R, view_data: &mut ViewData) {
    let model = runtime.model(state.active_tab);
    view_data.projection = TableProjection::capture(model);
    view_data.column_widths = column_widths(&view_data.projection);
    clamp_table_cursor(view_data);
}

fn refresh_filter_bar<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let filter = runtime.filter();
    let names = runtime
        .lookup_snapshot(LookupKind::ItemTypes)
        .and_then(|types| Ok((types, runtime.lookup_snapshot(LookupKind::Places)?)));
    match names {
        Ok((types, places)) => {
            view_data.filter_bar = FilterBar {
                filter,
                item_type: lookup_label(&types, filter.item_type_id.map(|id| id.get())),
                place: lookup_label(&places, filter.place_id.map(|id| id.get())),
            };
        }
        Err(error) => {
            view_data.filter_bar.filter = filter;
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("filter names unavailable: {error:#}"),
            );
        }
    }
}

fn lookup_label(list: &LookupSnapshot, id: Option<i64>) -> String {
    id.and_then(|id| list.index_of(id))
        .and_then(|row| list.name_at(row))
        .unwrap_or(NONE_OPTION)
        .to_owned()
}

fn column_widths(projection: &TableProjection) -> Vec<u16> {
    projection
        .content_widths()
        .into_iter()
        .map(|width| width.clamp(1, MAX_COLUMN_WIDTH) as u16)
        .collect()
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.overlay.is_some() {
        handle_overlay_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if let Some(command) = table_command_for_key(key) {
        apply_table_command(state, runtime, view_data, internal_tx, command);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Char('f'), KeyModifiers::NONE) | (KeyCode::Tab, _) => {
            switch_tab(state, runtime, view_data, internal_tx, AppCommand::NextTab);
        }
        (KeyCode::Char('b'), KeyModifiers::NONE) | (KeyCode::BackTab, _) => {
            switch_tab(state, runtime, view_data, internal_tx, AppCommand::PrevTab);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => add_row(state, runtime, view_data, internal_tx),
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            remove_row(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('m'), KeyModifiers::NONE) => {
            if require_action(state, view_data, internal_tx, ToolbarAction::AddMultiline) {
                view_data.overlay = Some(Overlay::Multiline {
                    tab: state.active_tab,
                    text: String::new(),
                });
            }
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            if require_action(state, view_data, internal_tx, ToolbarAction::PrintCsv) {
                view_data.overlay = Some(Overlay::CsvPath {
                    input: format!("{}.csv", state.active_tab.as_str()),
                });
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            open_history(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('v'), KeyModifiers::NONE) => {
            if require_action(state, view_data, internal_tx, ToolbarAction::HideFilter) {
                let events = state.dispatch(AppCommand::ToggleFilterHidden);
                if events
                    .iter()
                    .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
                {
                    arm_status_clear(view_data, internal_tx);
                }
            }
        }
        (KeyCode::Char('F'), _) => open_filter_dialog(state, runtime, view_data, internal_tx),
        (KeyCode::Char(digit @ '1'..='3'), KeyModifiers::NONE) => {
            let index = digit as usize - '1' as usize;
            toggle_filter_group(
                state,
                runtime,
                view_data,
                internal_tx,
                FilterKind::ALL[index],
            );
        }
        (KeyCode::Char('i'), KeyModifiers::NONE) => {
            step_filter_value(state, runtime, view_data, internal_tx, FilterKind::ItemType);
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) => {
            step_filter_value(state, runtime, view_data, internal_tx, FilterKind::Place);
        }
        (KeyCode::Char('w'), KeyModifiers::NONE) => {
            step_filter_value(state, runtime, view_data, internal_tx, FilterKind::Activity);
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) | (KeyCode::Enter, _) => {
            begin_cell_edit(state, runtime, view_data, internal_tx);
        }
        _ => {}
    }
    false
}

fn require_action(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: ToolbarAction,
) -> bool {
    if state.action_enabled(action) {
        return true;
    }
    let message = format!(
        "{} is not available on the {} tab",
        action.label(),
        state.active_tab.label()
    );
    emit_status(state, view_data, internal_tx, message);
    false
}

fn switch_tab<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if !events
        .iter()
        .any(|event| matches!(event, AppEvent::TabChanged(_)))
    {
        return;
    }
    if let Err(error) = bind_active_tab(state, runtime, view_data) {
        show_error(view_data, "load failed", &error);
    }
    if state.filter_visible() {
        refresh_filter_bar(state, runtime, view_data, internal_tx);
    }
}

fn add_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if !require_action(state, view_data, internal_tx, ToolbarAction::Add) {
        return;
    }
    let result = runtime.model(state.active_tab).insert_row();
    match result {
        Ok(Some(row)) => {
            recapture(state, runtime, view_data);
            view_data.cursor.row = row;
            clamp_table_cursor(view_data);
            emit_status(state, view_data, internal_tx, "row added");
        }
        Ok(None) => emit_status(state, view_data, internal_tx, "add is not supported here"),
        Err(error) => show_error(view_data, "add failed", &anyhow::Error::from(error)),
    }
}

fn remove_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if !require_action(state, view_data, internal_tx, ToolbarAction::Remove) {
        return;
    }
    if view_data.projection.row_count() == 0 {
        emit_status(state, view_data, internal_tx, "nothing to remove");
        return;
    }

    let tab = state.active_tab;
    let row = view_data.cursor.row;
    let result = runtime.model(tab).remove_row(row);
    match result {
        Ok(RowRemoval::Removed) => {
            recapture(state, runtime, view_data);
            emit_status(state, view_data, internal_tx, "row removed");
        }
        Ok(RowRemoval::Blocked) if tab.is_lookup() => {
            show_message(view_data, MessageKind::Info, "remove", REMOVE_BLOCKED_MESSAGE);
        }
        Ok(RowRemoval::Blocked) => emit_status(state, view_data, internal_tx, "remove failed"),
        Ok(RowRemoval::Unsupported) => {
            emit_status(state, view_data, internal_tx, "remove is not supported here");
        }
        Err(error) => show_error(view_data, "remove failed", &anyhow::Error::from(error)),
    }
}

fn open_history<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if !require_action(state, view_data, internal_tx, ToolbarAction::ShowHistory) {
        return;
    }
    if view_data.projection.row_count() == 0 {
        emit_status(state, view_data, internal_tx, "no item selected");
        return;
    }
    match runtime.history(view_data.cursor.row) {
        Ok(Some(projection)) => {
            view_data.overlay = Some(Overlay::History {
                projection,
                scroll: 0,
            });
        }
        Ok(None) => emit_status(state, view_data, internal_tx, "no item selected"),
        Err(error) => show_error(view_data, "history failed", &error),
    }
}

fn open_filter_dialog<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if !require_action(state, view_data, internal_tx, ToolbarAction::HideFilter) {
        return;
    }
    let item_types = match runtime.lookup_snapshot(LookupKind::ItemTypes) {
        Ok(list) => list,
        Err(error) => {
            show_error(view_data, "filter", &error);
            return;
        }
    };
    let places = match runtime.lookup_snapshot(LookupKind::Places) {
        Ok(list) => list,
        Err(error) => {
            show_error(view_data, "filter", &error);
            return;
        }
    };

    let mut dialog = FilterDialogState::new(&item_types, &places);
    dialog.set_filter(&runtime.filter(), &item_types, &places);
    view_data.overlay = Some(Overlay::Filter(FilterDialogUi {
        dialog,
        item_types,
        places,
    }));
}

fn toggle_filter_group<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FilterKind,
) {
    if !state.filter_visible() {
        emit_status(state, view_data, internal_tx, "filter bar is not shown");
        return;
    }
    let on = !runtime.filter().is_enabled(kind);
    match runtime.switch_filter(kind, on) {
        Ok(()) => {
            sync_model_events(state, runtime, view_data);
            refresh_filter_bar(state, runtime, view_data, internal_tx);
            let label = if on { "on" } else { "off" };
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{} filter {label}", kind.label()),
            );
        }
        Err(error) => show_error(view_data, "filter failed", &error),
    }
}

/// Moves a group to its next value without touching its switch. Lookup
/// groups walk the list and pass through "(none)"; status flips.
fn step_filter_value<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FilterKind,
) {
    if !state.filter_visible() {
        emit_status(state, view_data, internal_tx, "filter bar is not shown");
        return;
    }
    let filter = runtime.filter();
    let value = match kind {
        FilterKind::ItemType => runtime.lookup_snapshot(LookupKind::ItemTypes).map(|list| {
            let next = next_lookup_id(&list, filter.item_type_id.map(ItemTypeId::get));
            FilterValue::ItemType(next.and_then(ItemTypeId::checked))
        }),
        FilterKind::Place => runtime.lookup_snapshot(LookupKind::Places).map(|list| {
            let next = next_lookup_id(&list, filter.place_id.map(PlaceId::get));
            FilterValue::Place(next.and_then(PlaceId::checked))
        }),
        FilterKind::Activity => Ok(FilterValue::WrittenOff(!filter.written_off())),
    };
    match value.and_then(|value| runtime.set_filter_value(value)) {
        Ok(()) => {
            sync_model_events(state, runtime, view_data);
            refresh_filter_bar(state, runtime, view_data, internal_tx);
            let bar = &view_data.filter_bar;
            let shown = match kind {
                FilterKind::ItemType => bar.item_type.clone(),
                FilterKind::Place => bar.place.clone(),
                FilterKind::Activity => status_label(&bar.filter).to_owned(),
            };
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{} filter: {shown}", kind.label()),
            );
        }
        Err(error) => show_error(view_data, "filter failed", &error),
    }
}

fn begin_cell_edit<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if view_data.projection.row_count() == 0 {
        emit_status(state, view_data, internal_tx, "nothing to edit");
        return;
    }
    let TableCursor { row, column } = view_data.cursor;
    let model = runtime.model(state.active_tab);
    let editor = model.cell_editor(row, column);
    let current = model.cell_value(row, column);

    match editor {
        CellEditor::ReadOnly => {
            emit_status(state, view_data, internal_tx, "column is read-only");
        }
        CellEditor::Text => {
            let header = view_data
                .projection
                .columns
                .get(column)
                .cloned()
                .unwrap_or_default();
            let input = current.map(|value| value.display()).unwrap_or_default();
            view_data.overlay = Some(Overlay::CellEditor(CellEditorUi {
                row,
                column,
                header,
                input,
            }));
        }
        CellEditor::Flag => {
            let next = !matches!(current, Some(CellValue::Flag(true)));
            commit_cell(
                state,
                runtime,
                view_data,
                internal_tx,
                row,
                column,
                CellValue::Flag(next),
            );
        }
        CellEditor::Reference(kind) => {
            let options = match runtime.lookup_snapshot(kind) {
                Ok(options) => options,
                Err(error) => {
                    show_error(view_data, "edit failed", &error);
                    return;
                }
            };
            let cursor = current
                .and_then(|value| value.reference_id())
                .and_then(|id| options.index_of(id))
                .map_or(0, |index| index + 1);
            view_data.overlay = Some(Overlay::ReferencePicker(ReferencePickerUi {
                row,
                column,
                options,
                cursor,
            }));
        }
    }
}

fn commit_cell<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    row: usize,
    column: usize,
    value: CellValue,
) {
    let result = runtime
        .model(state.active_tab)
        .set_cell_value(row, column, value);
    match result {
        Ok(true) => {
            recapture(state, runtime, view_data);
            emit_status(state, view_data, internal_tx, "saved");
        }
        Ok(false) => emit_status(state, view_data, internal_tx, "cell is not editable"),
        Err(error) => show_error(view_data, "edit failed", &anyhow::Error::from(error)),
    }
}

fn handle_overlay_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(overlay) = view_data.overlay.take() else {
        return;
    };

    view_data.overlay = match overlay {
        Overlay::Message { .. } if is_dismiss_key(key) => None,
        message @ Overlay::Message { .. } => Some(message),
        Overlay::History { .. } if is_dismiss_key(key) => None,
        Overlay::History { projection, scroll } => {
            let last = projection.row_count().saturating_sub(1);
            let scroll = match key.code {
                KeyCode::Char('j') | KeyCode::Down => (scroll + 1).min(last),
                KeyCode::Char('k') | KeyCode::Up => scroll.saturating_sub(1),
                KeyCode::Char('g') => 0,
                KeyCode::Char('G') => last,
                _ => scroll,
            };
            Some(Overlay::History { projection, scroll })
        }
        Overlay::Multiline { tab, mut text } => match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => None,
            (KeyCode::Char('s'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
                submit_multiline(state, runtime, view_data, internal_tx, tab, &text);
                view_data.overlay.take()
            }
            (KeyCode::Enter, _) => {
                text.push('\n');
                Some(Overlay::Multiline { tab, text })
            }
            (KeyCode::Backspace, _) => {
                text.pop();
                Some(Overlay::Multiline { tab, text })
            }
            (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
                text.push(ch);
                Some(Overlay::Multiline { tab, text })
            }
            _ => Some(Overlay::Multiline { tab, text }),
        },
        Overlay::CsvPath { mut input } => match key.code {
            KeyCode::Esc => None,
            KeyCode::Enter => {
                export_active_tab(state, runtime, view_data, internal_tx, input.trim());
                view_data.overlay.take()
            }
            KeyCode::Backspace => {
                input.pop();
                Some(Overlay::CsvPath { input })
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                input.push(ch);
                Some(Overlay::CsvPath { input })
            }
            _ => Some(Overlay::CsvPath { input }),
        },
        Overlay::Filter(mut ui) => match key.code {
            KeyCode::Esc => None,
            KeyCode::Enter => {
                let filter = ui.dialog.filter(&ui.item_types, &ui.places);
                apply_filter(state, runtime, view_data, internal_tx, filter);
                view_data.overlay.take()
            }
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => {
                ui.dialog.focus_next();
                Some(Overlay::Filter(ui))
            }
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => {
                ui.dialog.focus_prev();
                Some(Overlay::Filter(ui))
            }
            KeyCode::Char(' ') => {
                ui.dialog.toggle_focused();
                Some(Overlay::Filter(ui))
            }
            KeyCode::Char('j') | KeyCode::Down => {
                ui.dialog.select_next();
                Some(Overlay::Filter(ui))
            }
            KeyCode::Char('k') | KeyCode::Up => {
                ui.dialog.select_prev();
                Some(Overlay::Filter(ui))
            }
            _ => Some(Overlay::Filter(ui)),
        },
        Overlay::ReferencePicker(mut ui) => match key.code {
            KeyCode::Esc => None,
            KeyCode::Enter => {
                let value = picker_value(&ui);
                commit_cell(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    ui.row,
                    ui.column,
                    value,
                );
                view_data.overlay.take()
            }
            KeyCode::Char('j') | KeyCode::Down => {
                ui.cursor = (ui.cursor + 1).min(ui.options.len());
                Some(Overlay::ReferencePicker(ui))
            }
            KeyCode::Char('k') | KeyCode::Up => {
                ui.cursor = ui.cursor.saturating_sub(1);
                Some(Overlay::ReferencePicker(ui))
            }
            _ => Some(Overlay::ReferencePicker(ui)),
        },
        Overlay::CellEditor(mut ui) => match key.code {
            KeyCode::Esc => None,
            KeyCode::Enter => {
                let value = CellValue::Text(ui.input);
                commit_cell(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    ui.row,
                    ui.column,
                    value,
                );
                view_data.overlay.take()
            }
            KeyCode::Backspace => {
                ui.input.pop();
                Some(Overlay::CellEditor(ui))
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                ui.input.push(ch);
                Some(Overlay::CellEditor(ui))
            }
            _ => Some(Overlay::CellEditor(ui)),
        },
    };
}

fn is_dismiss_key(key: KeyEvent) -> bool {
    matches!(
        key.code,
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')
    )
}

fn picker_value(ui: &ReferencePickerUi) -> CellValue {
    let Some(row) = ui.cursor.checked_sub(1) else {
        return CellValue::Empty;
    };
    match (ui.options.id_at(row), ui.options.name_at(row)) {
        (Some(id), Some(name)) => CellValue::Reference {
            id,
            label: name.to_owned(),
        },
        _ => CellValue::Empty,
    }
}

fn submit_multiline<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    tab: TabKind,
    text: &str,
) {
    let lines = text.split('\n').map(str::to_owned).collect::<Vec<_>>();
    match runtime.add_multiline(tab, &lines) {
        Ok(added) => {
            sync_model_events(state, runtime, view_data);
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("added {added} lines"),
            );
        }
        Err(error) => {
            warn!(error = format!("{error:#}"), "multiline add failed");
            show_message(
                view_data,
                MessageKind::Error,
                "add lines",
                format!("{MULTILINE_FAILED_MESSAGE}\n{error:#}"),
            );
        }
    }
}

fn export_active_tab<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    path: &str,
) {
    if path.is_empty() {
        emit_status(state, view_data, internal_tx, "export canceled: no file name");
        return;
    }
    let result = export_csv_file(runtime.model(state.active_tab), Path::new(path));
    match result {
        Ok(rows) => emit_status(
            state,
            view_data,
            internal_tx,
            format!("exported {rows} rows to {path}"),
        ),
        Err(error @ ExportError::Open { .. }) => {
            show_message(view_data, MessageKind::Error, "export", error.to_string());
        }
        Err(error) => show_error(view_data, "export failed", &anyhow::Error::from(error)),
    }
}

fn apply_filter<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    filter: InventoryViewFilter,
) {
    match runtime.apply_filter(filter) {
        Ok(()) => {
            info!(?filter, "filter applied");
            sync_model_events(state, runtime, view_data);
            refresh_filter_bar(state, runtime, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, "filter applied");
        }
        Err(error) => show_error(view_data, "filter failed", &error),
    }
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(TableCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(TableCommand::MoveColumn(1)),
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveRow(HALF_PAGE_ROWS))
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveRow(-HALF_PAGE_ROWS))
        }
        (KeyCode::PageDown, _) => Some(TableCommand::MoveRow(FULL_PAGE_ROWS)),
        (KeyCode::PageUp, _) => Some(TableCommand::MoveRow(-FULL_PAGE_ROWS)),
        (KeyCode::Char('g'), _) => Some(TableCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) => Some(TableCommand::JumpLastRow),
        (KeyCode::Char('^'), _) => Some(TableCommand::JumpFirstColumn),
        (KeyCode::Char('$'), _) => Some(TableCommand::JumpLastColumn),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(TableCommand::CycleSort),
        _ => None,
    }
}

fn apply_table_command<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: TableCommand,
) {
    match command {
        TableCommand::MoveRow(delta) => move_row(view_data, delta),
        TableCommand::MoveColumn(delta) => move_col(view_data, delta),
        TableCommand::JumpFirstRow => view_data.cursor.row = 0,
        TableCommand::JumpLastRow => {
            view_data.cursor.row = view_data.projection.row_count().saturating_sub(1);
        }
        TableCommand::JumpFirstColumn => view_data.cursor.column = 0,
        TableCommand::JumpLastColumn => {
            view_data.cursor.column = view_data.projection.column_count().saturating_sub(1);
        }
        TableCommand::CycleSort => cycle_sort(state, runtime, view_data, internal_tx),
    }
}

fn cycle_sort<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let column = view_data.cursor.column;
    let model = runtime.model(state.active_tab);
    let direction = match model.sort_order() {
        Some(order) if order.column == column => order.direction.flipped(),
        _ => SortDirection::Asc,
    };
    let result = model.sort_by(column, direction);
    match result {
        Ok(true) => {
            recapture(state, runtime, view_data);
            let header = view_data
                .projection
                .columns
                .get(column)
                .cloned()
                .unwrap_or_default();
            let order = match direction {
                SortDirection::Asc => "ascending",
                SortDirection::Desc => "descending",
            };
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("sorted by {header} {order}"),
            );
        }
        Ok(false) => emit_status(state, view_data, internal_tx, "column cannot be sorted"),
        Err(error) => show_error(view_data, "sort failed", &anyhow::Error::from(error)),
    }
}

fn move_row(view_data: &mut ViewData, delta: isize) {
    let rows = view_data.projection.row_count();
    if rows == 0 {
        view_data.cursor.row = 0;
        return;
    }
    let next = (view_data.cursor.row as isize + delta).clamp(0, rows as isize - 1);
    view_data.cursor.row = next as usize;
}

fn move_col(view_data: &mut ViewData, delta: isize) {
    let columns = view_data.projection.column_count();
    if columns == 0 {
        view_data.cursor.column = 0;
        return;
    }
    let next = (view_data.cursor.column as isize + delta).clamp(0, columns as isize - 1);
    view_data.cursor.column = next as usize;
}

fn clamp_table_cursor(view_data: &mut ViewData) {
    let rows = view_data.projection.row_count();
    let columns = view_data.projection.column_count();
    view_data.cursor.row = view_data.cursor.row.min(rows.saturating_sub(1));
    view_data.cursor.column = view_data.cursor.column.min(columns.saturating_sub(1));
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let filter_height = if state.filter_visible() { 1 } else { 0 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(filter_height),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| tab.label().to_owned())
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title(APP_TITLE).borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    if state.filter_visible() {
        let filter = Paragraph::new(filter_bar_text(&view_data.filter_bar))
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(filter, layout[1]);
    }

    render_table(frame, layout[2], view_data);

    let status_widget = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[3]);

    if let Some(overlay) = &view_data.overlay {
        render_overlay(frame, overlay);
    }

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let projection = &view_data.projection;
    let widths = column_constraints(&view_data.column_widths);

    let header_cells = (0..projection.column_count()).map(|column| {
        Cell::from(header_label(projection, column)).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells);

    let rows = projection.rows.iter().enumerate().map(|(row_index, row)| {
        let selected_row = row_index == view_data.cursor.row;
        let cells = row
            .iter()
            .enumerate()
            .map(|(column_index, text)| {
                let mut style = Style::default();
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && column_index == view_data.cursor.column {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(text.clone()).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let title = format!("{} ({} rows)", projection.title, projection.row_count());
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

/// Fixed widths from content, with the last column taking the remainder.
fn column_constraints(widths: &[u16]) -> Vec<Constraint> {
    let last = widths.len().saturating_sub(1);
    widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            if index == last {
                Constraint::Min(*width)
            } else {
                Constraint::Length(*width)
            }
        })
        .collect()
}

fn header_label(projection: &TableProjection, column: usize) -> String {
    let label = projection
        .columns
        .get(column)
        .cloned()
        .unwrap_or_default();
    match projection.sort {
        Some(order) if order.column == column => {
            let mark = match order.direction {
                SortDirection::Asc => SORT_MARK_ASC,
                SortDirection::Desc => SORT_MARK_DESC,
            };
            format!("{label} {mark}")
        }
        _ => label,
    }
}

fn render_overlay(frame: &mut ratatui::Frame<'_>, overlay: &Overlay) {
    match overlay {
        Overlay::Message { kind, title, body } => {
            let area = centered_rect(60, 30, frame.area());
            frame.render_widget(Clear, area);
            let color = match kind {
                MessageKind::Info => Color::Cyan,
                MessageKind::Error => Color::Red,
            };
            let message = Paragraph::new(format!("{body}\n\nenter close"))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .title(title.as_str())
                        .borders(Borders::ALL)
                        .style(Style::default().fg(color)),
                );
            frame.render_widget(message, area);
        }
        Overlay::History { projection, scroll } => {
            let area = centered_rect(85, 70, frame.area());
            frame.render_widget(Clear, area);
            let header = Row::new(projection.columns.iter().map(|label| {
                Cell::from(label.clone()).style(Style::default().add_modifier(Modifier::BOLD))
            }));
            let rows = projection
                .rows
                .iter()
                .skip(*scroll)
                .map(|row| Row::new(row.iter().map(|text| Cell::from(text.clone()))));
            let widths = column_constraints(&column_widths(projection));
            let table = Table::new(rows, widths)
                .header(header)
                .column_spacing(2)
                .block(
                    Block::default()
                        .title(projection.title.as_str())
                        .borders(Borders::ALL),
                );
            frame.render_widget(table, area);
        }
        Overlay::Multiline { tab, text } => {
            let area = centered_rect(60, 60, frame.area());
            frame.render_widget(Clear, area);
            let editor = Paragraph::new(format!("{text}_")).block(
                Block::default()
                    .title(format!(
                        "add {} (one per line) ctrl+s add | esc cancel",
                        tab.label()
                    ))
                    .borders(Borders::ALL),
            );
            frame.render_widget(editor, area);
        }
        Overlay::CsvPath { input } => {
            let area = centered_rect(60, 20, frame.area());
            frame.render_widget(Clear, area);
            let prompt = Paragraph::new(format!("file: {input}_\n\nenter export | esc cancel"))
                .block(Block::default().title("export csv").borders(Borders::ALL));
            frame.render_widget(prompt, area);
        }
        Overlay::Filter(ui) => {
            let area = centered_rect(60, 40, frame.area());
            frame.render_widget(Clear, area);
            let dialog = Paragraph::new(render_filter_dialog_text(ui))
                .block(Block::default().title("filter").borders(Borders::ALL));
            frame.render_widget(dialog, area);
        }
        Overlay::ReferencePicker(ui) => {
            let area = centered_rect(40, 60, frame.area());
            frame.render_widget(Clear, area);
            let picker = Paragraph::new(render_picker_text(ui)).block(
                Block::default()
                    .title(ui.options.kind().entity())
                    .borders(Borders::ALL),
            );
            frame.render_widget(picker, area);
        }
        Overlay::CellEditor(ui) => {
            let area = centered_rect(60, 20, frame.area());
            frame.render_widget(Clear, area);
            let editor = Paragraph::new(format!("{}_\n\nenter save | esc cancel", ui.input))
                .block(Block::default().title(ui.header.as_str()).borders(Borders::ALL));
            frame.render_widget(editor, area);
        }
    }
}

fn status_label(filter: &InventoryViewFilter) -> &'static str {
    if filter.active { "active" } else { "written off" }
}

fn filter_bar_text(bar: &FilterBar) -> String {
    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    format!(
        "{} 1 item type(i): {}   {} 2 place(p): {}   {} 3 status(w): {}   F edit",
        check(bar.filter.use_item_type),
        bar.item_type,
        check(bar.filter.use_place),
        bar.place,
        check(bar.filter.use_activity),
        status_label(&bar.filter),
    )
}

fn render_filter_dialog_text(ui: &FilterDialogUi) -> String {
    let dialog = &ui.dialog;
    let pointer = |kind: FilterKind| if dialog.focus == kind { ">" } else { " " };
    let check = |on: bool| if on { "[x]" } else { "[ ]" };
    let selection = |list: &LookupSnapshot, row: Option<usize>| {
        let name = row.and_then(|row| list.name_at(row)).unwrap_or(NONE_OPTION);
        match row {
            Some(row) => format!("{name} ({}/{})", row + 1, list.len()),
            None => name.to_owned(),
        }
    };
    let status = if dialog.written_off {
        "written off"
    } else {
        "active"
    };

    [
        format!(
            "{} {} item type: {}",
            pointer(FilterKind::ItemType),
            check(dialog.use_item_type),
            selection(&ui.item_types, dialog.item_type_row)
        ),
        format!(
            "{} {} place: {}",
            pointer(FilterKind::Place),
            check(dialog.use_place),
            selection(&ui.places, dialog.place_row)
        ),
        format!(
            "{} {} status: {status}",
            pointer(FilterKind::Activity),
            check(dialog.use_activity)
        ),
        String::new(),
        "tab/h/l group | space use | j/k value | enter apply | esc cancel".to_owned(),
    ]
    .join("\n")
}

fn render_picker_text(ui: &ReferencePickerUi) -> String {
    std::iter::once(NONE_OPTION)
        .chain(ui.options.names())
        .enumerate()
        .map(|(index, name)| {
            let marker = if index == ui.cursor { ">" } else { " " };
            format!("{marker} {name}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn action_key(action: ToolbarAction) -> char {
    match action {
        ToolbarAction::Add => 'a',
        ToolbarAction::Remove => 'd',
        ToolbarAction::AddMultiline => 'm',
        ToolbarAction::PrintCsv => 'x',
        ToolbarAction::ShowHistory => 'r',
        ToolbarAction::HideFilter => 'v',
    }
}

fn status_text(state: &AppState) -> String {
    if let Some(status) = &state.status_line {
        return status.clone();
    }
    let mut hints = ToolbarAction::ALL
        .iter()
        .filter(|action| state.action_enabled(**action))
        .map(|action| format!("{} {}", action_key(*action), action.label()))
        .collect::<Vec<_>>();
    hints.push("e edit".to_owned());
    hints.push("? help".to_owned());
    hints.join(" | ")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k/h/l g/G ^/$ ctrl+d/u pgup/pgdn | b/f or tab tabs | s sort\n\
rows: a add | d remove | e/enter edit | m add lines | x export csv | r history\n\
filter: v show/hide bar | 1/2/3 toggle item type/place/status | F edit filter\n\
filter values: i next item type | p next place | w active/written off\n\
filter dialog: tab/h/l group | space use | j/k value | enter apply | esc cancel\n\
add lines: one name per line | ctrl+s add | esc cancel\n\
picker: j/k move | enter choose | esc cancel\n\
history: j/k scroll | esc close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
