// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::TabKind;

/// Actions the key bar exposes. Whether each one is live depends on the tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    Add,
    Remove,
    AddMultiline,
    PrintCsv,
    ShowHistory,
    HideFilter,
}

impl ToolbarAction {
    pub const ALL: [Self; 6] = [
        Self::Add,
        Self::Remove,
        Self::AddMultiline,
        Self::PrintCsv,
        Self::ShowHistory,
        Self::HideFilter,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::AddMultiline => "add lines",
            Self::PrintCsv => "csv",
            Self::ShowHistory => "history",
            Self::HideFilter => "filter bar",
        }
    }

    pub const fn enabled_on(self, tab: TabKind) -> bool {
        match self {
            Self::ShowHistory => matches!(tab, TabKind::Main),
            Self::AddMultiline => tab.is_lookup(),
            Self::Add | Self::Remove => !matches!(tab, TabKind::Print),
            Self::HideFilter => matches!(tab, TabKind::Main | TabKind::Print),
            Self::PrintCsv => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_tab: TabKind,
    pub filter_hidden: bool,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_tab: TabKind::Main,
            filter_hidden: false,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    SetActiveTab(TabKind),
    ToggleFilterHidden,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    TabChanged(TabKind),
    FilterBarChanged(bool),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::SetActiveTab(tab) => {
                if self.active_tab == tab {
                    return Vec::new();
                }
                self.active_tab = tab;
                vec![AppEvent::TabChanged(tab)]
            }
            AppCommand::ToggleFilterHidden => {
                if !self.action_enabled(ToolbarAction::HideFilter) {
                    return Vec::new();
                }
                self.filter_hidden = !self.filter_hidden;
                let label = if self.filter_hidden {
                    "filter hidden"
                } else {
                    "filter shown"
                };
                vec![
                    AppEvent::FilterBarChanged(self.filter_visible()),
                    self.set_status(label),
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn action_enabled(&self, action: ToolbarAction) -> bool {
        action.enabled_on(self.active_tab)
    }

    /// The filter bar shows when the tab supports it and the user has not
    /// hidden it.
    pub fn filter_visible(&self) -> bool {
        self.action_enabled(ToolbarAction::HideFilter) && !self.filter_hidden
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        vec![AppEvent::TabChanged(self.active_tab)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState, ToolbarAction};
    use crate::TabKind;

    #[test]
    fn tab_rotation_wraps() {
        let mut state = AppState {
            active_tab: TabKind::Persons,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextTab);
        assert_eq!(state.active_tab, TabKind::Main);
        assert_eq!(events, vec![AppEvent::TabChanged(TabKind::Main)]);

        state.dispatch(AppCommand::PrevTab);
        assert_eq!(state.active_tab, TabKind::Persons);
    }

    #[test]
    fn print_tab_disables_add_and_remove() {
        let state = AppState {
            active_tab: TabKind::Print,
            ..AppState::default()
        };
        assert!(!state.action_enabled(ToolbarAction::Add));
        assert!(!state.action_enabled(ToolbarAction::Remove));
        assert!(!state.action_enabled(ToolbarAction::AddMultiline));
        assert!(!state.action_enabled(ToolbarAction::ShowHistory));
        assert!(state.action_enabled(ToolbarAction::HideFilter));
        assert!(state.action_enabled(ToolbarAction::PrintCsv));
    }

    #[test]
    fn lookup_tabs_enable_multiline_entry() {
        for tab in [TabKind::ItemTypes, TabKind::Places, TabKind::Persons] {
            assert!(ToolbarAction::AddMultiline.enabled_on(tab));
            assert!(ToolbarAction::Add.enabled_on(tab));
            assert!(!ToolbarAction::HideFilter.enabled_on(tab));
            assert!(!ToolbarAction::ShowHistory.enabled_on(tab));
        }
        assert!(ToolbarAction::ShowHistory.enabled_on(TabKind::Main));
        assert!(!ToolbarAction::AddMultiline.enabled_on(TabKind::Main));
    }

    #[test]
    fn filter_bar_follows_tab_and_toggle() {
        let mut state = AppState::default();
        assert!(state.filter_visible());

        let events = state.dispatch(AppCommand::ToggleFilterHidden);
        assert!(!state.filter_visible());
        assert_eq!(events[0], AppEvent::FilterBarChanged(false));

        state.dispatch(AppCommand::SetActiveTab(TabKind::Places));
        assert!(!state.filter_visible());
        assert!(state.dispatch(AppCommand::ToggleFilterHidden).is_empty());
        assert!(state.filter_hidden);

        state.dispatch(AppCommand::SetActiveTab(TabKind::Print));
        state.dispatch(AppCommand::ToggleFilterHidden);
        assert!(state.filter_visible());
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SetStatus("exported 3 rows".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("exported 3 rows"));
        assert_eq!(
            state.dispatch(AppCommand::ClearStatus),
            vec![AppEvent::StatusCleared]
        );
        assert_eq!(state.status_line, None);
    }
}
