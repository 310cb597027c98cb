//! Composer button and its duration menu.
//!
//! The button pushes the chosen tag into the shared [`SelectionSlot`] and
//! listens on the slot's event channel so it can visually reset once the
//! before-send hook has consumed the selection.

use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use super::selection::{SelectionEvent, SelectionSlot};
use crate::host::traits::ComposerComponent;

pub const MENU_TITLE: &str = "Message expires in...";
pub const DISABLE_LABEL: &str = "Disable TTL";
const IDLE_TITLE: &str = "Set message expiration";

/// One entry of the duration menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationOption {
    pub label: String,
    pub value: String,
}

impl DurationOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Menu offered when no custom list is configured.
pub fn default_options() -> Vec<DurationOption> {
    vec![
        DurationOption::new("5 minutes", "5m"),
        DurationOption::new("15 minutes", "15m"),
        DurationOption::new("1 hour", "1h"),
        DurationOption::new("1 day", "1d"),
    ]
}

/// A row of the open menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    /// `None` for the "Disable TTL" row.
    pub value: Option<String>,
    pub checked: bool,
}

/// State of one mounted composer button.
#[derive(Debug)]
pub struct ComposerButton {
    slot: SelectionSlot,
    options: Arc<[DurationOption]>,
    events: Receiver<SelectionEvent>,
    selected: Option<String>,
    menu_open: bool,
}

impl ComposerButton {
    pub fn new(slot: SelectionSlot, options: Arc<[DurationOption]>) -> Self {
        let events = slot.subscribe();
        let selected = slot.pending();
        Self {
            slot,
            options,
            events,
            selected,
            menu_open: false,
        }
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// Click on the overlay behind the menu.
    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn select(&mut self, value: &str) {
        self.selected = Some(value.to_string());
        self.menu_open = false;
        self.slot.select(value);
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.menu_open = false;
        self.slot.clear();
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The button is highlighted while a selection is pending.
    pub fn is_active(&self) -> bool {
        self.selected.is_some()
    }

    /// Label of the selection, falling back to the raw tag.
    pub fn selected_label(&self) -> String {
        let Some(selected) = self.selected.as_deref() else {
            return String::new();
        };
        self.options
            .iter()
            .find(|option| option.value == selected)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| selected.to_string())
    }

    /// Tooltip for the button.
    pub fn title(&self) -> String {
        if self.is_active() {
            format!("TTL: {}", self.selected_label())
        } else {
            IDLE_TITLE.to_string()
        }
    }

    /// Rows of the open menu; empty while closed.
    pub fn menu(&self) -> Vec<MenuEntry> {
        if !self.menu_open {
            return Vec::new();
        }

        let mut entries: Vec<MenuEntry> = self
            .options
            .iter()
            .map(|option| MenuEntry {
                label: option.label.clone(),
                value: Some(option.value.clone()),
                checked: self.selected.as_deref() == Some(option.value.as_str()),
            })
            .collect();

        if self.is_active() {
            entries.push(MenuEntry {
                label: DISABLE_LABEL.to_string(),
                value: None,
                checked: false,
            });
        }
        entries
    }

    /// Apply slot notifications received since the last call.
    ///
    /// Returns `true` if the visible state changed.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => changed |= self.apply(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "composer fell behind selection events");
                    changed |= self.resync();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return changed,
            }
        }
    }

    fn apply(&mut self, event: SelectionEvent) -> bool {
        let next = match event {
            SelectionEvent::Selected(tag) => Some(tag),
            SelectionEvent::Cleared | SelectionEvent::Reset => None,
        };
        let changed = self.selected != next;
        self.selected = next;
        changed
    }

    fn resync(&mut self) -> bool {
        let pending = self.slot.pending();
        let changed = self.selected != pending;
        self.selected = pending;
        changed
    }
}

/// Composer-slot component; every mount shares the plugin's slot.
#[derive(Debug, Clone)]
pub struct ComposerTtlButton {
    slot: SelectionSlot,
    options: Arc<[DurationOption]>,
}

impl ComposerTtlButton {
    pub fn new(slot: SelectionSlot) -> Self {
        Self::with_options(slot, default_options())
    }

    pub fn with_options(slot: SelectionSlot, options: Vec<DurationOption>) -> Self {
        Self {
            slot,
            options: options.into(),
        }
    }
}

impl ComposerComponent for ComposerTtlButton {
    fn mount(&self) -> ComposerButton {
        ComposerButton::new(self.slot.clone(), self.options.clone())
    }
}
