//! The single "selected section" value shared by planets, the menu and the modal.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A content section. Each one owns a planet and a modal panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Profile,
    Tech,
    Experience,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Profile, Section::Tech, Section::Experience];

    /// Position in [`Section::ALL`].
    pub fn index(self) -> usize {
        match self {
            Section::Profile => 0,
            Section::Tech => 1,
            Section::Experience => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Profile => "profile",
            Section::Tech => "tech",
            Section::Experience => "experience",
        }
    }

    /// Menu hotkey mapping: `1`, `2`, `3`.
    pub fn from_hotkey(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Section::Profile),
            2 => Some(Section::Tech),
            3 => Some(Section::Experience),
            _ => None,
        }
    }
}

/// Current selection. Written by click handlers, read every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStore {
    current: Option<Section>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Section> {
        self.current
    }

    pub fn is_selected(&self, section: Section) -> bool {
        self.current == Some(section)
    }

    pub fn set(&mut self, value: Option<Section>) {
        if self.current != value {
            debug!(
                from = self.current.map(Section::label),
                to = value.map(Section::label),
                "selection changed"
            );
        }
        self.current = value;
    }

    pub fn open(&mut self, section: Section) {
        self.set(Some(section));
    }

    pub fn close(&mut self) {
        self.set(None);
    }

    /// Open `section`, or close it when it is already the selection.
    pub fn toggle(&mut self, section: Section) {
        if self.is_selected(section) {
            self.close();
        } else {
            self.open(section);
        }
    }
}
