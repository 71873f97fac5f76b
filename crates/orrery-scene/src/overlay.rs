//! Modal host: a centred content panel over a dismissing backdrop.

use glam::Vec2;
use tracing::debug;

use crate::selection::SelectionStore;

pub const MODAL_MIN_WIDTH: f32 = 420.0;
pub const MODAL_MAX_WIDTH: f32 = 960.0;
pub const MODAL_MAX_WIDTH_FRACTION: f32 = 0.85;
pub const MODAL_MAX_HEIGHT_FRACTION: f32 = 0.8;

/// Axis-aligned rectangle in physical pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x <= max.x && point.y >= self.min.y && point.y <= max.y
    }
}

/// Centred content rect for a panel that would like to be `preferred` big.
/// The minimum width wins over the maximum on narrow viewports.
pub fn modal_rect(viewport: Vec2, preferred: Vec2) -> Rect {
    let max_width = (viewport.x * MODAL_MAX_WIDTH_FRACTION).min(MODAL_MAX_WIDTH);
    let width = preferred.x.min(max_width).max(MODAL_MIN_WIDTH);
    let height = preferred.y.min(viewport.y * MODAL_MAX_HEIGHT_FRACTION).max(0.0);
    let size = Vec2::new(width, height);
    Rect {
        min: (viewport - size) * 0.5,
        size,
    }
}

/// What a pointer press did once the modal had seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No modal is open; the scene should handle the click.
    PassThrough,
    /// Landed on the panel; it stops there.
    Consumed,
    /// Landed on the backdrop and closed the modal.
    Dismissed,
}

/// Presents the panel for the current selection.
#[derive(Debug, Clone)]
pub struct ModalHost {
    preferred: Vec2,
}

impl Default for ModalHost {
    fn default() -> Self {
        Self {
            preferred: Vec2::new(MODAL_MAX_WIDTH, 640.0),
        }
    }
}

impl ModalHost {
    pub fn new(preferred: Vec2) -> Self {
        Self { preferred }
    }

    pub fn is_open(&self, store: &SelectionStore) -> bool {
        store.get().is_some()
    }

    /// Panel rect, or `None` while nothing is selected.
    pub fn layout(&self, store: &SelectionStore, viewport: Vec2) -> Option<Rect> {
        self.is_open(store)
            .then(|| modal_rect(viewport, self.preferred))
    }

    pub fn handle_click(
        &self,
        store: &mut SelectionStore,
        viewport: Vec2,
        point: Vec2,
    ) -> ClickOutcome {
        let Some(rect) = self.layout(store, viewport) else {
            return ClickOutcome::PassThrough;
        };
        if rect.contains(point) {
            ClickOutcome::Consumed
        } else {
            debug!("modal dismissed by backdrop");
            store.close();
            ClickOutcome::Dismissed
        }
    }

    /// Escape closes an open modal. Returns whether it did.
    pub fn handle_escape(&self, store: &mut SelectionStore) -> bool {
        if !self.is_open(store) {
            return false;
        }
        debug!("modal dismissed by escape");
        store.close();
        true
    }
}
