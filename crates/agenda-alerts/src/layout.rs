//! Alert geometry. All values are surface units.

use agenda_core::config::DisplayConfig;

use crate::surface::Rect;

/// Padding above the first alert and below the last.
const EDGE_PADDING: f32 = 10.0;
const DISMISS_WIDTH: f32 = 70.0;
const DISMISS_HEIGHT: f32 = 25.0;
/// Dismiss button's left edge, measured from the alert's right edge.
const DISMISS_INSET_RIGHT: f32 = 80.0;
/// Dismiss button's top edge, measured from the alert's bottom edge.
const DISMISS_INSET_BOTTOM: f32 = 35.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertLayout {
    pub width: f32,
    pub alert_height: f32,
    pub spacing: f32,
    pub margin: f32,
}

impl Default for AlertLayout {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

impl AlertLayout {
    pub fn from_config(cfg: &DisplayConfig) -> Self {
        Self {
            width: cfg.width,
            alert_height: cfg.alert_height,
            spacing: cfg.spacing,
            margin: cfg.margin,
        }
    }

    /// Vertical distance between consecutive alerts' top edges.
    pub fn slot_height(&self) -> f32 {
        self.alert_height + self.spacing
    }

    /// Resting offset of the alert at stack `position`.
    pub fn target_y(&self, position: usize) -> f32 {
        EDGE_PADDING + position as f32 * self.slot_height()
    }

    /// Offset new alerts start from: one slot above the visible area.
    pub fn spawn_offset(&self) -> f32 {
        -self.slot_height()
    }

    /// Height of a surface showing `count` alerts.
    pub fn surface_height(&self, count: usize) -> f32 {
        self.slot_height() * count as f32 + 2.0 * EDGE_PADDING
    }

    /// Dismiss button of an alert whose top edge is at `offset`.
    pub fn dismiss_rect(&self, offset: f32) -> Rect {
        Rect::new(
            self.width - DISMISS_INSET_RIGHT,
            offset + self.alert_height - DISMISS_INSET_BOTTOM,
            DISMISS_WIDTH,
            DISMISS_HEIGHT,
        )
    }

    /// Full body of an alert whose top edge is at `offset`.
    pub fn alert_rect(&self, offset: f32) -> Rect {
        Rect::new(0.0, offset, self.width, self.alert_height)
    }
}
