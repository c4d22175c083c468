//! Viewport-aware placement for element detail cards.

use serde::{Deserialize, Serialize};

/// Gap between the trigger and the popup.
pub const POPUP_OFFSET: f64 = 10.0;
/// Minimum distance kept from every viewport edge.
pub const VIEWPORT_MARGIN: f64 = 10.0;

/// Axis-aligned rectangle in viewport pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Horizontal centre.
    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Width and height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Top-left coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Left.
    pub x: f64,
    /// Top.
    pub y: f64,
}

/// Compute the popup's top-left corner.
///
/// Prefers above the trigger; flips below when that would cross the top
/// margin; clamps inside the bottom margin if it still overflows. Horizontally
/// the popup is centred on the trigger and clamped between the side margins.
/// Call again whenever the viewport is resized.
#[must_use]
pub fn place_popup(trigger: Rect, popup: Size, viewport: Size) -> Point {
    let mut y = trigger.y - popup.height - POPUP_OFFSET;
    if y < VIEWPORT_MARGIN {
        y = trigger.bottom() + POPUP_OFFSET;
        if y + popup.height > viewport.height - VIEWPORT_MARGIN {
            y = viewport.height - popup.height - VIEWPORT_MARGIN;
        }
    }

    let max_x = viewport.width - popup.width - VIEWPORT_MARGIN;
    let x = (trigger.center_x() - popup.width / 2.0)
        .min(max_x)
        .max(VIEWPORT_MARGIN);

    Point { x, y }
}
