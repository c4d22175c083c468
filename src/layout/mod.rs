//! Pure geometry for the table front-end.

pub mod grid;
pub mod popup;

pub use grid::{GridCell, grid_position};
pub use popup::{Point, Rect, Size, place_popup};
