//! Grid coordinates for the rendered table.

use serde::Serialize;

use crate::catalog::{ElementRecord, Series};

/// Row used for the detached lanthanide series.
pub const LANTHANIDE_ROW: u8 = 9;
/// Row used for the detached actinide series.
pub const ACTINIDE_ROW: u8 = 10;
/// Spacer cells before the first element of a detached series.
const SERIES_LEAD_COLUMNS: u8 = 3;

/// 1-based cell in an 18-column grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct GridCell {
    /// Row (periods 1-7, then the two series rows).
    pub row: u8,
    /// Column 1-18.
    pub column: u8,
}

/// Placeholder cells marking where the detached series belong in the main body.
pub const SERIES_PLACEHOLDERS: [(Series, GridCell); 2] = [
    (Series::Lanthanide, GridCell { row: 6, column: 3 }),
    (Series::Actinide, GridCell { row: 7, column: 3 }),
];

/// Where an element is drawn.
#[must_use]
pub fn grid_position(element: &ElementRecord) -> GridCell {
    match (element.series(), element.group) {
        (Some(Series::Lanthanide), _) => GridCell {
            row: LANTHANIDE_ROW,
            column: SERIES_LEAD_COLUMNS + 1 + element.atomic_number.saturating_sub(57),
        },
        (Some(Series::Actinide), _) => GridCell {
            row: ACTINIDE_ROW,
            column: SERIES_LEAD_COLUMNS + 1 + element.atomic_number.saturating_sub(89),
        },
        (None, Some(group)) => GridCell {
            row: element.period,
            column: group,
        },
        // A main-body element without a group only happens with hand-edited data.
        (None, None) => GridCell {
            row: element.period,
            column: SERIES_LEAD_COLUMNS,
        },
    }
}
