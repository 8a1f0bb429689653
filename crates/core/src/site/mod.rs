//! Site wind climate from a reanalysis grid cell
//!
//! - `grid`: four named corner series of one 0.25° cell
//! - `spatial`: bilinear interpolation to the site coordinates
//! - `vertical`: power-law extrapolation to hub height

pub mod grid;
pub mod spatial;
pub mod vertical;

pub use grid::{Corner, CornerSeries, GridCell, CELL_SIZE_DEG};
pub use spatial::{InterpolatedSite, SpatialInterpolator};
pub use vertical::{
    HeightAdjustedSeries, VerticalExtrapolator, REFERENCE_HEIGHT_HIGH, REFERENCE_HEIGHT_LOW,
};
