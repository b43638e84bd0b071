pub mod constants;
pub mod coordinates;
pub mod photometry;
pub mod stats;


pub use coordinates::{SkyPosition, SkyRegion, Offset};
pub use photometry::FluxMeasurement;
