//! The six generation layers, in pipeline order.
//!
//! Each layer exposes one `generate_*` entry point that consumes read-only
//! borrows of the earlier layers and returns an owned layer struct. Nothing
//! mutates a layer after it has been emitted.

pub mod features;
pub mod geology;
pub mod hydrology;
pub mod structures;
pub mod topography;
pub mod vegetation;

pub use features::{generate_features, FeaturesLayer};
pub use geology::{generate_geology, GeologyLayer};
pub use hydrology::{generate_hydrology, HydrologyLayer};
pub use structures::{generate_structures, StructuresLayer};
pub use topography::{generate_topography, TopographyLayer};
pub use vegetation::{generate_vegetation, VegetationLayer};
