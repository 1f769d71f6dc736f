//! Deterministic tactical battlemap generation.
//!
//! Six layered stages — geology → topography → hydrology → vegetation →
//! structures → features — each a pure function of the earlier layers, a
//! tactical context, and a seed. Identical inputs yield byte-identical
//! output.
//!
//! The main entry point is [`generator::generate`]; [`generator::generate_layers`]
//! exposes the intermediate layer outputs for callers that need more than the
//! flattened tile array.

pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod grid;
pub mod layers;
pub mod rng;
pub mod seed;

pub use config::GenerationConfig;
pub use context::TacticalContext;
pub use error::GenerationError;
pub use generator::{generate, generate_layers, GeneratedMap, MapSettings};
pub use seed::{validate_seed, MapSeed};
