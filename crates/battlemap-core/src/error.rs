//! Error taxonomy for the generation pipeline.
//!
//! All errors are value-returned; no layer recovers from another layer's
//! failure, and generation is never retried (it is deterministic, so a retry
//! cannot change the outcome).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Caller input outside the allowed ranges: bad dimensions, an invalid
    /// context tuple, or an unusable seed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An internal invariant was violated (e.g. a biome supplied no rock
    /// types). Indicates a bug, not bad input.
    #[error("configuration invariant violated: {0}")]
    Configuration(String),

    /// A failure inside a named layer, wrapping the underlying cause.
    #[error("{layer} layer failed")]
    Layer {
        layer: &'static str,
        #[source]
        source: Box<GenerationError>,
    },

    /// A later layer observed that an earlier layer was absent or malformed.
    /// Indicates a bug in the orchestrator.
    #[error("{layer} layer dependency malformed: {detail}")]
    Dependency { layer: &'static str, detail: String },
}

impl GenerationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn dependency(layer: &'static str, detail: impl Into<String>) -> Self {
        Self::Dependency { layer, detail: detail.into() }
    }

    /// Wrap an error as a failure of the named layer. Validation errors pass
    /// through unchanged so callers can still distinguish bad input.
    pub fn in_layer(layer: &'static str, source: GenerationError) -> Self {
        match source {
            e @ Self::Validation(_) => e,
            e => Self::Layer { layer, source: Box::new(e) },
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_wrap_preserves_cause() {
        let inner = GenerationError::configuration("no rock types for biome");
        let wrapped = GenerationError::in_layer("geology", inner);
        match wrapped {
            GenerationError::Layer { layer, source } => {
                assert_eq!(layer, "geology");
                assert!(matches!(*source, GenerationError::Configuration(_)));
            }
            other => panic!("expected Layer, got {other:?}"),
        }
    }

    #[test]
    fn validation_passes_through_layer_wrap() {
        let inner = GenerationError::validation("width out of range");
        let wrapped = GenerationError::in_layer("topography", inner);
        assert!(matches!(wrapped, GenerationError::Validation(_)));
    }
}
