//! Seed inputs and wire-stable normalization.
//!
//! A seed arrives as an integer or a string. Integers are truncated to
//! `u32`; strings are trimmed, lower-cased, and hashed with 32-bit FNV-1a.
//! The FNV constants are part of the public contract — changing them breaks
//! reproducibility of every previously shared seed. Numeric strings parse
//! as their integer value (with a warning from [`validate_seed`]) so that
//! `"123"` and `123` name the same map.

use serde::{Deserialize, Serialize};

const FNV32_OFFSET: u32 = 2_166_136_261;
const FNV32_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a over the UTF-8 bytes of `s`.
pub fn fnv1a_32(s: &str) -> u32 {
    let mut h = FNV32_OFFSET;
    for byte in s.as_bytes() {
        h ^= *byte as u32;
        h = h.wrapping_mul(FNV32_PRIME);
    }
    h
}

/// A seed as supplied by the caller: either an integer or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapSeed {
    Int(u64),
    Text(String),
}

impl MapSeed {
    /// Normalize to the 32-bit master seed the pipeline runs on.
    pub fn normalize(&self) -> u32 {
        match self {
            MapSeed::Int(v) => *v as u32,
            MapSeed::Text(t) => {
                let norm = t.trim().to_lowercase();
                match norm.parse::<u64>() {
                    Ok(v) => v as u32,
                    Err(_) => fnv1a_32(&norm),
                }
            }
        }
    }
}

impl From<u64> for MapSeed {
    fn from(v: u64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for MapSeed {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Outcome of [`validate_seed`]. Purely informational — no side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedValidation {
    pub valid: bool,
    pub normalized_seed: u32,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

/// Check a seed and report its normalized value plus any warnings.
pub fn validate_seed(seed: &MapSeed) -> SeedValidation {
    let mut warnings = Vec::new();
    let mut error = None;

    if let MapSeed::Text(t) = seed {
        let norm = t.trim().to_lowercase();
        if norm.is_empty() {
            error = Some("seed must not be empty".to_owned());
        } else {
            if norm.parse::<u64>().is_ok() {
                warnings.push("string seed normalized to integer".to_owned());
            }
            if norm.len() < 3 {
                warnings.push("seed is suspiciously short".to_owned());
            }
        }
    }

    SeedValidation {
        valid: error.is_none(),
        normalized_seed: seed.normalize(),
        warnings,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_reference_values() {
        // Published FNV-1a test vectors.
        assert_eq!(fnv1a_32(""), 2_166_136_261);
        assert_eq!(fnv1a_32("a"), 0xe40c292c);
        assert_eq!(fnv1a_32("foobar"), 0xbf9cf968);
    }

    #[test]
    fn integer_seeds_truncate_to_u32() {
        assert_eq!(MapSeed::Int(0).normalize(), 0);
        assert_eq!(MapSeed::Int(u64::from(u32::MAX) + 5).normalize(), 4);
    }

    #[test]
    fn string_seeds_are_case_and_space_insensitive() {
        let a = MapSeed::from("  Mountain-Pass ").normalize();
        let b = MapSeed::from("mountain-pass").normalize();
        assert_eq!(a, b);
        assert_eq!(b, fnv1a_32("mountain-pass"));
    }

    #[test]
    fn numeric_string_parses_as_integer() {
        assert_eq!(MapSeed::from("123").normalize(), 123);
        let v = validate_seed(&MapSeed::from("123"));
        assert!(v.valid);
        assert!(v.warnings.iter().any(|w| w.contains("normalized to integer")));
    }

    #[test]
    fn short_seed_warns_empty_seed_errors() {
        let short = validate_seed(&MapSeed::from("ab"));
        assert!(short.valid);
        assert!(short.warnings.iter().any(|w| w.contains("short")));

        let empty = validate_seed(&MapSeed::from("   "));
        assert!(!empty.valid);
        assert!(empty.error.is_some());
    }

    #[test]
    fn serde_accepts_number_or_string() {
        let from_num: MapSeed = serde_json::from_str("42").unwrap();
        let from_str: MapSeed = serde_json::from_str("\"badger\"").unwrap();
        assert_eq!(from_num, MapSeed::Int(42));
        assert_eq!(from_str, MapSeed::Text("badger".into()));
    }

    #[test]
    fn normalization_round_trips_through_serialization() {
        for seed in [MapSeed::Int(987_654_321), MapSeed::from("complete-tactical-test")] {
            let json = serde_json::to_string(&seed).unwrap();
            let back: MapSeed = serde_json::from_str(&json).unwrap();
            assert_eq!(back.normalize(), seed.normalize());
        }
    }
}
