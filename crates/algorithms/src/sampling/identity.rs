//! Coordinate-derived point identifiers
//!
//! The identifier is a pure function of the WGS84 coordinates rounded to
//! six decimals (~0.1 m). Value, severity and acquisition time never enter
//! it, so the same spot keeps its identifier across independent runs.
//!
//! Changing the rounding changes every identifier ever issued; such a change
//! must come with a new [`POINT_ID_PREFIX`].

use sha2::{Digest, Sha256};

/// Namespace and scheme version of point identifiers.
///
/// `rp1` keys round each coordinate by scaling to micro-degrees and rounding
/// half away from zero (`f64::round`), so 0.0078125 keys as 0.007813 and
/// -0.0078125 as -0.007813.
pub const POINT_ID_PREFIX: &str = "rp1";

/// Hex characters of the digest kept in an identifier
pub const POINT_ID_HEX_LEN: usize = 16;

const MICRO_DEGREES: f64 = 1_000_000.0;

/// Canonical "lat_lon" text at six decimals.
///
/// Formatted from integer micro-degrees so that values rounding to zero
/// never print as "-0.000000".
pub fn coordinate_key(lat: f64, lon: f64) -> String {
    format!("{}_{}", fixed6(lat), fixed6(lon))
}

/// Stable identifier of the location (lat, lon)
pub fn point_id(lat: f64, lon: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(coordinate_key(lat, lon).as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{POINT_ID_PREFIX}_{}", &digest[..POINT_ID_HEX_LEN])
}

fn fixed6(value: f64) -> String {
    let micro = (value * MICRO_DEGREES).round() as i64;
    let sign = if micro < 0 { "-" } else { "" };
    let abs = micro.unsigned_abs();
    format!("{sign}{}.{:06}", abs / 1_000_000, abs % 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(coordinate_key(-38.73, -72.61), "-38.730000_-72.610000");
        assert_eq!(coordinate_key(0.0000004, -0.0000004), "0.000000_0.000000");
        assert_eq!(coordinate_key(1.5, 179.9999996), "1.500000_180.000000");
    }

    #[test]
    fn test_same_rounding_same_id() {
        let a = point_id(-38.7301234, -72.6109876);
        let b = point_id(-38.73012341, -72.61098759);
        assert_eq!(a, b);
        assert!(a.starts_with("rp1_"));
        assert_eq!(a.len(), POINT_ID_PREFIX.len() + 1 + POINT_ID_HEX_LEN);
    }

    #[test]
    fn test_sixth_decimal_changes_id() {
        let base = point_id(10.123456, 20.654321);
        assert_ne!(base, point_id(10.123457, 20.654321));
        assert_ne!(base, point_id(10.123456, 20.654322));
        // Swapped coordinates are a different place
        assert_ne!(base, point_id(20.654321, 10.123456));
    }

    #[test]
    fn test_exact_halves_round_away_from_zero() {
        // 1/128 and 5/128 scale to exact .5 micro-degrees
        assert_eq!(coordinate_key(0.0078125, -0.0078125), "0.007813_-0.007813");
        assert_eq!(coordinate_key(0.0390625, -0.0390625), "0.039063_-0.039063");
    }

    #[test]
    fn test_negative_zero_is_normalized() {
        assert_eq!(point_id(-0.0000001, 5.0), point_id(0.0, 5.0));
    }

    #[test]
    fn test_no_collisions_on_micro_grid() {
        let mut ids = std::collections::HashSet::new();
        for i in 0..40 {
            for j in 0..40 {
                let lat = -38.730000 + i as f64 * 1e-6;
                let lon = -72.610000 + j as f64 * 1e-6;
                assert!(ids.insert(point_id(lat, lon)));
            }
        }
    }
}
