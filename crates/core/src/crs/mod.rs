//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of WGS84 geographic coordinates
pub const EPSG_WGS84: u32 = 4326;

const EPSG_UTM_NORTH_BASE: u32 = 32600;
const EPSG_UTM_SOUTH_BASE: u32 = 32700;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation (primary)
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(EPSG_WGS84)
    }

    /// WGS84 / UTM CRS built explicitly from a zone and hemisphere
    pub fn utm(zone: UtmZone) -> Self {
        Self::from_epsg(zone.epsg())
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Whether this is WGS84 geographic (lon/lat degrees)
    pub fn is_geographic(&self) -> bool {
        self.epsg == Some(EPSG_WGS84)
    }

    /// UTM zone and hemisphere, if this is a WGS84 / UTM code
    pub fn utm_zone(&self) -> Option<UtmZone> {
        self.epsg.and_then(UtmZone::from_epsg)
    }

    /// Whether the projection machinery can transform to/from this CRS
    pub fn is_supported(&self) -> bool {
        self.is_geographic() || self.utm_zone().is_some()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        // Simple check: if both have EPSG codes, compare them
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            // Return first 50 chars of WKT
            let end = wkt
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

/// Hemisphere half of the UTM system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// Hemisphere of a latitude; the equator belongs to the north
    pub fn from_latitude(lat: f64) -> Self {
        if lat < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }

    pub fn is_north(self) -> bool {
        self == Hemisphere::North
    }

    pub fn opposite(self) -> Self {
        match self {
            Hemisphere::North => Hemisphere::South,
            Hemisphere::South => Hemisphere::North,
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hemisphere::North => write!(f, "N"),
            Hemisphere::South => write!(f, "S"),
        }
    }
}

/// A WGS84 / UTM zone (1..=60) with its hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    pub zone: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    /// Build a zone, rejecting numbers outside 1..=60
    pub fn new(zone: u8, hemisphere: Hemisphere) -> Option<Self> {
        (1..=60).contains(&zone).then_some(Self { zone, hemisphere })
    }

    /// Zone containing a WGS84 longitude/latitude.
    ///
    /// Longitudes are wrapped into [-180, 180); the antimeridian falls in zone 1.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        let wrapped = (lon + 180.0).rem_euclid(360.0);
        let zone = ((wrapped / 6.0).floor() as u8 + 1).min(60);
        Self {
            zone,
            hemisphere: Hemisphere::from_latitude(lat),
        }
    }

    /// Parse an EPSG code: 326xx is north, 327xx is south
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        let (base, hemisphere) = if (EPSG_UTM_NORTH_BASE + 1..=EPSG_UTM_NORTH_BASE + 60).contains(&epsg) {
            (EPSG_UTM_NORTH_BASE, Hemisphere::North)
        } else if (EPSG_UTM_SOUTH_BASE + 1..=EPSG_UTM_SOUTH_BASE + 60).contains(&epsg) {
            (EPSG_UTM_SOUTH_BASE, Hemisphere::South)
        } else {
            return None;
        };
        Some(Self {
            zone: (epsg - base) as u8,
            hemisphere,
        })
    }

    /// EPSG code of this zone
    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => EPSG_UTM_NORTH_BASE,
            Hemisphere::South => EPSG_UTM_SOUTH_BASE,
        };
        base + u32::from(self.zone)
    }

    /// Central meridian in degrees
    pub fn central_meridian(&self) -> f64 {
        (f64::from(self.zone) - 1.0) * 6.0 - 180.0 + 3.0
    }

    /// Same zone number in the other hemisphere
    pub fn flipped(&self) -> Self {
        Self {
            zone: self.zone,
            hemisphere: self.hemisphere.opposite(),
        }
    }
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.zone, self.hemisphere)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4326);
        assert_eq!(crs.epsg(), Some(4326));
        assert_eq!(crs.identifier(), "EPSG:4326");
        assert!(crs.is_geographic());
    }

    #[test]
    fn test_crs_equivalence() {
        let a = CRS::from_epsg(4326);
        let b = CRS::wgs84();
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&CRS::from_proj("+proj=longlat")));
    }

    #[test]
    fn test_utm_epsg_parsing() {
        assert_eq!(
            UtmZone::from_epsg(32630),
            UtmZone::new(30, Hemisphere::North)
        );
        assert_eq!(
            UtmZone::from_epsg(32721),
            UtmZone::new(21, Hemisphere::South)
        );
        assert_eq!(UtmZone::from_epsg(32600), None);
        assert_eq!(UtmZone::from_epsg(32661), None);
        assert_eq!(UtmZone::from_epsg(3857), None);
        assert!(!CRS::from_epsg(3857).is_supported());
    }

    #[test]
    fn test_utm_zone_from_lon_lat() {
        // Madrid
        let z = UtmZone::from_lon_lat(-3.7037, 40.4168);
        assert_eq!(z.zone, 30);
        assert_eq!(z.hemisphere, Hemisphere::North);
        assert_eq!(z.epsg(), 32630);

        // Buenos Aires
        let z = UtmZone::from_lon_lat(-58.3816, -34.6037);
        assert_eq!(z.epsg(), 32721);

        // Edges
        assert_eq!(UtmZone::from_lon_lat(-180.0, 0.0).zone, 1);
        assert_eq!(UtmZone::from_lon_lat(179.999, 0.0).zone, 60);
        assert_eq!(UtmZone::from_lon_lat(180.0, 0.0).zone, 1);
    }

    #[test]
    fn test_flipped_and_display() {
        let z = UtmZone::new(19, Hemisphere::South).unwrap();
        assert_eq!(z.flipped().epsg(), 32619);
        assert_eq!(z.to_string(), "19S");
        assert_eq!(CRS::utm(z).identifier(), "EPSG:32719");
        assert!((z.central_meridian() - (-69.0)).abs() < 1e-12);
    }
}
