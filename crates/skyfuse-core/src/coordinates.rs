use serde::{Serialize, Deserialize};

/// Equatorial position in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    pub ra: f64,   // [0, 360)
    pub dec: f64,  // [-90, 90]
}

impl SkyPosition {
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// Great-circle separation in degrees (haversine, stable at small angles)
    pub fn separation(&self, other: &SkyPosition) -> f64 {
        let dec1 = self.dec.to_radians();
        let dec2 = other.dec.to_radians();
        let d_dec = dec2 - dec1;
        let d_ra = (other.ra - self.ra).to_radians();

        let a = (d_dec / 2.0).sin().powi(2)
            + dec1.cos() * dec2.cos() * (d_ra / 2.0).sin().powi(2);
        (2.0 * a.sqrt().min(1.0).asin()).to_degrees()
    }

    /// Coordinate offsets (other - self) in degrees, RA wrapped into (-180, 180]
    ///
    /// These are plain coordinate differences, not projected onto the tangent
    /// plane; the outlier rejection works on exactly these numbers.
    pub fn offset_to(&self, other: &SkyPosition) -> Offset {
        Offset {
            delta_ra: wrap_ra_difference(other.ra - self.ra),
            delta_dec: other.dec - self.dec,
        }
    }

    /// Check whether the position lies inside an RA/Dec box (exclusive bounds)
    pub fn within(&self, region: &SkyRegion) -> bool {
        self.ra > region.ra_min && self.ra < region.ra_max
            && self.dec > region.dec_min && self.dec < region.dec_max
    }
}

/// Coordinate offset between two positions (degrees)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub delta_ra: f64,
    pub delta_dec: f64,
}

impl Offset {
    /// Planar length of the offset vector
    pub fn length(&self) -> f64 {
        self.delta_ra.hypot(self.delta_dec)
    }
}

/// Rectangular RA/Dec footprint (degrees)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyRegion {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

impl SkyRegion {
    /// eFEDS field footprint
    pub fn efeds() -> Self {
        Self { ra_min: 126.0, ra_max: 146.2, dec_min: -3.2, dec_max: 6.2 }
    }
}

impl Default for SkyRegion {
    fn default() -> Self {
        Self::efeds()
    }
}

fn wrap_ra_difference(d: f64) -> f64 {
    let wrapped = d.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

pub fn arcsec_to_deg(arcsec: f64) -> f64 {
    arcsec / crate::constants::ARCSEC_PER_DEG
}
