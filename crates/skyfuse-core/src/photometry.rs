//! Magnitude/flux relations in the AB system (cgs flux densities)

use crate::constants::{AB_ZERO_POINT, POGSON, SENTINEL};
use serde::{Serialize, Deserialize};

/// True only for the exact sentinel value
pub fn is_sentinel(value: f64) -> bool {
    value == SENTINEL
}

/// A cell carries a measurement when it is present, finite and not the sentinel
pub fn is_present(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite() && !is_sentinel(v))
}

/// Present value or `None`
pub fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && !is_sentinel(*v))
}

/// Flux density and its standard error (erg s^-1 cm^-2 Hz^-1)
///
/// Either both components are valid or both are the sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluxMeasurement {
    pub flux: f64,
    pub error: f64,
}

impl FluxMeasurement {
    pub const ABSENT: FluxMeasurement = FluxMeasurement { flux: SENTINEL, error: SENTINEL };

    /// Build a measurement, collapsing to `ABSENT` unless both values are usable
    pub fn new(flux: f64, error: f64) -> Self {
        if flux.is_finite() && error.is_finite() && !is_sentinel(flux) && !is_sentinel(error) && error >= 0.0 {
            Self { flux, error }
        } else {
            Self::ABSENT
        }
    }

    pub fn is_valid(&self) -> bool {
        !is_sentinel(self.flux)
    }

    /// Scale both components, e.g. for a unit conversion
    pub fn scaled(self, factor: f64) -> Self {
        if self.is_valid() {
            Self::new(self.flux * factor, self.error * factor)
        } else {
            self
        }
    }
}

/// AB magnitude to flux density: 10^(-0.4 (m + 48.6))
pub fn ab_mag_to_flux(mag: f64) -> f64 {
    10f64.powf(-POGSON * (mag + AB_ZERO_POINT))
}

/// Inverse of [`ab_mag_to_flux`]
pub fn flux_to_ab_mag(flux: f64) -> f64 {
    -2.5 * flux.log10() - AB_ZERO_POINT
}

/// Propagate a magnitude error into a flux error: sigma_f = f ln(10) 0.4 sigma_m
pub fn flux_error_from_mag_error(flux: f64, mag_err: f64) -> f64 {
    flux * std::f64::consts::LN_10 * POGSON * mag_err
}

/// Convert an AB magnitude with error into a flux measurement
///
/// Only strictly positive magnitudes with a non-negative error are accepted.
pub fn ab_mag_measurement(mag: Option<f64>, mag_err: Option<f64>) -> FluxMeasurement {
    match (present(mag), present(mag_err)) {
        (Some(m), Some(e)) if m > 0.0 && e >= 0.0 => {
            let flux = ab_mag_to_flux(m);
            FluxMeasurement::new(flux, flux_error_from_mag_error(flux, e))
        }
        _ => FluxMeasurement::ABSENT,
    }
}

/// Vega magnitude to AB, with the Galactic extinction term added in magnitude space
pub fn vega_to_ab(vega_mag: f64, ab_offset: f64, extinction: f64) -> f64 {
    vega_mag + ab_offset + extinction
}

/// Multiplicative extinction correction 10^(k E(B-V) / 2.5 - exponent)
///
/// `exponent` folds the unit conversion into the same power of ten.
pub fn power_law_extinction_factor(k: f64, ebv: f64, exponent: f64) -> f64 {
    10f64.powf(k * ebv / 2.5 - exponent)
}
