/// Reserved value for an absent or invalid measurement
pub const SENTINEL: f64 = -99.0;

/// AB magnitude zero point: m_AB = -2.5 log10(f_nu) - 48.6 (cgs)
pub const AB_ZERO_POINT: f64 = 48.6;

/// Magnitude to log-flux scale: log10(f) = -0.4 m + const
pub const POGSON: f64 = 0.4;

/// Nanomaggy in erg s^-1 cm^-2 Hz^-1 (3631 Jy * 1e-9 * 1e-23)
pub const NANOMAGGY_CGS: f64 = 3.631e-29;

/// Nanojansky in erg s^-1 cm^-2 Hz^-1
pub const NANOJANSKY_CGS: f64 = 1e-32;

/// Decimal exponent taking micro-Jansky to erg s^-1 cm^-2 Hz^-1
pub const MICROJANSKY_EXPONENT: f64 = 29.0;

/// Arcseconds per degree
pub const ARCSEC_PER_DEG: f64 = 3600.0;

/// GALEX FUV extinction coefficient, A_FUV = k * E(B-V)
pub const K_FUV: f64 = 8.06;

/// GALEX NUV extinction coefficient
pub const K_NUV: f64 = 7.95;

/// VISTA J Vega to AB offset
pub const VEGA_AB_J: f64 = 0.916;

/// VISTA H Vega to AB offset
pub const VEGA_AB_H: f64 = 1.366;

/// VISTA Ks Vega to AB offset
pub const VEGA_AB_KS: f64 = 1.827;

/// HSC filter fraction at or above which a source counts as observed with the new i2 filter
pub const HSC_I2_MIN_FRACTION: f64 = 0.75;

/// HSC filter fraction at or below which a source counts as observed with the old i filter
pub const HSC_I_MAX_FRACTION: f64 = 0.25;

/// Outlier threshold in units of the recentred separation's standard deviation
pub const OUTLIER_SIGMA: f64 = 3.0;

/// Spectroscopic redshifts at or below this value are treated as absent
pub const ZSPEC_MIN: f64 = 0.002;

/// Highest spectroscopic quality grade
pub const ZSPEC_BEST_QUALITY: i64 = 3;
