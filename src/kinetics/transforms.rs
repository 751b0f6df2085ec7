//! Per-sample rate-law transforms.
//!
//! Every function here is pure and works on one sample. `NaN` is the
//! "undefined" sentinel: it marks samples where the reduction fraction `F`
//! falls outside the real domain of a transform, i.e. `F > 1` for the
//! fractional powers and `F >= 1` for the logarithm. Noisy onset samples with
//! `F < 0` stay defined. Negative bases are never handed to `powf` and
//! non-positive arguments are never handed to `ln`.

use std::f64::consts::PI;

use crate::domain::SpecimenRecord;

/// Lumped gas-film mass transfer constant.
pub const MASS_TRANSFER_COEFF: f64 = 3.7594 * 0.0008155;
/// Bulk gas concentration of the reducing species.
pub const BULK_CONCENTRATION: f64 = 11.04921;
/// Equilibrium concentration at the pellet surface.
pub const EQUILIBRIUM_CONCENTRATION: f64 = 4.40365;
/// Molar mass of Fe2O3 per iron atom: 55.85 + 1.5 * 16 (g/mol).
pub const OXIDE_MOLAR_MASS: f64 = 55.85 + 1.5 * 16.0;

/// Fraction of pellet mass attributable to residual oxygen.
pub fn oxygen_fraction(weight: f64, specimen: &SpecimenRecord) -> f64 {
    let oxy = specimen.oxygen_mass();
    let iron = specimen.iron_mass();
    (weight + oxy) / (weight + oxy + iron)
}

/// Plateau-normalized reduction fraction `F`.
pub fn reduction_fraction(weight: f64, plateau: f64, correction: f64) -> f64 {
    (weight / plateau) * correction
}

/// `base^exponent` restricted to the real branch: negative bases are undefined.
pub fn real_pow(base: f64, exponent: f64) -> f64 {
    if base.is_nan() || base < 0.0 {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// Shrinking core, diffusion through the iron layer:
/// `1/2 - F/3 - (1-F)^(2/3)/2`.
pub fn iron_layer_limiting(f: f64) -> f64 {
    0.5 - (1.0 / 3.0) * f - 0.5 * real_pow(1.0 - f, 2.0 / 3.0)
}

/// Mixed control: `1 - (1-F)^(1/3)`.
pub fn mixed_control_limiting(f: f64) -> f64 {
    1.0 - real_pow(1.0 - f, 1.0 / 3.0)
}

/// Complete internal burning: `ln(1-F)`, undefined from `F = 1` on.
pub fn complete_internal_burning(f: f64) -> f64 {
    if f.is_nan() || f >= 1.0 {
        return f64::NAN;
    }
    (1.0 - f).ln()
}

/// External mass transfer control at elapsed time `t` (s), clipped to 1.
///
/// Evaluated strictly left to right:
/// `k/(2r) * 4 * pi * r^2 * dC * t / (m0/M)`.
pub fn external_mass_transfer(t: f64, specimen: &SpecimenRecord) -> f64 {
    let r = specimen.initial_radius;
    let moles = specimen.initial_mass / OXIDE_MOLAR_MASS;
    let value = MASS_TRANSFER_COEFF / (2.0 * r) * 4.0 * PI * (r * r)
        * (BULK_CONCENTRATION - EQUILIBRIUM_CONCENTRATION)
        * t
        / moles;

    if value > 1.0 { 1.0 } else { value }
}
