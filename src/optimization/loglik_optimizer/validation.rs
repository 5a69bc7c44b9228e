//! Validation helpers for optimiser options and results.
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`],
//!   [`verify_tol_simplex`] ensure tolerances are finite and strictly
//!   positive when provided.
//! - **Gradient validation**: [`validate_grad`] enforces finite entries.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   `theta_hat` exists and contains only finite values.
//! - **Objective values**: [`validate_value`] checks log-likelihood outputs
//!   for finiteness.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta},
};

/// Shared positive-and-finite check; `make` builds the variant to return.
fn verify_positive(
    tol: Option<f64>, make: fn(f64, &'static str) -> OptError,
) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(make(tol, "Tolerance must be finite."));
        }
        if tol <= 0.0 {
            return Err(make(tol, "Tolerance must be positive."));
        }
    }
    Ok(())
}

/// Validate the optional gradient-norm tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    verify_positive(tol, |tol, reason| OptError::InvalidTolGrad { tol, reason })
}

/// Validate the optional cost-change tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    verify_positive(tol, |tol, reason| OptError::InvalidTolCost { tol, reason })
}

/// Validate the optional simplex standard-deviation tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolSimplex`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_simplex(tol: Option<f64>) -> OptResult<()> {
    verify_positive(tol, |tol, reason| OptError::InvalidTolSimplex { tol, reason })
}

/// Validate a gradient vector's entries.
///
/// # Errors
/// [`OptError::InvalidGradient`] with the index/value of the first
/// non-finite element.
pub fn validate_grad(grad: &Grad) -> OptResult<()> {
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta_hat = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in theta_hat.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(theta_hat)
}

/// Validate that a log-likelihood value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}
