//! loglik_optimizer::builders: solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin's generic wiring behind small builders that apply crate
//! options (tolerances, L-BFGS memory, initial simplex size).
//!
//! Conventions
//! -----------
//! - Builders never set `max_iters`; the runner applies it on the executor.
//! - L-BFGS builders do not set `θ0` either. Nelder–Mead has no separate
//!   initial point: its simplex *is* the starting state, built around `θ0`.
//! - Argmin configuration errors surface as [`OptError`](crate::optimization::OptError)
//!   via `From<argmin::core::Error>`.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::OptimiserOptions,
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Simplex,
            Theta,
        },
    },
};

/// L-BFGS with Hager–Zhang line search.
pub fn build_optimizer_hager_zhang(opts: &OptimiserOptions) -> OptResult<LbfgsHagerZhang> {
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), opts.lbfgs_mem());
    configure_lbfgs(lbfgs, opts)
}

/// L-BFGS with More–Thuente line search.
pub fn build_optimizer_more_thuente(opts: &OptimiserOptions) -> OptResult<LbfgsMoreThuente> {
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), opts.lbfgs_mem());
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional gradient and cost-change tolerances to an L-BFGS solver.
///
/// When a tolerance is `None` the Argmin default stays in effect.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &OptimiserOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Vertices `θ0` and `θ0 + step·e_i` for every coordinate `i`.
pub fn initial_simplex(theta0: &Theta, step: f64) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for index in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[index] += step;
        vertices.push(vertex);
    }
    vertices
}

/// Nelder–Mead over the initial simplex around `theta0`.
pub fn build_nelder_mead(theta0: &Theta, opts: &OptimiserOptions) -> OptResult<Simplex> {
    let mut solver = Simplex::new(initial_simplex(theta0, opts.simplex_step));
    if let Some(tol) = opts.tols.tol_simplex {
        solver = solver.with_sd_tolerance(tol)?;
    }
    Ok(solver)
}
