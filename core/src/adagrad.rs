//! Sparse proximal AdaGrad with an L1 penalty.
//!
//! Per active coordinate with a nonzero gradient:
//!
//!   rate = eta / (1 + sqrt(var))
//!   raw  = x - rate * g
//!   x    = sign(raw) * max(0, |raw| - lambda * rate)
//!
//! i.e. a composite mirror descent step whose soft-threshold applies the L1
//! penalty exactly. The sign comes from the unregularized update, not the old
//! weight.
//!
//! Coordinates whose gradient is exactly zero are skipped, so they get no L1
//! shrinkage that step (truncated-gradient approximation). With sparse
//! features most coordinates are untouched on any given step and shrinking
//! them all would make every update dense.
//!
//! `var` holds the running sum of squared gradients and only grows. The usual
//! iteration is `accumulate_variance` then `adagrad_step` on the same layout
//! (`SparseAdaGrad::update` does both).

use std::borrow::Borrow;

use crate::config::AdaGradConfig;
use crate::dispatch::sweep;
use crate::error::{expect_len, Result};
use crate::layout::{Dims, Layout, NonzeroSet, SparseKind};

/// One proximal AdaGrad update of a single weight. Caller skips `g == 0`.
#[inline]
pub fn proximal_update(x: f64, g: f64, var: f64, eta: f64, lambda: f64) -> f64 {
    let rate = eta / (1.0 + var.sqrt());
    let raw = x - rate * g;
    let magnitude = (raw.abs() - lambda * rate).max(0.0);
    if magnitude != 0.0 && raw < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

fn check_buffers(layout: &Layout<'_>, dims: Dims, bufs: &[(&'static str, usize)]) -> Result<()> {
    for &(what, len) in bufs {
        expect_len(what, dims.numel(), len)?;
    }
    layout.check(dims)
}

// ── Variance accumulation ────────────────────────────────────────────

/// `var[i] += g[i]^2` for every coordinate `layout` selects.
pub fn accumulate_variance(var: &mut [f64], g: &[f64], layout: Layout<'_>, dims: Dims) -> Result<()> {
    check_buffers(&layout, dims, &[("var", var.len()), ("g", g.len())])?;
    tracing::trace!(h = dims.h, d = dims.d, visits = layout.visits(dims), "accumulate variance");

    sweep(layout, dims, var, |idx, v| {
        let gi = g[idx];
        *v += gi * gi;
    });
    Ok(())
}

// ── Proximal step ────────────────────────────────────────────────────

/// Proximal AdaGrad step on every selected coordinate with `g != 0`.
///
/// `x`, `g` and `var` must all hold `dims.numel()` elements.
pub fn adagrad_step(
    x: &mut [f64],
    g: &[f64],
    var: &[f64],
    layout: Layout<'_>,
    eta: f64,
    lambda: f64,
    dims: Dims,
) -> Result<()> {
    check_buffers(&layout, dims, &[("x", x.len()), ("g", g.len()), ("var", var.len())])?;
    tracing::trace!(h = dims.h, d = dims.d, visits = layout.visits(dims), eta, lambda, "adagrad step");

    sweep(layout, dims, x, |idx, xi| {
        let gi = g[idx];
        if gi != 0.0 {
            *xi = proximal_update(*xi, gi, var[idx], eta, lambda);
        }
    });
    Ok(())
}

// ── Keyed variants ───────────────────────────────────────────────────

/// `accumulate_variance` with feature ids drawn from a key-ordered collection.
///
/// The ids are copied into `scratch` before any numeric work, so the source
/// never has to be shared across workers. Overflowing the scratch capacity
/// fails with `CapacityExceeded` and leaves `var` untouched.
pub fn accumulate_variance_keyed<I>(
    var: &mut [f64],
    g: &[f64],
    keys: I,
    kind: SparseKind,
    scratch: &mut NonzeroSet,
    dims: Dims,
) -> Result<()>
where
    I: IntoIterator,
    I::Item: Borrow<usize>,
{
    scratch.refill(keys.into_iter().map(|k| *k.borrow()))?;
    accumulate_variance(var, g, kind.layout(scratch), dims)
}

/// `adagrad_step` with feature ids drawn from a key-ordered collection.
#[allow(clippy::too_many_arguments)]
pub fn adagrad_step_keyed<I>(
    x: &mut [f64],
    g: &[f64],
    var: &[f64],
    keys: I,
    kind: SparseKind,
    scratch: &mut NonzeroSet,
    eta: f64,
    lambda: f64,
    dims: Dims,
) -> Result<()>
where
    I: IntoIterator,
    I::Item: Borrow<usize>,
{
    scratch.refill(keys.into_iter().map(|k| *k.borrow()))?;
    adagrad_step(x, g, var, kind.layout(scratch), eta, lambda, dims)
}

// ── Owned updater ────────────────────────────────────────────────────

/// Proximal AdaGrad for one parameter group: hyperparameters plus the
/// reusable scratch set for keyed updates.
///
/// Keyed calls take `&mut self`, so one updater cannot be driven by two
/// training steps at once. Give each concurrent caller its own updater.
pub struct SparseAdaGrad {
    config: AdaGradConfig,
    scratch: NonzeroSet,
}

impl SparseAdaGrad {
    pub fn new(config: AdaGradConfig) -> Result<Self> {
        config.validate()?;
        let scratch = NonzeroSet::with_capacity(config.max_nonzero);
        Ok(SparseAdaGrad { config, scratch })
    }

    pub fn config(&self) -> &AdaGradConfig {
        &self.config
    }

    pub fn accumulate(&self, var: &mut [f64], g: &[f64], layout: Layout<'_>, dims: Dims) -> Result<()> {
        accumulate_variance(var, g, layout, dims)
    }

    pub fn step(&self, x: &mut [f64], g: &[f64], var: &[f64], layout: Layout<'_>, dims: Dims) -> Result<()> {
        adagrad_step(x, g, var, layout, self.config.eta, self.config.lambda, dims)
    }

    /// Full iteration: fold `g` into `var`, then step.
    pub fn update(
        &self,
        x: &mut [f64],
        g: &[f64],
        var: &mut [f64],
        layout: Layout<'_>,
        dims: Dims,
    ) -> Result<()> {
        // Validate x here too so a bad x cannot leave var half-updated.
        expect_len("x", dims.numel(), x.len())?;
        self.accumulate(var, g, layout, dims)?;
        self.step(x, g, var, layout, dims)
    }

    pub fn accumulate_keyed<I>(
        &mut self,
        var: &mut [f64],
        g: &[f64],
        keys: I,
        kind: SparseKind,
        dims: Dims,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<usize>,
    {
        accumulate_variance_keyed(var, g, keys, kind, &mut self.scratch, dims)
    }

    pub fn step_keyed<I>(
        &mut self,
        x: &mut [f64],
        g: &[f64],
        var: &[f64],
        keys: I,
        kind: SparseKind,
        dims: Dims,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<usize>,
    {
        let AdaGradConfig { eta, lambda, .. } = self.config;
        adagrad_step_keyed(x, g, var, keys, kind, &mut self.scratch, eta, lambda, dims)
    }

    /// Keyed full iteration; the keys are materialized once for both passes.
    pub fn update_keyed<I>(
        &mut self,
        x: &mut [f64],
        g: &[f64],
        var: &mut [f64],
        keys: I,
        kind: SparseKind,
        dims: Dims,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<usize>,
    {
        self.scratch.refill(keys.into_iter().map(|k| *k.borrow()))?;
        let layout = kind.layout(&self.scratch);
        expect_len("x", dims.numel(), x.len())?;
        accumulate_variance(var, g, layout, dims)?;
        adagrad_step(x, g, var, layout, self.config.eta, self.config.lambda, dims)
    }
}
