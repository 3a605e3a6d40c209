//! Resolution metrics.
//!
//! `Resolver::resolve` returns only the implied ids; `Resolver::run` also
//! returns a [`Resolution`] carrying whether the fixpoint was reached and what
//! each pass did. Fields here are for profiling and for the CLI report; they
//! never influence the result.

use std::time::Duration;

/// Counts and timing for a single resolver pass.
#[derive(Debug, Default, Clone)]
pub struct PassMetrics {
    pub duration: Duration,
    /// Number of tokens in the context this pass evaluated against.
    pub context_size: usize,
    /// Live rules whose target was still open and whose logic was evaluated.
    pub rules_evaluated: usize,
    /// Rules skipped because their Mandatory group was already resolved.
    pub rules_group_skipped: usize,
    /// Part ids implied during this pass, in firing order.
    pub implied: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ResolveMetrics {
    pub total: Duration,
    pub passes: Vec<PassMetrics>,
}

/// Resolver output bundled with convergence and timing information.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Implied part ids in firing order, excluding confirmed ones.
    pub implied: Vec<String>,
    /// `false` when the pass limit was hit with rules still able to fire;
    /// the result is then a bounded approximation.
    pub converged: bool,
    pub metrics: ResolveMetrics,
}
