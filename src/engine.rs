//! Selection resolution engine.
//!
//! Resolving a set of confirmed parts is a forward-chaining pipeline:
//!
//! ```text
//! rules (all)  ──┐
//!               │  CompiledRules::new           (compiled_rules.rs)
//!               │    - shape flags per rule
//!               │    - drop inactive / dangling
//!               └───────────────┬──────────────
//!                               │
//! catalog ── PartIndex ─────────┼─ base tokens (every Baseline part)
//!                               │
//!                               v
//!                     Resolver::saturate (resolver.rs)
//!                       - build context from base + confirmed + implied
//!                       - fire rules whose logic holds
//!                       - skip resolved Mandatory groups
//!                       - repeat until a pass fires nothing
//!                               │
//!                               v
//!                         Resolution
//! ```
//!
//! Like any saturation engine, one rule's output can enable another: implying
//! a cab part adds its tokens to the context, which may satisfy the rule for
//! a cab heater. Unlike open-ended saturation, the number of passes is capped
//! ([`ResolveOptions::max_passes`]) and a run that hits the cap is reported
//! with `converged == false` instead of looping.
//!
//! ## Responsibilities by module
//!
//! - `compiled_rules.rs`: per-rule metadata and indexes, plus the
//!   configuration diagnostics callers surface upstream.
//! - `resolver.rs`: the bounded fixpoint loop and group exclusivity.
//! - `metrics.rs`: per-pass timing and counts.
//!
//! ## Debugging
//!
//! Pass summaries are logged at `debug` level and per-rule decisions at
//! `trace` level through `tracing`.

#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolver.rs"]
mod resolver;

pub use compiled_rules::{CompiledRules, RuleDiagnostics, RuleShape};
pub use metrics::{PassMetrics, Resolution, ResolveMetrics};
pub use resolver::{ResolveOptions, Resolver};
