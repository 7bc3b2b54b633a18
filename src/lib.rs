//! # dsl-eval: Deferred DSL Evaluation Engine
//!
//! `dsl-eval` runs the DSL of a description toolkit. A DSL here is a set of ordinary
//! callbacks: builder functions create expressions and attach deferred initializers to them,
//! and the engine later executes, validates and finalizes the resulting graph. The engine is
//! domain agnostic; the builder vocabulary and whatever consumes the finalized graph live
//! elsewhere.
//!
//! ## Building Blocks
//!
//! - Expression model ([`expression`]): the [`Expression`] trait and its optional
//!   [`Source`], [`Validator`] and [`Finalizer`] capabilities, plus growable
//!   [`ExpressionSet`]s
//! - Roots ([`root`]): dependency-ordered entry points that expose expression sets
//! - Evaluation ([`eval`]): the [`EvalContext`] of a run, the root scheduler and the
//!   three-phase driver
//! - Errors ([`error`], [`validation`]): attributed error records and validation batches
//! - Configuration ([`config`])
//!
//! ## Running a DSL
//!
//! ```text
//! register roots → sort by dependencies → execute → validate → finalize
//! ```
//!
//! Execution may grow the graph: a deferred initializer can append expressions to the set
//! being executed or register new roots, and the engine keeps going until nothing new
//! appears. Growth that never stops is cut off after
//! [`EvalConfig::max_iterations`](config::EvalConfig) passes.
//!
//! Errors reported during a phase are collected rather than returned immediately so a single
//! run reports as many problems as possible; the next phase only starts if none were
//! recorded.

pub mod config;
pub mod error;
pub mod eval;
pub mod expression;
pub mod root;
pub mod validation;

// Re-exports
pub use config::*;
pub use error::*;
pub use eval::*;
pub use expression::*;
pub use root::*;
pub use validation::*;
