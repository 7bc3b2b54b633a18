//! DSL Evaluation System
//!
//! The evaluation system turns the deferred builder callbacks registered by a DSL into a
//! validated, finalized expression graph.
//!
//! # Core Components
//!
//! ## Evaluation Context
//! Holds the state of one run: the registered roots, the stack of expressions whose DSL is
//! running and the errors reported so far.
//!
//! ## Scheduler
//! Orders roots so that every root is evaluated after the roots it depends on.
//!
//! ## Evaluator
//! Drives the three phases of a run over every expression set of every root.
//!
//! # Evaluation Pipeline
//!
//! 1. Roots are sorted by dependencies
//! 2. Execute: deferred initializers run, possibly appending expressions and registering roots
//! 3. Validate: validators run, failures are batched per expression set
//! 4. Finalize: finalizers run once the whole run is known to be valid
//!
//! A phase only starts when the previous one recorded no error.

pub mod context;
pub mod evaluator;
pub mod scheduler;
pub mod stack;

pub use context::EvalContext;
pub use evaluator::{run_dsl, Phase};
pub use scheduler::sort_roots;
pub use stack::ExpressionStack;
