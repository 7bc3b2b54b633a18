use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, trace};

use super::stack::ExpressionStack;
use crate::config::{ConfigError, EvalConfig};
use crate::error::{DslError, ErrorRecord, EvalResult, MultiError, SourceLocation, TOP_LEVEL_NAME};
use crate::expression::{downcast_rc, Dsl, ExprRef, Expression, TopExpr};
use crate::root::RootRef;

/// State of one evaluation run.
///
/// The context is handed to every deferred initializer so builder code can find the
/// expression it is configuring, report errors against it and register more roots. Separate
/// runs use separate contexts.
pub struct EvalContext {
    stack: ExpressionStack,
    errors: MultiError,
    roots: Vec<RootRef>,
    config: EvalConfig,
    top: ExprRef,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    pub fn new() -> Self {
        Self::from_config(EvalConfig::default())
    }

    /// Context driven by `config`, rejected if the config does not validate.
    pub fn with_config(config: EvalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: EvalConfig) -> Self {
        Self {
            stack: ExpressionStack::new(),
            errors: MultiError::new(),
            roots: Vec::new(),
            config,
            top: Rc::new(TopExpr),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Register a root. Roots registered while a run executes are evaluated in the same run.
    pub fn register(&mut self, root: RootRef) {
        debug!(root = %root.dsl_name(), "registering root");
        self.roots.push(root);
    }

    /// Registered roots in registration order.
    pub fn roots(&self) -> &[RootRef] {
        &self.roots
    }

    /// Run the registered roots through the execute, validate and finalize phases.
    pub fn run(&mut self) -> EvalResult<()> {
        super::evaluator::run_dsl(self)
    }

    /// The expression whose initializer is running, or the top-level sentinel.
    pub fn current(&self) -> ExprRef {
        self.stack
            .current()
            .cloned()
            .unwrap_or_else(|| self.top.clone())
    }

    /// The current expression if it is a `T`.
    pub fn current_as<T: Expression>(&self) -> Option<Rc<T>> {
        self.stack.current().cloned().and_then(downcast_rc::<T>)
    }

    /// True when no initializer is running, i.e. at the top level of the DSL.
    pub fn is_top_level(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn stack(&self) -> &ExpressionStack {
        &self.stack
    }

    pub fn errors(&self) -> &MultiError {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Append an already built record.
    pub fn record(&mut self, record: ErrorRecord) {
        debug!(error = %record, "recorded DSL error");
        self.errors.push(record);
    }

    /// Record an error against the current expression. The location is the caller's; helpers
    /// wrapping this call should be `#[track_caller]` so the location skips them too.
    #[track_caller]
    pub fn report(&mut self, error: DslError) {
        let mut record = ErrorRecord::new(error).with_owner(self.owner_name());
        if self.config.capture_locations {
            record = record.with_location(SourceLocation::from(std::panic::Location::caller()));
        }
        self.record(record);
    }

    /// Record a formatted error message against the current expression.
    #[track_caller]
    pub fn report_error(&mut self, message: impl fmt::Display) {
        self.report(DslError::Message(message.to_string()));
    }

    /// Report a construct used in a context that does not support it.
    #[track_caller]
    pub fn incompatible_dsl(&mut self, construct: &str) {
        self.report(DslError::IncompatibleDsl {
            construct: construct.to_string(),
        });
    }

    /// Report a dynamic argument of an unexpected type.
    #[track_caller]
    pub fn invalid_arg_error<T: fmt::Debug + ?Sized>(&mut self, expected: &str, actual: &T) {
        self.report(DslError::InvalidArgument {
            expected: expected.to_string(),
            actual: format!("{:?}", actual),
            actual_type: std::any::type_name::<T>().to_string(),
        });
    }

    /// Run `dsl` with `expr` as the current expression.
    ///
    /// Returns false if the DSL recorded an error. Intended for constructs that evaluate a
    /// nested block right away instead of deferring it to the execute phase. The scope of
    /// `expr` is left even if the DSL panics.
    pub fn execute(&mut self, dsl: Option<&Dsl>, expr: ExprRef) -> bool {
        let Some(dsl) = dsl else {
            return true;
        };
        let init_count = self.errors.len();
        if self.config.trace_expressions {
            trace!(expr = %expr.eval_name(), depth = self.stack.depth(), "executing DSL");
        }
        self.stack.push(expr);
        let result = panic::catch_unwind(AssertUnwindSafe(|| (**dsl)(self)));
        self.stack.pop();
        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
        self.errors.len() <= init_count
    }

    /// Forget all roots, errors and scopes so the context can drive a fresh run.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.errors.clear();
        self.roots.clear();
    }

    fn owner_name(&self) -> String {
        match self.stack.current() {
            Some(expr) => {
                let name = expr.eval_name();
                if name.is_empty() {
                    TOP_LEVEL_NAME.to_string()
                } else {
                    name
                }
            }
            None => TOP_LEVEL_NAME.to_string(),
        }
    }
}
