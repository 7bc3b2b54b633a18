//! Expression model
//!
//! Every unit the engine visits implements [`Expression`], which only requires a qualified
//! name for diagnostics. On top of that an expression opts into any of three capabilities:
//!
//! - [`Source`]: a deferred initializer run during the execute phase
//! - [`Validator`]: a check run once every initializer has executed
//! - [`Finalizer`]: a completion step run after the whole run validated
//!
//! The engine dispatches on capability presence through the `as_*` accessors rather than on
//! concrete types, so capabilities compose freely.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{DslError, TOP_LEVEL_NAME};
use crate::eval::context::EvalContext;

/// Shared handle to an expression.
pub type ExprRef = Rc<dyn Expression>;

/// A deferred initializer. It receives the context of the running evaluation.
pub type Dsl = Rc<dyn Fn(&mut EvalContext)>;

/// Object-safe access to the concrete type behind an expression.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A node of the evaluated graph.
pub trait Expression: AsAny {
    /// Qualified name of the expression, e.g. "resource bottle".
    fn eval_name(&self) -> String;

    fn as_source(&self) -> Option<&dyn Source> {
        None
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        None
    }

    fn as_finalizer(&self) -> Option<&dyn Finalizer> {
        None
    }
}

/// An expression initialized by a deferred callback.
pub trait Source {
    /// `None` means the expression was fully built at construction time.
    fn dsl(&self) -> Option<Dsl>;
}

/// An expression that can be validated.
pub trait Validator {
    /// Use [`crate::ValidationErrors`] to report more than one failure at a time.
    fn validate(&self) -> Result<(), DslError>;
}

/// An expression that needs a pass after the run executed and validated, e.g. to merge
/// generated expressions or apply defaults.
pub trait Finalizer {
    /// Cannot fail: anything that may fail belongs in [`Validator::validate`].
    fn finalize(&self);
}

/// Reference to the concrete expression type behind `expr`.
pub fn downcast_expr<T: Expression>(expr: &ExprRef) -> Option<&T> {
    (**expr).as_any().downcast_ref::<T>()
}

/// Owned handle to the concrete expression type behind `expr`.
pub fn downcast_rc<T: Expression>(expr: ExprRef) -> Option<Rc<T>> {
    expr.into_any_rc().downcast::<T>().ok()
}

/// Holder for an optional deferred initializer, embedded by expressions that implement
/// [`Source`].
#[derive(Clone, Default)]
pub struct DslFunc(Option<Dsl>);

impl DslFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut EvalContext) + 'static,
    {
        Self(Some(Rc::new(f)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }
}

impl From<Dsl> for DslFunc {
    fn from(dsl: Dsl) -> Self {
        Self(Some(dsl))
    }
}

impl Source for DslFunc {
    fn dsl(&self) -> Option<Dsl> {
        self.0.clone()
    }
}

impl fmt::Debug for DslFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => write!(f, "DslFunc(Some(..))"),
            None => write!(f, "DslFunc(None)"),
        }
    }
}

/// Sentinel reported as the current expression when nothing is being evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopExpr;

impl Expression for TopExpr {
    fn eval_name(&self) -> String {
        TOP_LEVEL_NAME.to_string()
    }
}

/// Ordered, growable sequence of expressions.
///
/// Cloning shares the sequence: an initializer holding a clone may append to the set the
/// engine is currently iterating. Appended expressions are visited after the current ones.
#[derive(Clone, Default)]
pub struct ExpressionSet {
    exprs: Rc<RefCell<Vec<ExprRef>>>,
}

impl ExpressionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, expr: ExprRef) {
        self.exprs.borrow_mut().push(expr);
    }

    pub fn len(&self) -> usize {
        self.exprs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ExprRef> {
        self.exprs.borrow().get(index).cloned()
    }

    /// Copy of the current contents. The engine iterates snapshots so initializers may push
    /// while it runs.
    pub fn snapshot(&self) -> Vec<ExprRef> {
        self.exprs.borrow().clone()
    }

    /// Whether both handles share the same underlying sequence.
    pub fn ptr_eq(&self, other: &ExpressionSet) -> bool {
        Rc::ptr_eq(&self.exprs, &other.exprs)
    }
}

impl FromIterator<ExprRef> for ExpressionSet {
    fn from_iter<I: IntoIterator<Item = ExprRef>>(iter: I) -> Self {
        Self {
            exprs: Rc::new(RefCell::new(iter.into_iter().collect())),
        }
    }
}

impl fmt::Debug for ExpressionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.exprs.borrow().iter().map(|e| e.eval_name()))
            .finish()
    }
}

/// Ordered key/values metadata attached to builder expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataExpr {
    entries: Vec<(String, Vec<String>)>,
}

impl MetadataExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append values to `key`, creating it after the existing keys if needed.
    pub fn add<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => existing.extend(values),
            None => self.entries.push((key.to_string(), values)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn merge(&mut self, other: &MetadataExpr) {
        for (key, values) in &other.entries {
            self.add(key, values.iter().cloned());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
