use std::rc::Rc;

use crate::error::EvalResult;
use crate::eval::context::EvalContext;
use crate::expression::ExpressionSet;

/// Shared handle to a registered root.
pub type RootRef = Rc<dyn Root>;

/// Callback the engine hands to [`Root::iterate_sets`]. It receives the context of the run
/// so the visited expressions can report errors and register more roots.
pub type SetIterator<'a> = dyn FnMut(&mut EvalContext, &ExpressionSet) -> EvalResult<()> + 'a;

/// Entry point into the evaluated graph.
///
/// The engine calls `iterate_sets` once per phase so the root controls the order in which its
/// sets are processed. Sets may be recomputed on every call.
pub trait Root {
    /// Displayed by the engine while running. Registered roots must have unique names.
    fn dsl_name(&self) -> String;

    /// Roots that must be evaluated before this one.
    fn depends_on(&self) -> Vec<RootRef> {
        Vec::new()
    }

    /// Call `it` once per expression set, in evaluation order. Errors returned by `it` are
    /// fatal for the run and should be propagated.
    fn iterate_sets(&self, ctx: &mut EvalContext, it: &mut SetIterator<'_>) -> EvalResult<()>;
}
