use std::ops::Range;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::context::EvalContext;
use super::scheduler::sort_roots;
use crate::error::{DslError, ErrorRecord, EvalError, EvalResult};
use crate::expression::ExpressionSet;
use crate::root::RootRef;
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Execute,
    Validate,
    Finalize,
}

/// Run the roots registered in `ctx`.
///
/// Roots are sorted by dependencies, then every expression set they expose is executed,
/// validated and finalized in that order. Executed DSL may append expressions to the set
/// being executed and register more roots; both are picked up in the same run. Each phase
/// only starts if the previous one recorded no error.
pub fn run_dsl(ctx: &mut EvalContext) -> EvalResult<()> {
    if sort_roots(ctx.roots())?.is_empty() {
        return Ok(());
    }

    let limit = ctx.config().max_iterations;
    debug!(phase = %Phase::Execute, roots = ctx.roots().len(), "starting phase");
    stabilize(
        ctx,
        |ctx| ctx.roots().len(),
        execute_roots,
        EvalError::TooManyRoots { limit },
    )?;
    check_errors(ctx, Phase::Execute)?;

    let roots = sort_roots(ctx.roots())?;

    debug!(phase = %Phase::Validate, roots = roots.len(), "starting phase");
    for root in &roots {
        visit_sets(ctx, root, validate_set)?;
    }
    check_errors(ctx, Phase::Validate)?;

    debug!(phase = %Phase::Finalize, roots = roots.len(), "starting phase");
    for root in &roots {
        visit_sets(ctx, root, finalize_set)?;
    }

    info!(roots = roots.len(), "DSL run complete");
    Ok(())
}

/// Visit a growing collection until it stops growing.
///
/// Each pass handles the items added since the previous pass, as reported by `len`. After
/// `max_iterations` passes the collection must be stable, otherwise `exceeded` is returned.
fn stabilize<L, P>(
    ctx: &mut EvalContext,
    len: L,
    mut pass: P,
    exceeded: EvalError,
) -> EvalResult<()>
where
    L: Fn(&EvalContext) -> usize,
    P: FnMut(&mut EvalContext, Range<usize>) -> EvalResult<()>,
{
    let limit = ctx.config().max_iterations;
    let mut done = 0;
    for _ in 0..limit {
        let total = len(ctx);
        if done >= total {
            return Ok(());
        }
        pass(ctx, done..total)?;
        done = total;
    }
    if len(ctx) > done {
        warn!(limit, error = %exceeded, "generation did not stabilize");
        return Err(exceeded);
    }
    Ok(())
}

/// Execute the roots registered at `range`, in dependency order.
fn execute_roots(ctx: &mut EvalContext, range: Range<usize>) -> EvalResult<()> {
    let pending: Vec<RootRef> = ctx.roots()[range].to_vec();
    let order = sort_roots(ctx.roots())?;
    for root in order
        .iter()
        .filter(|root| pending.iter().any(|p| Rc::ptr_eq(p, root)))
    {
        debug!(root = %root.dsl_name(), "executing root");
        visit_sets(ctx, root, run_set)?;
    }
    Ok(())
}

/// Hand `f` to the root's set iterator.
///
/// The first error `f` returns is fatal: later sets of the root are skipped and the error is
/// returned even if the root dropped it.
fn visit_sets<F>(ctx: &mut EvalContext, root: &RootRef, mut f: F) -> EvalResult<()>
where
    F: FnMut(&mut EvalContext, &ExpressionSet) -> EvalResult<()>,
{
    let mut fatal: Option<EvalError> = None;
    let result = root.iterate_sets(ctx, &mut |ctx, set| {
        if let Some(err) = &fatal {
            return Err(err.clone());
        }
        f(ctx, set).inspect_err(|err| fatal = Some(err.clone()))
    });
    match fatal {
        Some(err) => Err(err),
        None => result,
    }
}

/// Execute the DSL of every expression in `set`, including the ones appended meanwhile.
fn run_set(ctx: &mut EvalContext, set: &ExpressionSet) -> EvalResult<()> {
    let limit = ctx.config().max_iterations;
    stabilize(
        ctx,
        |_| set.len(),
        |ctx, range| {
            for idx in range {
                let Some(expr) = set.get(idx) else {
                    break;
                };
                if let Some(dsl) = expr.as_source().and_then(|source| source.dsl()) {
                    ctx.execute(Some(&dsl), expr.clone());
                }
            }
            Ok(())
        },
        EvalError::TooManyExpressions { limit },
    )
}

/// Validate every expression of `set` and record the failures as one batch.
fn validate_set(ctx: &mut EvalContext, set: &ExpressionSet) -> EvalResult<()> {
    let mut errors = ValidationErrors::new();
    for expr in set.snapshot() {
        if let Some(validator) = expr.as_validator() {
            if let Err(err) = validator.validate() {
                errors.add_error(&expr, err);
            }
        }
    }
    if !errors.is_empty() {
        ctx.record(ErrorRecord::new(DslError::Validation(errors)));
    }
    Ok(())
}

fn finalize_set(_ctx: &mut EvalContext, set: &ExpressionSet) -> EvalResult<()> {
    for expr in set.snapshot() {
        if let Some(finalizer) = expr.as_finalizer() {
            finalizer.finalize();
        }
    }
    Ok(())
}

fn check_errors(ctx: &EvalContext, phase: Phase) -> EvalResult<()> {
    if ctx.has_errors() {
        warn!(%phase, errors = ctx.error_count(), "phase failed");
        return Err(EvalError::Dsl(ctx.errors().clone()));
    }
    Ok(())
}
