#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dsl_eval::{
    DslError, DslFunc, EvalContext, EvalResult, ExprRef, Expression, ExpressionSet, Finalizer,
    Root, RootRef, SetIterator, Source, ValidationErrors, Validator,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Expression with a name only.
pub struct PlainExpr(pub String);

impl Expression for PlainExpr {
    fn eval_name(&self) -> String {
        self.0.clone()
    }
}

/// Expression implementing every capability, recording what the engine did with it.
#[derive(Default)]
pub struct TestExpr {
    pub name: String,
    pub dsl: DslFunc,
    pub failures: RefCell<Vec<String>>,
    pub nested: RefCell<Option<ValidationErrors>>,
    pub description: RefCell<Option<String>>,
    pub validated: Cell<usize>,
    pub finalized: Cell<usize>,
}

impl TestExpr {
    pub fn new(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            ..Default::default()
        })
    }

    pub fn with_dsl<F>(name: &str, f: F) -> Rc<Self>
    where
        F: Fn(&mut EvalContext) + 'static,
    {
        Rc::new(Self {
            name: name.to_string(),
            dsl: DslFunc::new(f),
            ..Default::default()
        })
    }

    pub fn fail_validation(&self, message: &str) {
        self.failures.borrow_mut().push(message.to_string());
    }
}

impl Expression for TestExpr {
    fn eval_name(&self) -> String {
        self.name.clone()
    }

    fn as_source(&self) -> Option<&dyn Source> {
        Some(&self.dsl)
    }

    fn as_validator(&self) -> Option<&dyn Validator> {
        Some(self)
    }

    fn as_finalizer(&self) -> Option<&dyn Finalizer> {
        Some(self)
    }
}

impl Validator for TestExpr {
    fn validate(&self) -> Result<(), DslError> {
        self.validated.set(self.validated.get() + 1);
        let failures = self.failures.borrow();
        let nested = self.nested.borrow();
        if failures.is_empty() && nested.is_none() {
            return Ok(());
        }
        let this: ExprRef = Rc::new(PlainExpr(self.name.clone()));
        let mut errors = ValidationErrors::new();
        for failure in failures.iter() {
            errors.add(&this, failure);
        }
        if let Some(nested) = nested.clone() {
            errors.add_error(&this, nested.into());
        }
        Err(errors.into())
    }
}

impl Finalizer for TestExpr {
    fn finalize(&self) {
        self.finalized.set(self.finalized.get() + 1);
        let mut description = self.description.borrow_mut();
        if description.is_none() {
            *description = Some(format!("{} (default)", self.name));
        }
    }
}

/// Root exposing a fixed list of expression sets.
pub struct TestRoot {
    pub name: String,
    pub deps: RefCell<Vec<RootRef>>,
    pub sets: Vec<ExpressionSet>,
    pub iterations: Cell<usize>,
}

impl TestRoot {
    pub fn new(name: &str, sets: Vec<ExpressionSet>) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            deps: RefCell::new(Vec::new()),
            sets,
            iterations: Cell::new(0),
        })
    }

    pub fn single(name: &str, exprs: Vec<ExprRef>) -> Rc<Self> {
        Self::new(name, vec![exprs.into_iter().collect()])
    }

    pub fn add_dependency(&self, root: RootRef) {
        self.deps.borrow_mut().push(root);
    }
}

impl Root for TestRoot {
    fn dsl_name(&self) -> String {
        self.name.clone()
    }

    fn depends_on(&self) -> Vec<RootRef> {
        self.deps.borrow().clone()
    }

    fn iterate_sets(&self, ctx: &mut EvalContext, it: &mut SetIterator<'_>) -> EvalResult<()> {
        self.iterations.set(self.iterations.get() + 1);
        for set in &self.sets {
            it(ctx, set)?;
        }
        Ok(())
    }
}

/// Root that ignores the result of the set iterator.
pub struct CarelessRoot(pub Vec<ExpressionSet>);

impl Root for CarelessRoot {
    fn dsl_name(&self) -> String {
        "careless".to_string()
    }

    fn iterate_sets(&self, ctx: &mut EvalContext, it: &mut SetIterator<'_>) -> EvalResult<()> {
        for set in &self.0 {
            let _ = it(ctx, set);
        }
        Ok(())
    }
}

pub fn as_expr<T: Expression>(expr: &Rc<T>) -> ExprRef {
    expr.clone()
}

pub fn as_root<T: Root + 'static>(root: &Rc<T>) -> RootRef {
    root.clone()
}
