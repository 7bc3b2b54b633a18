use crate::expression::ExprRef;

/// Stack of the expressions whose initializers are currently running, innermost last.
#[derive(Clone, Default)]
pub struct ExpressionStack {
    exprs: Vec<ExprRef>,
}

impl ExpressionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the scope of `expr`
    pub fn push(&mut self, expr: ExprRef) {
        self.exprs.push(expr);
    }

    /// Leave the innermost scope
    pub fn pop(&mut self) -> Option<ExprRef> {
        self.exprs.pop()
    }

    /// Innermost expression, if any
    pub fn current(&self) -> Option<&ExprRef> {
        self.exprs.last()
    }

    pub fn depth(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Qualified names from outermost to innermost.
    pub fn names(&self) -> Vec<String> {
        self.exprs.iter().map(|e| e.eval_name()).collect()
    }

    pub fn clear(&mut self) {
        self.exprs.clear();
    }
}
