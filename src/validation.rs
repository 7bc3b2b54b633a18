//! Validation error batches.
//!
//! A [`ValidationErrors`] pairs every failure with the expression that produced it. Batches
//! are always flat: adding or merging a batch appends its entries instead of nesting it.

use std::fmt;

use crate::error::DslError;
use crate::expression::ExprRef;

#[derive(Clone, Default)]
pub struct ValidationErrors {
    errors: Vec<DslError>,
    exprs: Vec<ExprRef>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a failure for `expr`.
    pub fn add(&mut self, expr: &ExprRef, message: impl fmt::Display) {
        self.add_error(expr, DslError::Message(message.to_string()));
    }

    /// Add an existing error for `expr`. A batch is flattened into this one and keeps the
    /// attribution of its own entries.
    pub fn add_error(&mut self, expr: &ExprRef, error: DslError) {
        match error {
            DslError::Validation(batch) => self.merge(batch),
            error => {
                self.errors.push(error);
                self.exprs.push(expr.clone());
            }
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
        self.exprs.extend(other.exprs);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ExprRef, &DslError)> {
        self.exprs.iter().zip(self.errors.iter())
    }

    /// Rendered lines, one per failure.
    pub fn messages(&self) -> Vec<String> {
        self.iter()
            .map(|(expr, err)| format!("{}: {}", expr.eval_name(), err))
            .collect()
    }

    /// `Ok(())` for an empty batch, the batch as an error otherwise.
    pub fn into_result(self) -> Result<(), DslError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DslError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("\n"))
    }
}

impl fmt::Debug for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.messages()).finish()
    }
}

impl std::error::Error for ValidationErrors {}
