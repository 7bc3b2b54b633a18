use std::fmt;

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Name used when an error is reported outside of any expression.
pub const TOP_LEVEL_NAME: &str = "top-level";

/// A failure attributed to a single expression.
#[derive(Error, Debug, Clone)]
pub enum DslError {
    #[error("{0}")]
    Message(String),

    #[error("invalid use of {construct}")]
    IncompatibleDsl { construct: String },

    #[error("cannot use {actual} (type {actual_type}) as type {expected}")]
    InvalidArgument {
        expected: String,
        actual: String,
        actual_type: String,
    },

    #[error("{0}")]
    Validation(ValidationErrors),
}

impl DslError {
    pub fn message<S: Into<String>>(message: S) -> Self {
        DslError::Message(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DslError::Validation(_))
    }
}

impl From<ValidationErrors> for DslError {
    fn from(errors: ValidationErrors) -> Self {
        DslError::Validation(errors)
    }
}

/// Location of the call that reported an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl From<&std::panic::Location<'_>> for SourceLocation {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A recorded error: the failure, the expression that owned it and where it was reported.
///
/// `Display` renders `<owner>: <message>`. The alternate form (`{:#}`) prefixes the
/// location as `[file:line] ` when one was captured.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub error: DslError,
    pub owner: Option<String>,
    pub location: Option<SourceLocation>,
}

impl ErrorRecord {
    pub fn new(error: DslError) -> Self {
        Self {
            error,
            owner: None,
            location: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl From<DslError> for ErrorRecord {
    fn from(error: DslError) -> Self {
        ErrorRecord::new(error)
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            if let Some(location) = &self.location {
                write!(f, "[{}] ", location)?;
            }
        }
        match &self.owner {
            Some(owner) => write!(f, "{}: {}", owner, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ErrorRecord {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The ordered list of errors accumulated during a run.
#[derive(Debug, Clone, Default)]
pub struct MultiError {
    records: Vec<ErrorRecord>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a ErrorRecord;
    type IntoIter = std::slice::Iter<'a, ErrorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if f.alternate() {
                write!(f, "{:#}", record)?;
            } else {
                write!(f, "{}", record)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

/// Errors returned by an evaluation run.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    #[error("{0}")]
    Dsl(MultiError),

    #[error("dependency cycle between roots: {}", .cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    #[error("missing root {dependency}: {root} depends on it")]
    MissingDependency { root: String, dependency: String },

    #[error("too many generated roots, infinite loop? (limit {limit})")]
    TooManyRoots { limit: usize },

    #[error("too many generated expressions, infinite loop? (limit {limit})")]
    TooManyExpressions { limit: usize },
}

impl EvalError {
    /// Errors that stop the run at the point of detection.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EvalError::Dsl(_))
    }

    /// The accumulated errors, for runs that failed execution or validation.
    pub fn records(&self) -> Option<&MultiError> {
        match self {
            EvalError::Dsl(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<MultiError> for EvalError {
    fn from(errors: MultiError) -> Self {
        EvalError::Dsl(errors)
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
