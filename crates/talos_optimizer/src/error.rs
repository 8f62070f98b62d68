use std::fmt::Display;

use thiserror::Error;

/// Why a piece of input was rejected. The variant name is what the user
/// sees. `Missing` means a field was absent, `Empty` that it was present
/// but blank; `MissingOrEmpty` covers the spots where the two cannot be
/// told apart, such as a choice of fields where none was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Missing,
    Empty,
    MissingOrEmpty,
    NotUnique,
    LessThanZero,
    LessThanOrEqualToZero,
    Unrecognized,
    Invalid,
}

impl Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValidationErrorKind::Missing => "Missing",
            ValidationErrorKind::Empty => "Empty",
            ValidationErrorKind::MissingOrEmpty => "MissingOrEmpty",
            ValidationErrorKind::NotUnique => "NotUnique",
            ValidationErrorKind::LessThanZero => "LessThanZero",
            ValidationErrorKind::LessThanOrEqualToZero => "LessThanOrEqualToZero",
            ValidationErrorKind::Unrecognized => "Unrecognized",
            ValidationErrorKind::Invalid => "Invalid",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed because {context} is {kind}.")]
pub struct ValidationError {
    pub context: String,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(context: impl Into<String>, kind: ValidationErrorKind) -> Self {
        ValidationError {
            context: context.into(),
            kind,
        }
    }
}

/// Failures raised while the routing model is being built or solved.
///
/// Solver infeasibility and timeouts are deliberately not here: an empty
/// assignment is reported as an itinerary with every job skipped.
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("no eligible worker exists for required job {0}")]
    NoViableWorker(String),
    #[error("arrival window of job {0} is unsatisfiable")]
    InvalidWindow(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}
