//! Error types for pipeline construction, fitting and scoring

use crate::problem_types::ProblemType;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline framework
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A component constructor rejected its keyword arguments
    #[error("Error received when instantiating component {component} with the following arguments {arguments}")]
    ComponentInstantiation {
        component: String,
        arguments: String,
        source: Box<PipelineError>,
    },

    #[error("Invalid pipeline structure: {0}")]
    InvalidPipelineStructure(String),

    #[error("Problem type {problem_type} not valid for this component graph. Valid problem types include {}", format_problem_types(.valid))]
    UnsupportedProblemType {
        problem_type: ProblemType,
        valid: Vec<ProblemType>,
    },

    #[error("Pipeline not fitted: call fit before using this method")]
    NotFitted,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Objective not found: {0}")]
    ObjectiveNotFound(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

fn format_problem_types(problem_types: &[ProblemType]) -> String {
    let names: Vec<String> = problem_types.iter().map(|p| p.to_string()).collect();
    format!("[{}]", names.join(", "))
}

impl PipelineError {
    /// Shorthand for an `InvalidParameter` error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = PipelineError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::IoError(_)));
    }

    #[test]
    fn test_unsupported_problem_type_lists_valid_types() {
        let err = PipelineError::UnsupportedProblemType {
            problem_type: ProblemType::Regression,
            valid: vec![ProblemType::Binary, ProblemType::Multiclass],
        };
        assert_eq!(
            err.to_string(),
            "Problem type regression not valid for this component graph. Valid problem types include [binary, multiclass]"
        );
    }

    #[test]
    fn test_instantiation_error_keeps_source() {
        let err = PipelineError::ComponentInstantiation {
            component: "Simple Imputer".to_string(),
            arguments: "{\"impute_strategy\":\"fake\"}".to_string(),
            source: Box::new(PipelineError::invalid_parameter("impute_strategy", "fake", "unknown strategy")),
        };
        assert!(err.to_string().contains("Simple Imputer"));
        assert!(err.to_string().contains("impute_strategy"));
        assert!(err.source().is_some());
    }
}
