//! Supported machine learning problem types

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Problem type a pipeline or estimator can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemType {
    /// Two-class classification
    Binary,
    /// Classification with more than two classes
    Multiclass,
    /// Continuous target
    Regression,
}

impl ProblemType {
    /// All known problem types
    pub const ALL: [ProblemType; 3] = [
        ProblemType::Binary,
        ProblemType::Multiclass,
        ProblemType::Regression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Binary => "binary",
            ProblemType::Multiclass => "multiclass",
            ProblemType::Regression => "regression",
        }
    }

    /// Whether this is a classification problem
    pub fn is_classification(&self) -> bool {
        matches!(self, ProblemType::Binary | ProblemType::Multiclass)
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "binary" => Ok(ProblemType::Binary),
            "multiclass" | "multi_class" | "multi-class" => Ok(ProblemType::Multiclass),
            "regression" => Ok(ProblemType::Regression),
            other => Err(PipelineError::invalid_parameter(
                "problem_type",
                other,
                format!(
                    "valid problem types are {}",
                    ProblemType::ALL.map(|p| p.as_str()).join(", ")
                ),
            )),
        }
    }
}

/// Parse a list of problem type names
pub fn handle_problem_types<S: AsRef<str>>(problem_types: &[S]) -> Result<Vec<ProblemType>> {
    problem_types.iter().map(|p| p.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_problem_types() {
        assert_eq!("binary".parse::<ProblemType>().unwrap(), ProblemType::Binary);
        assert_eq!("MultiClass".parse::<ProblemType>().unwrap(), ProblemType::Multiclass);
        assert!("clustering".parse::<ProblemType>().is_err());
    }

    #[test]
    fn test_handle_problem_types() {
        let parsed = handle_problem_types(&["binary", "multiclass"]).unwrap();
        assert_eq!(parsed, vec![ProblemType::Binary, ProblemType::Multiclass]);
    }

    #[test]
    fn test_problem_type_serialize() {
        let json = serde_json::to_string(&ProblemType::Multiclass).unwrap();
        assert_eq!(json, "\"multiclass\"");
    }
}
