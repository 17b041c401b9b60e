//! Hyperparameter search spaces attached to pipeline templates

use crate::error::{PipelineError, Result};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Range or set a hyperparameter is drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    /// Continuous float parameter
    Float { low: f64, high: f64, log_scale: bool },
    /// Integer parameter, both bounds inclusive
    Int { low: i64, high: i64 },
    /// Categorical parameter
    Categorical { choices: Vec<String> },
    /// Boolean parameter
    Boolean,
}

/// A single hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParameterType,
}

impl Parameter {
    /// Create a float parameter
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float {
                low,
                high,
                log_scale: false,
            },
        }
    }

    /// Create a log-scale float parameter
    pub fn log_float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Float {
                low,
                high,
                log_scale: true,
            },
        }
    }

    /// Create an integer parameter
    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Int { low, high },
        }
    }

    /// Create a categorical parameter
    pub fn categorical(name: impl Into<String>, choices: &[&str]) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Categorical {
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
        }
    }

    /// Create a boolean parameter
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::Boolean,
        }
    }

    /// Reject empty or inverted ranges
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| -> Result<()> {
            Err(PipelineError::invalid_parameter(
                &self.name,
                format!("{:?}", self.param_type),
                reason,
            ))
        };
        match &self.param_type {
            ParameterType::Float { low, high, log_scale } => {
                if !(low <= high) {
                    return invalid("low must not exceed high");
                }
                if *log_scale && *low <= 0.0 {
                    return invalid("log-scale bounds must be positive");
                }
            }
            ParameterType::Int { low, high } => {
                if low > high {
                    return invalid("low must not exceed high");
                }
            }
            ParameterType::Categorical { choices } => {
                if choices.is_empty() {
                    return invalid("needs at least one choice");
                }
            }
            ParameterType::Boolean => {}
        }
        Ok(())
    }

    /// Whether a value lies inside this parameter's range or choices
    pub fn contains(&self, value: &ParameterValue) -> bool {
        match (&self.param_type, value) {
            (ParameterType::Float { low, high, .. }, ParameterValue::Float(v)) => {
                *low <= *v && *v <= *high
            }
            (ParameterType::Int { low, high }, ParameterValue::Int(v)) => low <= v && v <= high,
            (ParameterType::Categorical { choices }, ParameterValue::String(s)) => {
                choices.contains(s)
            }
            (ParameterType::Boolean, ParameterValue::Bool(_)) => true,
            _ => false,
        }
    }

    /// Sample a random value
    pub fn sample(&self, rng: &mut impl Rng) -> ParameterValue {
        match &self.param_type {
            ParameterType::Float { low, high, log_scale } => {
                let val = if *log_scale {
                    let log_low = low.ln();
                    let log_high = high.ln();
                    (rng.gen::<f64>() * (log_high - log_low) + log_low).exp()
                } else {
                    rng.gen::<f64>() * (high - low) + low
                };
                // exp(ln(x)) can land a hair outside the bounds
                ParameterValue::Float(val.clamp(*low, *high))
            }
            ParameterType::Int { low, high } => ParameterValue::Int(rng.gen_range(*low..=*high)),
            ParameterType::Categorical { choices } => {
                let idx = rng.gen_range(0..choices.len());
                ParameterValue::String(choices[idx].clone())
            }
            ParameterType::Boolean => ParameterValue::Bool(rng.gen()),
        }
    }
}

/// Sampled parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
    Int(i64),
    String(String),
    Bool(bool),
}

impl ParameterValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ParameterValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Keyword-argument form of the value
    pub fn to_json(&self) -> Value {
        match self {
            ParameterValue::Float(v) => Value::from(*v),
            ParameterValue::Int(v) => Value::from(*v),
            ParameterValue::String(v) => Value::from(v.as_str()),
            ParameterValue::Bool(v) => Value::from(*v),
        }
    }
}

/// Sampled configuration, keyed by parameter name
pub type TrialParams = HashMap<String, ParameterValue>;

/// Search space for hyperparameter optimization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
}

impl SearchSpace {
    /// Create a new empty search space
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the search space
    pub fn add(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add a float parameter
    pub fn float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::float(name, low, high))
    }

    /// Add a log-scale float parameter
    pub fn log_float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Parameter::log_float(name, low, high))
    }

    /// Add an integer parameter
    pub fn int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(Parameter::int(name, low, high))
    }

    /// Add a categorical parameter
    pub fn categorical(self, name: impl Into<String>, choices: &[&str]) -> Self {
        self.add(Parameter::categorical(name, choices))
    }

    /// Add a boolean parameter
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.add(Parameter::boolean(name))
    }

    /// Get all parameters
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Validate every parameter, and reject duplicate names
    pub fn validate(&self) -> Result<()> {
        for (i, param) in self.parameters.iter().enumerate() {
            param.validate()?;
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(PipelineError::invalid_parameter(
                    &param.name,
                    &param.name,
                    "duplicate parameter name",
                ));
            }
        }
        Ok(())
    }

    /// Sample a random configuration
    pub fn sample(&self, rng: &mut impl Rng) -> TrialParams {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.sample(rng)))
            .collect()
    }

    /// Sample a configuration reproducibly from a seed
    pub fn sample_seeded(&self, seed: u64) -> TrialParams {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.sample(&mut rng)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Get parameter names in order
    pub fn param_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_space_builder() {
        let space = SearchSpace::new()
            .float("percent_features", 0.01, 1.0)
            .int("n_estimators", 10, 1000)
            .categorical("impute_strategy", &["mean", "median", "most_frequent"])
            .boolean("bootstrap");

        assert_eq!(space.len(), 4);
        assert!(space.validate().is_ok());
        assert!(space.get("n_estimators").is_some());
    }

    #[test]
    fn test_log_scale_sampling_stays_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let param = Parameter::log_float("C", 0.01, 10.0);

        for _ in 0..100 {
            let value = param.sample(&mut rng);
            assert!(param.contains(&value), "{:?} out of range", value);
        }
    }

    #[test]
    fn test_categorical_sampling() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let param = Parameter::categorical("impute_strategy", &["a", "b", "c"]);

        match param.sample(&mut rng) {
            ParameterValue::String(s) => assert!(["a", "b", "c"].contains(&s.as_str())),
            other => panic!("Expected string value, got {:?}", other),
        }
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let space = SearchSpace::new()
            .int("max_depth", 1, 32)
            .float("percent_features", 0.01, 1.0);
        assert_eq!(space.sample_seeded(7), space.sample_seeded(7));
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        assert!(Parameter::int("n", 5, 1).validate().is_err());
        assert!(Parameter::log_float("C", 0.0, 1.0).validate().is_err());
        assert!(Parameter::categorical("s", &[]).validate().is_err());

        let duplicated = SearchSpace::new().int("n", 1, 2).int("n", 1, 3);
        assert!(duplicated.validate().is_err());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(ParameterValue::Int(3).to_json(), serde_json::json!(3));
        assert_eq!(
            ParameterValue::String("mean".into()).to_json(),
            serde_json::json!("mean")
        );
    }
}
