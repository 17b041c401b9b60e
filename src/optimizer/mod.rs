//! Hyperparameter search spaces

pub mod search_space;

pub use search_space::{Parameter, ParameterType, ParameterValue, SearchSpace, TrialParams};
