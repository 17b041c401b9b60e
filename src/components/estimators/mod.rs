//! Built-in estimator components

pub mod logistic_regression;
pub mod random_forest;

pub use logistic_regression::{LogisticRegressionClassifier, LogisticRegressionConfig};
pub use random_forest::{RandomForestClassifier, RandomForestClassifierConfig};
