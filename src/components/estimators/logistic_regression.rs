//! Logistic regression classifier component

use crate::components::{
    config_to_parameters, parse_parameters, Component, ComponentBase, ComponentParameters,
    Estimator,
};
use crate::data::{frame_to_array, target_to_array};
use crate::error::{PipelineError, Result};
use crate::model_types::ModelFamily;
use crate::problem_types::ProblemType;
use crate::training::{LogisticRegression, Penalty};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Keyword arguments of the Logistic Regression Classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogisticRegressionConfig {
    pub penalty: Penalty,
    /// Inverse regularization strength
    #[serde(rename = "C")]
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self {
            penalty: Penalty::L2,
            c: 1.0,
            max_iter: 1000,
            learning_rate: 0.1,
        }
    }
}

impl LogisticRegressionConfig {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_penalty(mut self, penalty: Penalty) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) {
            return Err(PipelineError::invalid_parameter("C", self.c, "must be positive"));
        }
        if self.max_iter == 0 {
            return Err(PipelineError::invalid_parameter("max_iter", 0, "must be at least 1"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(PipelineError::invalid_parameter(
                "learning_rate",
                self.learning_rate,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Binary logistic regression trained by gradient descent
#[derive(Debug, Clone)]
pub struct LogisticRegressionClassifier {
    config: LogisticRegressionConfig,
    model: LogisticRegression,
}

impl Default for LogisticRegressionClassifier {
    fn default() -> Self {
        Self::build(LogisticRegressionConfig::default())
    }
}

impl LogisticRegressionClassifier {
    pub const NAME: &'static str = "Logistic Regression Classifier";

    pub fn new(config: LogisticRegressionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub fn from_parameters(parameters: &ComponentParameters) -> Result<Self> {
        Self::new(parse_parameters(Self::NAME, parameters)?)
    }

    fn build(config: LogisticRegressionConfig) -> Self {
        let model = LogisticRegression::new()
            .with_penalty(config.penalty)
            .with_c(config.c)
            .with_max_iter(config.max_iter)
            .with_learning_rate(config.learning_rate);
        Self { config, model }
    }
}

impl ComponentBase for LogisticRegressionClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> ComponentParameters {
        config_to_parameters(&self.config)
    }

    fn instantiate(&self, parameters: &ComponentParameters) -> Result<Component> {
        Ok(Component::estimator(Self::from_parameters(parameters)?))
    }
}

impl Estimator for LogisticRegressionClassifier {
    fn fit(&mut self, x: &DataFrame, y: &Series) -> Result<()> {
        let x_arr = frame_to_array(x)?;
        let y_arr = target_to_array(y)?;
        self.model.fit(&x_arr, &y_arr)?;
        Ok(())
    }

    fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        self.model.predict(&frame_to_array(x)?)
    }

    fn predict_proba(&self, x: &DataFrame) -> Result<Array2<f64>> {
        self.model.predict_proba(&frame_to_array(x)?)
    }

    fn classes(&self) -> &[f64] {
        self.model.classes()
    }

    fn problem_types(&self) -> &[ProblemType] {
        &[ProblemType::Binary]
    }

    fn model_family(&self) -> ModelFamily {
        ModelFamily::LinearModel
    }

    /// Coefficients in standardized feature space
    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.model.coefficients.clone()
    }
}
