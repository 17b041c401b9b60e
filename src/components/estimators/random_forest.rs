//! Random forest classifier component

use crate::components::{
    config_to_parameters, parse_parameters, Component, ComponentBase, ComponentParameters,
    Estimator,
};
use crate::data::{frame_to_array, target_to_array};
use crate::error::{PipelineError, Result};
use crate::model_types::ModelFamily;
use crate::problem_types::ProblemType;
use crate::training::RandomForest;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keyword arguments of the Random Forest Classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RandomForestClassifierConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub random_state: u64,
}

impl Default for RandomForestClassifierConfig {
    fn default() -> Self {
        Self {
            n_estimators: 10,
            max_depth: None,
            random_state: 0,
        }
    }
}

impl RandomForestClassifierConfig {
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PipelineError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "must be at least 1",
            ));
        }
        if self.max_depth == Some(0) {
            return Err(PipelineError::invalid_parameter("max_depth", 0, "must be at least 1"));
        }
        Ok(())
    }
}

/// Random forest over gini-split decision trees
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    config: RandomForestClassifierConfig,
    model: RandomForest,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::build(RandomForestClassifierConfig::default())
    }
}

impl RandomForestClassifier {
    pub const NAME: &'static str = "Random Forest Classifier";

    const PROBLEM_TYPES: [ProblemType; 2] = [ProblemType::Binary, ProblemType::Multiclass];

    pub fn new(config: RandomForestClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub fn from_parameters(parameters: &ComponentParameters) -> Result<Self> {
        Self::new(parse_parameters(Self::NAME, parameters)?)
    }

    fn build(config: RandomForestClassifierConfig) -> Self {
        let mut model = RandomForest::new(config.n_estimators).with_random_state(config.random_state);
        if let Some(depth) = config.max_depth {
            model = model.with_max_depth(depth);
        }
        Self { config, model }
    }
}

impl ComponentBase for RandomForestClassifier {
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

impl Estimator for RandomForestClassifier {
    fn fit(&mut self, x: &DataFrame, y: &Series) -> Result<()> {
        let x_arr = frame_to_array(x)?;
        let y_arr = target_to_array(y)?;
        self.model.fit(&x_arr, &y_arr)?;
        debug!(trees = self.model.n_trees(), "fitted random forest classifier");
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
        &Self::PROBLEM_TYPES
    }

    fn model_family(&self) -> ModelFamily {
        ModelFamily::RandomForest
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.model.feature_importances().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_predict_frame() {
        let df = df!(
            "a" => &[0.0, 0.1, 0.2, 1.0, 1.1, 1.2],
            "b" => &[5.0, 5.1, 5.2, 0.0, 0.1, 0.2]
        )
        .unwrap();
        let y = Series::new("y".into(), &[0i32, 0, 0, 1, 1, 1]);

        let mut rf = RandomForestClassifier::default();
        rf.fit(&df, &y).unwrap();

        assert_eq!(rf.classes(), &[0.0, 1.0]);
        assert_eq!(rf.predict(&df).unwrap().len(), 6);
        assert_eq!(rf.predict_proba(&df).unwrap().dim(), (6, 2));
        assert_eq!(rf.feature_importances().unwrap().len(), 2);
    }

    #[test]
    fn test_supports_classification_only() {
        let rf = RandomForestClassifier::default();
        assert!(rf.problem_types().contains(&ProblemType::Multiclass));
        assert!(!rf.problem_types().contains(&ProblemType::Regression));
        assert_eq!(rf.model_family(), ModelFamily::RandomForest);
    }

    #[test]
    fn test_rejects_zero_estimators() {
        let config = RandomForestClassifierConfig::default().with_n_estimators(0);
        assert!(matches!(
            RandomForestClassifier::new(config),
            Err(PipelineError::InvalidParameter { .. })
        ));
    }
}
