//! Feature selection driven by random forest importances

use crate::components::{
    config_to_parameters, parse_parameters, Component, ComponentBase, ComponentParameters,
    Transformer,
};
use crate::data::{column_names, frame_to_array, target_to_array};
use crate::error::{PipelineError, Result};
use crate::training::RandomForest;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Named importance cut-offs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdRule {
    #[serde(rename = "-inf")]
    NegInfinity,
    #[serde(rename = "mean")]
    Mean,
    #[serde(rename = "median")]
    Median,
}

/// Minimum importance a feature needs to be kept
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Value(f64),
    Rule(ThresholdRule),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Rule(ThresholdRule::NegInfinity)
    }
}

impl Threshold {
    /// Resolve the cut-off against fitted importances
    pub fn resolve(&self, importances: &[f64]) -> f64 {
        match *self {
            Threshold::Value(v) => v,
            Threshold::Rule(ThresholdRule::NegInfinity) => f64::NEG_INFINITY,
            Threshold::Rule(ThresholdRule::Mean) => {
                if importances.is_empty() {
                    0.0
                } else {
                    importances.iter().sum::<f64>() / importances.len() as f64
                }
            }
            Threshold::Rule(ThresholdRule::Median) => {
                let mut sorted = importances.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let n = sorted.len();
                match n {
                    0 => 0.0,
                    _ if n % 2 == 0 => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
                    _ => sorted[n / 2],
                }
            }
        }
    }
}

/// Keyword arguments of the RF Classifier Select From Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RFSelectFromModelConfig {
    /// Hard cap on the number of kept features
    pub number_features: Option<usize>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    /// Fraction of features kept when `number_features` is unset
    pub percent_features: f64,
    pub threshold: Threshold,
    pub random_state: u64,
}

impl Default for RFSelectFromModelConfig {
    fn default() -> Self {
        Self {
            number_features: None,
            n_estimators: 10,
            max_depth: None,
            percent_features: 0.5,
            threshold: Threshold::default(),
            random_state: 0,
        }
    }
}

impl RFSelectFromModelConfig {
    pub fn with_number_features(mut self, n: usize) -> Self {
        self.number_features = Some(n);
        self
    }

    pub fn with_percent_features(mut self, percent: f64) -> Self {
        self.percent_features = percent;
        self
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.percent_features > 0.0 && self.percent_features <= 1.0) {
            return Err(PipelineError::invalid_parameter(
                "percent_features",
                self.percent_features,
                "must be in (0, 1]",
            ));
        }
        if self.n_estimators == 0 {
            return Err(PipelineError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "must be at least 1",
            ));
        }
        if self.number_features == Some(0) {
            return Err(PipelineError::invalid_parameter(
                "number_features",
                0,
                "must be at least 1",
            ));
        }
        if self.max_depth == Some(0) {
            return Err(PipelineError::invalid_parameter("max_depth", 0, "must be at least 1"));
        }
        if let Threshold::Value(v) = self.threshold {
            if v.is_nan() {
                return Err(PipelineError::invalid_parameter("threshold", v, "must not be NaN"));
            }
        }
        Ok(())
    }
}

/// Keeps the features a random forest ranks as most important
#[derive(Debug, Clone, Default)]
pub struct RFClassifierSelectFromModel {
    config: RFSelectFromModelConfig,
    selected: Vec<String>,
    importances: Vec<(String, f64)>,
    is_fitted: bool,
}

impl RFClassifierSelectFromModel {
    pub const NAME: &'static str = "RF Classifier Select From Model";

    pub fn new(config: RFSelectFromModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            selected: Vec::new(),
            importances: Vec::new(),
            is_fitted: false,
        })
    }

    pub fn from_parameters(parameters: &ComponentParameters) -> Result<Self> {
        Self::new(parse_parameters(Self::NAME, parameters)?)
    }

    /// Names of the kept features, in input order
    pub fn selected_features(&self) -> &[String] {
        &self.selected
    }

    /// Importance of every input feature seen during fit
    pub fn importances(&self) -> &[(String, f64)] {
        &self.importances
    }

    fn max_kept(&self, n_features: usize) -> usize {
        match self.config.number_features {
            Some(n) => n,
            None => ((self.config.percent_features * n_features as f64).ceil() as usize).max(1),
        }
    }
}

impl ComponentBase for RFClassifierSelectFromModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> ComponentParameters {
        config_to_parameters(&self.config)
    }

    fn instantiate(&self, parameters: &ComponentParameters) -> Result<Component> {
        Ok(Component::transformer(Self::from_parameters(parameters)?))
    }
}

impl Transformer for RFClassifierSelectFromModel {
    fn fit(&mut self, x: &DataFrame, y: Option<&Series>) -> Result<()> {
        let y = y.ok_or_else(|| {
            PipelineError::DataError(format!("{} requires a target to fit", Self::NAME))
        })?;
        if x.width() == 0 {
            return Err(PipelineError::DataError(
                "no features to select from".to_string(),
            ));
        }

        let names = column_names(x);
        let x_arr = frame_to_array(x)?;
        let y_arr = target_to_array(y)?;

        let mut forest =
            RandomForest::new(self.config.n_estimators).with_random_state(self.config.random_state);
        if let Some(depth) = self.config.max_depth {
            forest = forest.with_max_depth(depth);
        }
        forest.fit(&x_arr, &y_arr)?;

        let importances: Vec<f64> = forest
            .feature_importances()
            .map(|imp| imp.to_vec())
            .unwrap_or_else(|| vec![0.0; names.len()]);
        let threshold = self.config.threshold.resolve(&importances);

        let mut ranked: Vec<usize> = (0..names.len())
            .filter(|&i| importances[i] >= threshold)
            .collect();
        // Stable sort keeps input order among equal importances
        ranked.sort_by(|&a, &b| importances[b].total_cmp(&importances[a]));
        ranked.truncate(self.max_kept(names.len()));
        ranked.sort_unstable();

        self.selected = ranked.iter().map(|&i| names[i].clone()).collect();
        self.importances = names.into_iter().zip(importances).collect();
        self.is_fitted = true;

        debug!(
            selected = self.selected.len(),
            total = self.importances.len(),
            "fitted feature selector"
        );
        Ok(())
    }

    fn transform(&self, x: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::NotFitted);
        }

        let columns = self
            .selected
            .iter()
            .map(|name| {
                x.column(name)
                    .cloned()
                    .map_err(|_| PipelineError::FeatureNotFound(name.clone()))
            })
            .collect::<Result<Vec<Column>>>()?;

        Ok(DataFrame::new(columns)?)
    }
}
