//! Pipeline templates: static component graphs with their search spaces

use super::Parameters;
use crate::components::{
    ComponentParameters, ComponentRef, ComponentRegistry, LogisticRegressionClassifier,
    OneHotEncoder, RFClassifierSelectFromModel, RandomForestClassifier, SimpleImputer,
};
use crate::error::{PipelineError, Result};
use crate::optimizer::{SearchSpace, TrialParams};
use crate::problem_types::ProblemType;

/// Static description of a pipeline
pub trait PipelineTemplate {
    /// Components in pipeline order; the last one must be an estimator
    fn component_graph(&self) -> Vec<ComponentRef>;

    /// Problem types the pipeline claims to support
    fn problem_types(&self) -> Vec<ProblemType>;

    /// Search space of tunable hyperparameters
    fn hyperparameters(&self) -> SearchSpace {
        SearchSpace::new()
    }

    /// Display name overriding the one derived from the components
    fn custom_name(&self) -> Option<String> {
        None
    }

    /// Route a sampled trial to the components that accept each key.
    ///
    /// A hyperparameter is handed to every component whose default
    /// parameters contain its name. Keys no component accepts are rejected.
    fn parameters_from_trial(
        &self,
        registry: &ComponentRegistry,
        trial: &TrialParams,
    ) -> Result<Parameters> {
        let mut defaults = Vec::new();
        for reference in self.component_graph() {
            let component = registry.resolve(&reference, &ComponentParameters::new())?;
            defaults.push((component.name().to_string(), component.parameters()));
        }

        let mut keys: Vec<&String> = trial.keys().collect();
        keys.sort();

        let mut parameters = Parameters::new();
        for key in keys {
            let mut routed = false;
            for (component, accepted) in &defaults {
                if accepted.contains_key(key.as_str()) {
                    parameters
                        .entry(component.clone())
                        .or_default()
                        .insert(key.clone(), trial[key].to_json());
                    routed = true;
                }
            }
            if !routed {
                return Err(PipelineError::invalid_parameter(
                    key.as_str(),
                    trial[key].to_json(),
                    "no component in the graph accepts this hyperparameter",
                ));
            }
        }
        Ok(parameters)
    }
}

/// Random forest classification over imputed, encoded and selected features
#[derive(Debug, Clone, Copy, Default)]
pub struct RFClassificationPipeline;

impl PipelineTemplate for RFClassificationPipeline {
    fn component_graph(&self) -> Vec<ComponentRef> {
        vec![
            SimpleImputer::NAME.into(),
            OneHotEncoder::NAME.into(),
            RFClassifierSelectFromModel::NAME.into(),
            RandomForestClassifier::NAME.into(),
        ]
    }

    fn problem_types(&self) -> Vec<ProblemType> {
        vec![ProblemType::Binary, ProblemType::Multiclass]
    }

    fn hyperparameters(&self) -> SearchSpace {
        SearchSpace::new()
            .int("n_estimators", 10, 1000)
            .int("max_depth", 1, 32)
            .categorical("impute_strategy", &["mean", "median", "most_frequent"])
            .float("percent_features", 0.01, 1.0)
    }
}

/// Logistic regression over imputed, encoded features
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticRegressionPipeline;

impl PipelineTemplate for LogisticRegressionPipeline {
    fn component_graph(&self) -> Vec<ComponentRef> {
        vec![
            SimpleImputer::NAME.into(),
            OneHotEncoder::NAME.into(),
            LogisticRegressionClassifier::NAME.into(),
        ]
    }

    fn problem_types(&self) -> Vec<ProblemType> {
        vec![ProblemType::Binary]
    }

    fn hyperparameters(&self) -> SearchSpace {
        SearchSpace::new()
            .categorical("impute_strategy", &["mean", "median", "most_frequent"])
            .log_float("C", 0.01, 10.0)
    }
}

/// Template assembled at runtime from registry names
#[derive(Debug, Clone, Default)]
pub struct CustomPipeline {
    component_names: Vec<String>,
    problem_types: Vec<ProblemType>,
    hyperparameters: SearchSpace,
    name: Option<String>,
}

impl CustomPipeline {
    pub fn new<S: Into<String>>(
        component_names: impl IntoIterator<Item = S>,
        problem_types: Vec<ProblemType>,
    ) -> Self {
        Self {
            component_names: component_names.into_iter().map(Into::into).collect(),
            problem_types,
            hyperparameters: SearchSpace::new(),
            name: None,
        }
    }

    pub fn with_hyperparameters(mut self, hyperparameters: SearchSpace) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl PipelineTemplate for CustomPipeline {
    fn component_graph(&self) -> Vec<ComponentRef> {
        self.component_names
            .iter()
            .map(|name| ComponentRef::Name(name.clone()))
            .collect()
    }

    fn problem_types(&self) -> Vec<ProblemType> {
        self.problem_types.clone()
    }

    fn hyperparameters(&self) -> SearchSpace {
        self.hyperparameters.clone()
    }

    fn custom_name(&self) -> Option<String> {
        self.name.clone()
    }
}
