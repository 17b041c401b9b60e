//! Pipeline components
//!
//! A component is one stage of a pipeline: either a [`Transformer`] that maps
//! features to new features, or an [`Estimator`] that produces predictions.
//! Components are constructed from keyword arguments
//! ([`ComponentParameters`]) and can describe themselves through a
//! [`Logger`].

pub mod estimators;
pub mod registry;
pub mod transformers;

pub use estimators::{LogisticRegressionClassifier, RandomForestClassifier};
pub use registry::{handle_component, ComponentFactory, ComponentRef, ComponentRegistry};
pub use transformers::{OneHotEncoder, RFClassifierSelectFromModel, SimpleImputer};

use crate::error::{PipelineError, Result};
use crate::model_types::ModelFamily;
use crate::problem_types::ProblemType;
use crate::utils::Logger;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

/// Keyword arguments of a single component
pub type ComponentParameters = serde_json::Map<String, Value>;

/// Capabilities shared by every component
pub trait ComponentBase: Debug {
    /// Display name, also the registry key
    fn name(&self) -> &str;

    /// Effective constructor arguments, defaults filled in
    fn parameters(&self) -> ComponentParameters;

    /// Log the component's name and parameters, returning the parameters
    fn describe(&self, logger: &Logger, print_name: bool) -> ComponentParameters {
        if print_name {
            logger.log_subtitle(self.name());
        }
        let parameters = self.parameters();
        for (key, value) in &parameters {
            logger.log(&format!("  * {} : {}", key, display_value(value)));
        }
        parameters
    }

    /// Construct a fresh component of the same kind from keyword arguments
    fn instantiate(&self, parameters: &ComponentParameters) -> Result<Component>;
}

/// A component mapping features to new features
pub trait Transformer: ComponentBase {
    fn fit(&mut self, x: &DataFrame, y: Option<&Series>) -> Result<()>;

    fn transform(&self, x: &DataFrame) -> Result<DataFrame>;

    fn fit_transform(&mut self, x: &DataFrame, y: Option<&Series>) -> Result<DataFrame> {
        self.fit(x, y)?;
        self.transform(x)
    }
}

/// A component producing predictions; always the last stage of a pipeline
pub trait Estimator: ComponentBase {
    fn fit(&mut self, x: &DataFrame, y: &Series) -> Result<()>;

    fn predict(&self, x: &DataFrame) -> Result<Array1<f64>>;

    /// Class probabilities, one column per entry of [`Estimator::classes`]
    fn predict_proba(&self, x: &DataFrame) -> Result<Array2<f64>>;

    /// Sorted class labels seen during fit
    fn classes(&self) -> &[f64];

    /// Problem types this estimator supports
    fn problem_types(&self) -> &[ProblemType];

    fn model_family(&self) -> ModelFamily;

    /// Per-feature importances, aligned with the columns seen during fit
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

/// A live component of either kind
#[derive(Debug)]
pub enum Component {
    Transformer(Box<dyn Transformer>),
    Estimator(Box<dyn Estimator>),
}

impl Component {
    /// Wrap a transformer
    pub fn transformer(transformer: impl Transformer + 'static) -> Self {
        Component::Transformer(Box::new(transformer))
    }

    /// Wrap an estimator
    pub fn estimator(estimator: impl Estimator + 'static) -> Self {
        Component::Estimator(Box::new(estimator))
    }

    pub fn name(&self) -> &str {
        self.view().name()
    }

    pub fn parameters(&self) -> ComponentParameters {
        self.view().parameters()
    }

    pub fn describe(&self, logger: &Logger, print_name: bool) -> ComponentParameters {
        self.view().describe(logger, print_name)
    }

    pub fn instantiate(&self, parameters: &ComponentParameters) -> Result<Component> {
        self.view().instantiate(parameters)
    }

    pub fn is_estimator(&self) -> bool {
        matches!(self, Component::Estimator(_))
    }

    /// Borrow the component without giving up ownership
    pub fn view(&self) -> ComponentView<'_> {
        match self {
            Component::Transformer(t) => ComponentView::Transformer(t.as_ref()),
            Component::Estimator(e) => ComponentView::Estimator(e.as_ref()),
        }
    }
}

/// Borrowed view of a component
#[derive(Debug, Clone, Copy)]
pub enum ComponentView<'a> {
    Transformer(&'a dyn Transformer),
    Estimator(&'a dyn Estimator),
}

impl<'a> ComponentView<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            ComponentView::Transformer(t) => t.name(),
            ComponentView::Estimator(e) => e.name(),
        }
    }

    pub fn parameters(&self) -> ComponentParameters {
        match *self {
            ComponentView::Transformer(t) => t.parameters(),
            ComponentView::Estimator(e) => e.parameters(),
        }
    }

    pub fn describe(&self, logger: &Logger, print_name: bool) -> ComponentParameters {
        match *self {
            ComponentView::Transformer(t) => t.describe(logger, print_name),
            ComponentView::Estimator(e) => e.describe(logger, print_name),
        }
    }

    pub fn instantiate(&self, parameters: &ComponentParameters) -> Result<Component> {
        match *self {
            ComponentView::Transformer(t) => t.instantiate(parameters),
            ComponentView::Estimator(e) => e.instantiate(parameters),
        }
    }

    pub fn is_estimator(&self) -> bool {
        matches!(self, ComponentView::Estimator(_))
    }

    pub fn as_estimator(&self) -> Option<&'a dyn Estimator> {
        match *self {
            ComponentView::Estimator(e) => Some(e),
            ComponentView::Transformer(_) => None,
        }
    }
}

/// Deserialize a component config from keyword arguments.
///
/// Unknown keys and wrongly typed values both surface as `InvalidParameter`.
pub fn parse_parameters<T: DeserializeOwned>(
    component: &str,
    parameters: &ComponentParameters,
) -> Result<T> {
    serde_json::from_value(Value::Object(parameters.clone())).map_err(|e| {
        PipelineError::invalid_parameter(component, Value::Object(parameters.clone()), e.to_string())
    })
}

/// Serialize a component config back into keyword arguments
pub fn config_to_parameters<T: Serialize>(config: &T) -> ComponentParameters {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => map,
        _ => ComponentParameters::new(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct Config {
        top_n: usize,
    }

    fn params(value: Value) -> ComponentParameters {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_parse_parameters_fills_defaults() {
        let config: Config = parse_parameters("Encoder", &ComponentParameters::new()).unwrap();
        assert_eq!(config, Config { top_n: 0 });
    }

    #[test]
    fn test_parse_parameters_rejects_unknown_key() {
        let err = parse_parameters::<Config>("Encoder", &params(json!({"bogus": 1}))).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter { ref name, .. } if name == "Encoder"));
    }

    #[test]
    fn test_parse_parameters_rejects_wrong_type() {
        let err = parse_parameters::<Config>("Encoder", &params(json!({"top_n": "ten"})));
        assert!(err.is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let map = config_to_parameters(&Config { top_n: 4 });
        assert_eq!(map.get("top_n"), Some(&json!(4)));
    }

    #[test]
    fn test_component_view_dispatch() {
        let component = Component::transformer(SimpleImputer::default());
        assert!(!component.is_estimator());
        assert_eq!(component.name(), "Simple Imputer");
        assert!(component.view().as_estimator().is_none());

        let estimator = Component::estimator(RandomForestClassifier::default());
        assert!(estimator.is_estimator());
        assert!(estimator.view().as_estimator().is_some());
    }
}
