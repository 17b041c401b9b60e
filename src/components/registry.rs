//! Component registry
//!
//! Resolves a [`ComponentRef`] (a registry name or a live instance) to a
//! freshly constructed [`Component`].

use super::estimators::{LogisticRegressionClassifier, RandomForestClassifier};
use super::transformers::{OneHotEncoder, RFClassifierSelectFromModel, SimpleImputer};
use super::{Component, ComponentParameters};
use crate::error::{PipelineError, Result};
use std::collections::HashMap;
use std::fmt;

/// Constructor registered under a component name
pub type ComponentFactory = Box<dyn Fn(&ComponentParameters) -> Result<Component> + Send + Sync>;

/// Entry of a component graph
#[derive(Debug)]
pub enum ComponentRef {
    /// Registry name, e.g. `"Simple Imputer"`
    Name(String),
    /// Live component; re-instantiated with the pipeline's parameters
    Instance(Component),
}

impl ComponentRef {
    /// Name used to look up the component's parameters
    pub fn name(&self) -> &str {
        match self {
            ComponentRef::Name(name) => name,
            ComponentRef::Instance(component) => component.name(),
        }
    }
}

impl From<&str> for ComponentRef {
    fn from(name: &str) -> Self {
        ComponentRef::Name(name.to_string())
    }
}

impl From<String> for ComponentRef {
    fn from(name: String) -> Self {
        ComponentRef::Name(name)
    }
}

impl From<Component> for ComponentRef {
    fn from(component: Component) -> Self {
        ComponentRef::Instance(component)
    }
}

/// Name -> factory table
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl Default for ComponentRegistry {
    /// Registry holding every built-in component
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SimpleImputer::NAME, |p| {
            Ok(Component::transformer(SimpleImputer::from_parameters(p)?))
        });
        registry.register(OneHotEncoder::NAME, |p| {
            Ok(Component::transformer(OneHotEncoder::from_parameters(p)?))
        });
        registry.register(RFClassifierSelectFromModel::NAME, |p| {
            Ok(Component::transformer(RFClassifierSelectFromModel::from_parameters(p)?))
        });
        registry.register(RandomForestClassifier::NAME, |p| {
            Ok(Component::estimator(RandomForestClassifier::from_parameters(p)?))
        });
        registry.register(LogisticRegressionClassifier::NAME, |p| {
            Ok(Component::estimator(LogisticRegressionClassifier::from_parameters(p)?))
        });
        registry
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

impl ComponentRegistry {
    /// Registry with no components
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) a factory under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ComponentParameters) -> Result<Component> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct a component by registry name
    pub fn create(&self, name: &str, parameters: &ComponentParameters) -> Result<Component> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PipelineError::ComponentNotFound(name.to_string()))?;
        factory(parameters)
    }

    /// Construct a live component for a graph entry
    pub fn resolve(
        &self,
        reference: &ComponentRef,
        parameters: &ComponentParameters,
    ) -> Result<Component> {
        match reference {
            ComponentRef::Name(name) => self.create(name, parameters),
            ComponentRef::Instance(component) => component.instantiate(parameters),
        }
    }
}

/// Resolve a reference with default parameters using the built-in registry
pub fn handle_component(reference: &ComponentRef) -> Result<Component> {
    ComponentRegistry::default().resolve(reference, &ComponentParameters::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = ComponentRegistry::default();
        assert_eq!(
            registry.names(),
            vec![
                "Logistic Regression Classifier",
                "One Hot Encoder",
                "RF Classifier Select From Model",
                "Random Forest Classifier",
                "Simple Imputer",
            ]
        );
    }

    #[test]
    fn test_handle_component_by_name() {
        let component = handle_component(&"One Hot Encoder".into()).unwrap();
        assert_eq!(component.name(), "One Hot Encoder");
        assert!(!component.is_estimator());
    }

    #[test]
    fn test_unknown_name() {
        let err = handle_component(&"Gradient Boosted Widget".into()).unwrap_err();
        assert!(matches!(err, PipelineError::ComponentNotFound(name) if name == "Gradient Boosted Widget"));
    }

    #[test]
    fn test_instance_is_reinstantiated_with_parameters() {
        let reference = ComponentRef::from(Component::estimator(RandomForestClassifier::default()));
        let mut params = ComponentParameters::new();
        params.insert("n_estimators".to_string(), json!(25));

        let component = ComponentRegistry::default().resolve(&reference, &params).unwrap();
        assert_eq!(component.parameters().get("n_estimators"), Some(&json!(25)));
    }

    #[test]
    fn test_custom_factory() {
        let mut registry = ComponentRegistry::empty();
        registry.register("Imputer Alias", |p| {
            Ok(Component::transformer(SimpleImputer::from_parameters(p)?))
        });
        assert!(registry.contains("Imputer Alias"));
        assert!(registry
            .create("Imputer Alias", &ComponentParameters::new())
            .is_ok());
    }
}
