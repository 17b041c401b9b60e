//! Integration test: built-in components and the registry

use automl_pipelines::components::{
    handle_component, Component, ComponentBase, ComponentParameters, ComponentRef,
    ComponentRegistry, OneHotEncoder, RFClassifierSelectFromModel, SimpleImputer, Transformer,
};
use automl_pipelines::utils::Logger;
use automl_pipelines::PipelineError;
use polars::prelude::*;
use serde_json::json;

fn mixed_frame() -> DataFrame {
    df!(
        "age" => &[Some(20.0), None, Some(40.0), Some(30.0), Some(25.0), Some(35.0)],
        "city" => &[Some("paris"), Some("rome"), None, Some("paris"), Some("oslo"), Some("rome")],
        "noise" => &[0.3, 0.1, 0.2, 0.6, 0.5, 0.4]
    )
    .unwrap()
}

fn params(value: serde_json::Value) -> ComponentParameters {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_default_registry_contents() {
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

    let estimator = handle_component(&"Random Forest Classifier".into()).unwrap();
    assert!(estimator.is_estimator());
    let transformer = handle_component(&"Simple Imputer".into()).unwrap();
    assert!(!transformer.is_estimator());
}

#[test]
fn test_registry_rejects_bad_arguments() {
    let registry = ComponentRegistry::default();

    let unknown_key = registry.create("One Hot Encoder", &params(json!({"top": 3})));
    assert!(matches!(
        unknown_key,
        Err(PipelineError::InvalidParameter { .. })
    ));

    let bad_value = registry.create(
        "RF Classifier Select From Model",
        &params(json!({"percent_features": 2.0})),
    );
    assert!(matches!(bad_value, Err(PipelineError::InvalidParameter { .. })));

    assert!(matches!(
        registry.create("Nope", &ComponentParameters::new()),
        Err(PipelineError::ComponentNotFound(_))
    ));
}

#[test]
fn test_custom_factory() {
    let mut registry = ComponentRegistry::empty();
    registry.register("Median Imputer", |p| {
        let mut arguments = p.clone();
        arguments.insert("impute_strategy".to_string(), json!("median"));
        Ok(Component::transformer(SimpleImputer::from_parameters(&arguments)?))
    });

    let component = registry
        .resolve(&ComponentRef::from("Median Imputer"), &ComponentParameters::new())
        .unwrap();
    assert_eq!(component.parameters()["impute_strategy"], json!("median"));
}

#[test]
fn test_instance_reinstantiated_with_parameters() {
    let registry = ComponentRegistry::empty();
    let reference = ComponentRef::from(Component::transformer(OneHotEncoder::default()));

    let component = registry
        .resolve(&reference, &params(json!({"top_n": 2})))
        .unwrap();
    assert_eq!(component.name(), "One Hot Encoder");
    assert_eq!(component.parameters()["top_n"], json!(2));
}

#[test]
fn test_transformer_chain_on_mixed_frame() {
    let x = mixed_frame();
    let y = Series::new("target".into(), &[0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);

    let mut imputer = SimpleImputer::from_parameters(&params(json!({"impute_strategy": "mean"})))
        .unwrap();
    let imputed = imputer.fit_transform(&x, Some(&y)).unwrap();
    assert_eq!(imputed.column("age").unwrap().null_count(), 0);
    assert_eq!(imputed.column("city").unwrap().null_count(), 0);

    let mut encoder = OneHotEncoder::default();
    let encoded = encoder.fit_transform(&imputed, Some(&y)).unwrap();
    assert!(encoded.column("city").is_err());
    assert!(encoded.column("city_paris").is_ok());
    assert!(encoded.column("city_rome").is_ok());

    let mut selector = RFClassifierSelectFromModel::from_parameters(&params(
        json!({"number_features": 2, "n_estimators": 5}),
    ))
    .unwrap();
    let selected = selector.fit_transform(&encoded, Some(&y)).unwrap();
    assert_eq!(selected.width(), 2);
    assert_eq!(selector.selected_features().len(), 2);
}

#[test]
fn test_transform_before_fit() {
    let x = mixed_frame();
    assert!(matches!(
        SimpleImputer::default().transform(&x),
        Err(PipelineError::NotFitted)
    ));
    assert!(matches!(
        OneHotEncoder::default().transform(&x),
        Err(PipelineError::NotFitted)
    ));
}

#[test]
fn test_describe_returns_parameters() {
    let logger = Logger::new("test");
    let imputer = SimpleImputer::default();
    let described = imputer.describe(&logger, true);
    assert_eq!(described, imputer.parameters());
    assert_eq!(described["impute_strategy"], json!("most_frequent"));
    assert_eq!(described["fill_value"], json!(null));
}
