//! Pipelines: a chain of transformers ending in one estimator
//!
//! A [`PipelineTemplate`] describes a pipeline statically (component graph,
//! problem types, search space). [`PipelineBase`] turns a template and its
//! per-component parameters into live components and runs fit / predict /
//! score over them. [`BinaryClassificationPipeline`] and
//! [`MulticlassClassificationPipeline`] add problem-type aware scoring.

pub mod classification;
pub mod graphs;
pub mod pipeline_base;
pub mod templates;

pub use classification::{
    BinaryClassificationPipeline, ClassificationPipeline, MulticlassClassificationPipeline,
};
pub use graphs::{make_feature_importance_graph, make_pipeline_graph, FeatureImportanceChart};
pub use pipeline_base::PipelineBase;
pub use templates::{
    CustomPipeline, LogisticRegressionPipeline, PipelineTemplate, RFClassificationPipeline,
};

use crate::components::ComponentParameters;
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};

/// Keyword arguments per component, keyed by component name
pub type Parameters = HashMap<String, ComponentParameters>;

/// Parse parameters from a JSON object of objects
pub fn parameters_from_json(json: &str) -> Result<Parameters> {
    Ok(serde_json::from_str(json)?)
}

/// Render parameters as pretty JSON with components in name order
pub fn parameters_to_json(parameters: &Parameters) -> Result<String> {
    let ordered: BTreeMap<&String, &ComponentParameters> = parameters.iter().collect();
    Ok(serde_json::to_string_pretty(&ordered)?)
}
