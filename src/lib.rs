//! Composable machine learning pipelines
//!
//! A pipeline is a chain of transformers ending in one estimator. This crate
//! provides:
//! - Component traits and a registry of built-in components
//! - Pipeline construction, fit / predict / score orchestration
//! - Binary and multiclass classification pipelines
//! - Objectives and plot metrics for scoring
//! - Pipeline templates with hyperparameter search spaces
//!
//! # Modules
//!
//! - [`components`] - Transformer / estimator traits, built-ins, registry
//! - [`pipelines`] - Pipeline base, classification pipelines, templates, graphs
//! - [`objectives`] - Scoring objectives and plot metrics
//! - [`optimizer`] - Hyperparameter search spaces
//! - [`training`] - Numerical models backing the estimators
//! - [`data`] - Frame and array conversions
//! - [`utils`] - Logging
//!
//! # Example
//!
//! ```no_run
//! use automl_pipelines::prelude::*;
//! use ndarray::array;
//!
//! let x = array![[0.0, 1.0], [1.0, 0.0], [0.1, 0.9], [0.9, 0.2]];
//! let y = vec![0.0, 1.0, 0.0, 1.0];
//!
//! let mut pipeline = BinaryClassificationPipeline::new(&RFClassificationPipeline, Parameters::new())?;
//! pipeline.fit(x.clone(), y.clone())?;
//! let scores = pipeline.score(x, y, &["Accuracy Binary".into(), "AUC".into()])?;
//! println!("{:?}", scores);
//! # Ok::<(), automl_pipelines::PipelineError>(())
//! ```

pub mod components;
pub mod data;
pub mod error;
pub mod model_types;
pub mod objectives;
pub mod optimizer;
pub mod pipelines;
pub mod problem_types;
pub mod training;
pub mod utils;

pub use error::{PipelineError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::components::{
        Component, ComponentBase, ComponentParameters, ComponentRef, ComponentRegistry,
        Estimator, Transformer,
    };
    pub use crate::error::{PipelineError, Result};
    pub use crate::model_types::ModelFamily;
    pub use crate::objectives::{get_objective, Objective, ObjectiveRef, ObjectiveScores};
    pub use crate::optimizer::SearchSpace;
    pub use crate::pipelines::{
        BinaryClassificationPipeline, ClassificationPipeline, CustomPipeline,
        LogisticRegressionPipeline, MulticlassClassificationPipeline, Parameters, PipelineBase,
        PipelineTemplate, RFClassificationPipeline,
    };
    pub use crate::problem_types::ProblemType;
    pub use crate::utils::{init_logging, Logger};
}
