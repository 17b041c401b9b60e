//! Pipeline orchestration core

use super::graphs::{make_feature_importance_graph, make_pipeline_graph, FeatureImportanceChart};
use super::templates::PipelineTemplate;
use super::Parameters;
use crate::components::{
    Component, ComponentParameters, ComponentRef, ComponentRegistry, ComponentView, Estimator,
    Transformer,
};
use crate::data::{check_lengths, column_names, target_to_array, IntoFeatures, IntoTarget};
use crate::error::{PipelineError, Result};
use crate::model_types::ModelFamily;
use crate::objectives::{ObjectiveRef, ObjectiveScores, PlotMetric, PlotScores, Predictions};
use crate::problem_types::ProblemType;
use crate::utils::Logger;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// How `score` treats objectives, set by the classification pipelines
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ScoreOptions {
    /// Reject objectives that do not support this problem type
    pub problem_type: Option<ProblemType>,
    /// Hand the feature frame to every objective
    pub always_pass_features: bool,
}

/// A fitted-or-unfitted chain of transformers ending in one estimator
#[derive(Debug)]
pub struct PipelineBase {
    name: String,
    problem_types: Vec<ProblemType>,
    parameters: Parameters,
    transformers: Vec<Box<dyn Transformer>>,
    estimator: Box<dyn Estimator>,
    input_feature_names: HashMap<String, Vec<String>>,
    results: HashMap<String, f64>,
    is_fitted: bool,
    logger: Logger,
}

/// Reuse a value computed earlier in the same call, or compute it now
fn cached<T>(slot: &mut Option<T>, compute: impl FnOnce() -> Result<T>) -> Result<&T> {
    let value = match slot.take() {
        Some(value) => value,
        None => compute()?,
    };
    Ok(slot.insert(value))
}

impl PipelineBase {
    /// Build a pipeline from a template using the built-in components
    pub fn new<T: PipelineTemplate + ?Sized>(template: &T, parameters: Parameters) -> Result<Self> {
        Self::with_registry(template, parameters, &ComponentRegistry::default())
    }

    /// Build a pipeline from a template, resolving components through `registry`
    pub fn with_registry<T: PipelineTemplate + ?Sized>(
        template: &T,
        parameters: Parameters,
        registry: &ComponentRegistry,
    ) -> Result<Self> {
        let mut pipeline = Self::from_graph(
            template.component_graph(),
            template.problem_types(),
            parameters,
            registry,
        )?;
        if let Some(name) = template.custom_name() {
            pipeline.logger = Logger::new(&name);
            pipeline.name = name;
        }
        Ok(pipeline)
    }

    /// Build a pipeline from an explicit component graph.
    ///
    /// Every component is constructed with `parameters[name]` (or no
    /// arguments). The last component must be the only estimator and must
    /// support every declared problem type.
    pub fn from_graph(
        graph: Vec<ComponentRef>,
        problem_types: Vec<ProblemType>,
        parameters: Parameters,
        registry: &ComponentRegistry,
    ) -> Result<Self> {
        let no_arguments = ComponentParameters::new();
        let mut components = Vec::with_capacity(graph.len());
        for reference in &graph {
            let name = reference.name();
            let arguments = parameters.get(name).unwrap_or(&no_arguments);
            let component = registry
                .resolve(reference, arguments)
                .map_err(|err| match err {
                    PipelineError::ComponentNotFound(_) => err,
                    other => PipelineError::ComponentInstantiation {
                        component: name.to_string(),
                        arguments: Value::Object(arguments.clone()).to_string(),
                        source: Box::new(other),
                    },
                })?;
            components.push(component);
        }

        let estimator = match components.pop() {
            Some(Component::Estimator(estimator)) => estimator,
            Some(Component::Transformer(last)) => {
                return Err(PipelineError::InvalidPipelineStructure(format!(
                    "the last component must be an estimator, got '{}'",
                    last.name()
                )))
            }
            None => {
                return Err(PipelineError::InvalidPipelineStructure(
                    "component graph is empty".to_string(),
                ))
            }
        };

        let transformers = components
            .into_iter()
            .map(|component| match component {
                Component::Transformer(transformer) => Ok(transformer),
                Component::Estimator(inner) => Err(PipelineError::InvalidPipelineStructure(
                    format!("estimator '{}' must be the last component", inner.name()),
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&unsupported) = problem_types
            .iter()
            .find(|problem_type| !estimator.problem_types().contains(problem_type))
        {
            return Err(PipelineError::UnsupportedProblemType {
                problem_type: unsupported,
                valid: estimator.problem_types().to_vec(),
            });
        }

        let name = Self::generate_name(estimator.name(), &transformers);
        debug!(pipeline = %name, components = transformers.len() + 1, "constructed pipeline");

        Ok(Self {
            logger: Logger::new(&name),
            name,
            problem_types,
            parameters,
            transformers,
            estimator,
            input_feature_names: HashMap::new(),
            results: HashMap::new(),
            is_fitted: false,
        })
    }

    /// Estimator name, then `" w/ "` and the transformer names joined by `" + "`
    fn generate_name(estimator: &str, transformers: &[Box<dyn Transformer>]) -> String {
        let mut name = estimator.to_string();
        for (i, transformer) in transformers.iter().enumerate() {
            name.push_str(if i == 0 { " w/ " } else { " + " });
            name.push_str(transformer.name());
        }
        name
    }

    /// Unfitted copies of every component, re-instantiated from their parameters
    fn fresh_components(&self) -> Result<(Vec<Box<dyn Transformer>>, Box<dyn Estimator>)> {
        let transformers = self
            .transformers
            .iter()
            .map(|transformer| match transformer.instantiate(&transformer.parameters())? {
                Component::Transformer(t) => Ok(t),
                Component::Estimator(e) => Err(PipelineError::InvalidPipelineStructure(format!(
                    "'{}' re-instantiated as an estimator",
                    e.name()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        let estimator = match self.estimator.instantiate(&self.estimator.parameters())? {
            Component::Estimator(e) => e,
            Component::Transformer(t) => {
                return Err(PipelineError::InvalidPipelineStructure(format!(
                    "'{}' re-instantiated as a transformer",
                    t.name()
                )))
            }
        };
        Ok((transformers, estimator))
    }

    /// A fresh, unfitted pipeline with the same components and parameters
    pub fn clone_unfitted(&self) -> Result<Self> {
        let (transformers, estimator) = self.fresh_components()?;
        Ok(Self {
            name: self.name.clone(),
            problem_types: self.problem_types.clone(),
            parameters: self.parameters.clone(),
            transformers,
            estimator,
            input_feature_names: HashMap::new(),
            results: HashMap::new(),
            is_fitted: false,
            logger: self.logger.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn problem_types(&self) -> &[ProblemType] {
        &self.problem_types
    }

    /// Model family of the estimator
    pub fn model_family(&self) -> ModelFamily {
        self.estimator.model_family()
    }

    pub fn estimator(&self) -> &dyn Estimator {
        self.estimator.as_ref()
    }

    /// Class labels seen by the estimator during fit
    pub fn classes(&self) -> &[f64] {
        self.estimator.classes()
    }

    /// Number of components, estimator included
    pub fn len(&self) -> usize {
        self.transformers.len() + 1
    }

    /// Always false; a pipeline holds at least its estimator
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Component at `index`, estimator last
    pub fn get(&self, index: usize) -> Option<ComponentView<'_>> {
        match index.cmp(&self.transformers.len()) {
            std::cmp::Ordering::Less => Some(ComponentView::Transformer(
                self.transformers[index].as_ref(),
            )),
            std::cmp::Ordering::Equal => Some(ComponentView::Estimator(self.estimator.as_ref())),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// First component with the given name
    pub fn get_component(&self, name: &str) -> Option<ComponentView<'_>> {
        self.component_graph()
            .into_iter()
            .find(|component| component.name() == name)
    }

    /// Components in pipeline order
    pub fn component_graph(&self) -> Vec<ComponentView<'_>> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    /// Component names in pipeline order
    pub fn component_names(&self) -> Vec<&str> {
        self.component_graph().iter().map(|c| c.name()).collect()
    }

    /// Sub-pipelines are not supported
    pub fn slice(&self, range: Range<usize>) -> Result<PipelineBase> {
        Err(PipelineError::UnsupportedOperation(format!(
            "slicing pipelines is not supported (requested {}..{})",
            range.start, range.end
        )))
    }

    /// Components cannot be replaced after construction
    pub fn set_component(&mut self, index: usize, _component: Component) -> Result<()> {
        Err(PipelineError::UnsupportedOperation(format!(
            "setting pipeline components is not supported (index {})",
            index
        )))
    }

    /// Parameters exactly as passed at construction
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Input column names each component saw during the last fit
    pub fn input_feature_names(&self) -> &HashMap<String, Vec<String>> {
        &self.input_feature_names
    }

    pub fn results(&self) -> &HashMap<String, f64> {
        &self.results
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.is_fitted {
            Ok(())
        } else {
            Err(PipelineError::NotFitted)
        }
    }

    /// Fit every transformer in order, then the estimator.
    ///
    /// Components are fitted as unfitted copies and swapped in only once the
    /// whole chain succeeds, so a failed fit leaves the previous state intact.
    pub fn fit<X: IntoFeatures, Y: IntoTarget>(&mut self, x: X, y: Y) -> Result<&mut Self> {
        let x = x.into_features()?;
        let y = y.into_target()?;
        check_lengths(&x, &y)?;

        let (mut transformers, mut estimator) = self.fresh_components()?;
        let input_feature_names = self.fit_chain(&mut transformers, estimator.as_mut(), &x, &y)?;

        self.transformers = transformers;
        self.estimator = estimator;
        self.input_feature_names = input_feature_names;
        self.is_fitted = true;
        Ok(self)
    }

    fn fit_chain(
        &self,
        transformers: &mut [Box<dyn Transformer>],
        estimator: &mut dyn Estimator,
        x: &DataFrame,
        y: &Series,
    ) -> Result<HashMap<String, Vec<String>>> {
        let _span = self.logger.span().enter();
        let mut input_feature_names = HashMap::new();

        let mut current = x.clone();
        for transformer in transformers.iter_mut() {
            input_feature_names.insert(transformer.name().to_string(), column_names(&current));
            debug!(
                component = transformer.name(),
                rows = current.height(),
                columns = current.width(),
                "fitting transformer"
            );
            current = transformer.fit_transform(&current, Some(y))?;
        }

        debug!(
            component = estimator.name(),
            columns = current.width(),
            "fitting estimator"
        );
        estimator.fit(&current, y)?;
        input_feature_names.insert(estimator.name().to_string(), column_names(&current));
        Ok(input_feature_names)
    }

    fn transform_chain(&self, x: &DataFrame) -> Result<DataFrame> {
        let mut current = x.clone();
        for transformer in &self.transformers {
            current = transformer.transform(&current)?;
        }
        Ok(current)
    }

    /// Predicted labels for each row
    pub fn predict<X: IntoFeatures>(&self, x: X) -> Result<Array1<f64>> {
        self.ensure_fitted()?;
        let x = x.into_features()?;
        let transformed = self.transform_chain(&x)?;
        self.estimator.predict(&transformed)
    }

    /// Class probabilities for each row, columns ordered by [`Self::classes`]
    pub fn predict_proba<X: IntoFeatures>(&self, x: X) -> Result<Array2<f64>> {
        self.ensure_fitted()?;
        let x = x.into_features()?;
        let transformed = self.transform_chain(&x)?;
        self.estimator.predict_proba(&transformed)
    }

    /// Evaluate each objective, returning scores in the requested order.
    ///
    /// Labels and probabilities are computed at most once per call.
    pub fn score<X: IntoFeatures, Y: IntoTarget>(
        &self,
        x: X,
        y: Y,
        objectives: &[ObjectiveRef],
    ) -> Result<ObjectiveScores> {
        self.score_objectives(
            &x.into_features()?,
            &y.into_target()?,
            objectives,
            ScoreOptions::default(),
        )
    }

    pub(crate) fn score_objectives(
        &self,
        x: &DataFrame,
        y: &Series,
        objectives: &[ObjectiveRef],
        options: ScoreOptions,
    ) -> Result<ObjectiveScores> {
        self.ensure_fitted()?;
        check_lengths(x, y)?;

        let resolved = objectives
            .iter()
            .map(ObjectiveRef::resolve)
            .collect::<Result<Vec<_>>>()?;
        if let Some(problem_type) = options.problem_type {
            if let Some(objective) = resolved.iter().find(|o| !o.supports(problem_type)) {
                return Err(PipelineError::UnsupportedProblemType {
                    problem_type,
                    valid: objective.problem_types().to_vec(),
                });
            }
        }

        let y_true = target_to_array(y)?;
        let mut transformed: Option<DataFrame> = None;
        let mut labels: Option<Array1<f64>> = None;
        let mut proba: Option<Array2<f64>> = None;
        let mut scores = ObjectiveScores::new();

        for objective in &resolved {
            let predictions = if objective.score_needs_proba() {
                let proba = cached(&mut proba, || {
                    let xt = cached(&mut transformed, || self.transform_chain(x))?;
                    self.estimator.predict_proba(xt)
                })?;
                Predictions::Probabilities {
                    proba,
                    classes: self.estimator.classes(),
                }
            } else {
                let labels = cached(&mut labels, || {
                    let xt = cached(&mut transformed, || self.transform_chain(x))?;
                    self.estimator.predict(xt)
                })?;
                Predictions::Labels(labels)
            };

            let extra = if options.always_pass_features || objective.uses_extra_columns() {
                Some(x)
            } else {
                None
            };
            let score = objective.score(predictions, &y_true, extra)?;
            debug!(objective = objective.name(), score, "scored objective");
            scores.insert(objective.name(), score);
        }

        Ok(scores)
    }

    /// Compute plot data for each metric, sharing predictions like [`Self::score`]
    pub fn get_plot_data<X: IntoFeatures, Y: IntoTarget>(
        &self,
        x: X,
        y: Y,
        plot_metrics: &[&dyn PlotMetric],
    ) -> Result<PlotScores> {
        self.ensure_fitted()?;
        let x = x.into_features()?;
        let y = y.into_target()?;
        check_lengths(&x, &y)?;

        let y_true = target_to_array(&y)?;
        let mut transformed: Option<DataFrame> = None;
        let mut labels: Option<Array1<f64>> = None;
        let mut proba: Option<Array2<f64>> = None;
        let mut plots = PlotScores::new();

        for metric in plot_metrics {
            let predictions = if metric.score_needs_proba() {
                let proba = cached(&mut proba, || {
                    let xt = cached(&mut transformed, || self.transform_chain(&x))?;
                    self.estimator.predict_proba(xt)
                })?;
                Predictions::Probabilities {
                    proba,
                    classes: self.estimator.classes(),
                }
            } else {
                let labels = cached(&mut labels, || {
                    let xt = cached(&mut transformed, || self.transform_chain(&x))?;
                    self.estimator.predict(xt)
                })?;
                Predictions::Labels(labels)
            };
            plots.insert(metric.name(), metric.compute(predictions, &y_true)?);
        }

        Ok(plots)
    }

    /// Log a summary of the pipeline; optionally return its parameters
    pub fn describe(&self, return_dict: bool) -> Option<&Parameters> {
        let logger = &self.logger;
        logger.log_title(&self.name);

        let problem_types: Vec<&str> = self.problem_types.iter().map(|p| p.as_str()).collect();
        logger.log(&format!("Problem Types: {}", problem_types.join(", ")));
        logger.log(&format!("Model Type: {}", self.model_family()));

        if let Some(names) = self.input_feature_names.get(self.estimator.name()) {
            logger.log(&format!("Number of features: {}", names.len()));
        }

        logger.log_subtitle("Pipeline Steps");
        for (i, component) in self.component_graph().iter().enumerate() {
            logger.log(&format!("{}. {}", i + 1, component.name()));
            component.describe(logger, false);
        }

        return_dict.then_some(&self.parameters)
    }

    /// Estimator importances paired with its input features, largest magnitude first
    pub fn feature_importances(&self) -> Result<Vec<(String, f64)>> {
        self.ensure_fitted()?;
        let importances = self.estimator.feature_importances().ok_or_else(|| {
            PipelineError::UnsupportedOperation(format!(
                "{} does not report feature importances",
                self.estimator.name()
            ))
        })?;
        let names = self
            .input_feature_names
            .get(self.estimator.name())
            .ok_or(PipelineError::NotFitted)?;
        if names.len() != importances.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} importances", names.len()),
                actual: format!("{} importances", importances.len()),
            });
        }

        let mut pairs: Vec<(String, f64)> = names.iter().cloned().zip(importances.iter().copied()).collect();
        pairs.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        Ok(pairs)
    }

    /// Graphviz DOT source of the pipeline, also written to `filepath` when given
    pub fn graph(&self, filepath: Option<&Path>) -> Result<String> {
        let dot = make_pipeline_graph(self);
        if let Some(path) = filepath {
            std::fs::write(path, &dot)?;
        }
        Ok(dot)
    }

    /// Chart data for the estimator's feature importances
    pub fn feature_importance_graph(&self, show_all_features: bool) -> Result<FeatureImportanceChart> {
        let importances = self.feature_importances()?;
        Ok(make_feature_importance_graph(
            &self.name,
            &importances,
            show_all_features,
        ))
    }
}
