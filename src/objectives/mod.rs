//! Objectives: named scoring functions applied to pipeline predictions
//!
//! An [`Objective`] declares whether it scores hard labels or class
//! probabilities and whether it needs the original feature frame. Pipelines
//! use those flags to compute each kind of prediction at most once per
//! scoring call.

pub mod plot_metrics;
pub mod standard_metrics;

pub use plot_metrics::{ConfusionMatrix, PlotData, PlotMetric, PlotScores, RocCurve};
pub use standard_metrics::{
    Accuracy, Average, LogLoss, PrecisionRecallF1, RocAuc, ScoreKind,
};

use crate::error::{PipelineError, Result};
use crate::problem_types::ProblemType;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt::Debug;
use std::ops::Deref;

/// Predictions handed to an objective
#[derive(Debug, Clone, Copy)]
pub enum Predictions<'a> {
    /// Hard class labels
    Labels(&'a Array1<f64>),
    /// Class probabilities; column `j` belongs to `classes[j]`
    Probabilities {
        proba: &'a Array2<f64>,
        classes: &'a [f64],
    },
}

impl<'a> Predictions<'a> {
    /// Number of predicted rows
    pub fn len(&self) -> usize {
        match self {
            Predictions::Labels(labels) => labels.len(),
            Predictions::Probabilities { proba, .. } => proba.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hard labels, or `DataError` when probabilities were passed
    pub fn labels(&self) -> Result<&'a Array1<f64>> {
        match *self {
            Predictions::Labels(labels) => Ok(labels),
            Predictions::Probabilities { .. } => Err(PipelineError::DataError(
                "expected class labels, got probabilities".to_string(),
            )),
        }
    }

    /// Probabilities with their class order, or `DataError` when labels were passed
    pub fn probabilities(&self) -> Result<(&'a Array2<f64>, &'a [f64])> {
        match *self {
            Predictions::Probabilities { proba, classes } => Ok((proba, classes)),
            Predictions::Labels(_) => Err(PipelineError::DataError(
                "expected class probabilities, got labels".to_string(),
            )),
        }
    }

    /// Fail unless there is one prediction per target row
    pub fn check_len(&self, y_true: &Array1<f64>) -> Result<()> {
        if self.len() != y_true.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", self.len()),
            });
        }
        Ok(())
    }
}

/// A named scoring function
pub trait Objective: Debug {
    fn name(&self) -> &str;

    fn greater_is_better(&self) -> bool {
        true
    }

    /// Score from class probabilities rather than labels
    fn score_needs_proba(&self) -> bool {
        false
    }

    /// Needs the feature frame passed to `score`
    fn uses_extra_columns(&self) -> bool {
        false
    }

    fn problem_types(&self) -> &[ProblemType];

    fn supports(&self, problem_type: ProblemType) -> bool {
        self.problem_types().contains(&problem_type)
    }

    fn score(
        &self,
        predictions: Predictions<'_>,
        y_true: &Array1<f64>,
        x: Option<&DataFrame>,
    ) -> Result<f64>;
}

/// An objective given by name or as a live instance
#[derive(Debug)]
pub enum ObjectiveRef {
    Name(String),
    Instance(Box<dyn Objective>),
}

impl ObjectiveRef {
    pub fn instance(objective: impl Objective + 'static) -> Self {
        ObjectiveRef::Instance(Box::new(objective))
    }

    pub(crate) fn resolve(&self) -> Result<ResolvedObjective<'_>> {
        match self {
            ObjectiveRef::Name(name) => Ok(ResolvedObjective::Owned(get_objective(name)?)),
            ObjectiveRef::Instance(objective) => Ok(ResolvedObjective::Borrowed(objective.as_ref())),
        }
    }
}

impl From<&str> for ObjectiveRef {
    fn from(name: &str) -> Self {
        ObjectiveRef::Name(name.to_string())
    }
}

impl From<String> for ObjectiveRef {
    fn from(name: String) -> Self {
        ObjectiveRef::Name(name)
    }
}

impl From<Box<dyn Objective>> for ObjectiveRef {
    fn from(objective: Box<dyn Objective>) -> Self {
        ObjectiveRef::Instance(objective)
    }
}

/// Objective looked up for the duration of one scoring call
pub(crate) enum ResolvedObjective<'a> {
    Borrowed(&'a dyn Objective),
    Owned(Box<dyn Objective>),
}

impl<'a> Deref for ResolvedObjective<'a> {
    type Target = dyn Objective + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            ResolvedObjective::Borrowed(objective) => *objective,
            ResolvedObjective::Owned(objective) => objective.as_ref(),
        }
    }
}

/// Every built-in objective
pub fn all_objectives() -> Vec<Box<dyn Objective>> {
    vec![
        Box::new(Accuracy::binary()),
        Box::new(Accuracy::multiclass()),
        Box::new(PrecisionRecallF1::binary(ScoreKind::Precision)),
        Box::new(PrecisionRecallF1::binary(ScoreKind::Recall)),
        Box::new(PrecisionRecallF1::binary(ScoreKind::F1)),
        Box::new(PrecisionRecallF1::multiclass(ScoreKind::Precision, Average::Micro)),
        Box::new(PrecisionRecallF1::multiclass(ScoreKind::Precision, Average::Macro)),
        Box::new(PrecisionRecallF1::multiclass(ScoreKind::Recall, Average::Micro)),
        Box::new(PrecisionRecallF1::multiclass(ScoreKind::Recall, Average::Macro)),
        Box::new(PrecisionRecallF1::multiclass(ScoreKind::F1, Average::Micro)),
        Box::new(PrecisionRecallF1::multiclass(ScoreKind::F1, Average::Macro)),
        Box::new(RocAuc),
        Box::new(LogLoss::binary()),
        Box::new(LogLoss::multiclass()),
    ]
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Look up a built-in objective by name.
///
/// Matching ignores case and treats spaces, dashes and underscores alike,
/// so `"Log Loss Binary"` and `"log_loss_binary"` are the same objective.
pub fn get_objective(name: &str) -> Result<Box<dyn Objective>> {
    let wanted = normalize_name(name);
    all_objectives()
        .into_iter()
        .find(|objective| normalize_name(objective.name()) == wanted)
        .ok_or_else(|| PipelineError::ObjectiveNotFound(name.to_string()))
}

/// Built-in objectives supporting a problem type
pub fn get_objectives(problem_type: ProblemType) -> Vec<Box<dyn Objective>> {
    all_objectives()
        .into_iter()
        .filter(|objective| objective.supports(problem_type))
        .collect()
}

/// Scores keyed by objective name, in the order they were requested
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectiveScores {
    entries: Vec<(String, f64)>,
}

impl ObjectiveScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a score, keeping first-insertion order
    pub fn insert(&mut self, name: impl Into<String>, score: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((name, score)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, score)| *score)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(key, score)| (key.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ObjectiveScores {
    type Item = (String, f64);
    type IntoIter = std::vec::IntoIter<(String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
