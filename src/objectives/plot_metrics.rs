//! Metrics producing curve or table data for a renderer

use super::standard_metrics::{binary_auc, union_labels};
use super::Predictions;
use crate::error::{PipelineError, Result};
use crate::problem_types::ProblemType;
use ndarray::Array1;
use serde::Serialize;
use std::fmt::Debug;

/// Data computed by a plot metric
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotData {
    Roc {
        fpr: Vec<f64>,
        tpr: Vec<f64>,
        thresholds: Vec<f64>,
        auc: f64,
    },
    ConfusionMatrix {
        labels: Vec<f64>,
        /// `matrix[i][j]` counts rows with truth `labels[i]` predicted as `labels[j]`
        matrix: Vec<Vec<usize>>,
    },
}

/// A metric whose result is plotted rather than compared
pub trait PlotMetric: Debug {
    fn name(&self) -> &str;

    fn score_needs_proba(&self) -> bool;

    fn problem_types(&self) -> &[ProblemType];

    fn compute(&self, predictions: Predictions<'_>, y_true: &Array1<f64>) -> Result<PlotData>;
}

/// Receiver operating characteristic of the positive (last) class
#[derive(Debug, Clone, Copy)]
pub struct RocCurve;

impl PlotMetric for RocCurve {
    fn name(&self) -> &str {
        "ROC"
    }

    fn score_needs_proba(&self) -> bool {
        true
    }

    fn problem_types(&self) -> &[ProblemType] {
        &[ProblemType::Binary]
    }

    fn compute(&self, predictions: Predictions<'_>, y_true: &Array1<f64>) -> Result<PlotData> {
        predictions.check_len(y_true)?;
        let (proba, classes) = predictions.probabilities()?;
        let (Some(&positive), Some(last)) = (classes.last(), proba.ncols().checked_sub(1)) else {
            return Err(PipelineError::DataError("no classes to plot".to_string()));
        };
        let scores = proba.column(last).to_vec();
        let auc = binary_auc(y_true, &scores, positive)?;

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let n_pos = y_true.iter().filter(|&&t| t == positive).count() as f64;
        let n_neg = y_true.len() as f64 - n_pos;

        // Leading point sits above every score so the curve starts at (0, 0)
        let top = scores[order[0]] + 1.0;
        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut thresholds = vec![top];

        let (mut tp, mut fp) = (0.0, 0.0);
        for (k, &idx) in order.iter().enumerate() {
            if y_true[idx] == positive {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            let is_last_of_tie = order
                .get(k + 1)
                .map_or(true, |&next| scores[next] != scores[idx]);
            if is_last_of_tie {
                fpr.push(fp / n_neg);
                tpr.push(tp / n_pos);
                thresholds.push(scores[idx]);
            }
        }

        Ok(PlotData::Roc {
            fpr,
            tpr,
            thresholds,
            auc,
        })
    }
}

/// Counts of predicted versus true labels
#[derive(Debug, Clone, Copy)]
pub struct ConfusionMatrix;

impl PlotMetric for ConfusionMatrix {
    fn name(&self) -> &str {
        "Confusion Matrix"
    }

    fn score_needs_proba(&self) -> bool {
        false
    }

    fn problem_types(&self) -> &[ProblemType] {
        &[ProblemType::Binary, ProblemType::Multiclass]
    }

    fn compute(&self, predictions: Predictions<'_>, y_true: &Array1<f64>) -> Result<PlotData> {
        predictions.check_len(y_true)?;
        let y_pred = predictions.labels()?;

        let labels = union_labels(y_true, y_pred);
        let index = |v: f64| labels.iter().position(|&l| l == v);
        let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if let (Some(i), Some(j)) = (index(t), index(p)) {
                matrix[i][j] += 1;
            }
        }

        Ok(PlotData::ConfusionMatrix { labels, matrix })
    }
}

/// Plot data keyed by metric name, in request order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotScores {
    entries: Vec<(String, PlotData)>,
}

impl PlotScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: PlotData) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((name, data)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PlotData> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, data)| data)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
