//! Standard classification metrics

use super::{Objective, Predictions};
use crate::data::unique_labels;
use crate::error::{PipelineError, Result};
use crate::problem_types::ProblemType;
use ndarray::Array1;
use polars::prelude::DataFrame;

const BINARY: &[ProblemType] = &[ProblemType::Binary];
const MULTICLASS: &[ProblemType] = &[ProblemType::Multiclass];

/// Label treated as the positive class by binary label metrics
pub const POSITIVE_LABEL: f64 = 1.0;

/// Probability clipping applied by log loss
const LOG_LOSS_EPS: f64 = 1e-15;

/// Fraction of labels predicted exactly
#[derive(Debug, Clone)]
pub struct Accuracy {
    name: &'static str,
    problem_types: &'static [ProblemType],
}

impl Accuracy {
    pub fn binary() -> Self {
        Self {
            name: "Accuracy Binary",
            problem_types: BINARY,
        }
    }

    pub fn multiclass() -> Self {
        Self {
            name: "Accuracy Multiclass",
            problem_types: MULTICLASS,
        }
    }
}

impl Objective for Accuracy {
    fn name(&self) -> &str {
        self.name
    }

    fn problem_types(&self) -> &[ProblemType] {
        self.problem_types
    }

    fn score(&self, predictions: Predictions<'_>, y_true: &Array1<f64>, _x: Option<&DataFrame>) -> Result<f64> {
        predictions.check_len(y_true)?;
        let y_pred = predictions.labels()?;
        if y_true.is_empty() {
            return Ok(0.0);
        }
        let correct = y_pred.iter().zip(y_true.iter()).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y_true.len() as f64)
    }
}

/// Which confusion-based score to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    Precision,
    Recall,
    F1,
}

/// How per-class scores are combined for multiclass targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Average {
    /// Single positive class (`POSITIVE_LABEL`)
    Binary,
    /// Pool true/false positives across classes
    Micro,
    /// Unweighted mean of per-class scores
    Macro,
}

/// Precision, recall or F1; zero when the denominator is empty
#[derive(Debug, Clone)]
pub struct PrecisionRecallF1 {
    name: &'static str,
    kind: ScoreKind,
    average: Average,
}

impl PrecisionRecallF1 {
    pub fn binary(kind: ScoreKind) -> Self {
        let name = match kind {
            ScoreKind::Precision => "Precision",
            ScoreKind::Recall => "Recall",
            ScoreKind::F1 => "F1",
        };
        Self {
            name,
            kind,
            average: Average::Binary,
        }
    }

    pub fn multiclass(kind: ScoreKind, average: Average) -> Self {
        let name = match (kind, average) {
            (ScoreKind::Precision, Average::Micro) => "Precision Micro",
            (ScoreKind::Precision, _) => "Precision Macro",
            (ScoreKind::Recall, Average::Micro) => "Recall Micro",
            (ScoreKind::Recall, _) => "Recall Macro",
            (ScoreKind::F1, Average::Micro) => "F1 Micro",
            (ScoreKind::F1, _) => "F1 Macro",
        };
        let average = if average == Average::Binary { Average::Macro } else { average };
        Self { name, kind, average }
    }

    fn from_counts(&self, tp: usize, fp: usize, fn_: usize) -> f64 {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        match self.kind {
            ScoreKind::Precision => ratio(tp, tp + fp),
            ScoreKind::Recall => ratio(tp, tp + fn_),
            ScoreKind::F1 => ratio(2 * tp, 2 * tp + fp + fn_),
        }
    }
}

/// True positives, false positives and false negatives for one label
fn label_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>, label: f64) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        match (t == label, p == label) {
            (true, true) => counts.0 += 1,
            (false, true) => counts.1 += 1,
            (true, false) => counts.2 += 1,
            (false, false) => {}
        }
    }
    counts
}

/// Sorted union of the labels in truth and predictions
pub(crate) fn union_labels(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Vec<f64> {
    let mut labels = unique_labels(y_true);
    labels.extend(unique_labels(y_pred));
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup();
    labels
}

impl Objective for PrecisionRecallF1 {
    fn name(&self) -> &str {
        self.name
    }

    fn problem_types(&self) -> &[ProblemType] {
        match self.average {
            Average::Binary => BINARY,
            Average::Micro | Average::Macro => MULTICLASS,
        }
    }

    fn score(&self, predictions: Predictions<'_>, y_true: &Array1<f64>, _x: Option<&DataFrame>) -> Result<f64> {
        predictions.check_len(y_true)?;
        let y_pred = predictions.labels()?;

        let score = match self.average {
            Average::Binary => {
                let (tp, fp, fn_) = label_counts(y_true, y_pred, POSITIVE_LABEL);
                self.from_counts(tp, fp, fn_)
            }
            Average::Micro => {
                let (tp, fp, fn_) = union_labels(y_true, y_pred)
                    .into_iter()
                    .map(|label| label_counts(y_true, y_pred, label))
                    .fold((0, 0, 0), |acc, c| (acc.0 + c.0, acc.1 + c.1, acc.2 + c.2));
                self.from_counts(tp, fp, fn_)
            }
            Average::Macro => {
                let labels = union_labels(y_true, y_pred);
                if labels.is_empty() {
                    return Ok(0.0);
                }
                let total: f64 = labels
                    .iter()
                    .map(|&label| {
                        let (tp, fp, fn_) = label_counts(y_true, y_pred, label);
                        self.from_counts(tp, fp, fn_)
                    })
                    .sum();
                total / labels.len() as f64
            }
        };
        Ok(score)
    }
}

/// Area under the ROC curve, scored from the last probability column
#[derive(Debug, Clone, Copy)]
pub struct RocAuc;

/// Ranks starting at 1, ties sharing their average rank
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Binary AUC of positive-class scores
pub(crate) fn binary_auc(y_true: &Array1<f64>, scores: &[f64], positive: f64) -> Result<f64> {
    let n_pos = y_true.iter().filter(|&&t| t == positive).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(PipelineError::DataError(
            "AUC is undefined when only one class is present in y_true".to_string(),
        ));
    }

    let ranks = average_ranks(scores);
    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t == positive)
        .map(|(_, &r)| r)
        .sum();

    let n_pos = n_pos as f64;
    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

impl Objective for RocAuc {
    fn name(&self) -> &str {
        "AUC"
    }

    fn score_needs_proba(&self) -> bool {
        true
    }

    fn problem_types(&self) -> &[ProblemType] {
        BINARY
    }

    fn score(&self, predictions: Predictions<'_>, y_true: &Array1<f64>, _x: Option<&DataFrame>) -> Result<f64> {
        predictions.check_len(y_true)?;
        let (proba, classes) = predictions.probabilities()?;
        let (Some(&positive), Some(last)) = (classes.last(), proba.ncols().checked_sub(1)) else {
            return Err(PipelineError::DataError("no classes to score".to_string()));
        };
        let scores = proba.column(last).to_vec();
        binary_auc(y_true, &scores, positive)
    }
}

/// Cross-entropy of the predicted class probabilities
#[derive(Debug, Clone)]
pub struct LogLoss {
    name: &'static str,
    problem_types: &'static [ProblemType],
}

impl LogLoss {
    pub fn binary() -> Self {
        Self {
            name: "Log Loss Binary",
            problem_types: BINARY,
        }
    }

    pub fn multiclass() -> Self {
        Self {
            name: "Log Loss Multiclass",
            problem_types: MULTICLASS,
        }
    }
}

impl Objective for LogLoss {
    fn name(&self) -> &str {
        self.name
    }

    fn greater_is_better(&self) -> bool {
        false
    }

    fn score_needs_proba(&self) -> bool {
        true
    }

    fn problem_types(&self) -> &[ProblemType] {
        self.problem_types
    }

    fn score(&self, predictions: Predictions<'_>, y_true: &Array1<f64>, _x: Option<&DataFrame>) -> Result<f64> {
        predictions.check_len(y_true)?;
        let (proba, classes) = predictions.probabilities()?;
        if proba.ncols() != classes.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} probability columns", classes.len()),
                actual: format!("{} probability columns", proba.ncols()),
            });
        }
        if y_true.is_empty() {
            return Ok(0.0);
        }

        let mut total = 0.0;
        for (row, &label) in proba.rows().into_iter().zip(y_true.iter()) {
            let idx = classes.iter().position(|&c| c == label).ok_or_else(|| {
                PipelineError::DataError(format!("label {} was not seen during fit", label))
            })?;
            total -= row[idx].clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS).ln();
        }
        Ok(total / y_true.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![0.0, 1.0, 1.0, 0.0];
        let y_pred = array![0.0, 1.0, 0.0, 0.0];
        let score = Accuracy::binary()
            .score(Predictions::Labels(&y_pred), &y_true, None)
            .unwrap();
        assert!((score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_binary_precision_recall_f1() {
        let y_true = array![1.0, 1.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 1.0, 0.0, 1.0, 0.0];
        let preds = Predictions::Labels(&y_pred);

        // tp = 2, fp = 1, fn = 1
        let precision = PrecisionRecallF1::binary(ScoreKind::Precision).score(preds, &y_true, None).unwrap();
        let recall = PrecisionRecallF1::binary(ScoreKind::Recall).score(preds, &y_true, None).unwrap();
        let f1 = PrecisionRecallF1::binary(ScoreKind::F1).score(preds, &y_true, None).unwrap();
        assert!((precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_without_positive_predictions_is_zero() {
        let y_true = array![1.0, 0.0];
        let y_pred = array![0.0, 0.0];
        let score = PrecisionRecallF1::binary(ScoreKind::Precision)
            .score(Predictions::Labels(&y_pred), &y_true, None)
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_macro_and_micro() {
        let y_true = array![0.0, 1.0, 2.0, 2.0];
        let y_pred = array![0.0, 2.0, 2.0, 2.0];
        let preds = Predictions::Labels(&y_pred);

        let micro = PrecisionRecallF1::multiclass(ScoreKind::F1, Average::Micro)
            .score(preds, &y_true, None)
            .unwrap();
        assert!((micro - 0.75).abs() < 1e-12);

        // per-class recall: 1, 0, 1
        let macro_recall = PrecisionRecallF1::multiclass(ScoreKind::Recall, Average::Macro)
            .score(preds, &y_true, None)
            .unwrap();
        assert!((macro_recall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_auc_with_ties() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let proba = array![[0.9, 0.1], [0.6, 0.4], [0.65, 0.35], [0.2, 0.8]];
        let classes = [0.0, 1.0];
        let auc = RocAuc
            .score(Predictions::Probabilities { proba: &proba, classes: &classes }, &y_true, None)
            .unwrap();
        assert!((auc - 0.75).abs() < 1e-12);

        let tied = array![[0.5, 0.5], [0.5, 0.5], [0.5, 0.5], [0.5, 0.5]];
        let auc = RocAuc
            .score(Predictions::Probabilities { proba: &tied, classes: &classes }, &y_true, None)
            .unwrap();
        assert!((auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class() {
        let y_true = array![1.0, 1.0];
        let proba = array![[0.2, 0.8], [0.4, 0.6]];
        assert!(RocAuc
            .score(Predictions::Probabilities { proba: &proba, classes: &[0.0, 1.0] }, &y_true, None)
            .is_err());
    }

    #[test]
    fn test_log_loss() {
        let y_true = array![0.0, 2.0];
        let proba = array![[0.5, 0.25, 0.25], [0.0, 0.0, 1.0]];
        let loss = LogLoss::multiclass()
            .score(
                Predictions::Probabilities { proba: &proba, classes: &[0.0, 1.0, 2.0] },
                &y_true,
                None,
            )
            .unwrap();
        assert!((loss - (-(0.5f64).ln() / 2.0)).abs() < 1e-9);
        assert!(!LogLoss::multiclass().greater_is_better());
    }

    #[test]
    fn test_log_loss_unseen_label() {
        let y_true = array![5.0];
        let proba = array![[0.5, 0.5]];
        assert!(LogLoss::binary()
            .score(Predictions::Probabilities { proba: &proba, classes: &[0.0, 1.0] }, &y_true, None)
            .is_err());
    }

    #[test]
    fn test_label_metrics_reject_probabilities() {
        let proba = array![[0.5, 0.5]];
        let y_true = array![1.0];
        assert!(Accuracy::binary()
            .score(Predictions::Probabilities { proba: &proba, classes: &[0.0, 1.0] }, &y_true, None)
            .is_err());
    }
}
