//! Linear model implementations

use crate::data::unique_labels;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Regularization applied to the coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    L2,
    None,
}

/// Logistic regression for binary classification
///
/// Features are standardized internally before gradient descent, so the
/// learning rate behaves the same regardless of feature scale. Coefficients
/// are reported in the standardized space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Regularization kind
    pub penalty: Penalty,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Per-feature means and scales seen during fit
    means: Array1<f64>,
    scales: Array1<f64>,
    /// Class labels; index 1 is the positive class
    classes: Vec<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            penalty: Penalty::L2,
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            means: Array1::zeros(0),
            scales: Array1::zeros(0),
            classes: Vec::new(),
        }
    }

    /// Set regularization kind
    pub fn with_penalty(mut self, penalty: Penalty) -> Self {
        self.penalty = penalty;
        self
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    fn standardize(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.means) / &self.scales
    }

    /// Fit the model using gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.c <= 0.0 {
            return Err(PipelineError::invalid_parameter("C", self.c, "must be positive"));
        }

        let classes = unique_labels(y);
        if classes.len() != 2 {
            return Err(PipelineError::DataError(format!(
                "Logistic regression requires exactly 2 classes, found {}",
                classes.len()
            )));
        }

        self.means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        self.scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        let xs = self.standardize(x);
        let target = y.mapv(|label| if label == classes[1] { 1.0 } else { 0.0 });

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;

        let lr = self.learning_rate;
        let reg = match self.penalty {
            Penalty::L2 => 1.0 / (self.c * n_samples as f64),
            Penalty::None => 0.0,
        };

        for _iter in 0..self.max_iter {
            let linear = xs.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - &target;
            let dw = (xs.t().dot(&errors) / n_samples as f64) + (reg * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.classes = classes;

        Ok(self)
    }

    /// Probability of each class, one column per entry of `classes()`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(PipelineError::NotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let intercept = self.intercept.unwrap_or(0.0);

        let positive = Self::sigmoid(&(self.standardize(x).dot(coefficients) + intercept));
        let mut proba = Array2::zeros((x.nrows(), 2));
        for (i, &p) in positive.iter().enumerate() {
            proba[[i, 0]] = 1.0 - p;
            proba[[i, 1]] = p;
        }
        Ok(proba)
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .column(1)
            .mapv(|p| if p >= 0.5 { self.classes[1] } else { self.classes[0] }))
    }

    /// Class labels seen during fit
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }
}
