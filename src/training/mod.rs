//! Model training module
//!
//! Numeric learners behind the built-in estimator components:
//! - Decision trees and Random Forests
//! - Logistic regression

pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use linear_models::{LogisticRegression, Penalty};
pub use random_forest::{MaxFeatures, RandomForest};
