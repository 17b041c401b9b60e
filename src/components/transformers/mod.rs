//! Built-in transformer components

pub mod encoder;
pub mod feature_selection;
pub mod imputer;

pub use encoder::{OneHotEncoder, OneHotEncoderConfig};
pub use feature_selection::{RFClassifierSelectFromModel, RFSelectFromModelConfig, Threshold, ThresholdRule};
pub use imputer::{ImputeStrategy, SimpleImputer, SimpleImputerConfig};
