//! One-hot encoding of categorical columns

use crate::components::{
    config_to_parameters, parse_parameters, Component, ComponentBase, ComponentParameters,
    Transformer,
};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Keyword arguments of the One Hot Encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OneHotEncoderConfig {
    /// Maximum number of categories kept per column
    pub top_n: usize,
}

impl Default for OneHotEncoderConfig {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

impl OneHotEncoderConfig {
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(PipelineError::invalid_parameter(
                "top_n",
                self.top_n,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Encoder turning each string column into indicator columns
/// `<column>_<category>`, one per retained category.
#[derive(Debug, Clone, Default)]
pub struct OneHotEncoder {
    config: OneHotEncoderConfig,
    // Column name -> retained categories in output order
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub const NAME: &'static str = "One Hot Encoder";

    pub fn new(config: OneHotEncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            categories: Vec::new(),
            is_fitted: false,
        })
    }

    pub fn from_parameters(parameters: &ComponentParameters) -> Result<Self> {
        Self::new(parse_parameters(Self::NAME, parameters)?)
    }

    /// Retained categories of a fitted column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cats)| cats.as_slice())
    }

    /// The `top_n` most frequent categories; ties broken by category text
    fn top_categories(&self, series: &Series) -> Result<Vec<String>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in series.str()?.into_iter().flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        Ok(ranked
            .into_iter()
            .take(self.config.top_n)
            .map(|(cat, _)| cat.to_string())
            .collect())
    }
}

fn indicator_name(column: &str, category: &str) -> String {
    format!("{}_{}", column, category)
}

impl ComponentBase for OneHotEncoder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> ComponentParameters {
        config_to_parameters(&self.config)
    }

    fn instantiate(&self, parameters: &ComponentParameters) -> Result<Component> {
        Ok(Component::transformer(Self::from_parameters(parameters)?))
    }
}

impl Transformer for OneHotEncoder {
    fn fit(&mut self, x: &DataFrame, _y: Option<&Series>) -> Result<()> {
        let mut categories = Vec::new();
        for column in x.get_columns() {
            let series = column.as_materialized_series();
            if matches!(series.dtype(), DataType::String) {
                categories.push((series.name().to_string(), self.top_categories(series)?));
            }
        }

        // Indicator names must not clash with kept columns or with each other
        let mut output_names = HashSet::new();
        for column in x.get_columns() {
            let name = column.name().as_str();
            let indicators = categories.iter().find(|(encoded, _)| encoded == name);
            let names: Vec<String> = match indicators {
                Some((_, cats)) => cats.iter().map(|cat| indicator_name(name, cat)).collect(),
                None => vec![name.to_string()],
            };
            for output in names {
                if !output_names.insert(output.clone()) {
                    return Err(PipelineError::DataError(format!(
                        "one-hot encoding would produce duplicate column '{}'",
                        output
                    )));
                }
            }
        }

        debug!(encoded_columns = categories.len(), "fitted one-hot encoder");
        self.categories = categories;
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, x: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::NotFitted);
        }

        for (name, _) in &self.categories {
            if x.column(name).is_err() {
                return Err(PipelineError::FeatureNotFound(name.clone()));
            }
        }

        let mut columns = Vec::with_capacity(x.width());
        for column in x.get_columns() {
            let series = column.as_materialized_series();
            let Some(cats) = self.categories(series.name().as_str()) else {
                columns.push(column.clone());
                continue;
            };

            let values = series.str()?;
            for cat in cats {
                // Nulls and unseen categories encode to all zeros
                let indicator: Vec<f64> = values
                    .into_iter()
                    .map(|v| if v == Some(cat.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                columns.push(Column::new(
                    indicator_name(series.name(), cat).into(),
                    indicator,
                ));
            }
        }

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column_names;

    fn sample() -> DataFrame {
        df!(
            "color" => &["red", "blue", "red", "green", "blue", "red"],
            "size" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        )
        .unwrap()
    }

    #[test]
    fn test_encodes_strings_and_passes_numeric() {
        let mut encoder = OneHotEncoder::default();
        let out = encoder.fit_transform(&sample(), None).unwrap();

        assert_eq!(
            column_names(&out),
            vec!["color_red", "color_blue", "color_green", "size"]
        );
        let red: Vec<Option<f64>> = out
            .column("color_red")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(red, vec![Some(1.0), Some(0.0), Some(1.0), Some(0.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_top_n_limits_categories() {
        let mut encoder = OneHotEncoder::new(OneHotEncoderConfig::default().with_top_n(2)).unwrap();
        encoder.fit(&sample(), None).unwrap();
        assert_eq!(
            encoder.categories("color").unwrap(),
            &["red".to_string(), "blue".to_string()]
        );
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let mut encoder = OneHotEncoder::default();
        encoder.fit(&sample(), None).unwrap();

        let unseen = df!("color" => &["purple"], "size" => &[1.0]).unwrap();
        let out = encoder.transform(&unseen).unwrap();
        let row_sum: f64 = ["color_red", "color_blue", "color_green"]
            .iter()
            .map(|name| {
                out.column(name)
                    .unwrap()
                    .as_materialized_series()
                    .f64()
                    .unwrap()
                    .get(0)
                    .unwrap()
            })
            .sum();
        assert_eq!(row_sum, 0.0);
    }

    #[test]
    fn test_rejects_zero_top_n() {
        assert!(OneHotEncoder::new(OneHotEncoderConfig { top_n: 0 }).is_err());
    }

    #[test]
    fn test_indicator_name_collision() {
        let df = df!(
            "color" => &["red", "blue"],
            "color_red" => &[1.0, 0.0]
        )
        .unwrap();
        let mut encoder = OneHotEncoder::default();
        match encoder.fit(&df, None) {
            Err(PipelineError::DataError(msg)) => assert!(msg.contains("color_red")),
            other => panic!("Expected DataError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fitted_column() {
        let mut encoder = OneHotEncoder::default();
        encoder.fit(&sample(), None).unwrap();
        let df = df!("size" => &[1.0]).unwrap();
        assert!(matches!(
            encoder.transform(&df),
            Err(PipelineError::FeatureNotFound(_))
        ));
    }
}
