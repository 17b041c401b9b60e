//! Missing value imputation

use crate::components::{
    config_to_parameters, parse_parameters, Component, ComponentBase, ComponentParameters,
    Transformer,
};
use crate::data::{is_numeric_dtype, series_to_f64};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Strategy for imputing missing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Replace with mean (numeric columns)
    Mean,
    /// Replace with median (numeric columns)
    Median,
    /// Replace with mode / most frequent value
    MostFrequent,
    /// Replace with `fill_value`
    Constant,
}

/// Keyword arguments of the Simple Imputer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimpleImputerConfig {
    pub impute_strategy: ImputeStrategy,
    /// Value used by the constant strategy; a number or a string
    pub fill_value: Option<Value>,
}

impl Default for SimpleImputerConfig {
    fn default() -> Self {
        Self {
            impute_strategy: ImputeStrategy::MostFrequent,
            fill_value: None,
        }
    }
}

impl SimpleImputerConfig {
    pub fn with_strategy(mut self, strategy: ImputeStrategy) -> Self {
        self.impute_strategy = strategy;
        self
    }

    pub fn with_fill_value(mut self, value: impl Into<Value>) -> Self {
        self.fill_value = Some(value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        match &self.fill_value {
            None if self.impute_strategy == ImputeStrategy::Constant => {
                Err(PipelineError::invalid_parameter(
                    "fill_value",
                    "None",
                    "required when impute_strategy is constant",
                ))
            }
            Some(v) if !(v.is_number() || v.is_string()) => Err(
                PipelineError::invalid_parameter("fill_value", v, "must be a number or a string"),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FillValue {
    Numeric(f64),
    Text(String),
}

/// Imputer filling nulls column by column.
///
/// Numeric and boolean columns are filled with the mean, median, mode or
/// constant and come out as `Float64`. A numeric column with no observed
/// values is kept and filled with `0.0`, or with `fill_value` under the
/// constant strategy, rather than dropped. String columns are
/// filled with their mode, or with `fill_value` under the constant strategy.
/// Other columns pass through untouched.
#[derive(Debug, Clone, Default)]
pub struct SimpleImputer {
    config: SimpleImputerConfig,
    fill_values: Vec<(String, FillValue)>,
    is_fitted: bool,
}

impl SimpleImputer {
    pub const NAME: &'static str = "Simple Imputer";

    pub fn new(config: SimpleImputerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fill_values: Vec::new(),
            is_fitted: false,
        })
    }

    pub fn from_parameters(parameters: &ComponentParameters) -> Result<Self> {
        Self::new(parse_parameters(Self::NAME, parameters)?)
    }

    pub fn config(&self) -> &SimpleImputerConfig {
        &self.config
    }

    fn numeric_fill(&self, series: &Series) -> Result<f64> {
        if let ImputeStrategy::Constant = self.config.impute_strategy {
            return match &self.config.fill_value {
                Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                    PipelineError::invalid_parameter("fill_value", n, "not representable as f64")
                }),
                _ => Err(PipelineError::DataError(format!(
                    "cannot fill numeric column '{}' with a non-numeric fill_value",
                    series.name()
                ))),
            };
        }

        let mut values: Vec<f64> = series_to_f64(series)?.into_iter().flatten().collect();
        values.sort_by(|a, b| a.total_cmp(b));

        // Entirely missing numeric columns fall back to zero
        let Some(first) = values.first().copied() else {
            return Ok(0.0);
        };

        let fill = match self.config.impute_strategy {
            ImputeStrategy::Mean => values.iter().sum::<f64>() / values.len() as f64,
            ImputeStrategy::Median => {
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                }
            }
            _ => mode(&values).unwrap_or(first),
        };
        Ok(fill)
    }

    fn text_fill(&self, series: &Series) -> Result<Option<String>> {
        if let ImputeStrategy::Constant = self.config.impute_strategy {
            return Ok(match &self.config.fill_value {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            });
        }

        let mut values: Vec<&str> = series.str()?.into_iter().flatten().collect();
        values.sort_unstable();
        Ok(mode(&values).map(|s| s.to_string()))
    }

    fn fill_column(series: &Series, fill: &FillValue) -> Result<Column> {
        let name = series.name().clone();
        let column = match fill {
            FillValue::Numeric(v) => {
                let filled: Vec<f64> = series_to_f64(series)?
                    .into_iter()
                    .map(|x| x.unwrap_or(*v))
                    .collect();
                Column::new(name, filled)
            }
            FillValue::Text(v) => {
                let filled: Vec<String> = series
                    .str()?
                    .into_iter()
                    .map(|x| x.unwrap_or(v.as_str()).to_string())
                    .collect();
                Column::new(name, filled)
            }
        };
        Ok(column)
    }
}

/// Most frequent value of sorted input; ties go to the smallest value
fn mode<T: PartialEq + Copy>(sorted: &[T]) -> Option<T> {
    let mut best = None;
    let mut best_count = 0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best_count {
            best_count = j - i;
            best = Some(sorted[i]);
        }
        i = j;
    }
    best
}

impl ComponentBase for SimpleImputer {
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

impl Transformer for SimpleImputer {
    fn fit(&mut self, x: &DataFrame, _y: Option<&Series>) -> Result<()> {
        let mut fill_values = Vec::new();

        for column in x.get_columns() {
            let series = column.as_materialized_series();
            let dtype = series.dtype();

            let fill = if is_numeric_dtype(dtype) || matches!(dtype, DataType::Boolean) {
                Some(FillValue::Numeric(self.numeric_fill(series)?))
            } else if matches!(dtype, DataType::String) {
                self.text_fill(series)?.map(FillValue::Text)
            } else {
                None
            };

            if let Some(fill) = fill {
                fill_values.push((series.name().to_string(), fill));
            }
        }

        debug!(columns = fill_values.len(), "fitted imputer");
        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, x: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::NotFitted);
        }

        for (name, _) in &self.fill_values {
            if x.column(name).is_err() {
                return Err(PipelineError::FeatureNotFound(name.clone()));
            }
        }

        let columns = x
            .get_columns()
            .iter()
            .map(|column| {
                let series = column.as_materialized_series();
                match self
                    .fill_values
                    .iter()
                    .find(|(name, _)| name.as_str() == series.name().as_str())
                {
                    Some((_, fill)) => Self::fill_column(series, fill),
                    None => Ok(column.clone()),
                }
            })
            .collect::<Result<Vec<Column>>>()?;

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn float_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().as_materialized_series().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_most_frequent_is_default() {
        let df = df!("a" => &[Some(1.0), Some(2.0), Some(2.0), None]).unwrap();
        let mut imputer = SimpleImputer::default();
        let out = imputer.fit_transform(&df, None).unwrap();
        assert_eq!(float_values(&out, "a"), vec![Some(1.0), Some(2.0), Some(2.0), Some(2.0)]);
    }

    #[test]
    fn test_mean_and_median() {
        let df = df!("a" => &[Some(1.0), Some(2.0), Some(6.0), None]).unwrap();

        let mut mean = SimpleImputer::new(
            SimpleImputerConfig::default().with_strategy(ImputeStrategy::Mean),
        )
        .unwrap();
        let out = mean.fit_transform(&df, None).unwrap();
        assert_eq!(float_values(&out, "a")[3], Some(3.0));

        let mut median = SimpleImputer::new(
            SimpleImputerConfig::default().with_strategy(ImputeStrategy::Median),
        )
        .unwrap();
        let out = median.fit_transform(&df, None).unwrap();
        assert_eq!(float_values(&out, "a")[3], Some(2.0));
    }

    #[test]
    fn test_mode_ties_pick_smallest() {
        assert_eq!(mode(&[1.0, 1.0, 3.0, 3.0]), Some(1.0));
        assert_eq!(mode(&["a", "b", "b"]), Some("b"));
        assert_eq!(mode::<f64>(&[]), None);
    }

    #[test]
    fn test_string_column_uses_mode() {
        let df = df!("c" => &[Some("x"), Some("y"), Some("y"), None]).unwrap();
        let mut imputer = SimpleImputer::new(
            SimpleImputerConfig::default().with_strategy(ImputeStrategy::Mean),
        )
        .unwrap();
        let out = imputer.fit_transform(&df, None).unwrap();
        let values: Vec<Option<&str>> = out.column("c").unwrap().as_materialized_series().str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("x"), Some("y"), Some("y"), Some("y")]);
    }

    #[test]
    fn test_all_null_numeric_column_fills_zero() {
        let df = df!("a" => &[None::<f64>, None]).unwrap();
        let mut imputer = SimpleImputer::default();
        let out = imputer.fit_transform(&df, None).unwrap();
        assert_eq!(float_values(&out, "a"), vec![Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_constant_requires_fill_value() {
        let config = SimpleImputerConfig::default().with_strategy(ImputeStrategy::Constant);
        assert!(matches!(
            SimpleImputer::new(config),
            Err(PipelineError::InvalidParameter { .. })
        ));

        let config = SimpleImputerConfig::default()
            .with_strategy(ImputeStrategy::Constant)
            .with_fill_value(-1.0);
        let mut imputer = SimpleImputer::new(config).unwrap();
        let df = df!("a" => &[Some(5.0), None]).unwrap();
        let out = imputer.fit_transform(&df, None).unwrap();
        assert_eq!(float_values(&out, "a"), vec![Some(5.0), Some(-1.0)]);
    }

    #[test]
    fn test_from_parameters_rejects_bad_strategy() {
        let params = match json!({"impute_strategy": "mode"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(matches!(
            SimpleImputer::from_parameters(&params),
            Err(PipelineError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_parameters_report_defaults() {
        let params = SimpleImputer::default().parameters();
        assert_eq!(params.get("impute_strategy"), Some(&json!("most_frequent")));
        assert_eq!(params.get("fill_value"), Some(&Value::Null));
    }

    #[test]
    fn test_transform_before_fit() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(matches!(
            SimpleImputer::default().transform(&df),
            Err(PipelineError::NotFitted)
        ));
    }

    #[test]
    fn test_missing_fitted_column() {
        let mut imputer = SimpleImputer::default();
        imputer.fit(&df!("a" => &[1.0]).unwrap(), None).unwrap();
        assert!(matches!(
            imputer.transform(&df!("b" => &[1.0]).unwrap()),
            Err(PipelineError::FeatureNotFound(_))
        ));
    }
}
