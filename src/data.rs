//! Boundary coercion between raw inputs, polars frames and ndarray arrays
//!
//! Pipelines work on a `DataFrame` for features and a `Series` for the
//! target. Raw `ndarray` inputs are converted on the way in; estimators
//! convert back to dense `f64` arrays on the way down.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Name given to targets built from raw arrays
pub const DEFAULT_TARGET_NAME: &str = "target";

/// Inputs that can be coerced to a feature frame
pub trait IntoFeatures {
    fn into_features(self) -> Result<DataFrame>;
}

/// Inputs that can be coerced to a target series
pub trait IntoTarget {
    fn into_target(self) -> Result<Series>;
}

impl IntoFeatures for DataFrame {
    fn into_features(self) -> Result<DataFrame> {
        Ok(self)
    }
}

impl IntoFeatures for &DataFrame {
    fn into_features(self) -> Result<DataFrame> {
        Ok(self.clone())
    }
}

impl IntoFeatures for Array2<f64> {
    fn into_features(self) -> Result<DataFrame> {
        array_to_frame(&self)
    }
}

impl IntoFeatures for &Array2<f64> {
    fn into_features(self) -> Result<DataFrame> {
        array_to_frame(self)
    }
}

impl IntoTarget for Series {
    fn into_target(self) -> Result<Series> {
        Ok(self)
    }
}

impl IntoTarget for &Series {
    fn into_target(self) -> Result<Series> {
        Ok(self.clone())
    }
}

impl IntoTarget for Array1<f64> {
    fn into_target(self) -> Result<Series> {
        Ok(Series::new(DEFAULT_TARGET_NAME.into(), self.to_vec()))
    }
}

impl IntoTarget for &Array1<f64> {
    fn into_target(self) -> Result<Series> {
        Ok(Series::new(DEFAULT_TARGET_NAME.into(), self.to_vec()))
    }
}

impl IntoTarget for Vec<f64> {
    fn into_target(self) -> Result<Series> {
        Ok(Series::new(DEFAULT_TARGET_NAME.into(), self))
    }
}

impl IntoTarget for &[f64] {
    fn into_target(self) -> Result<Series> {
        Ok(Series::new(DEFAULT_TARGET_NAME.into(), self))
    }
}

/// Build a frame from a dense array, naming columns by position ("0", "1", ...)
pub fn array_to_frame(x: &Array2<f64>) -> Result<DataFrame> {
    let columns: Vec<Column> = (0..x.ncols())
        .map(|i| Column::new(i.to_string().into(), x.column(i).to_vec()))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Ordered column names of a frame
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Check if dtype is numeric
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Values of a numeric (or boolean) series as `f64`, nulls kept as `None`
pub fn series_to_f64(series: &Series) -> Result<Vec<Option<f64>>> {
    let dtype = series.dtype();
    if !is_numeric_dtype(dtype) && !matches!(dtype, DataType::Boolean) {
        return Err(PipelineError::DataError(format!(
            "column '{}' has non-numeric dtype {}",
            series.name(),
            dtype
        )));
    }

    let casted = series.cast(&DataType::Float64)?;
    let values = casted.f64()?.into_iter().collect();
    Ok(values)
}

/// Extract every column of a frame into a row-major `Array2<f64>`.
///
/// All columns must be numeric and free of missing values.
pub fn frame_to_array(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();

    let col_data: Vec<Vec<f64>> = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            series_to_f64(series)?
                .into_iter()
                .map(|v| {
                    v.ok_or_else(|| {
                        PipelineError::DataError(format!(
                            "column '{}' contains missing values",
                            series.name()
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

/// Extract a numeric target into an `Array1<f64>`
pub fn target_to_array(y: &Series) -> Result<Array1<f64>> {
    let values = series_to_f64(y)?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                PipelineError::DataError(format!("target '{}' contains missing values", y.name()))
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array1::from_vec(values))
}

/// Ensure features and target have the same number of rows
pub fn check_lengths(x: &DataFrame, y: &Series) -> Result<()> {
    if x.height() != y.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("y length = {}", x.height()),
            actual: format!("y length = {}", y.len()),
        });
    }
    Ok(())
}

/// Sorted unique labels of a target array
pub fn unique_labels(y: &Array1<f64>) -> Vec<f64> {
    let mut labels: Vec<f64> = y.iter().copied().collect();
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup();
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_array_round_trip_names_columns_by_position() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let df = x.clone().into_features().unwrap();

        assert_eq!(column_names(&df), vec!["0".to_string(), "1".to_string()]);
        assert_eq!(frame_to_array(&df).unwrap(), x);
    }

    #[test]
    fn test_frame_to_array_rejects_missing_values() {
        let df = df!("a" => &[Some(1.0), None]).unwrap();
        let err = frame_to_array(&df).unwrap_err();
        assert!(matches!(err, PipelineError::DataError(_)));
    }

    #[test]
    fn test_frame_to_array_rejects_strings() {
        let df = df!("a" => &["x", "y"]).unwrap();
        assert!(frame_to_array(&df).is_err());
    }

    #[test]
    fn test_integer_target_is_cast() {
        let y = Series::new("y".into(), &[0i64, 1, 2]);
        assert_eq!(target_to_array(&y).unwrap(), array![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_unique_labels_sorted() {
        assert_eq!(unique_labels(&array![2.0, 0.0, 2.0, 1.0]), vec![0.0, 1.0, 2.0]);
    }
}
