//! Binary and multiclass classification pipelines

use super::pipeline_base::{PipelineBase, ScoreOptions};
use super::templates::PipelineTemplate;
use super::Parameters;
use crate::components::ComponentRegistry;
use crate::data::{check_lengths, target_to_array, unique_labels, IntoFeatures, IntoTarget};
use crate::error::{PipelineError, Result};
use crate::objectives::{ObjectiveRef, ObjectiveScores, PlotMetric, PlotScores};
use crate::problem_types::ProblemType;
use ndarray::{Array1, Array2};

/// Pipeline bound to a single classification problem type
pub trait ClassificationPipeline {
    const PROBLEM_TYPE: ProblemType;

    fn base(&self) -> &PipelineBase;

    fn base_mut(&mut self) -> &mut PipelineBase;

    /// Whether every objective receives the feature frame
    fn passes_features_to_objectives(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn fit<X: IntoFeatures, Y: IntoTarget>(&mut self, x: X, y: Y) -> Result<&mut Self>
    where
        Self: Sized,
    {
        let x = x.into_features()?;
        let y = y.into_target()?;
        check_lengths(&x, &y)?;

        if Self::PROBLEM_TYPE == ProblemType::Binary {
            let labels = unique_labels(&target_to_array(&y)?);
            if labels.len() > 2 {
                return Err(PipelineError::DataError(format!(
                    "binary pipeline got {} distinct labels",
                    labels.len()
                )));
            }
        }

        self.base_mut().fit(x, y)?;
        Ok(self)
    }

    fn predict<X: IntoFeatures>(&self, x: X) -> Result<Array1<f64>> {
        self.base().predict(x)
    }

    fn predict_proba<X: IntoFeatures>(&self, x: X) -> Result<Array2<f64>> {
        self.base().predict_proba(x)
    }

    fn classes(&self) -> &[f64] {
        self.base().classes()
    }

    /// Score against objectives that support this pipeline's problem type
    fn score<X: IntoFeatures, Y: IntoTarget>(
        &self,
        x: X,
        y: Y,
        objectives: &[ObjectiveRef],
    ) -> Result<ObjectiveScores> {
        self.base().score_objectives(
            &x.into_features()?,
            &y.into_target()?,
            objectives,
            ScoreOptions {
                problem_type: Some(Self::PROBLEM_TYPE),
                always_pass_features: self.passes_features_to_objectives(),
            },
        )
    }

    fn get_plot_data<X: IntoFeatures, Y: IntoTarget>(
        &self,
        x: X,
        y: Y,
        plot_metrics: &[&dyn PlotMetric],
    ) -> Result<PlotScores> {
        self.base().get_plot_data(x, y, plot_metrics)
    }

    fn describe(&self, return_dict: bool) -> Option<&Parameters> {
        self.base().describe(return_dict)
    }
}

/// Construction shared by both wrappers; `template` must declare `problem_type`
fn build_base<T: PipelineTemplate + ?Sized>(
    problem_type: ProblemType,
    template: &T,
    parameters: Parameters,
    registry: &ComponentRegistry,
) -> Result<PipelineBase> {
    let declared = template.problem_types();
    if !declared.contains(&problem_type) {
        return Err(PipelineError::UnsupportedProblemType {
            problem_type,
            valid: declared,
        });
    }
    PipelineBase::with_registry(template, parameters, registry)
}

fn check_base(problem_type: ProblemType, base: &PipelineBase) -> Result<()> {
    if base.problem_types().contains(&problem_type) {
        Ok(())
    } else {
        Err(PipelineError::UnsupportedProblemType {
            problem_type,
            valid: base.problem_types().to_vec(),
        })
    }
}

macro_rules! classification_pipeline {
    ($(#[$meta:meta])* $pipeline:ident, $problem_type:expr, $passes_features:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $pipeline {
            base: PipelineBase,
        }

        impl $pipeline {
            pub fn new<T: PipelineTemplate + ?Sized>(
                template: &T,
                parameters: Parameters,
            ) -> Result<Self> {
                Self::with_registry(template, parameters, &ComponentRegistry::default())
            }

            pub fn with_registry<T: PipelineTemplate + ?Sized>(
                template: &T,
                parameters: Parameters,
                registry: &ComponentRegistry,
            ) -> Result<Self> {
                let base = build_base($problem_type, template, parameters, registry)?;
                Ok(Self { base })
            }

            /// Wrap an existing pipeline that declares this problem type
            pub fn from_base(base: PipelineBase) -> Result<Self> {
                check_base($problem_type, &base)?;
                Ok(Self { base })
            }

            pub fn into_base(self) -> PipelineBase {
                self.base
            }
        }

        impl ClassificationPipeline for $pipeline {
            const PROBLEM_TYPE: ProblemType = $problem_type;

            fn base(&self) -> &PipelineBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut PipelineBase {
                &mut self.base
            }

            fn passes_features_to_objectives(&self) -> bool {
                $passes_features
            }
        }
    };
}

classification_pipeline!(
    /// Pipeline for two-class targets
    BinaryClassificationPipeline,
    ProblemType::Binary,
    false
);

classification_pipeline!(
    /// Pipeline for targets with more than two classes; objectives always see the features
    MulticlassClassificationPipeline,
    ProblemType::Multiclass,
    true
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::{LogisticRegressionPipeline, RFClassificationPipeline};
    use ndarray::array;

    fn features() -> Array2<f64> {
        array![
            [0.0, 1.0],
            [0.2, 0.9],
            [0.1, 1.1],
            [1.0, 0.0],
            [0.9, 0.2],
            [1.1, 0.1],
        ]
    }

    #[test]
    fn test_binary_rejects_multiclass_only_template() {
        let template = crate::pipelines::CustomPipeline::new(
            ["Random Forest Classifier"],
            vec![ProblemType::Multiclass],
        );
        let result = BinaryClassificationPipeline::new(&template, Parameters::new());
        assert!(matches!(
            result,
            Err(PipelineError::UnsupportedProblemType {
                problem_type: ProblemType::Binary,
                ..
            })
        ));
    }

    #[test]
    fn test_multiclass_rejects_logistic_template() {
        let result =
            MulticlassClassificationPipeline::new(&LogisticRegressionPipeline, Parameters::new());
        assert!(matches!(
            result,
            Err(PipelineError::UnsupportedProblemType { .. })
        ));
    }

    #[test]
    fn test_binary_fit_rejects_three_labels() {
        let mut pipeline =
            BinaryClassificationPipeline::new(&RFClassificationPipeline, Parameters::new())
                .unwrap();
        let y = vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
        assert!(matches!(
            pipeline.fit(features(), y),
            Err(PipelineError::DataError(_))
        ));
        assert!(!pipeline.base().is_fitted());
    }

    #[test]
    fn test_binary_score_rejects_multiclass_objective() {
        let mut pipeline =
            BinaryClassificationPipeline::new(&LogisticRegressionPipeline, Parameters::new())
                .unwrap();
        let y = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        pipeline.fit(features(), y.clone()).unwrap();

        let scores = pipeline
            .score(features(), y.clone(), &["Accuracy Binary".into()])
            .unwrap();
        assert!(scores.get("Accuracy Binary").is_some());

        let result = pipeline.score(features(), y, &["Accuracy Multiclass".into()]);
        assert!(matches!(
            result,
            Err(PipelineError::UnsupportedProblemType { .. })
        ));
    }

    #[test]
    fn test_from_base_round_trip() {
        let base = PipelineBase::new(&RFClassificationPipeline, Parameters::new()).unwrap();
        let pipeline = MulticlassClassificationPipeline::from_base(base).unwrap();
        assert!(pipeline.passes_features_to_objectives());
        assert_eq!(pipeline.into_base().len(), 4);
    }
}
