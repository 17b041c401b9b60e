//! Data handed to graph and chart renderers

use super::PipelineBase;
use crate::components::ComponentParameters;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

/// Escape text for a Graphviz record label
fn escape_record(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn format_parameters(parameters: &ComponentParameters) -> String {
    parameters
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => "None".to_string(),
                other => other.to_string(),
            };
            format!("{} : {}\\l", escape_record(key), escape_record(&value))
        })
        .collect()
}

/// Graphviz DOT source: one record node per component, chained left to right
pub fn make_pipeline_graph(pipeline: &PipelineBase) -> String {
    let name = pipeline.name().replace('\\', "\\\\").replace('"', "\\\"");
    let mut dot = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(dot, "digraph \"{}\" {{", name);
    let _ = writeln!(dot, "    graph [label=\"{}\", labelloc=t, rankdir=LR];", name);
    let _ = writeln!(dot, "    node [shape=record, fontsize=10];");

    let components = pipeline.component_graph();
    for (i, component) in components.iter().enumerate() {
        let _ = writeln!(
            dot,
            "    \"{}\" [label=\"{{{}|{}}}\"];",
            i,
            escape_record(component.name()),
            format_parameters(&component.parameters())
        );
    }
    for i in 1..components.len() {
        let _ = writeln!(dot, "    \"{}\" -> \"{}\";", i - 1, i);
    }
    dot.push_str("}\n");
    dot
}

/// Feature importance table for a horizontal bar chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportanceChart {
    pub title: String,
    /// Feature names, largest magnitude first
    pub features: Vec<String>,
    pub importances: Vec<f64>,
}

impl FeatureImportanceChart {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Chart data from sorted importances; zero importances are dropped unless `show_all_features`
pub fn make_feature_importance_graph(
    pipeline_name: &str,
    importances: &[(String, f64)],
    show_all_features: bool,
) -> FeatureImportanceChart {
    let (features, importances) = importances
        .iter()
        .filter(|(_, importance)| show_all_features || *importance != 0.0)
        .cloned()
        .unzip();

    FeatureImportanceChart {
        title: format!("Feature Importances: {}", pipeline_name),
        features,
        importances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_record() {
        assert_eq!(escape_record("a|b{c}"), "a\\|b\\{c\\}");
    }

    #[test]
    fn test_importance_chart_drops_zero() {
        let importances = vec![("a".to_string(), 0.7), ("b".to_string(), 0.0), ("c".to_string(), -0.3)];

        let chart = make_feature_importance_graph("P", &importances, false);
        assert_eq!(chart.features, vec!["a", "c"]);
        assert_eq!(chart.importances, vec![0.7, -0.3]);

        let chart = make_feature_importance_graph("P", &importances, true);
        assert_eq!(chart.len(), 3);
        assert_eq!(chart.title, "Feature Importances: P");
    }
}
