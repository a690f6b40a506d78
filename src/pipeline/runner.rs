//! Pipeline runner for composing and executing transform steps.

use crate::collapse::{collapse_rows_with_config, CollapseConfig, CollapseKey, CollapseRule};
use crate::data::{AnnotatedMatrix, MatrixGroup};
use crate::error::{MatrixError, Result};
use crate::ops::{add, divide, log, multiply, subtract, threshold, transform, ElementwiseOp};
use crate::stats::{
    annotate_row_statistic, annotate_t_tests, group_zscore_annotated, quantile_normalize,
    zscore_axis, Axis, Statistic,
};
use crate::transpose::transpose_annotated;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// A step in the transform pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PipelineStep {
    // === Arithmetic (in place) ===
    /// Add a constant to every number.
    Add { value: f64 },
    /// Subtract a constant from every number.
    Subtract { value: f64 },
    /// Multiply every number by a constant.
    Multiply { value: f64 },
    /// Divide every number by a constant.
    Divide { value: f64 },

    // === Element-wise transforms ===
    /// Logarithm in `base`.
    Log { base: f64 },
    /// Clamp into `[min, max]`.
    Threshold { min: f64, max: f64 },
    /// Any other element-wise transform.
    Transform { transform: ElementwiseOp },

    // === Standardization and normalization ===
    /// Z-score along an axis.
    ZScore {
        #[serde(default)]
        axis: Axis,
    },
    /// Per-row z-score against a baseline pooled from column groups.
    GroupZScore { groups: Vec<MatrixGroup> },
    /// Quantile normalization across columns.
    QuantileNormalize,

    // === Annotation ===
    /// Store a per-row statistic as a row annotation.
    AnnotateStatistic {
        statistic: Statistic,
        /// Annotation name; defaults to the statistic's name.
        name: Option<String>,
    },
    /// Store per-row Welch t-test results as row annotations.
    TTest {
        group_a: MatrixGroup,
        group_b: MatrixGroup,
        prefix: String,
    },

    // === Reshaping ===
    /// Collapse rows sharing a key.
    Collapse {
        key: CollapseKey,
        rule: CollapseRule,
        #[serde(default)]
        config: CollapseConfig,
    },
    /// Swap rows and columns.
    Transpose,
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(MatrixError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(MatrixError::from)
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(MatrixError::from)
    }

    /// Save to pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(MatrixError::from)
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }
}

/// Builder for constructing and running transform pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Append an arbitrary step.
    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Add a constant to every value.
    pub fn add(self, value: f64) -> Self {
        self.step(PipelineStep::Add { value })
    }

    /// Subtract a constant from every value.
    pub fn subtract(self, value: f64) -> Self {
        self.step(PipelineStep::Subtract { value })
    }

    /// Multiply every value by a constant.
    pub fn multiply(self, value: f64) -> Self {
        self.step(PipelineStep::Multiply { value })
    }

    /// Divide every value by a constant.
    pub fn divide(self, value: f64) -> Self {
        self.step(PipelineStep::Divide { value })
    }

    /// Logarithm in `base`.
    pub fn log(self, base: f64) -> Self {
        self.step(PipelineStep::Log { base })
    }

    /// Clamp into `[min, max]`.
    pub fn threshold(self, min: f64, max: f64) -> Self {
        self.step(PipelineStep::Threshold { min, max })
    }

    /// Any element-wise transform.
    pub fn transform(self, transform: ElementwiseOp) -> Self {
        self.step(PipelineStep::Transform { transform })
    }

    /// Z-score along `axis`.
    pub fn zscore(self, axis: Axis) -> Self {
        self.step(PipelineStep::ZScore { axis })
    }

    /// Group-wise z-score.
    pub fn group_zscore(self, groups: Vec<MatrixGroup>) -> Self {
        self.step(PipelineStep::GroupZScore { groups })
    }

    /// Quantile normalization.
    pub fn quantile_normalize(self) -> Self {
        self.step(PipelineStep::QuantileNormalize)
    }

    /// Per-row statistic as a row annotation.
    pub fn annotate_statistic(self, statistic: Statistic, name: Option<&str>) -> Self {
        self.step(PipelineStep::AnnotateStatistic {
            statistic,
            name: name.map(String::from),
        })
    }

    /// Per-row Welch t-tests between two groups.
    pub fn t_test(self, group_a: MatrixGroup, group_b: MatrixGroup, prefix: &str) -> Self {
        self.step(PipelineStep::TTest {
            group_a,
            group_b,
            prefix: prefix.to_string(),
        })
    }

    /// Collapse rows sharing `key`, keeping the best row by `rule`.
    pub fn collapse(self, key: CollapseKey, rule: CollapseRule) -> Self {
        self.step(PipelineStep::Collapse {
            key,
            rule,
            config: CollapseConfig::default(),
        })
    }

    /// Transpose.
    pub fn transpose(self) -> Self {
        self.step(PipelineStep::Transpose)
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            steps: self.steps.clone(),
        }
    }

    /// Run the pipeline on a copy of `input`.
    #[instrument(skip_all, fields(pipeline = %self.name, n_steps = self.steps.len()))]
    pub fn run(&self, input: &AnnotatedMatrix) -> Result<AnnotatedMatrix> {
        let mut state = input.clone();

        for (i, step) in self.steps.iter().enumerate() {
            debug!(
                step = i + 1,
                ?step,
                n_rows = state.n_rows(),
                n_cols = state.n_cols(),
                "running pipeline step"
            );
            state = apply_step(state, step).map_err(|e| {
                MatrixError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
        }

        debug!(n_rows = state.n_rows(), n_cols = state.n_cols(), "pipeline finished");
        Ok(state)
    }
}

fn apply_step(mut state: AnnotatedMatrix, step: &PipelineStep) -> Result<AnnotatedMatrix> {
    match step {
        // === Arithmetic ===
        PipelineStep::Add { value } => add(state.matrix_mut(), *value),
        PipelineStep::Subtract { value } => subtract(state.matrix_mut(), *value),
        PipelineStep::Multiply { value } => multiply(state.matrix_mut(), *value),
        PipelineStep::Divide { value } => divide(state.matrix_mut(), *value),

        // === Element-wise ===
        PipelineStep::Log { base } => {
            let out = log(state.matrix(), *base)?;
            state = state.with_matrix(out)?;
        }
        PipelineStep::Threshold { min, max } => {
            let out = threshold(state.matrix(), *min, *max)?;
            state = state.with_matrix(out)?;
        }
        PipelineStep::Transform { transform: op } => {
            let out = transform(state.matrix(), op)?;
            state = state.with_matrix(out)?;
        }

        // === Standardization ===
        PipelineStep::ZScore { axis } => {
            let out = zscore_axis(state.matrix(), *axis);
            state = state.with_matrix(out)?;
        }
        PipelineStep::GroupZScore { groups } => {
            state = group_zscore_annotated(&state, groups)?;
        }
        PipelineStep::QuantileNormalize => {
            let out = quantile_normalize(state.matrix());
            state = state.with_matrix(out)?;
        }

        // === Annotation ===
        PipelineStep::AnnotateStatistic { statistic, name } => {
            let name = name.as_deref().unwrap_or(statistic.name());
            annotate_row_statistic(&mut state, name, *statistic)?;
        }
        PipelineStep::TTest {
            group_a,
            group_b,
            prefix,
        } => {
            annotate_t_tests(&mut state, group_a, group_b, prefix)?;
        }

        // === Reshaping ===
        PipelineStep::Collapse { key, rule, config } => {
            let (collapsed, report) = collapse_rows_with_config(&state, key, rule, config)?;
            debug!(
                n_input = report.n_input_rows,
                n_output = report.len(),
                "collapse step"
            );
            state = collapsed;
        }
        PipelineStep::Transpose => {
            state = transpose_annotated(&state)?;
        }
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AnnotationValue, DenseMatrix};
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_matrix() -> AnnotatedMatrix {
        let m = DenseMatrix::from_rows(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![7.0, 8.0, 9.0, 10.0],
            vec![2.0, 2.0, 2.0, 2.0],
        ])
        .unwrap();
        let mut am = AnnotatedMatrix::new(Box::new(m));
        am.row_annotations_mut()
            .insert("gene", vec!["G1", "G1", "G2"])
            .unwrap();
        am.row_annotations_mut()
            .insert("probe", vec!["p1", "p2", "p3"])
            .unwrap();
        am.col_annotations_mut()
            .insert("condition", vec!["ctl", "ctl", "trt", "trt"])
            .unwrap();
        am
    }

    #[test]
    fn test_pipeline_builder() {
        let pipeline = Pipeline::new()
            .name("test")
            .add(1.0)
            .log(2.0)
            .zscore(Axis::Rows)
            .transpose();

        let config = pipeline.to_config(Some("Test pipeline"));
        assert_eq!(config.steps.len(), 4);
        assert_eq!(config.name, "test");
        assert_eq!(config.steps[2], PipelineStep::ZScore { axis: Axis::Rows });
    }

    #[test]
    fn test_arithmetic_steps() {
        let am = create_test_matrix();
        let out = Pipeline::new().add(1.0).multiply(2.0).run(&am).unwrap();
        assert_eq!(out.matrix().row_values(0), vec![4.0, 6.0, 8.0, 10.0]);
        // input is untouched
        assert_eq!(am.matrix().row_values(0), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_collapse_then_transpose() {
        let am = create_test_matrix();
        let out = Pipeline::new()
            .collapse(
                CollapseKey::Annotation("gene".to_string()),
                CollapseRule::MaxMean,
            )
            .transpose()
            .run(&am)
            .unwrap();

        assert_eq!(out.n_rows(), 4);
        assert_eq!(out.n_cols(), 2);
        assert_eq!(out.matrix().col_values(0), vec![7.0, 8.0, 9.0, 10.0]);
        assert_eq!(out.col_annotation("probe", 0), Some(&AnnotationValue::from("p1;p2")));
        assert!(out.row_annotations().contains("condition"));
    }

    #[test]
    fn test_group_zscore_and_t_test_steps() {
        let am = create_test_matrix();
        let ctl = MatrixGroup::matching("ctl", "condition", "ctl");
        let trt = MatrixGroup::matching("trt", "condition", "trt");
        let out = Pipeline::new()
            .t_test(ctl.clone(), trt.clone(), "trt")
            .group_zscore(vec![ctl, trt])
            .annotate_statistic(Statistic::Mean, None)
            .run(&am)
            .unwrap();

        assert!(out.row_annotations().contains("trt_p_value"));
        // constant row scores 0 everywhere
        assert_eq!(out.matrix().row_values(2), vec![0.0; 4]);
        let mean = out.row_annotation("mean", 0).and_then(|v| v.as_number()).unwrap();
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pipeline_error_handling() {
        let am = create_test_matrix();
        let result = Pipeline::new().add(1.0).threshold(5.0, 1.0).run(&am);
        match result {
            Err(MatrixError::Pipeline(msg)) => assert!(msg.starts_with("Step 2")),
            other => panic!("expected pipeline error, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_config_yaml() {
        let yaml = r#"
name: expression
description: log then standardize
steps:
  - step: add
    value: 1.0
  - step: log
    base: 2.0
  - step: z_score
    axis: rows
  - step: collapse
    key:
      annotation: gene
    rule:
      rule: max_std_dev
  - step: quantile_normalize
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "expression");
        assert_eq!(config.steps.len(), 5);
        assert_eq!(config.steps[1], PipelineStep::Log { base: 2.0 });

        let round_trip = PipelineConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(round_trip, config);

        let out = Pipeline::from_config(&config).run(&create_test_matrix()).unwrap();
        assert_eq!(out.n_rows(), 2);
    }

    #[test]
    fn test_pipeline_config_json() {
        let config = Pipeline::new()
            .name("json")
            .threshold(0.0, 5.0)
            .transform(ElementwiseOp::Round { decimals: 1 })
            .to_config(None);
        let json = config.to_json().unwrap();
        assert!(json.contains("\"step\": \"threshold\""));
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_pipeline_config_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name: from-file").unwrap();
        writeln!(file, "steps:").unwrap();
        writeln!(file, "  - step: transpose").unwrap();
        file.flush().unwrap();

        let config = PipelineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.steps, vec![PipelineStep::Transpose]);
        assert!(config.description.is_none());

        let missing = PipelineConfig::from_path("/nonexistent/pipeline.yaml");
        assert!(matches!(missing, Err(MatrixError::Io(_))));
    }
}
