use crate::domain::model::{AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::stats::bivariate::linalg::{dot, l1_norm, l2_norm, max_norm, squared_l2_norm};
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;

pub const DEFAULT_VECTOR: [f64; 3] = [25.0, 2.0, 5.0];

/// L1, L2, squared L2 and max norms of one vector, plus the orthogonality
/// check of the unit basis vectors.
pub struct VectorNormsAnalysis {
    pub vector: Vec<f64>,
}

impl VectorNormsAnalysis {
    pub fn new(vector: Vec<f64>) -> Self {
        Self { vector }
    }
}

impl Default for VectorNormsAnalysis {
    fn default() -> Self {
        Self::new(DEFAULT_VECTOR.to_vec())
    }
}

#[async_trait]
impl Analysis for VectorNormsAnalysis {
    fn name(&self) -> &str {
        "norms"
    }

    async fn extract(&self) -> Result<Table> {
        let mut table = Table::new(["x"]);
        for v in &self.vector {
            table.push_row(vec![v.to_string()])?;
        }
        Ok(table)
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let x = data.numeric_values("x")?;
        if x.is_empty() {
            return Err(StatsError::empty_data("vector has no components"));
        }
        let (i, j) = ([1.0, 0.0], [0.0, 1.0]);

        let mut output = AnalysisOutput::new("Vector Norms");
        output
            .line("x", format!("{:?}", x))
            .line("L2 norm", format!("{:.4}", l2_norm(&x)))
            .line("L1 norm", l1_norm(&x))
            .line("Squared L2 norm", squared_l2_norm(&x))
            .line("x · x", dot(&x, &x))
            .line("Max norm", max_norm(&x))
            .line("i · j", dot(&i, &j));
        output.artifact(Artifact::Json {
            name: "vector_norms.json".to_string(),
            value: serde_json::json!({
                "vector": x,
                "l2": l2_norm(&x),
                "l1": l1_norm(&x),
                "squared_l2": squared_l2_norm(&x),
                "max": max_norm(&x),
                "orthogonal_unit_dot": dot(&i, &j),
            }),
        });
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_vector_norms() {
        let analysis = VectorNormsAnalysis::default();
        let data = analysis.extract().await.unwrap();
        let output = analysis.transform(data).unwrap();
        assert_eq!(output.value_of("L2 norm"), Some("25.5734"));
        assert_eq!(output.value_of("L1 norm"), Some("32"));
        assert_eq!(output.value_of("Squared L2 norm"), Some("654"));
        assert_eq!(output.value_of("x · x"), Some("654"));
        assert_eq!(output.value_of("Max norm"), Some("25"));
        assert_eq!(output.value_of("i · j"), Some("0"));
    }

    #[test]
    fn test_empty_vector() {
        let analysis = VectorNormsAnalysis::new(Vec::new());
        assert!(analysis.transform(Table::new(["x"])).is_err());
    }
}
