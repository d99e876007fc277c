//! How columns move together: correlation, covariance and per-feature
//! variance, with the eigen structure of the covariance matrix.

use super::{file_stem, numeric_headers};
use crate::charts::{Figure, Grid, Heatmap, Layer, Plot, Rgb};
use crate::core::TableSource;
use crate::domain::model::{AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::stats::bivariate::{
    complete_cases, correlation_matrix, covariance, covariance_matrix, pearson_correlation,
    symmetric_eigen, Matrix,
};
use crate::stats::descriptive::sample_variance;
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;

/// `strong positive`, `weak negative`, `none`, ...
pub fn correlation_strength(r: f64) -> &'static str {
    match (r.abs(), r >= 0.0) {
        (a, true) if a >= 0.7 => "strong positive",
        (a, false) if a >= 0.7 => "strong negative",
        (a, true) if a >= 0.3 => "moderate positive",
        (a, false) if a >= 0.3 => "moderate negative",
        (a, true) if a > 0.1 => "weak positive",
        (a, false) if a > 0.1 => "weak negative",
        _ => "none",
    }
}

/// Explicit columns, or every numeric column when none are given.
fn resolve_columns(data: &Table, columns: &[String]) -> Result<Vec<String>> {
    let columns = if columns.is_empty() {
        numeric_headers(data)
    } else {
        columns.to_vec()
    };
    if columns.len() < 2 {
        return Err(StatsError::InsufficientDataError {
            context: "matrix columns".to_string(),
            needed: 2,
            found: columns.len(),
        });
    }
    Ok(columns)
}

fn column_values(data: &Table, columns: &[String]) -> Result<Vec<Vec<f64>>> {
    let refs: Vec<&str> = columns.iter().map(String::as_str).collect();
    complete_cases(data, &refs)
}

fn heatmap(title: &str, matrix: &Matrix) -> Figure {
    let side = 260 + 150 * matrix.size() as u32;
    Figure::Heatmap(Heatmap {
        title: title.to_string(),
        labels: matrix.labels.clone(),
        values: matrix.values.clone(),
        size: (side.max(600), side.max(480)),
    })
}

fn pair(data: &Table, x: &str, y: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut columns = complete_cases(data, &[x, y])?;
    let ys = columns.pop().unwrap_or_default();
    let xs = columns.pop().unwrap_or_default();
    Ok((xs, ys))
}

pub enum CorrelationMode {
    /// Pearson r of two columns.
    Pair { x: String, y: String },
    /// Four series (`series,x,y` long format) drawn as a 2×2 grid.
    Demo,
    /// Correlation and covariance matrices of the given (or all numeric)
    /// columns.
    Matrix { columns: Vec<String> },
}

pub struct CorrelationAnalysis {
    pub source: TableSource,
    pub mode: CorrelationMode,
}

impl CorrelationAnalysis {
    pub fn new(source: TableSource, mode: CorrelationMode) -> Self {
        Self { source, mode }
    }

    fn pair(&self, data: &Table, x: &str, y: &str) -> Result<AnalysisOutput> {
        let (xs, ys) = pair(data, x, y)?;
        let r = pearson_correlation(&xs, &ys).ok_or_else(|| StatsError::ValidationError {
            message: format!(
                "correlation of '{}' and '{}' is undefined (fewer than 2 rows or zero variance)",
                x, y
            ),
        })?;

        let plot = Plot::new(format!("{} vs {} (r = {:.2})", x, y, r))
            .x_label(x)
            .y_label(y)
            .layer(Layer::points(xs.iter().copied().zip(ys.iter().copied()).collect(), Rgb::BLUE));

        let mut output = AnalysisOutput::new("Correlation Coefficient");
        output
            .line("Source", self.source.describe())
            .line("Columns", format!("{} vs {}", x, y))
            .line("Rows used", xs.len())
            .line("Correlation Coefficient", format!("{:.2}", r))
            .line("Strength", correlation_strength(r));
        output.artifact(Artifact::Chart {
            name: format!("correlation_{}_{}.png", file_stem(x), file_stem(y)),
            figure: plot.into(),
        });
        Ok(output)
    }

    fn demo(&self, data: Table) -> Result<AnalysisOutput> {
        let mut order: Vec<String> = Vec::new();
        for name in data.column("series")? {
            if !order.iter().any(|o| o == name) {
                order.push(name.to_string());
            }
        }

        let mut output = AnalysisOutput::new("How strong or weak two variables are correlated");
        output.line("Source", self.source.describe());
        let mut panels = Vec::new();
        for name in &order {
            let series = data.filter_rows(|row| row.first().map(String::as_str) == Some(name.as_str()));
            let (xs, ys) = pair(&series, "x", "y")?;
            let r = pearson_correlation(&xs, &ys).unwrap_or(f64::NAN);
            output.line(name.as_str(), format!("r = {:.2}", r));
            panels.push(
                Plot::new(format!("{} (r = {:.2})", name, r))
                    .x_label("X")
                    .y_label("Y")
                    .layer(Layer::points(xs.into_iter().zip(ys).collect(), Rgb::BLUE)),
            );
        }

        output
            .artifact(Artifact::Csv {
                name: "correlation_demo.csv".to_string(),
                table: data,
            })
            .artifact(Artifact::Chart {
                name: "correlation_strength.png".to_string(),
                figure: Figure::Grid(Grid {
                    title: "Correlation strength".to_string(),
                    columns: 2,
                    panels,
                    size: (1440, 1200),
                }),
            });
        Ok(output)
    }

    fn matrix(&self, data: &Table, columns: &[String]) -> Result<AnalysisOutput> {
        let columns = resolve_columns(data, columns)?;
        let values = column_values(data, &columns)?;
        let labels: Vec<&str> = columns.iter().map(String::as_str).collect();
        let corr = correlation_matrix(&labels, &values)?;
        let cov = covariance_matrix(&labels, &values)?;

        let mut output = AnalysisOutput::new("Correlation Matrix");
        output
            .line("Source", self.source.describe())
            .line("Columns", columns.join(", "))
            .line("Complete rows", values.first().map_or(0, Vec::len));
        for (i, a) in columns.iter().enumerate() {
            for (j, b) in columns.iter().enumerate().skip(i + 1) {
                output.line(format!("r({}, {})", a, b), format!("{:.3}", corr.values[i][j]));
            }
        }

        output
            .artifact(Artifact::Csv {
                name: "correlation_matrix.csv".to_string(),
                table: corr.to_table(),
            })
            .artifact(Artifact::Chart {
                name: "correlation_matrix.png".to_string(),
                figure: heatmap("Correlation Matrix", &corr),
            })
            .artifact(Artifact::Csv {
                name: "covariance_matrix.csv".to_string(),
                table: cov.to_table(),
            })
            .artifact(Artifact::Chart {
                name: "covariance_matrix.png".to_string(),
                figure: heatmap("Covariance Matrix", &cov),
            });
        Ok(output)
    }
}

#[async_trait]
impl Analysis for CorrelationAnalysis {
    fn name(&self) -> &str {
        "correlation"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        match &self.mode {
            CorrelationMode::Pair { x, y } => self.pair(&data, x, y),
            CorrelationMode::Demo => self.demo(data),
            CorrelationMode::Matrix { columns } => self.matrix(&data, columns),
        }
    }
}

pub enum CovarianceMode {
    /// Variance of X and covariance of X with Y.
    Pair { x: String, y: String },
    /// Covariance matrix of the columns plus its eigen decomposition.
    Matrix { columns: Vec<String> },
    /// Eigen decomposition of a labelled covariance matrix CSV.
    Eigen,
}

pub struct CovarianceAnalysis {
    pub source: TableSource,
    pub mode: CovarianceMode,
}

impl CovarianceAnalysis {
    pub fn new(source: TableSource, mode: CovarianceMode) -> Self {
        Self { source, mode }
    }

    fn pair(&self, data: &Table, x: &str, y: &str) -> Result<AnalysisOutput> {
        let (xs, ys) = pair(data, x, y)?;
        let insufficient = || StatsError::InsufficientDataError {
            context: format!("covariance of '{}' and '{}'", x, y),
            needed: 2,
            found: xs.len(),
        };
        let var_x = sample_variance(&xs).ok_or_else(insufficient)?;
        let cov_xy = covariance(&xs, &ys).ok_or_else(insufficient)?;
        let direction = if cov_xy > 0.0 {
            "increase together"
        } else if cov_xy < 0.0 {
            "move in opposite directions"
        } else {
            "no consistent relationship"
        };

        let mut output = AnalysisOutput::new("Variance and Covariance");
        output
            .line("Source", self.source.describe())
            .line("Rows used", xs.len())
            .line(format!("📈 Variance of {} (X)", x), format!("{:.2}", var_x))
            .line(
                format!("🔗 Covariance of {} and {} (X,Y)", x, y),
                format!("{:.2}", cov_xy),
            )
            .line("Direction", direction);
        output.artifact(Artifact::Json {
            name: "covariance.json".to_string(),
            value: serde_json::json!({
                "x": x,
                "y": y,
                "rows": xs.len(),
                "variance_x": var_x,
                "covariance_xy": cov_xy,
            }),
        });
        Ok(output)
    }

    fn eigen(output: &mut AnalysisOutput, matrix: &Matrix) -> Result<()> {
        let pairs = symmetric_eigen(matrix)?;

        let mut table = Table::new(["component", "eigenvalue"]);
        for (i, p) in pairs.iter().enumerate() {
            table.push_row(vec![i.to_string(), p.value.to_string()])?;
            output.line(format!("Eigenvalue {}", i), format!("{:.4}", p.value));
        }

        let top = pairs
            .first()
            .ok_or_else(|| StatsError::empty_data("covariance matrix is empty"))?;
        output.line(
            "Top eigenvector",
            matrix
                .labels
                .iter()
                .zip(&top.vector)
                .map(|(l, w)| format!("{}={:.4}", l, w))
                .collect::<Vec<_>>()
                .join(", "),
        );

        let values_plot = Plot::new("Eigenvalues of Covariance Matrix")
            .x_label("Component Index")
            .y_label("Eigenvalue (Variance Explained)")
            .size(1200, 480)
            .layer(
                Layer::line(
                    pairs.iter().enumerate().map(|(i, p)| (i as f64, p.value)).collect(),
                    Rgb::BLUE,
                )
                .with_markers(),
            );
        let vector_plot = Plot::new("Top Eigenvector (Principal Portfolio Direction)")
            .y_label("Weight")
            .size(1200, 480)
            .categories(matrix.labels.clone())
            .layer(Layer::category_bars(&top.vector, Rgb::BLUE).with_colors(Rgb::PALETTE.to_vec()));

        output
            .artifact(Artifact::Csv {
                name: "eigenvalues.csv".to_string(),
                table,
            })
            .artifact(Artifact::Chart {
                name: "covariance_matrix_eigenvalues.png".to_string(),
                figure: values_plot.into(),
            })
            .artifact(Artifact::Chart {
                name: "covariance_matrix_eigenvector.png".to_string(),
                figure: vector_plot.into(),
            });
        Ok(())
    }
}

#[async_trait]
impl Analysis for CovarianceAnalysis {
    fn name(&self) -> &str {
        "covariance"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        match &self.mode {
            CovarianceMode::Pair { x, y } => self.pair(&data, x, y),
            CovarianceMode::Matrix { columns } => {
                let columns = resolve_columns(&data, columns)?;
                let values = column_values(&data, &columns)?;
                let labels: Vec<&str> = columns.iter().map(String::as_str).collect();
                let cov = covariance_matrix(&labels, &values)?;

                let mut output = AnalysisOutput::new("Covariance Matrix");
                output
                    .line("Source", self.source.describe())
                    .line("Columns", columns.join(", "))
                    .line("Complete rows", values.first().map_or(0, Vec::len));
                output
                    .artifact(Artifact::Csv {
                        name: "covariance_matrix.csv".to_string(),
                        table: cov.to_table(),
                    })
                    .artifact(Artifact::Chart {
                        name: "covariance_matrix.png".to_string(),
                        figure: heatmap("Covariance Matrix", &cov),
                    });
                Self::eigen(&mut output, &cov)?;
                Ok(output)
            }
            CovarianceMode::Eigen => {
                let matrix = Matrix::from_table(&data)?;
                let mut output = AnalysisOutput::new("Covariance Matrix Eigen Decomposition");
                output
                    .line("Source", self.source.describe())
                    .line("Columns", matrix.labels.join(", "));
                Self::eigen(&mut output, &matrix)?;
                Ok(output)
            }
        }
    }
}

/// Sample variance of each feature, written to `feature_variance.csv`.
pub struct VarianceAnalysis {
    pub source: TableSource,
    pub columns: Vec<String>,
}

impl VarianceAnalysis {
    pub fn new(source: TableSource, columns: Vec<String>) -> Self {
        Self { source, columns }
    }
}

#[async_trait]
impl Analysis for VarianceAnalysis {
    fn name(&self) -> &str {
        "variance"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let columns = if self.columns.is_empty() {
            numeric_headers(&data)
        } else {
            self.columns.clone()
        };
        if columns.is_empty() {
            return Err(StatsError::empty_data("no numeric columns to analyze"));
        }
        let values = column_values(&data, &columns)?;

        let mut table = Table::new(["feature", "variance"]);
        let mut heights = Vec::with_capacity(columns.len());
        let mut output = AnalysisOutput::new("Variance of Each Feature");
        output.line("Source", self.source.describe());
        for (column, v) in columns.iter().zip(&values) {
            let variance = sample_variance(v).ok_or_else(|| StatsError::InsufficientDataError {
                context: format!("variance of '{}'", column),
                needed: 2,
                found: v.len(),
            })?;
            table.push_row(vec![column.clone(), variance.to_string()])?;
            output.line(column.as_str(), format!("{:.2}", variance));
            heights.push(variance);
        }

        let plot = Plot::new("Feature Variance")
            .y_label("Variance")
            .size(900, 600)
            .categories(columns.clone())
            .layer(Layer::category_bars(&heights, Rgb::BLUE).with_colors(Rgb::PALETTE.to_vec()));
        output
            .artifact(Artifact::Csv {
                name: "feature_variance.csv".to_string(),
                table,
            })
            .artifact(Artifact::Chart {
                name: "feature_variance.png".to_string(),
                figure: plot.into(),
            });
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::DatasetKind;

    fn source() -> TableSource {
        TableSource::generated(DatasetKind::HeightWeight, 1)
    }

    fn heights() -> Table {
        Table::from_csv_bytes(b"Height,Weight,Name\n160,60,a\n165,65,b\n170,70,c\n175,75,d\n180,80,e\n")
            .unwrap()
    }

    #[test]
    fn test_perfect_pair_correlation() {
        let analysis = CorrelationAnalysis::new(
            source(),
            CorrelationMode::Pair {
                x: "Height".into(),
                y: "Weight".into(),
            },
        );
        let output = analysis.transform(heights()).unwrap();
        assert_eq!(output.value_of("Correlation Coefficient"), Some("1.00"));
        assert_eq!(output.value_of("Strength"), Some("strong positive"));
    }

    #[test]
    fn test_constant_column_has_no_correlation() {
        let data = Table::from_csv_bytes(b"a,b\n1,5\n2,5\n3,5\n").unwrap();
        let analysis = CorrelationAnalysis::new(
            source(),
            CorrelationMode::Pair {
                x: "a".into(),
                y: "b".into(),
            },
        );
        assert!(matches!(
            analysis.transform(data),
            Err(StatsError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_demo_grid_has_four_panels() {
        let data = crate::datasets::correlation_demo_table(42).unwrap();
        let analysis = CorrelationAnalysis::new(source(), CorrelationMode::Demo);
        let output = analysis.transform(data).unwrap();
        let grid = output
            .artifacts
            .iter()
            .find_map(|a| match a {
                Artifact::Chart {
                    figure: Figure::Grid(g),
                    ..
                } => Some(g),
                _ => None,
            })
            .unwrap();
        assert_eq!(grid.panels.len(), 4);
        assert!(grid.panels[0].title.starts_with("Strong Positive Correlation (r = 0.9"));
    }

    #[test]
    fn test_matrix_uses_numeric_columns() {
        let analysis = CorrelationAnalysis::new(
            source(),
            CorrelationMode::Matrix {
                columns: Vec::new(),
            },
        );
        let output = analysis.transform(heights()).unwrap();
        assert_eq!(output.value_of("Columns"), Some("Height, Weight"));
        assert_eq!(output.value_of("r(Height, Weight)"), Some("1.000"));
        assert_eq!(output.artifacts.len(), 4);
    }

    #[test]
    fn test_covariance_pair() {
        let analysis = CovarianceAnalysis::new(
            source(),
            CovarianceMode::Pair {
                x: "Height".into(),
                y: "Weight".into(),
            },
        );
        let output = analysis.transform(heights()).unwrap();
        assert_eq!(output.value_of("📈 Variance of Height (X)"), Some("62.50"));
        assert_eq!(
            output.value_of("🔗 Covariance of Height and Weight (X,Y)"),
            Some("62.50")
        );
        assert_eq!(output.value_of("Direction"), Some("increase together"));
    }

    #[test]
    fn test_eigen_from_matrix_csv() {
        let data = Table::from_csv_bytes(b",a,b\na,2,0\nb,0,1\n").unwrap();
        let analysis = CovarianceAnalysis::new(source(), CovarianceMode::Eigen);
        let output = analysis.transform(data).unwrap();
        assert_eq!(output.value_of("Eigenvalue 0"), Some("2.0000"));
        assert_eq!(output.value_of("Eigenvalue 1"), Some("1.0000"));
        assert_eq!(output.value_of("Top eigenvector"), Some("a=1.0000, b=0.0000"));
    }

    #[test]
    fn test_feature_variance() {
        let analysis = VarianceAnalysis::new(source(), Vec::new());
        let output = analysis.transform(heights()).unwrap();
        assert_eq!(output.value_of("Height"), Some("62.50"));
        assert_eq!(output.value_of("Weight"), Some("62.50"));
        assert_eq!(output.title, "Variance of Each Feature");
    }

    #[test]
    fn test_covariance_matrix_title_is_plain() {
        let analysis = CovarianceAnalysis::new(
            source(),
            CovarianceMode::Matrix {
                columns: Vec::new(),
            },
        );
        let output = analysis.transform(heights()).unwrap();
        assert_eq!(output.title, "Covariance Matrix");
        assert!(output.value_of("Eigenvalue 0").is_some());
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(correlation_strength(-0.85), "strong negative");
        assert_eq!(correlation_strength(0.05), "none");
        assert_eq!(correlation_strength(0.2), "weak positive");
    }
}
