use super::file_stem;
use crate::charts::{Layer, Plot, Rgb};
use crate::core::TableSource;
use crate::datasets::daily_temperatures;
use crate::domain::model::{AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::stats::descriptive::{mean, sample_std_dev};
use crate::stats::distribution::{empirical_cdf, histogram, linspace, pmf, GaussianKde, Normal};
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;

const KDE_POINTS: usize = 1000;
const NORMAL_BINS: usize = 20;

fn present(data: &Table, column: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = data.numeric_column(column)?.into_iter().flatten().collect();
    if values.is_empty() {
        return Err(StatsError::empty_data(format!("no numeric values in '{}'", column)));
    }
    Ok(values)
}

/// PMF for discrete columns, KDE density for continuous ones and the
/// empirical CDF for any column.
pub struct DistributionAnalysis {
    pub source: TableSource,
    pub discrete: Vec<String>,
    pub continuous: Vec<String>,
    pub cumulative: Vec<String>,
}

impl DistributionAnalysis {
    /// The customer-behaviour layout: purchases and visits are discrete,
    /// spend and time in store continuous.
    pub fn customer_behavior(source: TableSource) -> Self {
        let owned = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect();
        Self {
            source,
            discrete: owned(&["ProductsPurchased", "VisitFrequency"]),
            continuous: owned(&["AmountSpent", "TimeInStore"]),
            cumulative: owned(&["ProductsPurchased", "AmountSpent"]),
        }
    }

    fn pmf(output: &mut AnalysisOutput, data: &Table, column: &str) -> Result<()> {
        let probabilities = pmf(&present(data, column)?);
        let mut table = Table::new(["value", "probability"]);
        for (value, p) in &probabilities {
            table.push_row(vec![value.to_string(), format!("{:.6}", p)])?;
        }
        let (top, top_p) = probabilities
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or_default();
        output.line(
            format!("PMF {}", column),
            format!(
                "{} distinct values, most likely {} (p = {:.3})",
                probabilities.len(),
                top,
                top_p
            ),
        );

        let heights: Vec<f64> = probabilities.iter().map(|(_, p)| *p).collect();
        let plot = Plot::new(format!("PMF of {}", column))
            .x_label(column)
            .y_label("Probability")
            .size(600, 400)
            .categories(probabilities.iter().map(|(v, _)| v.to_string()).collect())
            .layer(Layer::category_bars(&heights, Rgb::BLUE));

        let stem = file_stem(column);
        output
            .artifact(Artifact::Csv {
                name: format!("pmf_{}.csv", stem),
                table,
            })
            .artifact(Artifact::Chart {
                name: format!("pmf_{}.png", stem),
                figure: plot.into(),
            });
        Ok(())
    }

    fn pdf(output: &mut AnalysisOutput, data: &Table, column: &str) -> Result<()> {
        let values = present(data, column)?;
        let kde = GaussianKde::new(&values)?;
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let curve = kde.evaluate(&linspace(lo, hi, KDE_POINTS));
        let (peak, _) = curve
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or_default();
        output.line(
            format!("PDF {}", column),
            format!("bandwidth {:.4}, density peaks near {:.2}", kde.bandwidth(), peak),
        );

        let plot = Plot::new(format!("PDF of {}", column))
            .x_label(column)
            .y_label("Density")
            .size(600, 400)
            .layer(Layer::Area {
                data: curve.clone(),
                color: Rgb::GREEN,
            })
            .layer(Layer::line(curve, Rgb::GREEN));
        output.artifact(Artifact::Chart {
            name: format!("pdf_{}.png", file_stem(column)),
            figure: plot.into(),
        });
        Ok(())
    }

    fn cdf(output: &mut AnalysisOutput, data: &Table, column: &str) -> Result<()> {
        let points = empirical_cdf(&present(data, column)?);
        let median = points
            .iter()
            .find(|(_, p)| *p >= 0.5)
            .map(|(x, _)| *x)
            .unwrap_or_default();
        output.line(
            format!("CDF {}", column),
            format!("{} points, P(X ≤ {}) ≥ 0.5", points.len(), median),
        );

        let plot = Plot::new(format!("CDF of {}", column))
            .x_label(column)
            .y_label("Cumulative Probability")
            .size(600, 400)
            .layer(Layer::line(points, Rgb::PURPLE));
        output.artifact(Artifact::Chart {
            name: format!("cdf_{}.png", file_stem(column)),
            figure: plot.into(),
        });
        Ok(())
    }
}

#[async_trait]
impl Analysis for DistributionAnalysis {
    fn name(&self) -> &str {
        "distribution"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        if self.discrete.is_empty() && self.continuous.is_empty() && self.cumulative.is_empty() {
            return Err(StatsError::ValidationError {
                message: "no columns selected for the distribution plots".to_string(),
            });
        }

        let mut output = AnalysisOutput::new("PMF / PDF / CDF");
        output.line("Source", self.source.describe());
        // 1️⃣ 離散
        for column in &self.discrete {
            Self::pmf(&mut output, &data, column)?;
        }
        // 2️⃣ 連續
        for column in &self.continuous {
            Self::pdf(&mut output, &data, column)?;
        }
        // 3️⃣ 累積
        for column in &self.cumulative {
            Self::cdf(&mut output, &data, column)?;
        }
        Ok(output)
    }
}

pub enum NormalInput {
    /// `days` draws from N(mu, sigma); the curve uses the true parameters.
    Simulated {
        days: usize,
        mu: f64,
        sigma: f64,
        seed: u64,
    },
    /// A real column; the curve is fitted from its mean and sample std.
    Table { source: TableSource, column: String },
}

/// Density histogram with a normal PDF curve on top.
pub struct NormalAnalysis {
    pub input: NormalInput,
    pub interval: Option<(f64, f64)>,
}

impl NormalAnalysis {
    pub fn new(input: NormalInput, interval: Option<(f64, f64)>) -> Self {
        Self { input, interval }
    }

    /// 365 days of N(30, 3) temperatures and P(32 ≤ X ≤ 33).
    pub fn temperatures(seed: u64) -> Self {
        Self::new(
            NormalInput::Simulated {
                days: 365,
                mu: 30.0,
                sigma: 3.0,
                seed,
            },
            Some((32.0, 33.0)),
        )
    }

    fn column(&self) -> &str {
        match &self.input {
            NormalInput::Simulated { .. } => "Temperature",
            NormalInput::Table { column, .. } => column,
        }
    }
}

#[async_trait]
impl Analysis for NormalAnalysis {
    fn name(&self) -> &str {
        "normal"
    }

    async fn extract(&self) -> Result<Table> {
        match &self.input {
            NormalInput::Simulated {
                days,
                mu,
                sigma,
                seed,
            } => daily_temperatures(*days, *mu, *sigma, *seed),
            NormalInput::Table { source, .. } => source.load().await,
        }
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let column = self.column();
        let values = present(&data, column)?;

        let (normal, title, x_label) = match &self.input {
            NormalInput::Simulated { mu, sigma, .. } => (
                Normal::new(*mu, *sigma)?,
                "Temperature Distribution".to_string(),
                "Temperature (°C)".to_string(),
            ),
            NormalInput::Table { .. } => {
                let insufficient = || StatsError::InsufficientDataError {
                    context: format!("normal fit of '{}'", column),
                    needed: 2,
                    found: values.len(),
                };
                let mu = mean(&values).ok_or_else(insufficient)?;
                let sigma = sample_std_dev(&values).ok_or_else(insufficient)?;
                (
                    Normal::new(mu, sigma)?,
                    format!("Real-World Normal Distribution (n={})", values.len()),
                    "Value".to_string(),
                )
            }
        };

        let hist = histogram(&values, NORMAL_BINS, true)?;
        let lo = hist.edges.first().copied().unwrap_or(normal.mu);
        let hi = hist.edges.last().copied().unwrap_or(normal.mu);
        let curve: Vec<(f64, f64)> = linspace(lo, hi, KDE_POINTS)
            .into_iter()
            .map(|x| (x, normal.pdf(x)))
            .collect();

        let mut output = AnalysisOutput::new(title.clone());
        output
            .line("Values", values.len())
            .line("Mean (μ)", format!("{:.2}", normal.mu))
            .line("Std. Deviation (σ)", format!("{:.2}", normal.sigma));
        if let Some((a, b)) = self.interval {
            let p = normal.probability_between(a, b);
            output.line(
                format!("📊 P({} ≤ X ≤ {})", a, b),
                format!("{:.2}%", p * 100.0),
            );
        }

        let mut table = Table::new(["bin_start", "bin_end", "count", "density"]);
        for ((l, r, h), count) in hist.bars().into_iter().zip(&hist.counts) {
            table.push_row(vec![
                format!("{:.4}", l),
                format!("{:.4}", r),
                count.to_string(),
                format!("{:.6}", h),
            ])?;
        }

        let plot = Plot::new(title)
            .x_label(x_label)
            .y_label("Density")
            .size(1000, 500)
            .layer(
                Layer::bars(hist.bars(), Rgb::SKY)
                    .with_opacity(0.6)
                    .with_label("Histogram"),
            )
            .layer(Layer::line(curve, Rgb::RED).with_label("PDF Curve"));

        let stem = file_stem(column);
        output
            .artifact(Artifact::Csv {
                name: format!("normal_{}_histogram.csv", stem),
                table,
            })
            .artifact(Artifact::Chart {
                name: format!("normal_{}.png", stem),
                figure: plot.into(),
            });
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::DatasetKind;

    #[tokio::test]
    async fn test_temperature_probability() {
        let analysis = NormalAnalysis::temperatures(42);
        let data = analysis.extract().await.unwrap();
        assert_eq!(data.len(), 365);
        let output = analysis.transform(data).unwrap();
        assert_eq!(output.title, "Temperature Distribution");
        assert_eq!(output.value_of("📊 P(32 ≤ X ≤ 33)"), Some("9.38%"));
        assert_eq!(output.artifacts.len(), 2);
    }

    #[test]
    fn test_fitted_normal_on_column() {
        let data = crate::datasets::simulated_normal(7).unwrap();
        let analysis = NormalAnalysis::new(
            NormalInput::Table {
                source: TableSource::generated(DatasetKind::SimulatedNormal, 7),
                column: "n400".into(),
            },
            None,
        );
        let output = analysis.transform(data).unwrap();
        assert_eq!(output.title, "Real-World Normal Distribution (n=400)");
        match &output.artifacts[0] {
            Artifact::Csv { table, .. } => assert_eq!(table.len(), 20),
            other => panic!("unexpected artifact {}", other.name()),
        }
    }

    #[test]
    fn test_customer_behavior_outputs() {
        let data = crate::datasets::customer_behavior(200, 42).unwrap();
        let analysis = DistributionAnalysis::customer_behavior(TableSource::generated(
            DatasetKind::CustomerBehavior,
            42,
        ));
        let output = analysis.transform(data).unwrap();
        let names: Vec<&str> = output.artifacts.iter().map(Artifact::name).collect();
        assert!(names.contains(&"pmf_products_purchased.csv"));
        assert!(names.contains(&"pdf_time_in_store.png"));
        assert!(names.contains(&"cdf_amount_spent.png"));
        assert_eq!(names.len(), 2 * 2 + 2 + 2);
    }

    #[test]
    fn test_pmf_sums_to_one_in_csv() {
        let data = Table::from_csv_bytes(b"k\n1\n1\n2\n3\n").unwrap();
        let analysis = DistributionAnalysis {
            source: TableSource::generated(DatasetKind::CustomerBehavior, 1),
            discrete: vec!["k".into()],
            continuous: Vec::new(),
            cumulative: Vec::new(),
        };
        let output = analysis.transform(data).unwrap();
        match &output.artifacts[0] {
            Artifact::Csv { table, .. } => {
                let total: f64 = table.numeric_values("probability").unwrap().iter().sum();
                assert!((total - 1.0).abs() < 1e-5);
            }
            other => panic!("unexpected artifact {}", other.name()),
        }
        assert_eq!(
            output.value_of("PMF k"),
            Some("3 distinct values, most likely 1 (p = 0.500)")
        );
    }

    #[test]
    fn test_missing_column() {
        let data = Table::from_csv_bytes(b"k\n1\n").unwrap();
        let analysis = DistributionAnalysis::customer_behavior(TableSource::generated(
            DatasetKind::CustomerBehavior,
            1,
        ));
        assert!(analysis.transform(data).is_err());
    }
}
