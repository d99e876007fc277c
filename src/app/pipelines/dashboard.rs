use crate::charts::{BoxStats, Figure, Grid, Layer, Plot, Rgb};
use crate::domain::model::{AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::stats::descriptive::{mean, median};
use crate::stats::distribution::histogram;
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;
use std::path::PathBuf;

const STOCK_PRICES: [(f64, f64); 5] = [(1.0, 9.0), (2.0, 9.5), (3.0, 10.1), (4.0, 10.0), (5.0, 12.0)];
const CITY_TEMPERATURES: [(&str, f64); 5] = [
    ("NewYork", 75.0),
    ("London", 65.0),
    ("Dubai", 105.0),
    ("New Delhi", 98.0),
    ("Tokyo", 90.0),
];
// r, g, c, y, m
const CITY_COLORS: [Rgb; 5] = [
    Rgb(255, 0, 0),
    Rgb(0, 128, 0),
    Rgb(0, 191, 191),
    Rgb(191, 191, 0),
    Rgb(191, 0, 191),
];
const SCATTER_COLOR: Rgb = Rgb(255, 87, 51);

/// Five-panel figure built from a headerless `sale,cost` file.
pub struct SalesDashboardAnalysis {
    pub input: PathBuf,
}

impl SalesDashboardAnalysis {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

fn box_stats(values: &[f64], column: &str) -> Result<BoxStats> {
    BoxStats::from_values(values)
        .ok_or_else(|| StatsError::empty_data(format!("no values for the {} box plot", column)))
}

#[async_trait]
impl Analysis for SalesDashboardAnalysis {
    fn name(&self) -> &str {
        "sales-dashboard"
    }

    async fn extract(&self) -> Result<Table> {
        tracing::debug!("📁 Reading sales lines from {}", self.input.display());
        let data = tokio::fs::read(&self.input).await?;
        Table::from_headerless_csv(&data, &["sale", "cost"])
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let sales = data.numeric_values("sale")?;
        let costs = data.numeric_values("cost")?;
        if sales.is_empty() {
            return Err(StatsError::empty_data("sales file has no lines"));
        }

        let scatter = Plot::new("Sales Vs Cost")
            .x_label("Sale")
            .y_label("Cost")
            .layer(
                Layer::points(sales.iter().copied().zip(costs.iter().copied()).collect(), SCATTER_COLOR)
                    .with_size(6)
                    .with_opacity(1.0),
            );

        let boxes = Plot::new("Box Plot of Sales")
            .y_label("USD")
            .categories(vec!["sale".to_string(), "cost".to_string()])
            .layer(Layer::BoxPlot {
                position: 0.0,
                stats: box_stats(&sales, "sale")?,
                color: Rgb::GREEN,
            })
            .layer(Layer::BoxPlot {
                position: 1.0,
                stats: box_stats(&costs, "cost")?,
                color: Rgb::GREEN,
            });

        let hist = histogram(&sales, 5, false)?;
        let bars: Vec<(f64, f64, f64)> = hist
            .bars()
            .into_iter()
            .map(|(l, r, h)| {
                // rwidth 0.9
                let pad = (r - l) * 0.05;
                (l + pad, r - pad, h)
            })
            .collect();
        let sales_hist = Plot::new("Histogram of Sales")
            .y_label("USD")
            .layer(Layer::bars(bars, Rgb::CYAN));

        let stock = Plot::new("Stockprice History")
            .x_label("Day")
            .y_label("Price")
            .layer(
                Layer::line(STOCK_PRICES.to_vec(), Rgb::GREEN)
                    .with_size(3)
                    .with_markers(),
            );

        let heights: Vec<f64> = CITY_TEMPERATURES.iter().map(|(_, t)| *t).collect();
        let cities = Plot::new("Temperature Variation")
            .x_label("Cities")
            .y_label("Temperature")
            .categories(CITY_TEMPERATURES.iter().map(|(c, _)| c.to_string()).collect())
            .layer(Layer::category_bars(&heights, Rgb::RED).with_colors(CITY_COLORS.to_vec()));

        let mut output = AnalysisOutput::new("Sales Dashboard");
        output
            .line("Input", self.input.display())
            .line("Lines", sales.len())
            .line("Mean sale", format!("{:.2}", mean(&sales).unwrap_or_default()))
            .line("Median sale", format!("{:.2}", median(&sales).unwrap_or_default()))
            .line("Mean cost", format!("{:.2}", mean(&costs).unwrap_or_default()));
        output.artifact(Artifact::Chart {
            name: "sales_dashboard.png".to_string(),
            figure: Figure::Grid(Grid {
                title: "Sales Dashboard".to_string(),
                columns: 3,
                panels: vec![scatter, boxes, sales_hist, stock, cities],
                size: (1800, 1000),
            }),
        });
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dashboard_from_sales_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("salesdata2.csv");
        std::fs::write(&path, "100,60\n200,120\n\n150,80\n300,200\n250,150\n").unwrap();

        let analysis = SalesDashboardAnalysis::new(&path);
        let data = analysis.extract().await.unwrap();
        let output = analysis.transform(data).unwrap();
        assert_eq!(output.value_of("Lines"), Some("5"));
        assert_eq!(output.value_of("Mean sale"), Some("200.00"));
        match &output.artifacts[0] {
            Artifact::Chart {
                figure: Figure::Grid(grid),
                ..
            } => {
                assert_eq!(grid.panels.len(), 5);
                assert_eq!(grid.columns, 3);
            }
            other => panic!("unexpected artifact {}", other.name()),
        }
    }

    #[test]
    fn test_empty_sales_file() {
        let data = Table::from_headerless_csv(b"\n", &["sale", "cost"]).unwrap();
        let err = SalesDashboardAnalysis::new("unused.csv").transform(data).unwrap_err();
        assert!(matches!(err, StatsError::EmptyDataError { .. }));
    }
}
