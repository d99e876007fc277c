//! Covariance, correlation and the eigen structure of covariance matrices.

use crate::domain::model::{parse_numeric, Table};
use crate::stats::descriptive::mean;
use crate::utils::error::{Result, StatsError};
use serde::Serialize;

/// Sample covariance (n − 1).
pub fn covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let sum: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    Some(sum / (x.len() - 1) as f64)
}

/// Pearson r; `None` when either side has zero variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let cov = covariance(x, y)?;
    let sx = covariance(x, x)?.sqrt();
    let sy = covariance(y, y)?.sqrt();
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some((cov / (sx * sy)).clamp(-1.0, 1.0))
}

/// Square matrix with row/column labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == row)?;
        let c = self.labels.iter().position(|l| l == col)?;
        Some(self.values[r][c])
    }

    /// Labelled CSV layout: first column holds the row label.
    pub fn to_table(&self) -> Table {
        let mut headers = vec![String::new()];
        headers.extend(self.labels.iter().cloned());
        let rows = self
            .labels
            .iter()
            .zip(&self.values)
            .map(|(label, row)| {
                let mut cells = vec![label.clone()];
                cells.extend(row.iter().map(|v| v.to_string()));
                cells
            })
            .collect();
        Table { headers, rows }
    }

    pub fn from_table(table: &Table) -> Result<Self> {
        let labels: Vec<String> = table.headers.iter().skip(1).cloned().collect();
        if labels.is_empty() || table.rows.len() != labels.len() {
            return Err(StatsError::ValidationError {
                message: "matrix CSV must be square with a label column".to_string(),
            });
        }
        let mut values = Vec::with_capacity(labels.len());
        for row in &table.rows {
            let parsed: Option<Vec<f64>> = row
                .iter()
                .skip(1)
                .map(|c| parse_numeric(c))
                .collect();
            values.push(parsed.ok_or_else(|| StatsError::ValidationError {
                message: format!("non-numeric cell in matrix row '{}'", row[0]),
            })?);
        }
        Ok(Self { labels, values })
    }
}

/// Rows where every selected column parses; the "dropna" view.
pub fn complete_cases(table: &Table, columns: &[&str]) -> Result<Vec<Vec<f64>>> {
    let views = columns
        .iter()
        .map(|c| table.numeric_column(c))
        .collect::<Result<Vec<_>>>()?;

    let mut out = vec![Vec::new(); columns.len()];
    for row in 0..table.len() {
        if views.iter().all(|v| v[row].is_some()) {
            for (col, view) in views.iter().enumerate() {
                out[col].push(view[row].unwrap_or_default());
            }
        }
    }
    Ok(out)
}

fn pairwise<F>(labels: &[&str], columns: &[Vec<f64>], f: F) -> Result<Matrix>
where
    F: Fn(&[f64], &[f64]) -> Option<f64>,
{
    if columns.first().map_or(0, |c| c.len()) < 2 {
        return Err(StatsError::InsufficientDataError {
            context: "pairwise matrix".to_string(),
            needed: 2,
            found: columns.first().map_or(0, |c| c.len()),
        });
    }
    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| f(a, b).unwrap_or(f64::NAN)).collect())
        .collect();
    Ok(Matrix {
        labels: labels.iter().map(|l| l.to_string()).collect(),
        values,
    })
}

pub fn covariance_matrix(labels: &[&str], columns: &[Vec<f64>]) -> Result<Matrix> {
    pairwise(labels, columns, covariance)
}

pub fn correlation_matrix(labels: &[&str], columns: &[Vec<f64>]) -> Result<Matrix> {
    pairwise(labels, columns, pearson_correlation)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EigenPair {
    pub value: f64,
    pub vector: Vec<f64>,
}

/// Eigen decomposition of a symmetric matrix by cyclic Jacobi rotations,
/// sorted by descending eigenvalue. Eigenvectors are unit length with the
/// largest-magnitude component positive.
pub fn symmetric_eigen(matrix: &Matrix) -> Result<Vec<EigenPair>> {
    let n = matrix.size();
    let mut a = matrix.values.clone();
    for (i, row) in a.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            if !v.is_finite() || (v - a[j][i]).abs() > 1e-9 * v.abs().max(1.0) {
                return Err(StatsError::ValidationError {
                    message: "eigen decomposition needs a finite symmetric matrix".to_string(),
                });
            }
        }
    }

    let mut vectors = vec![vec![0.0; n]; n];
    for (i, row) in vectors.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _sweep in 0..100 {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off < 1e-22 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-300 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in vectors.iter_mut() {
                    let vkp = row[p];
                    let vkq = row[q];
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut pairs: Vec<EigenPair> = (0..n)
        .map(|i| {
            let mut vector: Vec<f64> = vectors.iter().map(|row| row[i]).collect();
            let pivot = vector
                .iter()
                .copied()
                .max_by(|x, y| x.abs().total_cmp(&y.abs()))
                .unwrap_or(0.0);
            if pivot < 0.0 {
                vector.iter_mut().for_each(|v| *v = -*v);
            }
            EigenPair {
                value: a[i][i],
                vector,
            }
        })
        .collect();
    pairs.sort_by(|x, y| y.value.total_cmp(&x.value));
    Ok(pairs)
}

pub mod linalg {
    //! Vector norms.

    pub fn dot(x: &[f64], y: &[f64]) -> f64 {
        x.iter().zip(y).map(|(a, b)| a * b).sum()
    }

    pub fn l1_norm(x: &[f64]) -> f64 {
        x.iter().map(|v| v.abs()).sum()
    }

    pub fn squared_l2_norm(x: &[f64]) -> f64 {
        dot(x, x)
    }

    pub fn l2_norm(x: &[f64]) -> f64 {
        squared_l2_norm(x).sqrt()
    }

    pub fn max_norm(x: &[f64]) -> f64 {
        x.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::linalg::*;
    use super::*;

    #[test]
    fn test_perfect_correlation() {
        let height = [160.0, 165.0, 170.0, 175.0, 180.0];
        let weight = [60.0, 65.0, 70.0, 75.0, 80.0];
        assert!((pearson_correlation(&height, &weight).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(covariance(&height, &weight), Some(62.5));
        let inverted: Vec<f64> = weight.iter().map(|w| -w).collect();
        assert!((pearson_correlation(&height, &inverted).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(covariance(&[1.0], &[2.0]), None);
        assert_eq!(covariance(&[1.0, 2.0], &[2.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
    }

    #[test]
    fn test_covariance_matrix_and_table_round_trip() {
        let cols = vec![vec![1.0, 2.0, 3.0], vec![2.0, 4.0, 6.0]];
        let m = covariance_matrix(&["a", "b"], &cols).unwrap();
        assert_eq!(m.get("a", "a"), Some(1.0));
        assert_eq!(m.get("a", "b"), Some(2.0));
        assert_eq!(m.get("b", "b"), Some(4.0));
        let back = Matrix::from_table(&m.to_table()).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_complete_cases_drops_partial_rows() {
        let table = Table::from_csv_bytes(b"x,y\n1,2\n,3\n4,x\n5,6\n").unwrap();
        let cols = complete_cases(&table, &["x", "y"]).unwrap();
        assert_eq!(cols, vec![vec![1.0, 5.0], vec![2.0, 6.0]]);
    }

    #[test]
    fn test_symmetric_eigen() {
        let m = Matrix {
            labels: vec!["a".into(), "b".into()],
            values: vec![vec![2.0, 1.0], vec![1.0, 2.0]],
        };
        let pairs = symmetric_eigen(&m).unwrap();
        assert!((pairs[0].value - 3.0).abs() < 1e-10);
        assert!((pairs[1].value - 1.0).abs() < 1e-10);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert!((pairs[0].vector[0] - s).abs() < 1e-8);
        assert!((pairs[0].vector[1] - s).abs() < 1e-8);
    }

    #[test]
    fn test_norms() {
        let x = [25.0, 2.0, 5.0];
        assert_eq!(l1_norm(&x), 32.0);
        assert_eq!(squared_l2_norm(&x), 654.0);
        assert!((l2_norm(&x) - 25.573_423).abs() < 1e-6);
        assert_eq!(max_norm(&x), 25.0);
        assert_eq!(dot(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }
}
