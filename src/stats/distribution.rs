//! Probability mass, density and cumulative distribution helpers.

use crate::stats::descriptive::{sample_std_dev, sorted};
use crate::stats::special::{standard_normal_cdf, standard_normal_pdf};
use crate::utils::error::{Result, StatsError};
use serde::Serialize;
use std::f64::consts::PI;

/// Relative frequency of each distinct value, ascending.
pub fn pmf(values: &[f64]) -> Vec<(f64, f64)> {
    let s = sorted(values);
    let n = s.len() as f64;
    let mut out: Vec<(f64, f64)> = Vec::new();
    for x in s {
        match out.last_mut() {
            Some((v, count)) if *v == x => *count += 1.0,
            _ => out.push((x, 1.0)),
        }
    }
    out.iter_mut().for_each(|(_, p)| *p /= n);
    out
}

/// Empirical CDF points `(x_(i), i / n)`.
pub fn empirical_cdf(values: &[f64]) -> Vec<(f64, f64)> {
    let s = sorted(values);
    let n = s.len() as f64;
    s.into_iter()
        .enumerate()
        .map(|(i, x)| (x, (i + 1) as f64 / n))
        .collect()
}

/// `count` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Gaussian kernel density estimate with Scott's rule bandwidth.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    data: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    pub fn new(values: &[f64]) -> Result<Self> {
        let std = sample_std_dev(values).ok_or(StatsError::InsufficientDataError {
            context: "kernel density estimate".to_string(),
            needed: 2,
            found: values.len(),
        })?;
        if std == 0.0 {
            return Err(StatsError::ValidationError {
                message: "kernel density needs values with non-zero spread".to_string(),
            });
        }
        let bandwidth = std * (values.len() as f64).powf(-0.2);
        Ok(Self {
            data: values.to_vec(),
            bandwidth,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let total: f64 = self
            .data
            .iter()
            .map(|xi| standard_normal_pdf((x - xi) / h))
            .sum();
        total / (self.data.len() as f64 * h)
    }

    pub fn evaluate(&self, points: &[f64]) -> Vec<(f64, f64)> {
        points.iter().map(|&x| (x, self.pdf(x))).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Normal {
    pub mu: f64,
    pub sigma: f64,
}

impl Normal {
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
            return Err(StatsError::ValidationError {
                message: format!("invalid normal parameters mu={} sigma={}", mu, sigma),
            });
        }
        Ok(Self { mu, sigma })
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.mu) / self.sigma;
        (-0.5 * z * z).exp() / (self.sigma * (2.0 * PI).sqrt())
    }

    pub fn cdf(&self, x: f64) -> f64 {
        standard_normal_cdf((x - self.mu) / self.sigma)
    }

    /// P(a ≤ X ≤ b)
    pub fn probability_between(&self, a: f64, b: f64) -> f64 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.cdf(hi) - self.cdf(lo)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Counts, or densities when built with `density = true`.
    pub heights: Vec<f64>,
}

impl Histogram {
    /// `(left, right, height)` per bin.
    pub fn bars(&self) -> Vec<(f64, f64, f64)> {
        self.edges
            .windows(2)
            .zip(&self.heights)
            .map(|(w, h)| (w[0], w[1], *h))
            .collect()
    }
}

/// Equal-width histogram over `[min, max]`; the last bin is closed.
pub fn histogram(values: &[f64], bins: usize, density: bool) -> Result<Histogram> {
    if values.is_empty() || bins == 0 {
        return Err(StatsError::empty_data("histogram needs values and bins"));
    }
    let s = sorted(values);
    let (mut lo, mut hi) = (s[0], s[s.len() - 1]);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let edges = linspace(lo, hi, bins + 1);
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for x in &s {
        let idx = (((x - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let n = s.len() as f64;
    let heights = counts
        .iter()
        .map(|&c| if density { c as f64 / (n * width) } else { c as f64 })
        .collect();
    Ok(Histogram {
        edges,
        counts,
        heights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmf_sums_to_one() {
        let p = pmf(&[1.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(p.len(), 3);
        assert_eq!(p[2], (3.0, 0.5));
        let total: f64 = p.iter().map(|(_, v)| v).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empirical_cdf() {
        let cdf = empirical_cdf(&[3.0, 1.0, 2.0, 4.0]);
        assert_eq!(cdf[0], (1.0, 0.25));
        assert_eq!(cdf[3], (4.0, 1.0));
    }

    #[test]
    fn test_normal_probability_between() {
        let la = Normal::new(30.0, 3.0).unwrap();
        let p = la.probability_between(32.0, 33.0);
        assert!((p - 0.0938).abs() < 1e-4);
        assert!((la.pdf(30.0) - 0.132_980_760).abs() < 1e-8);
        assert!(Normal::new(0.0, 0.0).is_err());
    }

    #[test]
    fn test_kde_integrates_to_about_one() {
        let data: Vec<f64> = (0..200).map(|i| (i as f64 * 0.37).sin() * 10.0).collect();
        let kde = GaussianKde::new(&data).unwrap();
        let grid = linspace(-40.0, 40.0, 4001);
        let step = grid[1] - grid[0];
        let area: f64 = kde.evaluate(&grid).iter().map(|(_, y)| y * step).sum();
        assert!((area - 1.0).abs() < 1e-3);
        assert!(GaussianKde::new(&[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_histogram_density() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let hist = histogram(&values, 20, true).unwrap();
        assert_eq!(hist.counts.iter().sum::<usize>(), 100);
        assert_eq!(hist.edges.len(), 21);
        let area: f64 = hist.bars().iter().map(|(l, r, h)| (r - l) * h).sum();
        assert!((area - 1.0).abs() < 1e-9);
        let counts = histogram(&[5.0, 5.0], 3, false).unwrap();
        assert_eq!(counts.counts, vec![0, 2, 0]);
    }
}
