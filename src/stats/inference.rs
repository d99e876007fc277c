//! Interval estimates for a sample mean.

use crate::stats::descriptive::{mean, sample_std_dev};
use crate::stats::special::t_quantile;
use crate::utils::error::{Result, StatsError};
use serde::Serialize;

/// Standard error of the mean: sample std / √n.
pub fn standard_error(values: &[f64]) -> Option<f64> {
    Some(sample_std_dev(values)? / (values.len() as f64).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Student t interval around the sample mean with n − 1 degrees of freedom.
pub fn t_confidence_interval(values: &[f64], confidence: f64) -> Result<ConfidenceInterval> {
    scaled_t_confidence_interval(values, confidence, 1.0)
}

/// As [`t_confidence_interval`] with mean and error multiplied by `scale`
/// (e.g. 100 to report a proportion as a percentage).
pub fn scaled_t_confidence_interval(
    values: &[f64],
    confidence: f64,
    scale: f64,
) -> Result<ConfidenceInterval> {
    if !(0.0 < confidence && confidence < 1.0) {
        return Err(StatsError::ValidationError {
            message: format!("confidence must be in (0, 1), got {}", confidence),
        });
    }
    let insufficient = || StatsError::InsufficientDataError {
        context: "confidence interval".to_string(),
        needed: 2,
        found: values.len(),
    };
    let m = mean(values).ok_or_else(insufficient)? * scale;
    let se = standard_error(values).ok_or_else(insufficient)? * scale;
    let t = t_quantile(0.5 + confidence / 2.0, (values.len() - 1) as f64);

    Ok(ConfidenceInterval {
        mean: m,
        lower: m - t * se,
        upper: m + t * se,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_interval() {
        let values = [10.0, 12.0, 9.0, 11.0, 13.0, 8.0, 10.0, 12.0, 11.0, 9.0];
        let ci = t_confidence_interval(&values, 0.95).unwrap();
        assert!((ci.mean - 10.5).abs() < 1e-12);
        // s = 1.5811, se = 0.5, t(0.975, 9) = 2.2622
        assert!((ci.upper - ci.mean - 2.262_157 * 0.5).abs() < 1e-4);
        assert!(ci.contains(10.5));
    }

    #[test]
    fn test_scaled_interval() {
        let defects = [0.0, 1.0, 0.0, 0.0];
        let ci = scaled_t_confidence_interval(&defects, 0.95, 100.0).unwrap();
        assert_eq!(ci.mean, 25.0);
        assert!(ci.lower < 0.0);
    }

    #[test]
    fn test_interval_rejects_bad_input() {
        assert!(t_confidence_interval(&[1.0], 0.95).is_err());
        assert!(t_confidence_interval(&[1.0, 2.0], 1.0).is_err());
    }
}
