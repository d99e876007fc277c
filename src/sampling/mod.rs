//! Sampling techniques over row indices, plus the sampling-error
//! measurements run against the customers dataset.

pub mod errors;

use crate::utils::error::{Result, StatsError};
use rand::seq::index;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

fn insufficient(context: &str, needed: usize, found: usize) -> StatsError {
    StatsError::InsufficientDataError {
        context: context.to_string(),
        needed,
        found,
    }
}

/// `n` distinct indices from `0..population`, ascending.
pub fn simple_random<R: Rng + ?Sized>(
    population: usize,
    n: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if n > population {
        return Err(insufficient("simple random sample", n, population));
    }
    let mut picked = index::sample(rng, population, n).into_vec();
    picked.sort_unstable();
    Ok(picked)
}

/// Proportional stratified sample: `round(fraction * stratum size)` rows from
/// every stratum, strata visited in label order.
pub fn stratified<R, S>(labels: &[S], fraction: f64, rng: &mut R) -> Result<Vec<usize>>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(StatsError::ValidationError {
            message: format!("sampling fraction must be in (0, 1], got {}", fraction),
        });
    }

    let mut strata: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        strata.entry(label.as_ref()).or_default().push(i);
    }

    let mut picked = Vec::new();
    for members in strata.values() {
        // half to even: 2.5 -> 2, 7.5 -> 8
        let take = ((members.len() as f64) * fraction).round_ties_even() as usize;
        let take = take.min(members.len());
        picked.extend(
            index::sample(rng, members.len(), take)
                .into_iter()
                .map(|i| members[i]),
        );
    }
    picked.sort_unstable();
    Ok(picked)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSample {
    pub clusters: Vec<String>,
    pub indices: Vec<usize>,
}

/// Every member of `k` randomly chosen distinct clusters.
pub fn cluster<R, S>(labels: &[S], k: usize, rng: &mut R) -> Result<ClusterSample>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    let distinct: Vec<&str> = labels
        .iter()
        .map(|l| l.as_ref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if k == 0 || k > distinct.len() {
        return Err(insufficient("cluster sample", k.max(1), distinct.len()));
    }

    let mut clusters: Vec<String> = index::sample(rng, distinct.len(), k)
        .into_iter()
        .map(|i| distinct[i].to_string())
        .collect();
    clusters.sort();

    let indices = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| clusters.iter().any(|c| c == l.as_ref()))
        .map(|(i, _)| i)
        .collect();
    Ok(ClusterSample { clusters, indices })
}

/// Every `step`-th index starting at `start`.
pub fn systematic(population: usize, step: usize, start: usize) -> Result<Vec<usize>> {
    if step == 0 {
        return Err(StatsError::ValidationError {
            message: "systematic sampling step must be at least 1".to_string(),
        });
    }
    if start >= step.min(population.max(1)) && population > 0 {
        return Err(StatsError::ValidationError {
            message: format!("start {} must be below the step {}", start, step),
        });
    }
    Ok((start..population).step_by(step).collect())
}

/// [`systematic`] with the start drawn uniformly from `[0, step)`.
pub fn systematic_random_start<R: Rng + ?Sized>(
    population: usize,
    step: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if step == 0 {
        return systematic(population, step, 0);
    }
    let start = rng.random_range(0..step.min(population.max(1)));
    systematic(population, step, start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_simple_random_is_distinct_and_seeded() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = simple_random(1000, 100, &mut rng).unwrap();
        assert_eq!(a.len(), 100);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
        assert!(a.iter().all(|&i| i < 1000));

        let mut again = StdRng::seed_from_u64(42);
        assert_eq!(simple_random(1000, 100, &mut again).unwrap(), a);
        assert!(simple_random(5, 6, &mut rng).is_err());
    }

    #[test]
    fn test_stratified_is_proportional() {
        let labels: Vec<&str> = std::iter::repeat_n("Young", 30)
            .chain(std::iter::repeat_n("Middle", 40))
            .chain(std::iter::repeat_n("Senior", 30))
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = stratified(&labels, 0.1, &mut rng).unwrap();
        assert_eq!(picked.len(), 10);
        let middle = picked.iter().filter(|&&i| labels[i] == "Middle").count();
        assert_eq!(middle, 4);
        assert!(stratified(&labels, 0.0, &mut rng).is_err());
    }

    #[test]
    fn test_stratified_rounds_half_to_even() {
        let labels: Vec<&str> = std::iter::repeat_n("A", 5)
            .chain(std::iter::repeat_n("B", 15))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let picked = stratified(&labels, 0.5, &mut rng).unwrap();
        let a = picked.iter().filter(|&&i| labels[i] == "A").count();
        assert_eq!(a, 2);
        assert_eq!(picked.len() - a, 8);
    }

    #[test]
    fn test_cluster_takes_whole_clusters() {
        let labels: Vec<String> = (0..100).map(|i| format!("N{}", i % 10)).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let sample = cluster(&labels, 3, &mut rng).unwrap();
        assert_eq!(sample.clusters.len(), 3);
        assert_eq!(sample.indices.len(), 30);
        assert!(cluster(&labels, 11, &mut rng).is_err());
    }

    #[test]
    fn test_systematic() {
        assert_eq!(systematic(10, 3, 1).unwrap(), vec![1, 4, 7]);
        assert!(systematic(10, 0, 0).is_err());
        assert!(systematic(10, 3, 3).is_err());

        let mut rng = StdRng::seed_from_u64(3);
        let picked = systematic_random_start(800, 80, &mut rng).unwrap();
        assert_eq!(picked.len(), 10);
        assert!(picked[0] < 80);
        assert!(picked.windows(2).all(|w| w[1] - w[0] == 80));
    }
}
