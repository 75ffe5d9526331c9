//! Seeded one-dimensional k-means behind a minimal clustering capability.
//!
//! `Clusterer` is the only thing the zone segmenter depends on, so the
//! concrete algorithm can be swapped without touching zone semantics.
//!
//! `KMeans` runs `n_init` independent restarts, each seeded from
//! `seed ^ mix(restart)`, using k-means++ initialisation followed by Lloyd
//! iterations. The restart with the lowest inertia wins; ties go to the
//! lower restart index. With the `threading` feature restarts run on the
//! rayon pool, and the selection rule keeps the output identical.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Partition `points` into `k` groups, returning one label in `0..k` per point.
pub trait Clusterer {
    fn cluster(&self, points: &[f64], k: usize, seed: u64) -> Vec<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeans {
    pub n_init: usize,
    pub max_iter: usize,
    /// Stop when no centroid moves more than this.
    pub tolerance: f64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

/// Result of a single restart.
#[derive(Debug, Clone)]
struct Run {
    labels: Vec<usize>,
    inertia: f64,
    iterations: usize,
}

fn restart_seed(seed: u64, restart: usize) -> u64 {
    seed ^ (restart as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Index of the nearest centroid; ties go to the lower index.
#[inline]
fn nearest(x: f64, centroids: &[f64]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let d = (x - c) * (x - c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// k-means++ seeding: first centroid uniform, the rest drawn with
/// probability ∝ squared distance to the nearest chosen centroid.
fn init_plus_plus(points: &[f64], k: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut d2: Vec<f64> = points.iter().map(|&p| (p - centroids[0]).powi(2)).collect();
    while centroids.len() < k {
        let total: f64 = d2.iter().sum();
        let next = if total <= 0.0 {
            // Every point coincides with a centroid already.
            points[rng.gen_range(0..points.len())]
        } else {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = points.len() - 1;
            for (i, &w) in d2.iter().enumerate() {
                acc += w;
                if acc >= target && w > 0.0 {
                    pick = i;
                    break;
                }
            }
            points[pick]
        };
        centroids.push(next);
        for (d, &p) in d2.iter_mut().zip(points.iter()) {
            *d = d.min((p - next).powi(2));
        }
    }
    centroids
}

impl KMeans {
    fn run_once(&self, points: &[f64], k: usize, seed: u64) -> Run {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = init_plus_plus(points, k, &mut rng);
        let mut labels = vec![0usize; points.len()];
        let mut iterations = 0;

        for _ in 0..self.max_iter.max(1) {
            iterations += 1;
            for (label, &p) in labels.iter_mut().zip(points.iter()) {
                *label = nearest(p, &centroids);
            }

            let mut sums = vec![0f64; k];
            let mut counts = vec![0usize; k];
            for (&label, &p) in labels.iter().zip(points.iter()) {
                sums[label] += p;
                counts[label] += 1;
            }

            let mut shift = 0f64;
            for c in 0..k {
                // Empty clusters keep their previous centroid.
                if counts[c] > 0 {
                    let updated = sums[c] / counts[c] as f64;
                    shift = shift.max((updated - centroids[c]).abs());
                    centroids[c] = updated;
                }
            }
            if shift <= self.tolerance {
                break;
            }
        }

        for (label, &p) in labels.iter_mut().zip(points.iter()) {
            *label = nearest(p, &centroids);
        }
        let inertia = labels
            .iter()
            .zip(points.iter())
            .map(|(&l, &p)| (p - centroids[l]).powi(2))
            .sum();

        Run { labels, inertia, iterations }
    }

    fn runs(&self, points: &[f64], k: usize, seed: u64) -> Vec<Run> {
        let restarts = self.n_init.max(1);
        #[cfg(feature = "threading")]
        {
            use rayon::prelude::*;
            (0..restarts)
                .into_par_iter()
                .map(|i| self.run_once(points, k, restart_seed(seed, i)))
                .collect()
        }
        #[cfg(not(feature = "threading"))]
        {
            (0..restarts)
                .map(|i| self.run_once(points, k, restart_seed(seed, i)))
                .collect()
        }
    }
}

impl Clusterer for KMeans {
    fn cluster(&self, points: &[f64], k: usize, seed: u64) -> Vec<usize> {
        if points.is_empty() || k == 0 {
            return Vec::new();
        }
        let k = k.min(points.len());

        let mut best: Option<(usize, Run)> = None;
        for (i, run) in self.runs(points, k, seed).into_iter().enumerate() {
            let better = match &best {
                None => true,
                Some((_, b)) => run.inertia < b.inertia,
            };
            if better {
                best = Some((i, run));
            }
        }

        match best {
            Some((restart, run)) => {
                debug!(restart, inertia = run.inertia, iterations = run.iterations, k, "k-means converged");
                run.labels
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_groups() -> Vec<f64> {
        let mut pts = Vec::new();
        for i in 0..20 {
            pts.push(0.10 + i as f64 * 0.001);
            pts.push(0.50 + i as f64 * 0.001);
            pts.push(0.85 + i as f64 * 0.001);
        }
        pts
    }

    #[test]
    fn separates_well_spaced_groups() {
        let pts = three_groups();
        let labels = KMeans::default().cluster(&pts, 3, 42);
        assert_eq!(labels.len(), pts.len());
        // Points from the same group share a label; different groups differ.
        for g in 0..3 {
            let first = labels[g];
            for i in (g..pts.len()).step_by(3) {
                assert_eq!(labels[i], first, "group {g} split at point {i}");
            }
        }
        assert_ne!(labels[0], labels[1]);
        assert_ne!(labels[1], labels[2]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn same_seed_same_labels() {
        let pts: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 100.0).collect();
        let km = KMeans::default();
        assert_eq!(km.cluster(&pts, 4, 7), km.cluster(&pts, 4, 7));
    }

    #[test]
    fn identical_points_do_not_panic() {
        let labels = KMeans::default().cluster(&[0.4; 5], 3, 42);
        assert_eq!(labels.len(), 5);
        assert!(labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn empty_input_gives_no_labels() {
        assert!(KMeans::default().cluster(&[], 3, 42).is_empty());
    }
}
