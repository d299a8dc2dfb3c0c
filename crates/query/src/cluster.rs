use manifold_encoder::Signature;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMember {
    pub path: String,
    pub signature: Signature,
    pub chaos_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Mean (C, S, E) of the members
    pub centroid: [f64; 3],

    /// Heuristic description of the cluster's structural character
    pub label: String,

    /// Members sorted by chaos score descending, ties by path
    pub members: Vec<ClusterMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterReport {
    pub clusters: Vec<Cluster>,
    pub files: usize,
    pub iterations: usize,
}

/// K-means in (C, S, E) space: k-means++ seeding, squared Euclidean
/// assignment, stop on the iteration cap or centroid convergence.
pub(crate) fn kmeans(
    points: &[[f64; 3]],
    k: usize,
    max_iterations: usize,
    min_movement: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<[f64; 3]>, usize) {
    assert!(k >= 1 && k <= points.len());

    let mut centroids = seed_plus_plus(points, k, rng);
    let mut assignments = vec![0usize; points.len()];
    let mut iterations = 0;

    for _ in 0..max_iterations {
        iterations += 1;

        for (i, point) in points.iter().enumerate() {
            assignments[i] = nearest(point, &centroids).0;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.iter().zip(assignments.iter()) {
            for d in 0..3 {
                sums[cluster][d] += point[d];
            }
            counts[cluster] += 1;
        }

        let mut movement = 0.0f64;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let next = [
                sums[c][0] / counts[c] as f64,
                sums[c][1] / counts[c] as f64,
                sums[c][2] / counts[c] as f64,
            ];
            movement = movement.max(squared_distance(&centroids[c], &next).sqrt());
            centroids[c] = next;
        }

        if movement < min_movement {
            break;
        }
    }

    (assignments, centroids, iterations)
}

/// k-means++ seeding: first centroid uniform, the rest sampled with
/// probability proportional to squared distance from the nearest chosen
/// centroid.
fn seed_plus_plus(points: &[[f64; 3]], k: usize, rng: &mut StdRng) -> Vec<[f64; 3]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|p| nearest(p, &centroids).1)
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= f64::EPSILON {
            // All remaining points coincide with a centroid.
            centroids.push(points[rng.gen_range(0..points.len())]);
            continue;
        }
        let mut target = rng.gen_range(0.0..total);
        let mut chosen = points.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        centroids.push(points[chosen]);
    }
    centroids
}

fn nearest(point: &[f64; 3], centroids: &[[f64; 3]]) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (i, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

/// Heuristic label from a cluster's mean structure (C, E) and chaos.
pub(crate) fn label_cluster(centroid: &[f64; 3], avg_chaos: f64) -> String {
    let coherence = centroid[0];
    let entropy = centroid[2];
    if avg_chaos > 0.35 {
        "high-chaos".to_string()
    } else if entropy > 0.85 && coherence < 0.30 {
        "dense-entropic".to_string()
    } else if entropy < 0.60 {
        "sparse".to_string()
    } else if coherence > 0.60 {
        "high-coherence".to_string()
    } else {
        "mixed-fluctuation".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn separated_blobs_land_in_distinct_clusters() {
        let mut points = Vec::new();
        for i in 0..10 {
            let jitter = f64::from(i) * 0.001;
            points.push([0.1 + jitter, 0.9, 0.1]);
            points.push([0.9 - jitter, 0.1, 0.9]);
        }
        let (assignments, centroids, _) = kmeans(&points, 2, 50, 1e-4, &mut rng());

        // Points at even indices share one cluster, odd the other.
        let first = assignments[0];
        let second = assignments[1];
        assert_ne!(first, second);
        for (i, &a) in assignments.iter().enumerate() {
            assert_eq!(a, if i % 2 == 0 { first } else { second });
        }
        assert_eq!(centroids.len(), 2);
    }

    #[test]
    fn k_equal_to_n_is_exact() {
        let points = vec![[0.1, 0.2, 0.3], [0.7, 0.8, 0.9], [0.4, 0.5, 0.6]];
        let (assignments, _, _) = kmeans(&points, 3, 50, 1e-4, &mut rng());
        let mut seen = assignments.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn identical_points_converge_immediately() {
        let points = vec![[0.5, 0.5, 0.5]; 8];
        let (assignments, _, iterations) = kmeans(&points, 2, 50, 1e-4, &mut rng());
        assert_eq!(assignments.len(), 8);
        assert!(iterations <= 2);
    }

    #[test]
    fn labels_follow_the_structure() {
        assert_eq!(label_cluster(&[0.2, 0.5, 0.9], 0.5), "high-chaos");
        assert_eq!(label_cluster(&[0.2, 0.5, 0.95], 0.1), "dense-entropic");
        assert_eq!(label_cluster(&[0.8, 0.5, 0.3], 0.1), "sparse");
        assert_eq!(label_cluster(&[0.8, 0.5, 0.7], 0.1), "high-coherence");
        assert_eq!(label_cluster(&[0.5, 0.5, 0.7], 0.1), "mixed-fluctuation");
    }
}
