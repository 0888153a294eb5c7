//! 2D projection of embedding matrices for visualisation.

use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

const POWER_ITERATIONS: usize = 50;
const SMOOTHING_ROUNDS: usize = 10;
const SMOOTHING_PULL: f32 = 0.2;

/// Neighbourhood size for the local smoothing pass: 15 for comfortable
/// inputs, scaled down for small categories, never below 2.
pub fn neighbor_count(n: usize) -> usize {
    let k = if n > 15 {
        15
    } else {
        std::cmp::min(5, n.saturating_sub(1))
    };
    k.max(2)
}

/// Project an `[n, d]` embedding matrix to `[n, 2]` display coordinates.
/// Deterministic for a fixed seed; inputs smaller than two rows collapse to
/// the origin rather than erroring.
pub fn project(embeddings: &[Vec<f32>], seed: u64) -> Vec<[f32; 2]> {
    let n = embeddings.len();
    if n == 0 {
        return Vec::new();
    }
    let d = embeddings[0].len();
    if n < 2 || d == 0 {
        return vec![[0.0, 0.0]; n];
    }

    let mut data = Array2::<f32>::zeros((n, d));
    for (i, row) in embeddings.iter().enumerate() {
        for (j, &value) in row.iter().enumerate().take(d) {
            data[[i, j]] = value;
        }
    }
    if let Some(means) = data.mean_axis(Axis(0)) {
        data -= &means;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let first = principal_direction(&data, None, &mut rng);
    let second = principal_direction(&data, Some(&first), &mut rng);

    let mut coords: Vec<[f32; 2]> = (0..n)
        .map(|i| {
            let row = data.row(i);
            [row.dot(&first), row.dot(&second)]
        })
        .collect();

    smooth(&mut coords, embeddings, neighbor_count(n));
    coords
}

/// Power iteration for the dominant direction of the centred data, with an
/// optional deflation vector to recover the second component.
fn principal_direction(
    data: &Array2<f32>,
    orthogonal_to: Option<&Array1<f32>>,
    rng: &mut StdRng,
) -> Array1<f32> {
    let d = data.ncols();
    let mut direction = Array1::from_shape_fn(d, |_| rng.gen_range(-1.0f32..1.0));
    let norm = direction.dot(&direction).sqrt();
    if norm > f32::EPSILON {
        direction /= norm;
    }
    for _ in 0..POWER_ITERATIONS {
        let mut next = data.t().dot(&data.dot(&direction));
        if let Some(prev) = orthogonal_to {
            let overlap = next.dot(prev);
            next = &next - &(prev * overlap);
        }
        let norm = next.dot(&next).sqrt();
        if norm <= f32::EPSILON {
            // All points coincide along this axis; keep the current unit
            // vector so coordinates stay finite.
            break;
        }
        direction = next / norm;
    }
    direction
}

/// Pull each point toward the mean position of its k nearest neighbours in
/// the original embedding space, preserving local structure on top of the
/// global PCA shape.
fn smooth(coords: &mut [[f32; 2]], embeddings: &[Vec<f32>], k: usize) {
    let n = coords.len();
    if n <= 2 {
        return;
    }
    let k = k.min(n - 1);
    let neighbours: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            let mut order: Vec<usize> = (0..n).filter(|&j| j != i).collect();
            order.sort_by(|&a, &b| {
                dist_sq(&embeddings[i], &embeddings[a])
                    .partial_cmp(&dist_sq(&embeddings[i], &embeddings[b]))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            order.truncate(k);
            order
        })
        .collect();

    for _ in 0..SMOOTHING_ROUNDS {
        let snapshot: Vec<[f32; 2]> = coords.to_vec();
        for (i, list) in neighbours.iter().enumerate() {
            let mut mean = [0.0f32, 0.0f32];
            for &j in list {
                mean[0] += snapshot[j][0];
                mean[1] += snapshot[j][1];
            }
            let inv = 1.0 / list.len() as f32;
            coords[i][0] += SMOOTHING_PULL * (mean[0] * inv - snapshot[i][0]);
            coords[i][1] += SMOOTHING_PULL * (mean[1] * inv - snapshot[i][1]);
        }
    }
}

fn dist_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::{neighbor_count, project};

    #[test]
    fn neighbor_count_follows_the_ramp() {
        assert_eq!(neighbor_count(100), 15);
        assert_eq!(neighbor_count(16), 15);
        assert_eq!(neighbor_count(10), 5);
        assert_eq!(neighbor_count(5), 4);
        assert_eq!(neighbor_count(3), 2);
        assert_eq!(neighbor_count(2), 2);
    }

    #[test]
    fn minimum_category_size_projects_cleanly() {
        let embeddings: Vec<Vec<f32>> = (0..5)
            .map(|i| vec![i as f32, (i * i) as f32, 1.0])
            .collect();
        let coords = project(&embeddings, 42);
        assert_eq!(coords.len(), 5);
        for point in coords {
            assert!(point[0].is_finite() && point[1].is_finite());
        }
    }

    #[test]
    fn projection_is_deterministic_for_a_seed() {
        let embeddings: Vec<Vec<f32>> = (0..8).map(|i| vec![i as f32, 1.0, -(i as f32)]).collect();
        assert_eq!(project(&embeddings, 42), project(&embeddings, 42));
    }

    #[test]
    fn degenerate_inputs_collapse_to_origin() {
        assert!(project(&[], 42).is_empty());
        assert_eq!(project(&[vec![1.0, 2.0]], 42), vec![[0.0, 0.0]]);
    }

    #[test]
    fn identical_points_stay_finite() {
        let embeddings = vec![vec![0.5, 0.5, 0.5]; 6];
        for point in project(&embeddings, 7) {
            assert!(point[0].is_finite() && point[1].is_finite());
        }
    }
}
