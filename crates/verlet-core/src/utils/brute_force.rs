use crate::core::crystal::Crystal;
use crate::core::masking::MaskingRules;

/// Every unordered pair `(i, j)`, `i < j`, of the asymmetric unit whose minimum-image distance
/// is at most `radius` and that `masking` does not exclude. Sorted.
pub fn brute_force_pairs(
    crystal: &dyn Crystal,
    coordinates: &[f64],
    radius: f64,
    masking: &dyn MaskingRules,
) -> Vec<(usize, usize)> {
    let n = coordinates.len() / 3;
    let radius_sq = radius * radius;
    let mut mask = vec![1.0; n];
    let mut pairs = Vec::new();

    for i in 0..n {
        masking.apply_mask(&mut mask, i);
        for j in (i + 1)..n {
            if mask[j] <= 0.0 {
                continue;
            }
            if distance_squared(crystal, coordinates, i, coordinates, j) <= radius_sq {
                pairs.push((i, j));
            }
        }
        masking.remove_mask(&mut mask, i);
    }
    pairs
}

/// Every directed pair `(i, j)` between atom `i` of the asymmetric unit and atom `j` of one
/// symmetry mate within `radius`. `i == j` is a real pair here. Sorted.
pub fn brute_force_mate_pairs(
    crystal: &dyn Crystal,
    asymmetric_unit: &[f64],
    mate: &[f64],
    radius: f64,
) -> Vec<(usize, usize)> {
    let n = asymmetric_unit.len() / 3;
    let radius_sq = radius * radius;
    let mut pairs = Vec::new();

    for i in 0..n {
        for j in 0..mate.len() / 3 {
            if distance_squared(crystal, asymmetric_unit, i, mate, j) <= radius_sq {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

#[inline]
fn distance_squared(crystal: &dyn Crystal, a: &[f64], i: usize, b: &[f64], j: usize) -> f64 {
    crystal.image(
        a[3 * i] - b[3 * j],
        a[3 * i + 1] - b[3 * j + 1],
        a[3 * i + 2] - b[3 * j + 2],
    )
}
