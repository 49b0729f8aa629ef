//! Auto-sum: the normalisation term of psi.

use tracing::debug;

use crate::distance::Distance;
use crate::path::CostPath;
use crate::sequence::Sequence;

/// Sum of distances between consecutive rows of `seq`.
///
/// Zero for a single-row sequence.
#[must_use]
pub fn auto_distance(seq: &Sequence, metric: Distance) -> f64 {
    (1..seq.rows())
        .map(|i| metric.compute(seq.row(i - 1), seq.row(i)))
        .sum()
}

/// Auto-sum over the full sequences.
#[must_use]
pub fn auto_sum_full(a: &Sequence, b: &Sequence, metric: Distance) -> f64 {
    auto_distance(a, metric) + auto_distance(b, metric)
}

/// Auto-sum over the rows referenced by `path`.
///
/// Each sequence is restricted to the unique row indices of its side of the
/// path, in order of first appearance along the path, and consecutive
/// distances are summed in that order.
#[must_use]
pub fn auto_sum_path(a: &Sequence, b: &Sequence, path: &CostPath, metric: Distance) -> f64 {
    restricted_auto_distance(a, path.a_indices(), metric)
        + restricted_auto_distance(b, path.b_indices(), metric)
}

fn restricted_auto_distance(
    seq: &Sequence,
    indices: impl IntoIterator<Item = usize>,
    metric: Distance,
) -> f64 {
    seq.select_unique_rows(indices)
        .map_or(0.0, |subset| auto_distance(&subset, metric))
}

/// Auto-sum over the path-referenced rows when `path` is given, otherwise over
/// the full sequences.
#[must_use]
pub fn auto_sum(a: &Sequence, b: &Sequence, metric: Distance, path: Option<&CostPath>) -> f64 {
    let value = match path {
        Some(path) => auto_sum_path(a, b, path, metric),
        None => auto_sum_full(a, b, metric),
    };
    debug!(value, restricted = path.is_some(), "auto-sum computed");
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathStep;

    fn seq(values: &[f64]) -> Sequence {
        let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        Sequence::from_rows(&rows).unwrap()
    }

    fn path(cells: &[(usize, usize)]) -> CostPath {
        CostPath::new(
            cells
                .iter()
                .map(|&(a, b)| PathStep { a, b, dist: 0.0, cost: 0.0 })
                .collect(),
        )
    }

    #[test]
    fn consecutive_distances() {
        let s = seq(&[0.0, 1.0, 3.0, 6.0]);
        assert_eq!(auto_distance(&s, Distance::Manhattan), 6.0);
        assert_eq!(auto_distance(&seq(&[4.0]), Distance::Manhattan), 0.0);
    }

    #[test]
    fn full_adds_both_sequences() {
        let a = seq(&[0.0, 1.0, 3.0]);
        let b = seq(&[5.0, 0.0]);
        assert_eq!(auto_sum_full(&a, &b, Distance::Manhattan), 8.0);
        assert_eq!(auto_sum(&a, &b, Distance::Manhattan, None), 8.0);
    }

    #[test]
    fn path_variant_uses_first_occurrence_order() {
        let a = seq(&[0.0, 1.0, 3.0, 6.0]);
        let b = seq(&[0.0, 10.0]);
        // a rows visited: 3, 3, 1, 0 -> unique 3, 1, 0 -> |6-1| + |1-0| = 6
        // b rows visited: 1, 0, 0, 0 -> unique 1, 0 -> 10
        let p = path(&[(3, 1), (3, 0), (1, 0), (0, 0)]);
        assert_eq!(auto_sum_path(&a, &b, &p, Distance::Manhattan), 16.0);
        assert_eq!(auto_sum(&a, &b, Distance::Manhattan, Some(&p)), 16.0);
    }

    #[test]
    fn path_order_not_row_order() {
        let a = seq(&[0.0, 5.0, 1.0]);
        let b = seq(&[0.0]);
        // unique order 2, 0, 1 -> |1-0| + |0-5| = 6; sorted would give 9
        let p = path(&[(2, 0), (0, 0), (1, 0)]);
        assert_eq!(auto_sum_path(&a, &b, &p, Distance::Manhattan), 6.0);
    }
}
