use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::model::Evaluation;

/// Ranking key: smaller diff first, then earlier generation index.
fn rank_key(evaluation: &Evaluation) -> Option<(OrderedFloat<f64>, usize)> {
    match (evaluation.consistent, evaluation.diff) {
        (true, Some(diff)) => Some((OrderedFloat(diff), evaluation.index)),
        _ => None,
    }
}

fn compare(a: &Evaluation, b: &Evaluation) -> Ordering {
    rank_key(a).cmp(&rank_key(b))
}

/// Pick the consistent item with minimal diff. Ties go to the lowest
/// generation index, independent of the order `items` arrive in.
pub fn select_minimal<T>(items: impl IntoIterator<Item = (Evaluation, T)>) -> Option<(Evaluation, T)> {
    items
        .into_iter()
        .filter(|(evaluation, _)| rank_key(evaluation).is_some())
        .min_by(|(a, _), (b, _)| compare(a, b))
}

/// Consistent evaluations, best first.
pub fn rank(evaluations: &[Evaluation]) -> Vec<Evaluation> {
    let mut ranked: Vec<Evaluation> = evaluations
        .iter()
        .copied()
        .filter(|e| rank_key(e).is_some())
        .collect();
    ranked.sort_by(compare);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consistent(index: usize, diff: f64) -> Evaluation {
        Evaluation { index, consistent: true, diff: Some(diff) }
    }

    fn rejected(index: usize) -> Evaluation {
        Evaluation { index, consistent: false, diff: None }
    }

    #[test]
    fn picks_minimal_diff() {
        let items = vec![(consistent(0, 0.8), "a"), (rejected(1), "b"), (consistent(2, 0.05), "c")];
        let (e, v) = select_minimal(items).unwrap();
        assert_eq!(e.index, 2);
        assert_eq!(v, "c");
    }

    #[test]
    fn tie_goes_to_earliest_index() {
        // Arrival order reversed on purpose.
        let items = vec![(consistent(3, 0.2), "late"), (consistent(1, 0.2), "early")];
        let (e, v) = select_minimal(items).unwrap();
        assert_eq!(e.index, 1);
        assert_eq!(v, "early");
    }

    #[test]
    fn nothing_consistent() {
        let items = vec![(rejected(0), ()), (rejected(1), ())];
        assert!(select_minimal(items).is_none());
    }

    #[test]
    fn rank_orders_by_diff_then_index() {
        let evals = [consistent(0, 0.5), rejected(1), consistent(2, 0.1), consistent(3, 0.5)];
        let ranked: Vec<usize> = rank(&evals).iter().map(|e| e.index).collect();
        assert_eq!(ranked, vec![2, 0, 3]);
    }
}
