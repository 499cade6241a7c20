use super::*;

fn universe(n: usize) -> Universe {
    Universe::from_names((0..n).map(|i| format!("e{i}")))
}

#[test]
fn sorts_descending_with_dense_ranks() {
    let u = universe(3);
    let values = [5.0, 30.0, 12.0];
    let ranked = rank(|id| values[id.index()], &u, 10);
    let order: Vec<_> = ranked.iter().map(|e| e.entity.0).collect();
    assert_eq!(order, vec![1, 2, 0]);
    let ranks: Vec<_> = ranked.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![0, 1, 2]);
}

#[test]
fn ties_keep_universe_order() {
    let u = universe(4);
    let ranked = rank(|id| if id.0 == 3 { 9.0 } else { 1.0 }, &u, 10);
    let order: Vec<_> = ranked.iter().map(|e| e.entity.0).collect();
    assert_eq!(order, vec![3, 0, 1, 2]);
}

#[test]
fn overflow_positions_share_rank_n() {
    let u = universe(6);
    let ranked = rank(|id| f64::from(id.0), &u, 3);
    let ranks: Vec<_> = ranked.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![0, 1, 2, 3, 3, 3]);
}

#[test]
fn ranks_have_no_gaps_below_n() {
    for entities in 1..8 {
        for visible in 1..6 {
            let u = universe(entities);
            let ranked = rank(|id| f64::from(id.0 * 7 % 5), &u, visible);
            for (i, e) in ranked.iter().enumerate() {
                assert_eq!(e.rank, i.min(visible));
            }
        }
    }
}

#[test]
fn empty_universe_ranks_nothing() {
    let u = Universe::new();
    assert!(rank(|_| 1.0, &u, 3).is_empty());
}
