use crate::data::series::{EntityId, Universe};

/// An entity's value and clamped rank within one keyframe.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RankedEntry {
    pub entity: EntityId,
    pub value: f64,
    /// 0-based position, clamped to the overflow rank `N` beyond the visible window.
    pub rank: usize,
}

/// Rank every entity of `universe` by `value_of`, descending.
///
/// Ties keep universe order (stable sort). Positions past `visible` all share rank `visible`,
/// so exiting bars head for one common off-window slot.
pub fn rank(
    value_of: impl Fn(EntityId) -> f64,
    universe: &Universe,
    visible: usize,
) -> Vec<RankedEntry> {
    let mut data: Vec<RankedEntry> = universe
        .ids()
        .map(|entity| RankedEntry {
            entity,
            value: value_of(entity),
            rank: 0,
        })
        .collect();
    data.sort_by(|a, b| b.value.total_cmp(&a.value));
    for (i, entry) in data.iter_mut().enumerate() {
        entry.rank = i.min(visible);
    }
    data
}

#[cfg(test)]
#[path = "../../tests/unit/race/rank.rs"]
mod tests;
