//! Dense, interpolated keyframes and the per-entity adjacency between them.

use std::collections::HashMap;

use crate::data::series::{EntityId, Series};
use crate::foundation::error::{RaceError, RaceResult};
use crate::foundation::math::lerp;
use crate::race::rank::{RankedEntry, rank};

/// Number of trailing copies of the final ranking appended after the last segment.
pub const SETTLE_FRAMES: usize = 2;

/// A fully ranked snapshot at one (possibly interpolated) instant.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Keyframe {
    pub timestamp: f64,
    /// Every universe entity, ordered by rank.
    pub entries: Vec<RankedEntry>,
}

impl Keyframe {
    /// The largest value in the frame (the rank-0 entry).
    pub fn max_value(&self) -> f64 {
        self.entries.first().map(|e| e.value).unwrap_or(0.0)
    }

    /// Entries drawn on screen: the first `n` by rank.
    pub fn visible(&self, n: usize) -> &[RankedEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Address of one entity appearance: keyframe index plus slot within that keyframe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct EntryRef {
    pub frame: u32,
    pub slot: u32,
}

/// Generated keyframes plus previous/next appearance maps.
#[derive(Clone, Debug, Default)]
pub struct KeyframeSet {
    keyframes: Vec<Keyframe>,
    prev: HashMap<EntryRef, EntryRef>,
    next: HashMap<EntryRef, EntryRef>,
}

impl KeyframeSet {
    /// Index keyframes and build the adjacency maps.
    pub fn new(keyframes: Vec<Keyframe>) -> Self {
        // Flatten, group by entity in first-appearance order, then pair neighbours.
        let mut group_order: Vec<EntityId> = Vec::new();
        let mut groups: HashMap<EntityId, Vec<EntryRef>> = HashMap::new();
        for (f, kf) in keyframes.iter().enumerate() {
            for (s, entry) in kf.entries.iter().enumerate() {
                let at = EntryRef {
                    frame: f as u32,
                    slot: s as u32,
                };
                groups
                    .entry(entry.entity)
                    .or_insert_with(|| {
                        group_order.push(entry.entity);
                        Vec::new()
                    })
                    .push(at);
            }
        }

        let mut prev = HashMap::new();
        let mut next = HashMap::new();
        for entity in &group_order {
            let Some(appearances) = groups.get(entity) else {
                continue;
            };
            for pair in appearances.windows(2) {
                next.insert(pair[0], pair[1]);
                prev.insert(pair[1], pair[0]);
            }
        }

        Self {
            keyframes,
            prev,
            next,
        }
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn get(&self, at: EntryRef) -> Option<&RankedEntry> {
        self.keyframes
            .get(at.frame as usize)?
            .entries
            .get(at.slot as usize)
    }

    pub fn prev_ref(&self, at: EntryRef) -> Option<EntryRef> {
        self.prev.get(&at).copied()
    }

    pub fn next_ref(&self, at: EntryRef) -> Option<EntryRef> {
        self.next.get(&at).copied()
    }

    /// The same entity's entry in the preceding appearance, if any.
    pub fn prev(&self, at: EntryRef) -> Option<&RankedEntry> {
        self.prev_ref(at).and_then(|r| self.get(r))
    }

    /// The same entity's entry in the following appearance, if any.
    pub fn next(&self, at: EntryRef) -> Option<&RankedEntry> {
        self.next_ref(at).and_then(|r| self.get(r))
    }
}

/// Turns a sparse [`Series`] into dense ranked keyframes.
#[derive(Clone, Copy, Debug)]
pub struct KeyframeGenerator {
    /// Interpolated frames emitted per series segment (`K`).
    pub steps: usize,
    /// Visible bar count (`N`), the overflow rank.
    pub visible: usize,
}

impl Default for KeyframeGenerator {
    fn default() -> Self {
        Self {
            steps: 10,
            visible: 12,
        }
    }
}

impl KeyframeGenerator {
    /// Produce `steps * (len - 1) + 2` keyframes.
    ///
    /// Each segment `(ta, A) -> (tb, B)` yields frames at `i / steps` for `i` in `0..steps`,
    /// re-ranking each one so order can shuffle mid-segment. The final ranking is then repeated
    /// twice so the scene can settle before capture stops.
    #[tracing::instrument(skip(series), fields(time_points = series.len()))]
    pub fn generate(&self, series: &Series) -> RaceResult<KeyframeSet> {
        if self.steps == 0 {
            return Err(RaceError::validation("interpolation steps must be > 0"));
        }
        let entries = series.entries();
        if entries.len() < 2 {
            return Err(RaceError::InsufficientData {
                observations: entries.len(),
            });
        }

        let universe = series.universe();
        let mut keyframes = Vec::with_capacity(self.steps * (entries.len() - 1) + SETTLE_FRAMES);
        for pair in entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            for i in 0..self.steps {
                let t = i as f64 / self.steps as f64;
                keyframes.push(Keyframe {
                    timestamp: lerp(a.timestamp, b.timestamp, t),
                    entries: rank(
                        |id| lerp(a.value(id), b.value(id), t),
                        universe,
                        self.visible,
                    ),
                });
            }
        }

        let last = &entries[entries.len() - 1];
        for _ in 0..SETTLE_FRAMES {
            keyframes.push(Keyframe {
                timestamp: last.timestamp,
                entries: rank(|id| last.value(id), universe, self.visible),
            });
        }

        tracing::debug!(keyframes = keyframes.len(), "generated keyframes");
        Ok(KeyframeSet::new(keyframes))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/race/keyframes.rs"]
mod tests;
