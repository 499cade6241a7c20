//! Axis tick join: which ticks enter, move, or fade out when the x scale changes.

use std::collections::BTreeMap;

use crate::foundation::math::lerp;
use crate::scene::model::{TickKey, TickPrimitive};
use crate::scene::scale::LinearScale;

/// Start and end state of one tick across a transition.
#[derive(Clone, Debug, PartialEq)]
pub struct TickTween {
    pub key: TickKey,
    pub from_x: f64,
    pub to_x: f64,
    pub from_opacity: f64,
    pub to_opacity: f64,
    pub text: String,
    /// Removed once the transition settles.
    pub exiting: bool,
}

impl TickTween {
    pub fn at(&self, t: f64) -> TickPrimitive {
        TickPrimitive {
            value: self.key.value(),
            x: lerp(self.from_x, self.to_x, t),
            opacity: lerp(self.from_opacity, self.to_opacity, t),
            text: self.text.clone(),
        }
    }
}

/// Join the ticks of `x` against the ticks currently on screen.
///
/// Entering ticks start where the previous scale would have put them, fully transparent.
/// Exiting ticks slide to their position under the new scale while fading out.
pub fn plan_ticks(
    current: &BTreeMap<TickKey, TickPrimitive>,
    prev_x: Option<&LinearScale>,
    x: &LinearScale,
    count: usize,
) -> Vec<TickTween> {
    let decimals = x.tick_decimals(count);
    let wanted: BTreeMap<TickKey, f64> = x
        .ticks(count)
        .into_iter()
        .map(|v| (TickKey::new(v), v))
        .collect();

    let mut out = Vec::with_capacity(wanted.len() + current.len());
    for (key, value) in &wanted {
        let to_x = x.apply(*value);
        let text = x.tick_format(*value, decimals);
        let tween = match current.get(key) {
            Some(tick) => TickTween {
                key: *key,
                from_x: tick.x,
                to_x,
                from_opacity: tick.opacity,
                to_opacity: 1.0,
                text,
                exiting: false,
            },
            None => TickTween {
                key: *key,
                from_x: prev_x.map(|p| p.apply(*value)).unwrap_or(to_x),
                to_x,
                from_opacity: 0.0,
                to_opacity: 1.0,
                text,
                exiting: false,
            },
        };
        out.push(tween);
    }
    for (key, tick) in current {
        if wanted.contains_key(key) {
            continue;
        }
        out.push(TickTween {
            key: *key,
            from_x: tick.x,
            to_x: x.apply(tick.value),
            from_opacity: tick.opacity,
            to_opacity: 0.0,
            text: tick.text.clone(),
            exiting: true,
        });
    }
    out
}
