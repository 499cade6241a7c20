use std::time::Duration;

use crate::foundation::error::{RaceError, RaceResult};

/// Easing curve applied to transition progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// Timing of one keyframe transition.
///
/// A transition is sampled at `animation_hz` ticks per second of timeline time; each tick
/// advances the virtual clock by [`TransitionSpec::tick_interval`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionSpec {
    pub duration: Duration,
    pub ease: Ease,
    pub animation_hz: u32,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(250),
            ease: Ease::Linear,
            animation_hz: 60,
        }
    }
}

impl TransitionSpec {
    pub fn validate(&self) -> RaceResult<()> {
        if self.animation_hz == 0 {
            return Err(RaceError::validation("animation_hz must be > 0"));
        }
        Ok(())
    }

    /// Number of animation ticks needed to cover the duration (always at least one).
    pub fn tick_count(&self) -> u32 {
        let ticks = (self.duration.as_secs_f64() * f64::from(self.animation_hz)).round();
        (ticks as u32).max(1)
    }

    pub fn tick_interval(&self) -> Duration {
        self.duration / self.tick_count()
    }

    /// Eased progress after `tick` of [`Self::tick_count`] ticks.
    pub fn progress(&self, tick: u32) -> f64 {
        let n = self.tick_count();
        self.ease.apply(f64::from(tick.min(n)) / f64::from(n))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
