//! Binds keyframes onto the scene, one synchronous transition per keyframe.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::animation::ease::TransitionSpec;
use crate::data::palette::color_for;
use crate::data::series::{EntityId, Series, TimeAxis, Universe};
use crate::foundation::core::Vec2;
use crate::foundation::error::{RaceError, RaceResult};
use crate::foundation::math::{format_grouped, lerp, lerp_round};
use crate::race::keyframes::{EntryRef, KeyframeSet};
use crate::race::rank::RankedEntry;
use crate::scene::axis::{TickTween, plan_ticks};
use crate::scene::model::{
    BarPrimitive, LabelPrimitive, PrimitiveId, Scene, SceneChange, SceneLayout, TickerPrimitive,
};
use crate::scene::scale::LinearScale;

/// Receives every scene write as it happens.
pub trait SceneObserver {
    /// Called after each primitive insert, update, or removal.
    fn on_mutation(&mut self, scene: &Scene, change: SceneChange) -> RaceResult<()>;

    /// Called once per animation tick; `at` is the position on the virtual timeline.
    fn on_tick(&mut self, _scene: &Scene, _at: Duration) -> RaceResult<()> {
        Ok(())
    }
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SceneObserver for NullObserver {
    fn on_mutation(&mut self, _scene: &Scene, _change: SceneChange) -> RaceResult<()> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Geometry {
    y: f64,
    width: f64,
}

#[derive(Clone, Copy, Debug)]
struct EntityTween {
    entity: EntityId,
    bar_from: Geometry,
    bar_to: Geometry,
    label_from: Vec2,
    label_to: Vec2,
    value_from: f64,
    value_to: f64,
    exiting: bool,
}

/// Drives the scene through a [`KeyframeSet`], keyframe by keyframe.
#[derive(Debug)]
pub struct SceneBinder {
    scene: Scene,
    names: Universe,
    time: TimeAxis,
    prev_x: Option<LinearScale>,
    clock: Duration,
    next_frame: usize,
}

impl SceneBinder {
    pub fn new(layout: SceneLayout, series: &Series) -> Self {
        Self {
            scene: Scene::new(layout),
            names: series.universe().clone(),
            time: series.time().clone(),
            prev_x: None,
            clock: Duration::ZERO,
            next_frame: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Virtual timeline position reached so far.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Index of the keyframe the next [`Self::bind_frame`] call must pass.
    pub fn next_frame(&self) -> usize {
        self.next_frame
    }

    /// Bind every remaining keyframe in order.
    #[tracing::instrument(skip_all, fields(keyframes = set.len()))]
    pub fn play(
        &mut self,
        set: &KeyframeSet,
        spec: &TransitionSpec,
        observer: &mut dyn SceneObserver,
    ) -> RaceResult<()> {
        spec.validate()?;
        while self.next_frame < set.len() {
            self.bind_frame(set, self.next_frame, spec, observer)?;
        }
        tracing::debug!(clock_ms = self.clock.as_millis() as u64, "race settled");
        Ok(())
    }

    /// Transition the scene to keyframe `index` and return once it has settled.
    ///
    /// Keyframes must be bound strictly in order, starting at 0.
    pub fn bind_frame(
        &mut self,
        set: &KeyframeSet,
        index: usize,
        spec: &TransitionSpec,
        observer: &mut dyn SceneObserver,
    ) -> RaceResult<()> {
        if index != self.next_frame {
            return Err(RaceError::validation(format!(
                "keyframe {index} bound out of order (expected {})",
                self.next_frame
            )));
        }
        let Some(kf) = set.keyframes().get(index) else {
            return Err(RaceError::validation(format!(
                "keyframe {index} out of range ({} keyframes)",
                set.len()
            )));
        };

        if self.scene.ticker.is_none() {
            self.scene.ticker = Some(TickerPrimitive {
                text: self.time.format(kf.timestamp),
                anchor: self.scene.layout().ticker_anchor(),
            });
            observer.on_mutation(&self.scene, SceneChange::Inserted(PrimitiveId::Ticker))?;
        }

        let mut x = self.scene.layout().x;
        x.set_domain_max(kf.max_value());
        self.scene.layout_mut().x = x;

        let entities = self.join_entities(set, index, &x, observer)?;
        let layout = *self.scene.layout();
        let ticks = plan_ticks(&self.scene.ticks, self.prev_x.as_ref(), &x, layout.tick_count);
        for tick in &ticks {
            if self.scene.ticks.contains_key(&tick.key) {
                continue;
            }
            self.scene.ticks.insert(tick.key, tick.at(0.0));
            observer.on_mutation(&self.scene, SceneChange::Inserted(PrimitiveId::Tick(tick.key)))?;
        }

        let ticks_per_transition = spec.tick_count();
        let interval = spec.tick_interval();
        for step in 1..=ticks_per_transition {
            let t = spec.progress(step);
            for tween in &entities {
                self.apply_entity(tween, t, observer)?;
            }
            for tween in &ticks {
                self.apply_tick(tween, t, observer)?;
            }
            self.clock += interval;
            observer.on_tick(&self.scene, self.clock)?;
        }

        self.settle(&entities, &ticks, kf.timestamp, observer)?;
        self.prev_x = Some(x);
        self.next_frame += 1;
        Ok(())
    }

    /// Enter new visible entities and collect tweens for everything on screen.
    fn join_entities(
        &mut self,
        set: &KeyframeSet,
        index: usize,
        x: &LinearScale,
        observer: &mut dyn SceneObserver,
    ) -> RaceResult<Vec<EntityTween>> {
        let layout = *self.scene.layout();
        let x0 = x.apply(0.0);
        let y = layout.y;
        let place = |e: &RankedEntry| Geometry {
            y: y.position(e.rank),
            width: x.apply(e.value) - x0,
        };
        let anchor = |e: &RankedEntry| Vec2::new(x.apply(e.value), y.position(e.rank));

        let visible = set.keyframes()[index].visible(layout.visible);
        let mut tweens = Vec::with_capacity(visible.len() + 1);
        let mut seen = BTreeSet::new();

        for (slot, entry) in visible.iter().enumerate() {
            let at = EntryRef {
                frame: index as u32,
                slot: slot as u32,
            };
            let origin = set.prev(at).unwrap_or(entry);
            seen.insert(entry.entity);

            let (bar_from, label_from) = match (
                self.scene.bars.get_mut(&entry.entity),
                self.scene.labels.get_mut(&entry.entity),
            ) {
                (Some(bar), Some(label)) => {
                    bar.bound = at;
                    label.bound = at;
                    (
                        Geometry {
                            y: bar.y,
                            width: bar.width,
                        },
                        label.translate,
                    )
                }
                _ => {
                    let from = place(origin);
                    self.scene.bars.insert(
                        entry.entity,
                        BarPrimitive {
                            entity: entry.entity,
                            fill: color_for(entry.entity),
                            x: x0,
                            y: from.y,
                            width: from.width,
                            height: y.bandwidth(),
                            bound: at,
                        },
                    );
                    observer
                        .on_mutation(&self.scene, SceneChange::Inserted(PrimitiveId::Bar(entry.entity)))?;
                    let translate = anchor(origin);
                    self.scene.labels.insert(
                        entry.entity,
                        LabelPrimitive {
                            entity: entry.entity,
                            name: self.names.name(entry.entity).to_string(),
                            translate,
                            value_text: format_grouped(origin.value),
                            bound: at,
                        },
                    );
                    observer.on_mutation(
                        &self.scene,
                        SceneChange::Inserted(PrimitiveId::Label(entry.entity)),
                    )?;
                    (from, translate)
                }
            };

            tweens.push(EntityTween {
                entity: entry.entity,
                bar_from,
                bar_to: place(entry),
                label_from,
                label_to: anchor(entry),
                value_from: origin.value,
                value_to: entry.value,
                exiting: false,
            });
        }

        for (entity, bar) in &self.scene.bars {
            if seen.contains(entity) {
                continue;
            }
            let Some(current) = set.get(bar.bound) else {
                continue;
            };
            let target = set.next(bar.bound).unwrap_or(current);
            let label_from = self
                .scene
                .labels
                .get(entity)
                .map(|l| l.translate)
                .unwrap_or_else(|| anchor(current));
            tweens.push(EntityTween {
                entity: *entity,
                bar_from: Geometry {
                    y: bar.y,
                    width: bar.width,
                },
                bar_to: place(target),
                label_from,
                label_to: anchor(target),
                value_from: current.value,
                value_to: target.value,
                exiting: true,
            });
        }
        Ok(tweens)
    }

    fn apply_entity(
        &mut self,
        tween: &EntityTween,
        t: f64,
        observer: &mut dyn SceneObserver,
    ) -> RaceResult<()> {
        if let Some(bar) = self.scene.bars.get_mut(&tween.entity) {
            bar.y = lerp(tween.bar_from.y, tween.bar_to.y, t);
            bar.width = lerp(tween.bar_from.width, tween.bar_to.width, t);
            observer.on_mutation(&self.scene, SceneChange::Updated(PrimitiveId::Bar(tween.entity)))?;
        }
        if let Some(label) = self.scene.labels.get_mut(&tween.entity) {
            label.translate = tween.label_from.lerp(tween.label_to, t);
            label.value_text = format_grouped(lerp_round(tween.value_from, tween.value_to, t));
            observer
                .on_mutation(&self.scene, SceneChange::Updated(PrimitiveId::Label(tween.entity)))?;
        }
        Ok(())
    }

    fn apply_tick(
        &mut self,
        tween: &TickTween,
        t: f64,
        observer: &mut dyn SceneObserver,
    ) -> RaceResult<()> {
        self.scene.ticks.insert(tween.key, tween.at(t));
        observer.on_mutation(&self.scene, SceneChange::Updated(PrimitiveId::Tick(tween.key)))
    }

    /// Drop exiting primitives, then caption the keyframe on the ticker.
    fn settle(
        &mut self,
        entities: &[EntityTween],
        ticks: &[TickTween],
        timestamp: f64,
        observer: &mut dyn SceneObserver,
    ) -> RaceResult<()> {
        for tween in entities.iter().filter(|t| t.exiting) {
            if self.scene.bars.remove(&tween.entity).is_some() {
                observer.on_mutation(&self.scene, SceneChange::Removed(PrimitiveId::Bar(tween.entity)))?;
            }
            if self.scene.labels.remove(&tween.entity).is_some() {
                observer
                    .on_mutation(&self.scene, SceneChange::Removed(PrimitiveId::Label(tween.entity)))?;
            }
        }
        for tween in ticks.iter().filter(|t| t.exiting) {
            if self.scene.ticks.remove(&tween.key).is_some() {
                observer.on_mutation(&self.scene, SceneChange::Removed(PrimitiveId::Tick(tween.key)))?;
            }
        }
        if let Some(ticker) = self.scene.ticker.as_mut() {
            ticker.text = self.time.format(timestamp);
            observer.on_mutation(&self.scene, SceneChange::Updated(PrimitiveId::Ticker))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/binder.rs"]
mod tests;
