use super::*;
use crate::data::series::{SeriesEntry, TimeUnit};
use crate::foundation::core::Canvas;
use crate::race::keyframes::KeyframeGenerator;

const CANVAS: Canvas = Canvas {
    width: 320,
    height: 180,
};

fn series(names: &[&str], points: &[(f64, &[f64])]) -> Series {
    let universe = Universe::from_names(names.iter().copied());
    let entries = points
        .iter()
        .map(|(ts, values)| SeriesEntry {
            timestamp: *ts,
            values: values.to_vec(),
        })
        .collect();
    Series::new(
        universe,
        entries,
        TimeAxis::new(TimeUnit::Year, "%Y").unwrap(),
    )
    .unwrap()
}

#[derive(Default)]
struct Recorder {
    changes: Vec<SceneChange>,
    ticks: Vec<Duration>,
    inserted_bars: Vec<BarPrimitive>,
    label_texts: Vec<(EntityId, String)>,
}

impl SceneObserver for Recorder {
    fn on_mutation(&mut self, scene: &Scene, change: SceneChange) -> RaceResult<()> {
        match change {
            SceneChange::Inserted(PrimitiveId::Bar(id)) => {
                if let Some(bar) = scene.bar(id) {
                    self.inserted_bars.push(bar.clone());
                }
            }
            SceneChange::Updated(PrimitiveId::Label(id)) => {
                if let Some(label) = scene.label(id) {
                    self.label_texts.push((id, label.value_text.clone()));
                }
            }
            _ => {}
        }
        self.changes.push(change);
        Ok(())
    }

    fn on_tick(&mut self, _scene: &Scene, at: Duration) -> RaceResult<()> {
        self.ticks.push(at);
        Ok(())
    }
}

fn binder_for(s: &Series, visible: usize) -> SceneBinder {
    SceneBinder::new(SceneLayout::new(CANVAS, visible).unwrap(), s)
}

#[test]
fn two_entity_race_never_enters_or_exits_after_start() {
    let s = series(&["A", "B"], &[(2000.0, &[10.0, 40.0]), (2001.0, &[50.0, 20.0])]);
    let set = KeyframeGenerator {
        steps: 10,
        visible: 2,
    }
    .generate(&s)
    .unwrap();
    let mut binder = binder_for(&s, 2);
    let mut rec = Recorder::default();
    binder
        .play(&set, &TransitionSpec::default(), &mut rec)
        .unwrap();

    let inserted_bars = rec
        .changes
        .iter()
        .filter(|c| matches!(c, SceneChange::Inserted(PrimitiveId::Bar(_))))
        .count();
    assert_eq!(inserted_bars, 2);
    assert!(
        !rec.changes
            .iter()
            .any(|c| matches!(c, SceneChange::Removed(PrimitiveId::Bar(_) | PrimitiveId::Label(_))))
    );

    let scene = binder.scene();
    let a = s.universe().get("A").unwrap();
    let layout = *scene.layout();
    let bar = scene.bar(a).unwrap();
    assert_eq!(bar.y, layout.y.position(0));
    assert_eq!(bar.width, layout.x.range.1 - layout.x.range.0);
    assert_eq!(scene.label(a).unwrap().value_text, "50");
    assert_eq!(scene.label(a).unwrap().name, "A");
    assert_eq!(scene.ticker().unwrap().text, "2001");
}

#[test]
fn ticker_is_first_write_and_caption_follows_each_transition() {
    let s = series(&["A", "B"], &[(2000.0, &[10.0, 40.0]), (2003.0, &[50.0, 20.0])]);
    let set = KeyframeGenerator {
        steps: 3,
        visible: 2,
    }
    .generate(&s)
    .unwrap();
    let spec = TransitionSpec::default();
    let mut binder = binder_for(&s, 2);
    let mut rec = Recorder::default();

    binder.bind_frame(&set, 0, &spec, &mut rec).unwrap();
    assert_eq!(rec.changes[0], SceneChange::Inserted(PrimitiveId::Ticker));
    assert_eq!(
        rec.changes.last(),
        Some(&SceneChange::Updated(PrimitiveId::Ticker))
    );

    // During keyframe 1 the ticker keeps the previous caption until settle.
    rec.changes.clear();
    binder.bind_frame(&set, 1, &spec, &mut rec).unwrap();
    let ticker_updates: Vec<_> = rec
        .changes
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, SceneChange::Updated(PrimitiveId::Ticker)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(ticker_updates, vec![rec.changes.len() - 1]);
    assert_eq!(binder.scene().ticker().unwrap().text, "2001");
}

#[test]
fn entering_and_exiting_bars_use_neighbouring_appearances() {
    let s = series(&["A", "B"], &[(0.0, &[10.0, 0.0]), (1.0, &[0.0, 10.0])]);
    let set = KeyframeGenerator {
        steps: 2,
        visible: 1,
    }
    .generate(&s)
    .unwrap();
    let a = s.universe().get("A").unwrap();
    let b = s.universe().get("B").unwrap();
    let spec = TransitionSpec::default();
    let mut binder = binder_for(&s, 1);
    let mut rec = Recorder::default();

    binder.bind_frame(&set, 0, &spec, &mut rec).unwrap();
    binder.bind_frame(&set, 1, &spec, &mut rec).unwrap();
    assert!(binder.scene().bar(a).is_some());
    assert!(binder.scene().bar(b).is_none());

    rec = Recorder::default();
    binder.bind_frame(&set, 2, &spec, &mut rec).unwrap();

    // B enters where it sat one keyframe earlier: overflow rank, value 5 of 10.
    let layout = *binder.scene().layout();
    let entered = rec.inserted_bars.iter().find(|bar| bar.entity == b).unwrap();
    assert_eq!(entered.y, layout.y.position(1));
    assert_eq!(entered.width, (layout.x.range.1 - layout.x.range.0) / 2.0);

    assert!(rec.changes.contains(&SceneChange::Removed(PrimitiveId::Bar(a))));
    assert!(rec.changes.contains(&SceneChange::Removed(PrimitiveId::Label(a))));
    assert!(binder.scene().bar(a).is_none());
    let bar = binder.scene().bar(b).unwrap();
    assert_eq!(bar.y, layout.y.position(0));
}

#[test]
fn value_text_counts_monotonically() {
    let s = series(&["A", "B"], &[(2000.0, &[10.0, 40.0]), (2001.0, &[1010.0, 20.0])]);
    let set = KeyframeGenerator {
        steps: 2,
        visible: 2,
    }
    .generate(&s)
    .unwrap();
    let a = s.universe().get("A").unwrap();
    let spec = TransitionSpec::default();
    let mut binder = binder_for(&s, 2);
    let mut rec = Recorder::default();
    binder.bind_frame(&set, 0, &spec, &mut rec).unwrap();
    rec.label_texts.clear();
    binder.bind_frame(&set, 1, &spec, &mut rec).unwrap();

    let values: Vec<i64> = rec
        .label_texts
        .iter()
        .filter(|(id, _)| *id == a)
        .map(|(_, text)| text.replace(',', "").parse().unwrap())
        .collect();
    assert_eq!(values.len(), spec.tick_count() as usize);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values.last(), Some(&510));
    assert_eq!(binder.scene().label(a).unwrap().value_text, "510");
}

#[test]
fn clock_advances_one_transition_per_keyframe() {
    let s = series(&["A"], &[(0.0, &[1.0]), (1.0, &[2.0])]);
    let set = KeyframeGenerator {
        steps: 3,
        visible: 1,
    }
    .generate(&s)
    .unwrap();
    let spec = TransitionSpec::default();
    let mut binder = binder_for(&s, 1);
    let mut rec = Recorder::default();
    binder.play(&set, &spec, &mut rec).unwrap();

    let per_frame = spec.tick_count() as usize;
    assert_eq!(rec.ticks.len(), per_frame * set.len());
    assert!(rec.ticks.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(binder.clock(), spec.tick_interval() * (per_frame * set.len()) as u32);
    assert_eq!(binder.next_frame(), set.len());
}

#[test]
fn settled_axis_ticks_are_opaque_and_start_at_zero() {
    let s = series(&["A", "B"], &[(2000.0, &[10.0, 40.0]), (2001.0, &[50.0, 20.0])]);
    let set = KeyframeGenerator {
        steps: 4,
        visible: 2,
    }
    .generate(&s)
    .unwrap();
    let mut binder = binder_for(&s, 2);
    binder
        .play(&set, &TransitionSpec::default(), &mut NullObserver)
        .unwrap();
    let ticks: Vec<_> = binder.scene().ticks().collect();
    assert!(!ticks.is_empty());
    assert_eq!(ticks[0].value, 0.0);
    assert!(ticks.iter().all(|t| t.opacity == 1.0));
}

#[test]
fn out_of_order_binding_is_rejected() {
    let s = series(&["A"], &[(0.0, &[1.0]), (1.0, &[2.0])]);
    let set = KeyframeGenerator::default().generate(&s).unwrap();
    let mut binder = binder_for(&s, 1);
    let err = binder
        .bind_frame(&set, 3, &TransitionSpec::default(), &mut NullObserver)
        .unwrap_err();
    assert!(matches!(err, RaceError::Validation(_)));
    assert!(binder.scene().is_empty());
}
