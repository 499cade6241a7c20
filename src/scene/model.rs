//! Vector scene: keyed arenas of bars, labels, axis ticks, and the ticker.

use std::collections::BTreeMap;

use crate::data::series::EntityId;
use crate::foundation::core::{Canvas, Point, Rgba8, Vec2};
use crate::foundation::error::{RaceError, RaceResult};
use crate::race::keyframes::EntryRef;
use crate::scene::scale::{BandScale, LinearScale};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 16.0,
            right: 6.0,
            bottom: 6.0,
            left: 0.0,
        }
    }
}

/// Fixed geometry of a race scene plus the per-keyframe horizontal scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLayout {
    pub canvas: Canvas,
    pub margin: Margin,
    /// Visible bar count `N`.
    pub visible: usize,
    pub bar_size: f64,
    pub font_size: f64,
    pub x: LinearScale,
    pub y: BandScale,
    pub tick_count: usize,
}

impl SceneLayout {
    pub const BAND_PADDING: f64 = 0.1;
    pub const TICKER_FONT_SIZE: f64 = 48.0;
    pub const TICK_FONT_SIZE: f64 = 10.0;
    pub const BAR_OPACITY: f64 = 0.6;
    pub const VALUE_OPACITY: f64 = 0.7;
    /// Horizontal offset of label text from the bar end.
    pub const LABEL_INSET: f64 = -6.0;

    pub fn new(canvas: Canvas, visible: usize) -> RaceResult<Self> {
        canvas.validate()?;
        if visible == 0 {
            return Err(RaceError::validation("visible bar count must be > 0"));
        }
        let margin = Margin::default();
        let width = f64::from(canvas.width);
        let height = f64::from(canvas.height);
        let n = visible as f64;
        let bar_size = (height - (margin.top + margin.bottom)) / n;
        let x = LinearScale::new((0.0, 1.0), (margin.left, width - margin.right));
        let y = BandScale::new(
            visible + 1,
            (
                margin.top,
                margin.top + bar_size * (n + 1.0 + Self::BAND_PADDING),
            ),
            Self::BAND_PADDING,
        );
        Ok(Self {
            canvas,
            margin,
            visible,
            bar_size,
            font_size: 0.25 * bar_size,
            x,
            y,
            tick_count: (width / 160.0) as usize,
        })
    }

    /// Baseline offset of the entity name inside a label.
    pub fn name_dy(&self) -> f64 {
        self.y.bandwidth() / 2.0 - 0.25 * self.bar_size
    }

    /// Baseline offset of the value text inside a label.
    pub fn value_dy(&self) -> f64 {
        self.y.bandwidth() / 2.0 + 0.15 * self.font_size
    }

    /// Vertical extent of axis guide lines, in canvas space.
    pub fn tick_line_span(&self) -> (f64, f64) {
        (
            10.0,
            self.bar_size * (self.visible as f64 + Self::BAND_PADDING) + 15.0,
        )
    }

    pub fn ticker_anchor(&self) -> Point {
        Point::new(
            f64::from(self.canvas.width) - 6.0,
            f64::from(self.canvas.height) - 50.0,
        )
    }
}

/// Key of an axis tick: the bit pattern of its (non-negative) value.
///
/// Tick values come from a `[0, max]` domain, so bit order equals numeric order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickKey(u64);

impl TickKey {
    pub fn new(value: f64) -> Self {
        Self((value + 0.0).to_bits())
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveId {
    Bar(EntityId),
    Label(EntityId),
    Tick(TickKey),
    Ticker,
}

/// A single write to the scene, reported to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneChange {
    Inserted(PrimitiveId),
    Updated(PrimitiveId),
    Removed(PrimitiveId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarPrimitive {
    pub entity: EntityId,
    pub fill: Rgba8,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub(crate) bound: EntryRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelPrimitive {
    pub entity: EntityId,
    pub name: String,
    /// Bar-end anchor; text is right-aligned against it.
    pub translate: Vec2,
    pub value_text: String,
    pub(crate) bound: EntryRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickPrimitive {
    pub value: f64,
    pub x: f64,
    pub opacity: f64,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickerPrimitive {
    pub text: String,
    pub anchor: Point,
}

/// The live vector scene.
///
/// Primitives are keyed by stable identifiers (entity id, tick value) so continuity across
/// keyframes never depends on object identity.
#[derive(Clone, Debug)]
pub struct Scene {
    layout: SceneLayout,
    pub(crate) bars: BTreeMap<EntityId, BarPrimitive>,
    pub(crate) labels: BTreeMap<EntityId, LabelPrimitive>,
    pub(crate) ticks: BTreeMap<TickKey, TickPrimitive>,
    pub(crate) ticker: Option<TickerPrimitive>,
}

impl Scene {
    pub fn new(layout: SceneLayout) -> Self {
        Self {
            layout,
            bars: BTreeMap::new(),
            labels: BTreeMap::new(),
            ticks: BTreeMap::new(),
            ticker: None,
        }
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub(crate) fn layout_mut(&mut self) -> &mut SceneLayout {
        &mut self.layout
    }

    pub fn bars(&self) -> impl Iterator<Item = &BarPrimitive> {
        self.bars.values()
    }

    pub fn bar(&self, entity: EntityId) -> Option<&BarPrimitive> {
        self.bars.get(&entity)
    }

    pub fn labels(&self) -> impl Iterator<Item = &LabelPrimitive> {
        self.labels.values()
    }

    pub fn label(&self, entity: EntityId) -> Option<&LabelPrimitive> {
        self.labels.get(&entity)
    }

    /// Ticks in ascending value order.
    pub fn ticks(&self) -> impl Iterator<Item = &TickPrimitive> {
        self.ticks.values()
    }

    pub fn ticker(&self) -> Option<&TickerPrimitive> {
        self.ticker.as_ref()
    }

    pub fn primitive_count(&self) -> usize {
        self.bars.len() + self.labels.len() + self.ticks.len() + usize::from(self.ticker.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }
}
