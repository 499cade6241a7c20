//! Text shaping with Parley and glyph drawing onto a `vello_cpu` context.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{RaceError, RaceResult};

const LAYOUT_CACHE_LIMIT: usize = 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// RGBA8 brush color carried through Parley layouts.
pub(crate) struct TextBrush {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Weight {
    Regular,
    Bold,
}

/// Which point of the laid-out text lands on the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// Right edge on the anchor, baseline on the anchor.
    EndBaseline,
    /// Horizontal center on the anchor, top edge on the anchor.
    MiddleTop,
}

/// A single font registered in its own Parley context.
///
/// Layouts request the family and weight of the face at the loaded collection
/// index, so shaping resolves to that face and not a sibling in the same file.
struct Face {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family: String,
    weight: parley::style::FontWeight,
}

impl Face {
    fn from_bytes(bytes: Vec<u8>, index: u32) -> RaceResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        let (family_id, info) = families
            .iter()
            .find_map(|(id, fonts)| fonts.iter().find(|f| f.index() == index).map(|f| (*id, f)))
            .or_else(|| {
                families
                    .first()
                    .and_then(|(id, fonts)| fonts.first().map(|f| (*id, f)))
            })
            .ok_or_else(|| RaceError::render("no font families registered from font bytes"))?;
        let weight = info.weight();
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| RaceError::render("registered font family has no name"))?
            .to_string();
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            weight,
        })
    }

    fn layout(&mut self, text: &str, size_px: f32, brush: TextBrush) -> parley::Layout<TextBrush> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(self.weight));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LayoutKey {
    weight: Weight,
    size_bits: u32,
    brush: TextBrush,
    text: String,
}

struct ShapedText {
    layout: parley::Layout<TextBrush>,
    width: f64,
    baseline: f64,
}

/// Lays out and draws the short strings of a race frame (names, values, ticks, ticker).
///
/// Holds one face per weight. With no face available, drawing is a no-op.
pub struct TextPainter {
    regular: Option<Face>,
    bold: Option<Face>,
    cache: HashMap<LayoutKey, Arc<ShapedText>>,
    warned: bool,
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPainter")
            .field("regular", &self.regular.as_ref().map(|f| f.family.as_str()))
            .field("bold", &self.bold.as_ref().map(|f| f.family.as_str()))
            .field("cached_layouts", &self.cache.len())
            .finish()
    }
}

impl TextPainter {
    /// A painter that never draws text.
    pub fn none() -> Self {
        Self {
            regular: None,
            bold: None,
            cache: HashMap::new(),
            warned: true,
        }
    }

    /// Load explicit font files, falling back to system sans-serif faces for what is missing.
    pub fn load(regular: Option<&Path>, bold: Option<&Path>) -> RaceResult<Self> {
        let read = |p: &Path| -> RaceResult<Vec<u8>> {
            std::fs::read(p)
                .map_err(|e| RaceError::render(format!("read font '{}': {e}", p.display())))
        };
        let regular_bytes = regular.map(read).transpose()?;
        let bold_bytes = bold.map(read).transpose()?;

        let need_system = regular_bytes.is_none() || bold_bytes.is_none();
        let system = if need_system {
            SystemFonts::load()
        } else {
            SystemFonts::default()
        };

        let regular_src = regular_bytes
            .map(|b| (b, 0))
            .or_else(|| system.face(usvg::fontdb::Weight::NORMAL));
        let bold_src = bold_bytes
            .map(|b| (b, 0))
            .or_else(|| system.face(usvg::fontdb::Weight::BOLD))
            .or_else(|| regular_src.clone());

        let regular = regular_src
            .map(|(bytes, index)| Face::from_bytes(bytes, index))
            .transpose()?;
        let bold = bold_src
            .map(|(bytes, index)| Face::from_bytes(bytes, index))
            .transpose()?;
        if let Some(face) = &regular {
            tracing::debug!(family = %face.family, "text face loaded");
        }
        Ok(Self {
            regular,
            bold,
            cache: HashMap::new(),
            warned: false,
        })
    }

    pub fn has_fonts(&self) -> bool {
        self.regular.is_some() || self.bold.is_some()
    }

    /// Draw `text` so that `anchor` lands on the given point.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        weight: Weight,
        size_px: f64,
        color: Rgba8,
        at: Point,
        anchor: TextAnchor,
    ) {
        if text.is_empty() || color.a == 0 || !(size_px.is_finite() && size_px > 0.0) {
            return;
        }
        let Some(shaped) = self.shape(text, weight, size_px as f32, color.into()) else {
            if !self.warned {
                tracing::warn!("no usable font found; text is not rendered");
                self.warned = true;
            }
            return;
        };

        let (tx, ty) = match anchor {
            TextAnchor::EndBaseline => (at.x - shaped.width, at.y - shaped.baseline),
            TextAnchor::MiddleTop => (at.x - shaped.width / 2.0, at.y),
        };
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((tx, ty)));
        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(run.run().font())
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Width of `text` in pixels, if a face is available.
    pub fn measure(&mut self, text: &str, weight: Weight, size_px: f64) -> Option<f64> {
        self.shape(text, weight, size_px as f32, TextBrush::default())
            .map(|s| s.width)
    }

    fn shape(
        &mut self,
        text: &str,
        weight: Weight,
        size_px: f32,
        brush: TextBrush,
    ) -> Option<Arc<ShapedText>> {
        let key = LayoutKey {
            weight,
            size_bits: size_px.to_bits(),
            brush,
            text: text.to_string(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit.clone());
        }

        let face = match weight {
            Weight::Regular if self.regular.is_some() => self.regular.as_mut(),
            Weight::Bold if self.bold.is_some() => self.bold.as_mut(),
            _ => self.regular.as_mut().or(self.bold.as_mut()),
        }?;
        let layout = face.layout(text, size_px, brush);
        let mut width = 0.0f64;
        let mut baseline = None;
        for line in layout.lines() {
            let m = line.metrics();
            width = width.max(f64::from(m.advance));
            baseline.get_or_insert(f64::from(m.baseline));
        }
        let shaped = Arc::new(ShapedText {
            layout,
            width,
            baseline: baseline.unwrap_or(0.0),
        });

        if self.cache.len() >= LAYOUT_CACHE_LIMIT {
            self.cache.clear();
        }
        self.cache.insert(key, shaped.clone());
        Some(shaped)
    }
}

/// System font lookup through `usvg`'s font database.
#[derive(Default)]
struct SystemFonts {
    db: Option<usvg::fontdb::Database>,
}

impl SystemFonts {
    const FALLBACK_FAMILIES: [&'static str; 5] = [
        "DejaVu Sans",
        "Liberation Sans",
        "Noto Sans",
        "Helvetica",
        "Arial",
    ];

    fn load() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "system fonts scanned");
        Self { db: Some(db) }
    }

    /// Bytes and collection index of a sans-serif face with the given weight.
    fn face(&self, weight: usvg::fontdb::Weight) -> Option<(Vec<u8>, u32)> {
        use usvg::fontdb::{Family, Query};

        let db = self.db.as_ref()?;
        let mut id = db.query(&Query {
            families: &[Family::SansSerif],
            weight,
            ..Default::default()
        });
        for name in Self::FALLBACK_FAMILIES {
            if id.is_some() {
                break;
            }
            id = db.query(&Query {
                families: &[Family::Name(name)],
                weight,
                ..Default::default()
            });
        }
        // Last resort: any face at all, only for the regular weight.
        if id.is_none() && weight == usvg::fontdb::Weight::NORMAL {
            id = db.faces().next().map(|f| f.id);
        }
        db.with_face_data(id?, |data, index| (data.to_vec(), index))
    }
}
