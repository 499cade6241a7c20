//! Raster mirror of the vector scene.

use crate::foundation::core::{Canvas, Point, Rgba8};
use crate::foundation::error::RaceResult;
use crate::render::backend::{FrameRGBA, RasterSource};
use crate::render::text::{TextAnchor, TextPainter, Weight};
use crate::scene::binder::SceneObserver;
use crate::scene::model::{Scene, SceneChange, SceneLayout};

/// Redraws a `vello_cpu` surface from the live scene state.
///
/// Every redraw is a full clear-and-draw, so the surface is always a faithful copy of the scene
/// at the last observed write.
pub struct MirrorRenderer {
    canvas: Canvas,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    text: TextPainter,
    renders: u64,
}

impl std::fmt::Debug for MirrorRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorRenderer")
            .field("canvas", &self.canvas)
            .field("renders", &self.renders)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl MirrorRenderer {
    pub fn new(canvas: Canvas, text: TextPainter) -> RaceResult<Self> {
        canvas.validate()?;
        let (w, h) = (canvas.width as u16, canvas.height as u16);
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        pixmap.data_as_u8_slice_mut().fill(255);
        Ok(Self {
            canvas,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap,
            text,
            renders: 0,
        })
    }

    /// Completed redraws so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Clear and redraw the whole surface from `scene`.
    ///
    /// A scene without primitives leaves the surface untouched.
    pub fn render(&mut self, scene: &Scene) -> RaceResult<()> {
        if scene.is_empty() {
            return Ok(());
        }
        let layout = *scene.layout();
        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        fill(
            ctx,
            Rgba8::WHITE,
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        );

        // Axis text and guides are placed in canvas space, outside the bar margin.
        for tick in scene.ticks().skip(1) {
            self.text.draw(
                ctx,
                &tick.text,
                Weight::Regular,
                SceneLayout::TICK_FONT_SIZE,
                Rgba8::BLACK.with_opacity(tick.opacity),
                Point::new(tick.x, 0.0),
                TextAnchor::MiddleTop,
            );
        }

        for bar in scene.bars() {
            fill(
                ctx,
                bar.fill.with_opacity(SceneLayout::BAR_OPACITY),
                bar.x,
                bar.y,
                bar.x + bar.width.max(0.0),
                bar.y + bar.height,
            );
        }

        let (line_top, line_bottom) = layout.tick_line_span();
        for (i, tick) in scene.ticks().enumerate() {
            let color = if i == 0 { Rgba8::BLACK } else { Rgba8::WHITE };
            let x = tick.x.round();
            fill(
                ctx,
                color.with_opacity(tick.opacity),
                x - 0.5,
                line_top,
                x + 0.5,
                line_bottom,
            );
        }

        let name_dy = layout.name_dy();
        let value_dy = layout.value_dy();
        for label in scene.labels() {
            let x = label.translate.x + SceneLayout::LABEL_INSET;
            self.text.draw(
                ctx,
                &label.name,
                Weight::Bold,
                layout.font_size,
                Rgba8::BLACK,
                Point::new(x, label.translate.y + name_dy),
                TextAnchor::EndBaseline,
            );
            self.text.draw(
                ctx,
                &label.value_text,
                Weight::Regular,
                layout.font_size,
                Rgba8::BLACK.with_opacity(SceneLayout::VALUE_OPACITY),
                Point::new(x, label.translate.y + value_dy),
                TextAnchor::EndBaseline,
            );
        }

        if let Some(ticker) = scene.ticker() {
            self.text.draw(
                ctx,
                &ticker.text,
                Weight::Bold,
                SceneLayout::TICKER_FONT_SIZE,
                Rgba8::BLACK,
                ticker.anchor,
                TextAnchor::EndBaseline,
            );
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.renders += 1;
        Ok(())
    }
}

impl RasterSource for MirrorRenderer {
    fn frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

impl SceneObserver for MirrorRenderer {
    fn on_mutation(&mut self, scene: &Scene, _change: SceneChange) -> RaceResult<()> {
        self.render(scene)
    }
}

fn fill(ctx: &mut vello_cpu::RenderContext, color: Rgba8, x0: f64, y0: f64, x1: f64, y1: f64) {
    if color.a == 0 || !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
        return;
    }
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, y0, x1, y1));
}

#[cfg(test)]
#[path = "../../tests/unit/render/mirror.rs"]
mod tests;
