//! CPU rasterization of a scene and image encoding.

use crate::error::RenderError;
use crate::options::OutputFormat;
use crate::result::EncodedImage;
use image::RgbaImage;
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Stroke, StrokeOpts};
use std::sync::Arc;
use stencil_core::scene::{NodeKind, Paint, SceneNode, ShapeNode, TextNode, TextAlign};
use stencil_core::{Scene, SerializableColor};

/// Curve flattening tolerance in output pixels.
const TOLERANCE: f64 = 0.1;
/// Horizontal shear applied to italic text.
const ITALIC_SKEW: f64 = -0.2;
/// Share of the font size covered by a text bar.
const GLYPH_HEIGHT: f64 = 0.6;

/// Draw `scene` into an `out_width` x `out_height` image, rendering at
/// `supersample` times the size and box-filtering down.
pub fn rasterize(
    scene: &Scene,
    out_width: u32,
    out_height: u32,
    supersample: u32,
) -> Result<RgbaImage, RenderError> {
    if out_width == 0 || out_height == 0 || scene.width == 0 || scene.height == 0 {
        return Err(RenderError::EmptyCanvas {
            width: out_width,
            height: out_height,
        });
    }
    let ss = supersample.max(1);
    let to_u16 = |v: u32| -> Result<u16, RenderError> {
        v.checked_mul(ss)
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| RenderError::Scene(format!("output size {v} x{ss} exceeds u16")))
    };
    let (w, h) = (to_u16(out_width)?, to_u16(out_height)?);

    let view = Affine::scale_non_uniform(
        f64::from(w) / f64::from(scene.width),
        f64::from(h) / f64::from(scene.height),
    );

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

    ctx.set_transform(affine_to_cpu(view));
    set_color(&mut ctx, scene.background);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(scene.width),
        f64::from(scene.height),
    ));
    if let Some(source) = &scene.background_image {
        log::trace!("Background image {source} is not drawn by the rasterizer");
    }

    for node in scene.nodes_ordered() {
        draw_node(&mut ctx, view, node)?;
    }

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    let premul = downsample(pixmap.data_as_u8_slice(), usize::from(w), usize::from(h), ss as usize);
    RgbaImage::from_raw(out_width, out_height, unpremultiply(premul))
        .ok_or_else(|| RenderError::Scene("pixel buffer size mismatch".to_string()))
}

fn draw_node(
    ctx: &mut vello_cpu::RenderContext,
    view: Affine,
    node: &SceneNode,
) -> Result<(), RenderError> {
    let paint = node.paint();
    let opacity = paint.opacity.clamp(0.0, 1.0) as f32;
    if opacity <= 0.0 {
        return Ok(());
    }
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }

    let transform = view * node.affine();
    match node.kind() {
        NodeKind::Shape(shape) => draw_shape(ctx, transform, shape, paint, node.width(), node.height()),
        NodeKind::Text(text) => draw_text(ctx, transform, text, paint, node.width()),
        NodeKind::Image(image) => {
            let (iw, ih) = image.natural_size();
            if iw > 0 && ih > 0 {
                let paint = image_paint(image.pixels())?;
                let fit = Affine::scale_non_uniform(node.width() / f64::from(iw), node.height() / f64::from(ih));
                ctx.set_transform(affine_to_cpu(transform * fit));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(iw), f64::from(ih)));
            }
        }
        NodeKind::Group(group) => {
            for child in group.children() {
                draw_node(ctx, view, child)?;
            }
        }
    }

    if opacity < 1.0 {
        ctx.pop_layer();
    }
    Ok(())
}

fn draw_shape(
    ctx: &mut vello_cpu::RenderContext,
    transform: Affine,
    shape: &ShapeNode,
    paint: &Paint,
    width: f64,
    height: f64,
) {
    let path = shape.local_path(width, height);
    ctx.set_transform(affine_to_cpu(transform));

    if let Some(fill) = paint.fill.filter(|_| !shape.is_open()) {
        set_color(ctx, fill);
        ctx.fill_path(&bezpath_to_cpu(&path));
    }
    if let Some(stroke) = paint.stroke.filter(|_| paint.stroke_width > 0.0) {
        let outline = kurbo::stroke(
            path.iter(),
            &Stroke::new(paint.stroke_width),
            &StrokeOpts::default(),
            TOLERANCE,
        );
        set_color(ctx, stroke);
        ctx.fill_path(&bezpath_to_cpu(&outline));
    }
}

/// Text is drawn as one bar per wrapped line, sized by the approximate
/// advance of the line.
fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    transform: Affine,
    text: &TextNode,
    paint: &Paint,
    width: f64,
) {
    let color = if text.is_hint() {
        text.hint_color
    } else {
        paint.fill.unwrap_or(SerializableColor::black())
    };
    let skew = if text.renders_italic() {
        Affine::new([1.0, 0.0, ITALIC_SKEW, 1.0, 0.0, 0.0])
    } else {
        Affine::IDENTITY
    };

    let line_height = text.line_height();
    let bar_height = text.font_size * GLYPH_HEIGHT;
    let mut bars = BezPath::new();
    for (i, line) in text.wrap_lines(width).iter().enumerate() {
        let advance = text.line_width(line).min(width.max(0.0));
        if advance <= 0.0 {
            continue;
        }
        let (x, advance) = match text.align {
            TextAlign::Left => (0.0, advance),
            TextAlign::Center => ((width - advance) / 2.0, advance),
            TextAlign::Right => (width - advance, advance),
            TextAlign::Justify => (0.0, width),
        };
        let top = i as f64 * line_height + (line_height - bar_height) / 2.0;
        let bar = Rect::new(x, top, x + advance, top + bar_height);
        // Shear around the bar's baseline so lines stay in place.
        let baseline = Affine::translate((0.0, bar.y1));
        let sheared = baseline * skew * baseline.inverse();
        bars.extend(sheared * bar.to_path(TOLERANCE));
    }
    if bars.elements().is_empty() {
        return;
    }

    ctx.set_transform(affine_to_cpu(transform));
    set_color(ctx, color);
    ctx.fill_path(&bezpath_to_cpu(&bars));
}

fn set_color(ctx: &mut vello_cpu::RenderContext, color: SerializableColor) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a));
}

fn image_paint(pixels: &Arc<RgbaImage>) -> Result<vello_cpu::Image, RenderError> {
    let (w, h) = pixels.dimensions();
    let too_big = || RenderError::Scene(format!("image {w}x{h} exceeds u16"));
    let w16 = u16::try_from(w).map_err(|_| too_big())?;
    let h16 = u16::try_from(h).map_err(|_| too_big())?;

    let mut may_have_opacities = false;
    let premul: Vec<vello_cpu::peniko::color::PremulRgba8> = pixels
        .pixels()
        .map(|px| {
            let [r, g, b, a] = px.0;
            may_have_opacities |= a != 255;
            let [r, g, b, a] = premul_rgba8(r, g, b, a);
            vello_cpu::peniko::color::PremulRgba8 { r, g, b, a }
        })
        .collect();

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(premul, w16, h16, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let af = (a as u16) + 1;
    let premul = |c: u8| -> u8 { (((c as u16) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

/// Average `factor` x `factor` blocks of premultiplied RGBA.
fn downsample(data: &[u8], width: usize, height: usize, factor: usize) -> Vec<u8> {
    if factor <= 1 {
        return data.to_vec();
    }
    let (ow, oh) = (width / factor, height / factor);
    let samples = (factor * factor) as u32;
    let mut out = Vec::with_capacity(ow * oh * 4);
    for oy in 0..oh {
        for ox in 0..ow {
            let mut acc = [0u32; 4];
            for sy in 0..factor {
                let row = (oy * factor + sy) * width;
                for sx in 0..factor {
                    let i = (row + ox * factor + sx) * 4;
                    for (c, value) in acc.iter_mut().enumerate() {
                        *value += u32::from(data[i + c]);
                    }
                }
            }
            out.extend(acc.iter().map(|v| ((v + samples / 2) / samples) as u8));
        }
    }
    out
}

fn unpremultiply(mut data: Vec<u8>) -> Vec<u8> {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    data
}

/// Encode `image` as `format`. JPEG quality is `quality * 100`; alpha is
/// flattened onto white first.
pub fn encode(image: &RgbaImage, format: OutputFormat, quality: f32) -> Result<EncodedImage, RenderError> {
    let (width, height) = image.dimensions();
    let bytes = match format {
        OutputFormat::Png => encode_png(image.as_raw(), width, height)?,
        OutputFormat::Jpeg => {
            let rgb: Vec<u8> = image
                .pixels()
                .flat_map(|px| {
                    let [r, g, b, a] = px.0;
                    let over_white = |c: u8| {
                        let (c, a) = (u32::from(c), u32::from(a));
                        ((c * a + 255 * (255 - a) + 127) / 255) as u8
                    };
                    [over_white(r), over_white(g), over_white(b)]
                })
                .collect();
            let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            let mut bytes = Vec::new();
            image::ImageEncoder::write_image(
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality),
                &rgb,
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| RenderError::Encode(e.to_string()))?;
            bytes
        }
    };
    Ok(EncodedImage { format, bytes })
}

fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {e}")))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| RenderError::Encode(format!("PNG data: {e}")))?;
    }
    Ok(png_data)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
