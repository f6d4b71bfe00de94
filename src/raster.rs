use image::{Rgba, RgbaImage};

use crate::{
    config::Style,
    foundation::error::{TexError, TexResult},
    typeset::CanvasHint,
};

// Avoid pathological allocations from huge dpi/padding combinations.
const MAX_DIM: u32 = 16_384;

/// Upper bound for the canvas a [`CanvasHint`] asks for. Content larger than
/// this still gets a canvas of its own size.
const MAX_HINT_DIM: u32 = 4_096;

/// x-height of the MathJax TeX fonts in em. MathJax sizes its SVG in `ex`
/// against this ratio, while usvg resolves `1ex` as half the font size.
const MATHJAX_EX_PER_EM: f32 = 0.442;

/// Pixel-space rectangle, `x`/`y` inclusive, `w`/`h` > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Rasterize an engine SVG into a trimmed, padded straight-alpha image.
///
/// SVG user units are treated as points, so `dpi / 72` is the pixel scale and
/// `ex` lengths resolve to MathJax's x-height of `style.font_size`. The drawing
/// is centered on a canvas of at least `hint` size (capped at
/// `MAX_HINT_DIM`), cropped to its inked pixels and then padded by `style.padding`
/// pixels on every side. An empty drawing yields a padding-only image.
pub fn rasterize(svg: &str, style: &Style, hint: CanvasHint) -> TexResult<RgbaImage> {
    let svg = svg.replace("currentColor", &style.font_color.to_hex());
    let opts = usvg::Options {
        font_size: style.font_size as f32 * 2.0 * MATHJAX_EX_PER_EM,
        ..usvg::Options::default()
    };
    let tree = match usvg::Tree::from_str(&svg, &opts) {
        Ok(tree) => tree,
        Err(usvg::Error::InvalidSize) => {
            tracing::debug!("empty drawing, emitting padding only");
            let blank = PixelBox {
                x: 0,
                y: 0,
                w: 1,
                h: 1,
            };
            return compose(&[0; 4], 1, blank, style);
        }
        Err(e) => return Err(TexError::raster(format!("parse svg: {e}"))),
    };

    let scale = style.scale();
    let size = tree.size();
    let content_w = to_px(size.width() * scale)?;
    let content_h = to_px(size.height() * scale)?;

    let (hint_w, hint_h) = hint.size_px(style.dpi);
    let canvas_w = content_w.max(hint_w.min(MAX_HINT_DIM));
    let canvas_h = content_h.max(hint_h.min(MAX_HINT_DIM));
    check_dims(canvas_w, canvas_h)?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas_w, canvas_h)
        .ok_or_else(|| TexError::raster("failed to allocate canvas pixmap"))?;

    let content = PixelBox {
        x: (canvas_w - content_w) / 2,
        y: (canvas_h - content_h) / 2,
        w: content_w,
        h: content_h,
    };
    let xform = resvg::tiny_skia::Transform::from_row(
        scale,
        0.0,
        0.0,
        scale,
        content.x as f32,
        content.y as f32,
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let ink = ink_bounds(pixmap.data(), canvas_w, canvas_h).unwrap_or(content);
    tracing::debug!(
        canvas_w,
        canvas_h,
        ink_w = ink.w,
        ink_h = ink.h,
        "rasterized expression"
    );

    compose(pixmap.data(), canvas_w, ink, style)
}

fn to_px(v: f32) -> TexResult<u32> {
    if !v.is_finite() || v < 0.0 {
        return Err(TexError::raster("svg has invalid width/height"));
    }
    Ok((v.ceil() as u32).max(1))
}

fn check_dims(w: u32, h: u32) -> TexResult<()> {
    if w > MAX_DIM || h > MAX_DIM {
        return Err(TexError::raster(format!(
            "raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok(())
}

/// Bounding box of pixels with non-zero alpha in a tightly packed RGBA8 buffer.
pub fn ink_bounds(rgba: &[u8], width: u32, height: u32) -> Option<PixelBox> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    let len = (width as usize) * (height as usize);
    for (i, px) in rgba.chunks_exact(4).take(len).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    if min_x == u32::MAX {
        return None;
    }
    Some(PixelBox {
        x: min_x,
        y: min_y,
        w: max_x - min_x + 1,
        h: max_y - min_y + 1,
    })
}

/// Crop `src` (premultiplied) to `region`, pad, lay over the background and
/// demultiply.
fn compose(src: &[u8], src_w: u32, region: PixelBox, style: &Style) -> TexResult<RgbaImage> {
    let pad = style.padding;
    let grow = |v: u32| {
        pad.checked_mul(2)
            .and_then(|p| v.checked_add(p))
            .ok_or_else(|| TexError::raster("padding overflows image size"))
    };
    let out_w = grow(region.w)?;
    let out_h = grow(region.h)?;
    check_dims(out_w, out_h)?;

    let bg = style.background.map(|c| c.to_premul()).unwrap_or([0; 4]);
    let ink_alpha = style.font_color.a as u32;

    let img = RgbaImage::from_fn(out_w, out_h, |x, y| {
        let inside = x >= pad && y >= pad && x - pad < region.w && y - pad < region.h;
        let fg = if inside {
            let sx = region.x + x - pad;
            let sy = region.y + y - pad;
            let i = ((sy * src_w + sx) * 4) as usize;
            let mut p = [src[i], src[i + 1], src[i + 2], src[i + 3]];
            if ink_alpha != 255 {
                for c in &mut p {
                    *c = ((*c as u32 * ink_alpha + 127) / 255) as u8;
                }
            }
            p
        } else {
            [0; 4]
        };
        Rgba(demultiply(over(fg, bg)))
    });
    Ok(img)
}

/// Premultiplied source-over.
fn over(fg: [u8; 4], bg: [u8; 4]) -> [u8; 4] {
    let inv = 255 - fg[3] as u32;
    let mut out = [0u8; 4];
    for i in 0..4 {
        let v = fg[i] as u32 + (bg[i] as u32 * inv + 127) / 255;
        out[i] = v.min(255) as u8;
    }
    out
}

fn demultiply(px: [u8; 4]) -> [u8; 4] {
    let a = px[3] as u32;
    if a == 0 {
        return [0; 4];
    }
    if a == 255 {
        return px;
    }
    let un = |c: u8| ((c as u32 * 255 + a / 2) / a).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Color;

    const RECT_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="5" viewBox="0 0 10 5">
  <rect x="0" y="0" width="10" height="5" fill="currentColor"/>
</svg>"#;

    fn style(dpi: u32, padding: u32) -> Style {
        Style {
            dpi,
            font_size: 14,
            font_color: Color::BLACK,
            background: Some(Color::WHITE),
            padding,
        }
    }

    #[test]
    fn output_is_trimmed_to_ink_plus_padding() {
        let img = rasterize(RECT_SVG, &style(72, 2), CanvasHint::Compact).unwrap();
        assert_eq!(img.dimensions(), (14, 9));
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(13, 8).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(11, 6).0, [0, 0, 0, 255]);
    }

    #[test]
    fn dpi_scales_the_drawing() {
        let img = rasterize(RECT_SVG, &style(144, 0), CanvasHint::Compact).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
    }

    #[test]
    fn multiline_canvas_trims_to_the_same_size() {
        let a = rasterize(RECT_SVG, &style(72, 3), CanvasHint::Compact).unwrap();
        let b = rasterize(RECT_SVG, &style(72, 3), CanvasHint::MultiLine).unwrap();
        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn font_color_replaces_current_color() {
        let mut s = style(72, 1);
        s.font_color = Color::rgb(255, 0, 0);
        let img = rasterize(RECT_SVG, &s, CanvasHint::Compact).unwrap();
        assert_eq!(img.get_pixel(5, 3).0, [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_background_keeps_alpha() {
        let mut s = style(72, 2);
        s.background = None;
        s.font_color = Color::rgba(0, 0, 255, 128);
        let img = rasterize(RECT_SVG, &s, CanvasHint::Compact).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(5, 4).0, [0, 0, 255, 128]);
    }

    #[test]
    fn blank_drawing_falls_back_to_content_box() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="3"></svg>"#;
        let img = rasterize(svg, &style(72, 1), CanvasHint::Compact).unwrap();
        assert_eq!(img.dimensions(), (6, 5));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn zero_size_drawing_is_padding_only() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="0"></svg>"#;
        let img = rasterize(svg, &style(72, 4), CanvasHint::Compact).unwrap();
        assert_eq!(img.dimensions(), (9, 9));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn sub_pixel_sizes_round_up_to_one_pixel() {
        assert_eq!(to_px(0.0).unwrap(), 1);
        assert_eq!(to_px(0.3).unwrap(), 1);
        assert!(to_px(-1.0).is_err());
        assert!(to_px(f32::NAN).is_err());
    }

    #[test]
    fn multiline_canvas_is_capped_at_high_dpi() {
        let single = rasterize(RECT_SVG, &style(2400, 0), CanvasHint::Compact).unwrap();
        let multi = rasterize(RECT_SVG, &style(2400, 0), CanvasHint::MultiLine).unwrap();
        assert_eq!(single.dimensions(), multi.dimensions());
        assert_eq!(single.dimensions(), (334, 167));
    }

    #[test]
    fn ex_lengths_follow_mathjax_x_height() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10ex" height="2ex" viewBox="0 0 10 2">
  <rect x="0" y="0" width="10" height="2" fill="currentColor"/>
</svg>"#;
        let mut s = style(72, 0);
        s.font_size = 100;
        let img = rasterize(svg, &s, CanvasHint::Compact).unwrap();
        // 10ex at 100pt = 10 * 0.442 * 100 = 442px, not usvg's default 500px.
        assert!((441..=443).contains(&img.width()), "width {}", img.width());
        assert!((88..=90).contains(&img.height()), "height {}", img.height());
    }

    #[test]
    fn malformed_svg_is_a_raster_error() {
        let err = rasterize("<svg", &style(72, 0), CanvasHint::Compact).unwrap_err();
        assert!(matches!(err, TexError::Raster(_)));
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20000" height="10"></svg>"#;
        let err = rasterize(svg, &style(72, 0), CanvasHint::Compact).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn ink_bounds_finds_extent() {
        let mut buf = vec![0u8; 4 * 4 * 3];
        buf[(4 + 1) * 4 + 3] = 10;
        buf[(2 * 4 + 2) * 4 + 3] = 255;
        assert_eq!(
            ink_bounds(&buf, 4, 3),
            Some(PixelBox {
                x: 1,
                y: 1,
                w: 2,
                h: 2
            })
        );
        assert_eq!(ink_bounds(&[0u8; 16], 2, 2), None);
    }
}
