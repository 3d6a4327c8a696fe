use super::chart::PieChart;
use crate::error::{other_error, ReportResult};
use ab_glyph::{Font, FontRef, FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::f64::consts::TAU;

pub const WIDTH: u32 = 960;
pub const HEIGHT: u32 = 720;

/// Pie centre and radius in pixels
pub const CENTER: (i32, i32) = (380, 400);
pub const RADIUS: i32 = 240;

const LEGEND_X: i32 = 720;
const LEGEND_Y: i32 = 160;
const SWATCH: u32 = 18;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([33, 33, 33, 255]);
const OUTLINE: Rgba<u8> = Rgba([200, 200, 200, 255]);

/// DejaVu Sans, used when no `CHART_FONT` is configured
static EMBEDDED_FONT: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");

pub fn embedded_font() -> ReportResult<FontRef<'static>> {
    FontRef::try_from_slice(EMBEDDED_FONT).map_err(|e| other_error(&format!("Embedded font is invalid: {}", e)))
}

/// Point at `distance` from the pie centre, `angle` radians clockwise from 12 o'clock
fn polar(angle: f64, distance: f64) -> (i32, i32) {
    (
        CENTER.0 + (distance * angle.sin()).round() as i32,
        CENTER.1 - (distance * angle.cos()).round() as i32,
    )
}

/// Paint the pie slices, clockwise from 12 o'clock in slice order
fn fill_slices(image: &mut RgbaImage, chart: &PieChart) {
    let mut boundaries = Vec::with_capacity(chart.slices.len());
    let mut cumulative = 0.0;
    for slice in &chart.slices {
        cumulative += slice.fraction;
        boundaries.push((cumulative, slice.color));
    }
    if cumulative <= 0.0 {
        return;
    }

    let radius_sq = (RADIUS as i64) * (RADIUS as i64);
    for dy in -RADIUS..=RADIUS {
        for dx in -RADIUS..=RADIUS {
            if (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64) > radius_sq {
                continue;
            }
            let angle = (dx as f64).atan2(-(dy as f64)).rem_euclid(TAU);
            let position = angle / TAU * cumulative;

            let color = boundaries
                .iter()
                .find(|(end, _)| position < *end)
                .or(boundaries.last())
                .map(|(_, color)| *color);

            if let Some(color) = color {
                let (x, y) = (CENTER.0 + dx, CENTER.1 + dy);
                if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
                    image.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

fn draw_legend_swatches(image: &mut RgbaImage, chart: &PieChart) {
    for (i, slice) in chart.slices.iter().enumerate() {
        let y = LEGEND_Y + i as i32 * (SWATCH as i32 + 12);
        draw_filled_rect_mut(image, Rect::at(LEGEND_X, y).of_size(SWATCH, SWATCH), slice.color);
    }
}

fn draw_labels(image: &mut RgbaImage, chart: &PieChart, font: &impl Font) {
    let title_scale = PxScale::from(32.0);
    let label_scale = PxScale::from(20.0);
    let legend_scale = PxScale::from(16.0);

    let (title_width, _) = text_size(title_scale, font, &chart.title);
    draw_text_mut(
        image,
        INK,
        (WIDTH as i32 - title_width as i32) / 2,
        40,
        title_scale,
        font,
        &chart.title,
    );

    if chart.slices.is_empty() {
        let message = "No events in range";
        let (width, height) = text_size(label_scale, font, message);
        draw_text_mut(
            image,
            INK,
            CENTER.0 - width as i32 / 2,
            CENTER.1 - height as i32 / 2,
            label_scale,
            font,
            message,
        );
        return;
    }

    let mut start = 0.0;
    for slice in &chart.slices {
        let end = start + slice.fraction;
        if slice.fraction > 0.0 {
            let middle = (start + end) / 2.0 * TAU;

            // Calendar name just outside the rim, on the side the slice faces
            let (width, height) = text_size(label_scale, font, &slice.label);
            let (x, y) = polar(middle, RADIUS as f64 * 1.1);
            let x = if middle.sin() < 0.0 { x - width as i32 } else { x };
            draw_text_mut(image, INK, x, y - height as i32 / 2, label_scale, font, &slice.label);

            // Percentage inside the slice
            let percent = slice.percent_label();
            let (width, height) = text_size(label_scale, font, &percent);
            let (x, y) = polar(middle, RADIUS as f64 * 0.6);
            draw_text_mut(
                image,
                INK,
                x - width as i32 / 2,
                y - height as i32 / 2,
                label_scale,
                font,
                &percent,
            );
        }
        start = end;
    }

    for (i, slice) in chart.slices.iter().enumerate() {
        let y = LEGEND_Y + i as i32 * (SWATCH as i32 + 12);
        let text = format!("{} ({:.1} h)", slice.label, slice.hours);
        draw_text_mut(
            image,
            INK,
            LEGEND_X + SWATCH as i32 + 8,
            y,
            legend_scale,
            font,
            &text,
        );
    }
}

/// Rasterize the chart, labelling it with `font` or the embedded font
pub fn rasterize(chart: &PieChart, font: Option<&FontVec>) -> ReportResult<RgbaImage> {
    let mut image = RgbaImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    fill_slices(&mut image, chart);
    draw_hollow_circle_mut(&mut image, CENTER, RADIUS, OUTLINE);
    draw_legend_swatches(&mut image, chart);

    match font {
        Some(font) => draw_labels(&mut image, chart, font),
        None => draw_labels(&mut image, chart, &embedded_font()?),
    }

    Ok(image)
}
