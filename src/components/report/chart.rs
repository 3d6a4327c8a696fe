use super::aggregate::TimeSpent;
use crate::components::google_calendar::Calendar;
use crate::error::{Error, ReportResult};
use image::Rgba;
use std::collections::HashMap;
use tracing::warn;

/// Colours for calendars without a usable background colour
pub const FALLBACK_PALETTE: [[u8; 3]; 10] = [
    [0x1f, 0x77, 0xb4],
    [0xff, 0x7f, 0x0e],
    [0x2c, 0xa0, 0x2c],
    [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd],
    [0x8c, 0x56, 0x4b],
    [0xe3, 0x77, 0xc2],
    [0x7f, 0x7f, 0x7f],
    [0xbc, 0xbd, 0x22],
    [0x17, 0xbe, 0xcf],
];

/// Parse a `#rrggbb` or `#rgb` colour
pub fn parse_hex_color(color: &str) -> Option<Rgba<u8>> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        6 => Some(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ])),
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                rgb[i] = channel(&c.to_string())? * 17;
            }
            Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        _ => None,
    }
}

fn fallback_color(index: usize) -> Rgba<u8> {
    let [r, g, b] = FALLBACK_PALETTE[index % FALLBACK_PALETTE.len()];
    Rgba([r, g, b, 255])
}

/// One calendar's share of the chart
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub calendar_id: String,
    pub label: String,
    pub hours: f64,
    /// Share of the total, between 0 and 1
    pub fraction: f64,
    pub color: Rgba<u8>,
}

impl PieSlice {
    /// Percentage with one decimal place, e.g. `62.5%`
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.fraction * 100.0)
    }
}

/// Pie chart of time spent, slices sorted by label
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<PieSlice>,
}

impl PieChart {
    pub fn total_hours(&self) -> f64 {
        self.slices.iter().map(|slice| slice.hours).sum()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.slices.iter().map(|slice| slice.label.as_str()).collect()
    }

    /// Image file name for this chart
    pub fn file_name(&self) -> String {
        format!("{}.png", self.title.replace(['/', '\\'], "-"))
    }
}

/// Turn aggregated hours into a chart, resolving labels and colours from the calendar list
pub fn render(time_spent: &TimeSpent, calendars: &[Calendar], title: &str) -> ReportResult<PieChart> {
    let metadata: HashMap<&str, &Calendar> = calendars
        .iter()
        .map(|calendar| (calendar.id.as_str(), calendar))
        .collect();

    let mut entries = Vec::with_capacity(time_spent.len());
    for (calendar_id, hours) in time_spent.iter() {
        let calendar = metadata
            .get(calendar_id)
            .ok_or_else(|| Error::UnknownCalendar(calendar_id.to_string()))?;
        entries.push((*calendar, hours));
    }

    entries.sort_by(|(a, _), (b, _)| a.summary.cmp(&b.summary).then_with(|| a.id.cmp(&b.id)));

    let total = time_spent.total_hours();
    let slices = entries
        .into_iter()
        .enumerate()
        .map(|(index, (calendar, hours))| {
            let color = match &calendar.background_color {
                Some(hex) => parse_hex_color(hex).unwrap_or_else(|| {
                    warn!("Unusable colour '{}' for {}, using palette", hex, calendar.summary);
                    fallback_color(index)
                }),
                None => fallback_color(index),
            };
            PieSlice {
                calendar_id: calendar.id.clone(),
                label: calendar.summary.clone(),
                hours,
                fraction: if total > 0.0 { hours / total } else { 0.0 },
                color,
            }
        })
        .collect();

    Ok(PieChart {
        title: title.to_string(),
        slices,
    })
}
