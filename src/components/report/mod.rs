pub mod aggregate;
pub mod chart;
pub mod draw;

pub use aggregate::{aggregate, event_hours, TimeSpent};
pub use chart::{render, PieChart, PieSlice};

use crate::error::{config_error, ReportResult};
use ab_glyph::FontVec;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Writes rendered charts into the reports directory
pub struct Reporter {
    reports_dir: PathBuf,
    font: Option<FontVec>,
}

impl Reporter {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            font: None,
        }
    }

    /// Replace the embedded font used for titles and labels
    pub fn with_font_file(mut self, path: &Path) -> ReportResult<Self> {
        let bytes = fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| config_error(&format!("Invalid font {}: {}", path.display(), e)))?;
        self.font = Some(font);
        Ok(self)
    }

    /// Save the chart as `<reports_dir>/<title>.png` and return the path
    pub fn publish(&self, chart: &PieChart) -> ReportResult<PathBuf> {
        fs::create_dir_all(&self.reports_dir)?;
        let path = self.reports_dir.join(chart.file_name());

        let image = draw::rasterize(chart, self.font.as_ref())?;
        image.save(&path)?;

        info!("Saved chart with {} slices to {}", chart.slices.len(), path.display());
        Ok(path)
    }
}

/// Open a saved chart in the system viewer
pub fn show(path: &Path) {
    if let Err(e) = webbrowser::open(&path.to_string_lossy()) {
        warn!("Could not open {}: {}", path.display(), e);
    }
}
