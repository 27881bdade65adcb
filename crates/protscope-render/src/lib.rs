//! Headless chart rendering for protscope reports.
//!
//! Charts are built as SVG documents and either written as-is or rasterized
//! to PNG, depending on the output file extension.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use svg::Document;
use svg::node::element::{Line, Rectangle, Text};
use thiserror::Error;

pub const DEFAULT_CHART_TITLE: &str = "Top 10 most frequent paralogous proteins";
pub const DEFAULT_Y_LABEL: &str = "Copy number";
pub const DEFAULT_TOP_N: usize = 10;

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const MARGIN_LEFT: f32 = 80.0;
const MARGIN_RIGHT: f32 = 30.0;
const MARGIN_TOP: f32 = 60.0;
const MARGIN_BOTTOM: f32 = 160.0;
const Y_TICKS: usize = 5;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse generated SVG: {0}")]
    Svg(#[from] resvg::usvg::Error),
    #[error("could not rasterize chart: {0}")]
    Raster(String),
}

/// Output encoding of a chart, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Svg,
    Png,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartFormat::Svg,
            _ => ChartFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub title: String,
    pub y_label: String,
    pub top_n: usize,
    pub width: f32,
    pub height: f32,
    /// PNG pixels per SVG unit.
    pub raster_scale: f32,
    pub bar_color: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_CHART_TITLE.to_string(),
            y_label: DEFAULT_Y_LABEL.to_string(),
            top_n: DEFAULT_TOP_N,
            width: 1000.0,
            height: 600.0,
            raster_scale: 3.0,
            bar_color: "#1f77b4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    pub label: String,
    pub value: usize,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: usize) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

fn tick_step(max_value: usize) -> usize {
    max_value.div_ceil(Y_TICKS).max(1)
}

/// Renders the first `settings.top_n` bars, in the given order.
pub fn render_bar_chart_svg(bars: &[Bar], settings: &ChartSettings) -> String {
    let bars = &bars[..bars.len().min(settings.top_n)];
    let w = settings.width;
    let h = settings.height;
    let plot_left = MARGIN_LEFT;
    let plot_right = w - MARGIN_RIGHT;
    let plot_top = MARGIN_TOP;
    let plot_bottom = h - MARGIN_BOTTOM;
    let plot_h = plot_bottom - plot_top;

    let max_value = bars.iter().map(|b| b.value).max().unwrap_or(0);
    let step = tick_step(max_value);
    let y_max = (step * Y_TICKS).max(1) as f32;
    let value_to_y = |v: f32| plot_bottom - v / y_max * plot_h;

    let mut doc = Document::new()
        .set("viewBox", (0, 0, w, h))
        .set("width", w)
        .set("height", h)
        .set("style", "background:#ffffff");

    doc = doc.add(
        Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", w)
            .set("height", h)
            .set("fill", "#ffffff"),
    );

    doc = doc.add(
        Text::new(settings.title.clone())
            .set("x", w * 0.5)
            .set("y", MARGIN_TOP * 0.5)
            .set("text-anchor", "middle")
            .set("font-family", FONT_FAMILY)
            .set("font-size", 20)
            .set("fill", "#202020"),
    );

    for tick in 0..=Y_TICKS {
        let value = tick * step;
        let y = value_to_y(value as f32);
        doc = doc
            .add(
                Line::new()
                    .set("x1", plot_left)
                    .set("y1", y)
                    .set("x2", plot_right)
                    .set("y2", y)
                    .set("stroke", "#e6e6e6")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(value.to_string())
                    .set("x", plot_left - 8.0)
                    .set("y", y)
                    .set("text-anchor", "end")
                    .set("dominant-baseline", "middle")
                    .set("font-family", FONT_FAMILY)
                    .set("font-size", 12)
                    .set("fill", "#404040"),
            );
    }

    let slot = if bars.is_empty() {
        0.0
    } else {
        (plot_right - plot_left) / bars.len() as f32
    };
    for (idx, bar) in bars.iter().enumerate() {
        let x_center = plot_left + slot * (idx as f32 + 0.5);
        let bar_w = slot * 0.8;
        let y = value_to_y(bar.value as f32);
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", x_center - bar_w * 0.5)
                    .set("y", y)
                    .set("width", bar_w)
                    .set("height", plot_bottom - y)
                    .set("fill", settings.bar_color.as_str()),
            )
            .add(
                Text::new(bar.label.clone())
                    .set("x", x_center)
                    .set("y", plot_bottom + 14.0)
                    .set("text-anchor", "end")
                    .set(
                        "transform",
                        format!("rotate(-45 {x_center} {})", plot_bottom + 14.0),
                    )
                    .set("font-family", FONT_FAMILY)
                    .set("font-size", 12)
                    .set("fill", "#202020"),
            );
    }

    // axes
    doc = doc
        .add(
            Line::new()
                .set("x1", plot_left)
                .set("y1", plot_bottom)
                .set("x2", plot_right)
                .set("y2", plot_bottom)
                .set("stroke", "#202020")
                .set("stroke-width", 1.2),
        )
        .add(
            Line::new()
                .set("x1", plot_left)
                .set("y1", plot_top)
                .set("x2", plot_left)
                .set("y2", plot_bottom)
                .set("stroke", "#202020")
                .set("stroke-width", 1.2),
        );

    let y_label_x = 24.0;
    let y_label_y = plot_top + plot_h * 0.5;
    doc = doc.add(
        Text::new(settings.y_label.clone())
            .set("x", y_label_x)
            .set("y", y_label_y)
            .set("text-anchor", "middle")
            .set("transform", format!("rotate(-90 {y_label_x} {y_label_y})"))
            .set("font-family", FONT_FAMILY)
            .set("font-size", 14)
            .set("fill", "#202020"),
    );

    doc.to_string()
}

pub fn rasterize_png(svg_text: &str, scale: f32) -> Result<Vec<u8>, RenderError> {
    let mut options = resvg::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = resvg::usvg::Tree::from_str(svg_text, &options)?;
    let size = tree
        .size()
        .to_int_size()
        .scale_by(scale)
        .ok_or_else(|| RenderError::Raster(format!("invalid raster scale {scale}")))?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| RenderError::Raster("could not allocate pixmap".to_string()))?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Raster(e.to_string()))
}

/// Renders `bars` and writes the chart to `path`, creating parent directories.
pub fn write_bar_chart(
    path: &Path,
    bars: &[Bar],
    settings: &ChartSettings,
) -> Result<ChartFormat, RenderError> {
    let svg_text = render_bar_chart_svg(bars, settings);
    let format = ChartFormat::from_path(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RenderError::Io {
            action: "create chart directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let bytes = match format {
        ChartFormat::Svg => svg_text.into_bytes(),
        ChartFormat::Png => rasterize_png(&svg_text, settings.raster_scale)?,
    };
    fs::write(path, bytes).map_err(|source| RenderError::Io {
        action: "write chart",
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "Wrote {format:?} chart with {} bars to {}",
        bars.len().min(settings.top_n),
        path.display()
    );
    Ok(format)
}
