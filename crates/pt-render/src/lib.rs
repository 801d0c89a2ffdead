#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use pt_pivot::LabeledMatrix;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Two-stop linear color ramp; cell intensity is value / page maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRamp {
    /// White to dark green (count heatmaps).
    Greens,
    /// Pale yellow to dark blue (presence/absence heatmaps).
    YellowBlue,
}

impl ColorRamp {
    fn stops(self) -> ([u8; 3], [u8; 3]) {
        match self {
            Self::Greens => ([247, 252, 245], [0, 68, 27]),
            Self::YellowBlue => ([255, 255, 217], [8, 29, 88]),
        }
    }

    fn color(self, intensity: f64) -> String {
        let (low, high) = self.stops();
        let t = intensity.clamp(0.0, 1.0);
        let channel = |idx: usize| {
            (f64::from(low[idx]) + (f64::from(high[idx]) - f64::from(low[idx])) * t).round() as u8
        };
        format!("rgb({},{},{})", channel(0), channel(1), channel(2))
    }
}

/// One page of the output document.
#[derive(Debug, Clone, PartialEq)]
pub enum FigurePage {
    /// Heatmap with an optional per-column totals bar panel above it.
    Heatmap {
        title: String,
        matrix: LabeledMatrix,
        ramp: ColorRamp,
        bar: Option<Vec<f64>>,
    },
    /// Standalone labeled bar plot.
    Bars {
        title: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
}

const PAGE_WIDTH: f64 = 1200.0;
const MARGIN: f64 = 60.0;
const TITLE_HEIGHT: f64 = 40.0;
const BAR_PANEL_HEIGHT: f64 = 140.0;
const HEATMAP_HEIGHT: f64 = 560.0;
const LABEL_GUTTER: f64 = 160.0;

fn page_height(page: &FigurePage) -> f64 {
    match page {
        FigurePage::Heatmap { bar, .. } => {
            TITLE_HEIGHT
                + bar.as_ref().map_or(0.0, |_| BAR_PANEL_HEIGHT)
                + HEATMAP_HEIGHT
                + MARGIN
        }
        FigurePage::Bars { .. } => TITLE_HEIGHT + BAR_PANEL_HEIGHT * 2.0 + MARGIN,
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render all pages into one SVG document, stacked vertically.
#[must_use]
pub fn render_document(pages: &[FigurePage]) -> String {
    let total_height: f64 = pages.iter().map(page_height).sum::<f64>() + MARGIN;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{PAGE_WIDTH}\" \
         height=\"{total_height}\" font-family=\"sans-serif\">\n"
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    let mut y = MARGIN / 2.0;
    for page in pages {
        match page {
            FigurePage::Heatmap {
                title,
                matrix,
                ramp,
                bar,
            } => render_heatmap(&mut svg, &mut y, title, matrix, *ramp, bar.as_deref()),
            FigurePage::Bars {
                title,
                labels,
                values,
            } => render_bars(&mut svg, &mut y, title, labels, values),
        }
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn write_document(path: impl AsRef<Path>, pages: &[FigurePage]) -> Result<(), RenderError> {
    let mut file = File::create(path)?;
    file.write_all(render_document(pages).as_bytes())?;
    Ok(())
}

fn render_heatmap(
    svg: &mut String,
    y: &mut f64,
    title: &str,
    matrix: &LabeledMatrix,
    ramp: ColorRamp,
    bar: Option<&[f64]>,
) {
    svg.push_str(&format!(
        "<text x=\"{MARGIN}\" y=\"{}\" font-size=\"20\">{}</text>\n",
        *y + 24.0,
        escape(title)
    ));
    *y += TITLE_HEIGHT;

    let plot_width = PAGE_WIDTH - MARGIN - LABEL_GUTTER;
    let n_cols = matrix.n_cols().max(1);
    let cell_width = plot_width / n_cols as f64;

    if let Some(values) = bar {
        let max = values.iter().copied().fold(0.0, f64::max).max(1.0);
        let base = *y + BAR_PANEL_HEIGHT - 10.0;
        for (col, value) in values.iter().enumerate() {
            let height = value / max * (BAR_PANEL_HEIGHT - 20.0);
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" \
                 fill=\"grey\" stroke=\"black\" stroke-width=\"0.3\"/>\n",
                LABEL_GUTTER + col as f64 * cell_width,
                base - height,
                (cell_width - 1.0).max(0.5),
                height
            ));
        }
        *y += BAR_PANEL_HEIGHT;
    }

    let n_rows = matrix.n_rows().max(1);
    let cell_height = HEATMAP_HEIGHT / n_rows as f64;
    let max = matrix.max_value().max(f64::MIN_POSITIVE);

    for row in 0..matrix.n_rows() {
        for col in 0..matrix.n_cols() {
            let color = ramp.color(matrix.get(row, col) / max);
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{color}\"/>\n",
                LABEL_GUTTER + col as f64 * cell_width,
                *y + row as f64 * cell_height,
                cell_width,
                cell_height
            ));
        }
    }

    // Row labels only; column axes get crowded past a few dozen genes,
    // matching the label-free x axis of the source figures.
    let label_size = (cell_height - 2.0).clamp(4.0, 12.0);
    for (row, label) in matrix.row_labels().iter().enumerate() {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{label_size:.1}\" text-anchor=\"end\">{}</text>\n",
            LABEL_GUTTER - 6.0,
            *y + row as f64 * cell_height + cell_height / 2.0 + label_size / 3.0,
            escape(label)
        ));
    }

    *y += HEATMAP_HEIGHT + MARGIN;
}

fn render_bars(svg: &mut String, y: &mut f64, title: &str, labels: &[String], values: &[f64]) {
    svg.push_str(&format!(
        "<text x=\"{MARGIN}\" y=\"{}\" font-size=\"20\">{}</text>\n",
        *y + 24.0,
        escape(title)
    ));
    *y += TITLE_HEIGHT;

    let plot_width = PAGE_WIDTH - 2.0 * MARGIN;
    let n = values.len().max(1);
    let slot = plot_width / n as f64;
    let max = values.iter().copied().fold(0.0, f64::max).max(1.0);
    let panel = BAR_PANEL_HEIGHT * 2.0;
    let base = *y + panel - 30.0;

    for (idx, value) in values.iter().enumerate() {
        let height = value / max * (panel - 60.0);
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" \
             fill=\"steelblue\" stroke=\"black\" stroke-width=\"0.3\"/>\n",
            MARGIN + idx as f64 * slot,
            base - height,
            (slot - 2.0).max(0.5),
            height
        ));
    }

    for (idx, label) in labels.iter().enumerate() {
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"9\" text-anchor=\"end\" \
             transform=\"rotate(-90 {:.2} {:.2})\">{}</text>\n",
            MARGIN + idx as f64 * slot + slot / 2.0,
            base + 12.0,
            MARGIN + idx as f64 * slot + slot / 2.0,
            base + 12.0,
            escape(label)
        ));
    }

    *y += panel + MARGIN;
}
