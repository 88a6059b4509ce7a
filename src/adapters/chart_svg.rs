//! SVG chart rendering for run reports.
//!
//! Plain string generation. Every generator returns an empty string when
//! there is nothing to draw.

use crate::domain::model::evaluation::CLASS_LABELS;
use crate::domain::table::RowKey;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 40.0;
const MARGIN_LEFT: f64 = 80.0;

const TOP_FEATURES: usize = 10;
const BAR_HEIGHT: f64 = 22.0;
const CELL_SIZE: f64 = 120.0;

fn svg_open(width: f64, height: f64) -> String {
    format!(
        "<svg width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" xmlns=\"http://www.w3.org/2000/svg\">\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n",
        width, height, width, height
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Cumulative PnL line over the row keys of the series.
pub fn generate_pnl_svg(keys: &[RowKey], cumulative: &[f64]) -> String {
    if cumulative.is_empty() || keys.len() != cumulative.len() {
        return String::new();
    }

    let min = cumulative.iter().copied().fold(0.0_f64, f64::min);
    let max = cumulative.iter().copied().fold(0.0_f64, f64::max);
    let range = (max - min).max(1.0);

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let x_scale = |i: usize| -> f64 {
        MARGIN_LEFT + (i as f64 / (cumulative.len() - 1).max(1) as f64) * plot_width
    };
    let y_scale = |v: f64| -> f64 { MARGIN_TOP + plot_height - ((v - min) / range) * plot_height };

    let mut path_data = String::new();
    for (i, &value) in cumulative.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        path_data.push_str(&format!("{} {:.1} {:.1}", cmd, x_scale(i), y_scale(value)));
    }

    let mut svg = svg_open(CHART_WIDTH, CHART_HEIGHT);
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" text-anchor=\"middle\" font-size=\"14\">Trading Performance</text>\n",
        CHART_WIDTH / 2.0
    ));
    // zero line
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"#ccc\" stroke-width=\"1\" stroke-dasharray=\"4\"/>\n",
        MARGIN_LEFT,
        y_scale(0.0),
        CHART_WIDTH - MARGIN_RIGHT,
        y_scale(0.0)
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
        MARGIN_LEFT - 5.0,
        MARGIN_TOP + 5.0,
        max
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
        MARGIN_LEFT - 5.0,
        CHART_HEIGHT - MARGIN_BOTTOM,
        min
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM + 15.0,
        keys[0]
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM + 15.0,
        keys[keys.len() - 1]
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\">Cumulative PnL</text>\n",
        MARGIN_LEFT + plot_width / 2.0,
        CHART_HEIGHT - 5.0
    ));
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"#2563eb\" stroke-width=\"1.5\"/>\n",
        path_data
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Horizontal bars for the ten most important features, largest on top.
pub fn generate_feature_importance_svg(names: &[String], importances: &[f64]) -> String {
    if names.is_empty() || names.len() != importances.len() {
        return String::new();
    }

    let mut ranked: Vec<(&str, f64)> = names
        .iter()
        .map(String::as_str)
        .zip(importances.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(TOP_FEATURES);

    let label_width = 140.0;
    let plot_width = CHART_WIDTH - label_width - MARGIN_RIGHT - 50.0;
    let height = MARGIN_TOP + ranked.len() as f64 * BAR_HEIGHT + MARGIN_BOTTOM;
    let max = ranked.first().map_or(0.0, |r| r.1).max(f64::EPSILON);

    let mut svg = svg_open(CHART_WIDTH, height);
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" text-anchor=\"middle\" font-size=\"14\">Top {} Feature Importance</text>\n",
        CHART_WIDTH / 2.0,
        ranked.len()
    ));
    for (i, (name, value)) in ranked.iter().enumerate() {
        let y = MARGIN_TOP + i as f64 * BAR_HEIGHT;
        let bar = (value / max) * plot_width;
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\">{}</text>\n",
            label_width - 5.0,
            y + BAR_HEIGHT * 0.65,
            escape(name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#2563eb\"/>\n",
            label_width,
            y + 2.0,
            bar,
            BAR_HEIGHT - 4.0
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"#666\">{:.4}</text>\n",
            label_width + bar + 4.0,
            y + BAR_HEIGHT * 0.65,
            value
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

/// 2x2 heatmap, rows are actual classes and columns predicted classes.
pub fn generate_confusion_svg(confusion: &[[usize; 2]; 2]) -> String {
    let max = confusion.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;
    let width = MARGIN_LEFT + 2.0 * CELL_SIZE + MARGIN_RIGHT;
    let height = MARGIN_TOP + 2.0 * CELL_SIZE + MARGIN_BOTTOM;

    let mut svg = svg_open(width, height);
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" text-anchor=\"middle\" font-size=\"14\">Confusion Matrix</text>\n",
        width / 2.0
    ));
    for (actual, row) in confusion.iter().enumerate() {
        for (predicted, &count) in row.iter().enumerate() {
            let x = MARGIN_LEFT + predicted as f64 * CELL_SIZE;
            let y = MARGIN_TOP + actual as f64 * CELL_SIZE;
            // lightness 95% (empty) down to 35% (largest cell)
            let lightness = 95.0 - 60.0 * (count as f64 / max);
            let text_fill = if lightness < 60.0 { "white" } else { "black" };
            svg.push_str(&format!(
                "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"hsl(217, 80%, {:.0}%)\" stroke=\"white\"/>\n",
                x, y, CELL_SIZE, CELL_SIZE, lightness
            ));
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"16\" fill=\"{}\">{}</text>\n",
                x + CELL_SIZE / 2.0,
                y + CELL_SIZE / 2.0 + 5.0,
                text_fill,
                count
            ));
        }
    }
    for (i, label) in CLASS_LABELS.iter().enumerate() {
        let offset = i as f64 * CELL_SIZE + CELL_SIZE / 2.0;
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"11\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            MARGIN_TOP + offset,
            label
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\">{}</text>\n",
            MARGIN_LEFT + offset,
            MARGIN_TOP + 2.0 * CELL_SIZE + 15.0,
            label
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\" fill=\"#666\">Predicted</text>\n",
        MARGIN_LEFT + CELL_SIZE,
        height - 5.0
    ));
    svg.push_str("</svg>\n");
    svg
}
