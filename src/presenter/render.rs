// Character-grid rendering of charts for the terminal
use crate::analyzer::Histogram;
use crate::presenter::{Chart, ChartBody, Marker, Series};

const SERIES_GLYPHS: [char; 4] = ['*', '+', 'o', 'x'];
const BAR_GLYPH: char = '#';
const MARKER_GLYPH: char = '|';

struct Canvas {
    cells: Vec<Vec<char>>,
    width: usize,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
            width,
        }
    }

    /// `row` counts from the bottom edge.
    fn put(&mut self, col: usize, row: usize, glyph: char) {
        let height = self.cells.len();
        if col < self.width && row < height {
            self.cells[height - 1 - row][col] = glyph;
        }
    }

    fn height(&self) -> usize {
        self.cells.len()
    }
}

/// Axis extremes and captions drawn around a canvas.
struct Frame<'a> {
    y_top: String,
    y_bottom: String,
    x_left: String,
    x_right: String,
    x_label: &'a str,
    y_label: &'a str,
}

pub fn render_chart(chart: &Chart, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(4);

    let mut out = String::new();
    out.push_str(&centered(&chart.title, width + 2));
    out.push('\n');
    match &chart.body {
        ChartBody::Lines(series) => render_lines(&mut out, chart, series, width, height),
        ChartBody::Histogram { histogram, markers } => {
            render_histogram(&mut out, chart, histogram, markers, width, height)
        }
    }
    for note in &chart.notes {
        out.push_str(note);
        out.push('\n');
    }
    out
}

fn render_lines(out: &mut String, chart: &Chart, series: &[Series], width: usize, height: usize) {
    let points: Vec<_> = series.iter().flat_map(Series::defined).collect();
    let (Some(first), Some(last)) = (
        points.iter().map(|(d, _)| *d).min(),
        points.iter().map(|(d, _)| *d).max(),
    ) else {
        out.push_str("(no data)\n");
        return;
    };

    let span = (last - first).num_days().max(1) as f64;
    let (lo, hi) = widen(
        points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min),
        points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max),
    );

    let mut canvas = Canvas::new(width, height);
    for (i, s) in series.iter().enumerate() {
        let glyph = SERIES_GLYPHS[i % SERIES_GLYPHS.len()];
        for (date, value) in s.defined() {
            let col = scale((date - first).num_days() as f64 / span, width);
            let row = scale((value - lo) / (hi - lo), height);
            canvas.put(col, row, glyph);
        }
    }

    let frame = Frame {
        y_top: axis_label(hi),
        y_bottom: axis_label(lo),
        x_left: first.to_string(),
        x_right: last.to_string(),
        x_label: &chart.x_label,
        y_label: &chart.y_label,
    };
    draw(out, &canvas, &frame);

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", SERIES_GLYPHS[i % SERIES_GLYPHS.len()], s.label))
        .collect();
    out.push_str(&legend.join("   "));
    out.push('\n');
}

fn render_histogram(
    out: &mut String,
    chart: &Chart,
    histogram: &Histogram,
    markers: &[Marker],
    width: usize,
    height: usize,
) {
    if histogram.total() == 0 {
        out.push_str("(no data)\n");
        return;
    }

    let bins = histogram.bins();
    let col_width = (width / bins).max(1);
    let plot_width = bins * col_width;
    let max_count = histogram.counts.iter().copied().max().unwrap_or(0).max(1);

    let mut canvas = Canvas::new(plot_width, height);
    for (bin, &count) in histogram.counts.iter().enumerate() {
        let mut bar = (count as f64 / max_count as f64 * height as f64).round() as usize;
        if count > 0 {
            bar = bar.max(1);
        }
        for row in 0..bar {
            for k in 0..col_width {
                canvas.put(bin * col_width + k, row, BAR_GLYPH);
            }
        }
    }

    let (lo, hi) = histogram.range();
    let mut legend = Vec::new();
    for marker in markers {
        if (lo..=hi).contains(&marker.x) {
            let col = scale((marker.x - lo) / (hi - lo), plot_width);
            for row in 0..canvas.height() {
                canvas.put(col, row, MARKER_GLYPH);
            }
            legend.push(format!("{} {} ({:.4})", MARKER_GLYPH, marker.label, marker.x));
        } else {
            legend.push(format!("{} {} ({:.4}, off scale)", MARKER_GLYPH, marker.label, marker.x));
        }
    }

    let frame = Frame {
        y_top: max_count.to_string(),
        y_bottom: "0".to_string(),
        x_left: axis_label(lo),
        x_right: axis_label(hi),
        x_label: &chart.x_label,
        y_label: &chart.y_label,
    };
    draw(out, &canvas, &frame);

    if !legend.is_empty() {
        out.push_str(&legend.join("   "));
        out.push('\n');
    }
}

fn draw(out: &mut String, canvas: &Canvas, frame: &Frame<'_>) {
    let gutter = frame.y_top.len().max(frame.y_bottom.len());
    let last_row = canvas.height() - 1;

    out.push_str(frame.y_label);
    out.push('\n');
    for (i, row) in canvas.cells.iter().enumerate() {
        let label = match i {
            0 => frame.y_top.as_str(),
            i if i == last_row => frame.y_bottom.as_str(),
            _ => "",
        };
        let line: String = row.iter().collect();
        out.push_str(&format!("{label:>gutter$} |{}\n", line.trim_end()));
    }
    out.push_str(&format!("{:gutter$} +{}\n", "", "-".repeat(canvas.width)));

    let pad = canvas
        .width
        .saturating_sub(frame.x_left.len() + frame.x_right.len())
        .max(1);
    out.push_str(&format!(
        "{:gutter$}  {}{}{}\n",
        "",
        frame.x_left,
        " ".repeat(pad),
        frame.x_right
    ));
    out.push_str(&format!(
        "{:gutter$}  {}\n",
        "",
        centered(frame.x_label, canvas.width).trim_end()
    ));
}

/// Maps a 0..=1 fraction onto a cell index in `0..cells`.
fn scale(fraction: f64, cells: usize) -> usize {
    (fraction.clamp(0.0, 1.0) * (cells - 1) as f64).round() as usize
}

fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) }
}

fn axis_label(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1000.0 {
        format!("{value:.0}")
    } else if magnitude >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.4}")
    }
}

fn centered(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}
