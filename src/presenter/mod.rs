// Presentation surface shared by both front-ends.

pub mod render;
pub mod terminal;

use crate::analyzer::Histogram;
use chrono::NaiveDate;
use std::io;

pub use terminal::TerminalPresenter;

/// Where analysis results end up: a text area and a chart window.
pub trait Presenter {
    fn display_text(&mut self, text: &str) -> io::Result<()>;

    /// Returns once the chart has been shown and dismissed.
    fn display_chart(&mut self, chart: &Chart) -> io::Result<()>;
}

/// A dated line; `None` values are gaps (e.g. before a moving-average window fills).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl Series {
    pub fn new(label: &str, dates: &[NaiveDate], values: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            points: dates.iter().copied().zip(values.iter().copied().map(Some)).collect(),
        }
    }

    pub fn with_gaps(label: &str, dates: &[NaiveDate], values: &[Option<f64>]) -> Self {
        Self {
            label: label.to_string(),
            points: dates.iter().copied().zip(values.iter().copied()).collect(),
        }
    }

    pub fn defined(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().filter_map(|(d, v)| v.map(|v| (*d, v)))
    }
}

/// Labelled vertical line across a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub label: String,
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartBody {
    Lines(Vec<Series>),
    Histogram {
        histogram: Histogram,
        markers: Vec<Marker>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub body: ChartBody,
    /// Extra lines printed under the plot.
    pub notes: Vec<String>,
}

impl Chart {
    pub fn lines(title: String, x_label: &str, y_label: &str, series: Vec<Series>) -> Self {
        Self {
            title,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            body: ChartBody::Lines(series),
            notes: Vec::new(),
        }
    }

    pub fn histogram(
        title: String,
        x_label: &str,
        y_label: &str,
        histogram: Histogram,
        markers: Vec<Marker>,
    ) -> Self {
        Self {
            title,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            body: ChartBody::Histogram { histogram, markers },
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

/// Keeps everything it is shown, for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub texts: Vec<String>,
    pub charts: Vec<Chart>,
}

#[cfg(test)]
impl Presenter for RecordingPresenter {
    fn display_text(&mut self, text: &str) -> io::Result<()> {
        self.texts.push(text.to_string());
        Ok(())
    }

    fn display_chart(&mut self, chart: &Chart) -> io::Result<()> {
        self.charts.push(chart.clone());
        Ok(())
    }
}
