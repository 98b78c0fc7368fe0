use crate::config::ChartConfig;
use crate::presenter::render::render_chart;
use crate::presenter::{Chart, Presenter};
use std::io::{self, Write};

/// Writes text and character-rendered charts to a terminal (or any writer).
pub struct TerminalPresenter<W: Write> {
    out: W,
    chart: ChartConfig,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, chart: ChartConfig) -> Self {
        Self { out, chart }
    }

    /// Prompt text stays on the input line.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn display_text(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    fn display_chart(&mut self, chart: &Chart) -> io::Result<()> {
        let rendered = render_chart(chart, self.chart.width, self.chart.height);
        write!(self.out, "{rendered}")?;
        self.out.flush()
    }
}
