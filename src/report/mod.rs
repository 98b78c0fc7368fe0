// Analysis operations, in the two flavours the front-ends present them.

pub mod form;
pub mod terminal;

/// `value` as a percentage with `decimals` places, e.g. 0.0051 -> "0.5100%".
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}
