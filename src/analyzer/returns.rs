use crate::model::AnalysisError;

/// Trading days per year used to annualize daily figures.
pub const TRADING_DAYS: i32 = 252;

/// Daily percentage change `p[i] / p[i-1] - 1`; the undefined first value is dropped.
pub fn pct_change(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

pub fn mean(values: &[f64]) -> Result<f64, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::InsufficientHistory {
            needed: 1,
            available: 0,
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with one degree of freedom removed.
pub fn sample_std(values: &[f64]) -> Result<f64, AnalysisError> {
    if values.len() < 2 {
        return Err(AnalysisError::InsufficientHistory {
            needed: 2,
            available: values.len(),
        });
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Ok(variance.sqrt())
}

/// `(1 + mean)^252 - 1`, regardless of how many days the sample spans.
pub fn annualized_return(mean_daily_return: f64) -> f64 {
    (1.0 + mean_daily_return).powi(TRADING_DAYS) - 1.0
}

pub fn annualized_volatility(daily_std: f64) -> f64 {
    daily_std * f64::from(TRADING_DAYS).sqrt()
}

/// Risk and return figures derived from a close-price series.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReturn {
    pub daily_returns: Vec<f64>,
    /// Sample standard deviation of the daily returns.
    pub volatility: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
}

impl RiskReturn {
    pub fn from_closes(closes: &[f64]) -> Result<Self, AnalysisError> {
        let daily_returns = pct_change(closes);
        let mean_daily_return = mean(&daily_returns)?;
        let volatility = sample_std(&daily_returns)?;
        Ok(Self {
            volatility,
            annualized_return: annualized_return(mean_daily_return),
            annualized_volatility: annualized_volatility(volatility),
            daily_returns,
        })
    }
}
