//! Drift and volatility from trailing simple returns.

use serde::Serialize;

/// Returns required before drift and volatility are estimated.
pub const MIN_RETURNS: usize = 5;

/// Trailing window of returns used for the estimate.
pub const RETURN_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnStatistics {
    /// Mean simple return per step.
    pub drift: f64,
    /// Sample standard deviation of the same returns. Never negative.
    pub volatility: f64,
}

impl ReturnStatistics {
    pub const ZERO: Self = Self {
        drift: 0.0,
        volatility: 0.0,
    };

    /// Estimate with the default minimum and window.
    pub fn estimate(closes: &[f64]) -> Self {
        Self::estimate_with(closes, MIN_RETURNS, RETURN_WINDOW)
    }

    /// Mean and sample standard deviation of the last `window` returns, or
    /// zero when fewer than `min_returns` returns exist.
    pub fn estimate_with(closes: &[f64], min_returns: usize, window: usize) -> Self {
        let returns = simple_returns(closes);
        if returns.is_empty() || returns.len() < min_returns || window == 0 {
            return Self::ZERO;
        }

        let trailing = &returns[returns.len().saturating_sub(window)..];
        let count = trailing.len() as f64;
        let drift = trailing.iter().sum::<f64>() / count;

        // n - 1 denominator; a single return has no spread.
        let volatility = if trailing.len() < 2 {
            0.0
        } else {
            let sum_sq = trailing
                .iter()
                .map(|value| (value - drift).powi(2))
                .sum::<f64>();
            (sum_sq / (count - 1.0)).sqrt()
        };

        Self { drift, volatility }
    }
}

/// Step-to-step simple returns. Steps from a zero close are dropped.
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .filter(|value| value.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn too_few_returns_give_zero() {
        let stats = ReturnStatistics::estimate(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        assert_eq!(stats, ReturnStatistics::ZERO);
        assert_eq!(ReturnStatistics::estimate(&[]), ReturnStatistics::ZERO);
        assert_eq!(ReturnStatistics::estimate(&[100.0]), ReturnStatistics::ZERO);
    }

    #[test]
    fn constant_growth_has_matching_drift_and_no_spread() {
        let closes = [100.0, 110.0, 121.0, 133.1, 146.41, 161.051];
        let stats = ReturnStatistics::estimate(&closes);
        assert!(approx(stats.drift, 0.1));
        assert!(stats.volatility < 1e-9);
    }

    #[test]
    fn uses_only_trailing_window() {
        let mut closes = vec![100.0];
        // 10 large moves followed by 20 flat steps.
        for _ in 0..10 {
            let last = *closes.last().expect("non-empty");
            closes.push(last * 1.5);
        }
        for _ in 0..20 {
            let last = *closes.last().expect("non-empty");
            closes.push(last);
        }

        let stats = ReturnStatistics::estimate(&closes);
        assert_eq!(stats, ReturnStatistics { drift: 0.0, volatility: 0.0 });
    }

    #[test]
    fn volatility_is_sample_standard_deviation() {
        // returns: +10%, -10%, +10%, -10%, +10%
        let closes = [100.0, 110.0, 99.0, 108.9, 98.01, 107.811];
        let stats = ReturnStatistics::estimate(&closes);

        let mean = 0.1 / 5.0;
        let expected = (((0.1f64 - mean).powi(2) * 3.0 + (-0.1f64 - mean).powi(2) * 2.0) / 4.0).sqrt();
        assert!(approx(stats.drift, mean));
        assert!(approx(stats.volatility, expected));
    }

    #[test]
    fn custom_minimum_admits_short_series() {
        let stats = ReturnStatistics::estimate_with(&[100.0, 110.0, 121.0], 2, RETURN_WINDOW);
        assert!(approx(stats.drift, 0.1));
    }

    #[test]
    fn zero_previous_close_is_dropped() {
        let returns = simple_returns(&[0.0, 10.0, 11.0]);
        assert_eq!(returns.len(), 1);
        assert!(approx(returns[0], 0.1));
    }
}
