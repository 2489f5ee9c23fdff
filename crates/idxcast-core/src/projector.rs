//! Compounded price path with a widening confidence band.

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::warn;

use crate::calendar_date;
use crate::stats::ReturnStatistics;

/// Band half-width as a fraction of price when volatility is zero.
pub const FALLBACK_BAND: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub forecasted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Project `horizon` daily points starting the day after `today`.
pub fn project_path(
    last_close: f64,
    stats: &ReturnStatistics,
    horizon: u32,
    today: Date,
) -> Vec<ProjectedPoint> {
    project_path_with_band(last_close, stats, horizon, today, FALLBACK_BAND)
}

/// Same as [`project_path`] with an explicit fallback band fraction.
///
/// Each step compounds the previous price by `1 + drift`. The band at step
/// `i` is `price * volatility * sqrt(i)`, or `price * fallback_band` when
/// volatility is zero.
///
/// The path holds fewer than `horizon` points in two cases: the calendar
/// passes 9999-12-31, the last date `time` represents, or the compounded
/// price or band stops being finite. Both are logged at `warn`.
pub fn project_path_with_band(
    last_close: f64,
    stats: &ReturnStatistics,
    horizon: u32,
    today: Date,
    fallback_band: f64,
) -> Vec<ProjectedPoint> {
    let mut points = Vec::with_capacity((horizon as usize).min(366));
    let mut price = last_close;
    let mut date = today;

    for step in 1..=horizon {
        let Some(next) = date.next_day() else {
            warn!(horizon, projected = points.len(), "forecast horizon runs past the calendar");
            break;
        };
        let next_price = price * (1.0 + stats.drift);

        let band = if stats.volatility > 0.0 {
            next_price * stats.volatility * f64::from(step).sqrt()
        } else {
            next_price * fallback_band
        }
        .abs();

        if !(next_price - band).is_finite() || !(next_price + band).is_finite() {
            warn!(horizon, projected = points.len(), "projected price overflowed");
            break;
        }
        date = next;
        price = next_price;

        points.push(ProjectedPoint {
            date,
            forecasted: price,
            lower_bound: price - band,
            upper_bound: price + band,
        });
    }

    points
}
