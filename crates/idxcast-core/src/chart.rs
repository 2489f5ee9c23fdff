//! Price chart artifact, serialized as a Plotly figure (`data` + `layout`).

use serde::Serialize;
use serde_json::{json, Value};

use crate::projector::ProjectedPoint;
use crate::{format_calendar_date, Observation};

pub const UP_COLOR: &str = "#00CD34";
pub const DOWN_COLOR: &str = "#FF0B0B";
pub const FORECAST_COLOR: &str = "#2587E2";
const BAND_FILL: &str = "rgba(37, 135, 226, 0.15)";
const BACKGROUND: &str = "#252B31";
const FOREGROUND: &str = "#C9D1D9";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChart {
    pub data: Vec<Trace>,
    pub layout: Value,
}

/// One Plotly scatter trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub showlegend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub size: f64,
}

impl Trace {
    fn scatter(mode: &'static str, x: Vec<String>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter",
            x,
            y,
            mode,
            name: None,
            showlegend: false,
            line: None,
            marker: None,
            fill: None,
            fillcolor: None,
        }
    }

    fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self.showlegend = true;
        self
    }
}

impl PriceChart {
    /// Chart the given history (already trimmed to the display window) and
    /// forecast. Returns `None` without history.
    ///
    /// Each historical step is its own two-point segment, green when the
    /// close held or rose and red when it fell.
    pub fn build(history: &[Observation], forecast: &[ProjectedPoint]) -> Option<Self> {
        let last = history.last()?;
        let mut data = Vec::with_capacity(history.len() + 4);

        for (index, pair) in history.windows(2).enumerate() {
            let mut segment = Trace::scatter(
                "lines",
                vec![format_calendar_date(pair[0].date), format_calendar_date(pair[1].date)],
                vec![pair[0].close, pair[1].close],
            );
            segment.line = Some(LineStyle {
                color: step_color(pair[0].close, pair[1].close),
                width: 3.0,
            });
            if index == 0 {
                segment = segment.named("Historical");
            }
            data.push(segment);
        }

        let last_color = match history {
            [.., previous, current] => step_color(previous.close, current.close),
            _ => UP_COLOR,
        };
        let mut marker = Trace::scatter(
            "markers",
            vec![format_calendar_date(last.date)],
            vec![last.close],
        );
        marker.marker = Some(MarkerStyle {
            color: last_color,
            size: 9.0,
        });
        data.push(marker);

        if !forecast.is_empty() {
            let dates = forecast
                .iter()
                .map(|point| format_calendar_date(point.date))
                .collect::<Vec<_>>();

            let mut lower = Trace::scatter(
                "lines",
                dates.clone(),
                forecast.iter().map(|point| point.lower_bound).collect(),
            );
            lower.line = Some(LineStyle {
                color: BAND_FILL,
                width: 0.0,
            });

            let mut upper = Trace::scatter(
                "lines",
                dates.clone(),
                forecast.iter().map(|point| point.upper_bound).collect(),
            )
            .named("Confidence band");
            upper.line = Some(LineStyle {
                color: BAND_FILL,
                width: 0.0,
            });
            upper.fill = Some("tonexty");
            upper.fillcolor = Some(BAND_FILL);

            let forecasted = forecast.iter().map(|point| point.forecasted).collect::<Vec<_>>();
            let mut path = Trace::scatter("lines", dates.clone(), forecasted.clone()).named("Forecast");
            path.line = Some(LineStyle {
                color: FORECAST_COLOR,
                width: 4.0,
            });

            let mut points = Trace::scatter("markers", dates, forecasted);
            points.marker = Some(MarkerStyle {
                color: FORECAST_COLOR,
                size: 7.0,
            });

            data.extend([lower, upper, path, points]);
        }

        Some(Self {
            data,
            layout: layout(),
        })
    }
}

fn step_color(previous: f64, current: f64) -> &'static str {
    if current >= previous {
        UP_COLOR
    } else {
        DOWN_COLOR
    }
}

fn layout() -> Value {
    json!({
        "height": 360,
        "margin": {"l": 10, "r": 10, "t": 35, "b": 10},
        "paper_bgcolor": BACKGROUND,
        "plot_bgcolor": BACKGROUND,
        "font": {"color": FOREGROUND, "size": 12},
        "xaxis": {
            "showgrid": false,
            "zeroline": false,
            "tickfont": {"color": FOREGROUND},
            "rangeslider": {"visible": false}
        },
        "yaxis": {
            "showgrid": true,
            "gridcolor": "#6F6F6F",
            "zeroline": false,
            "tickfont": {"color": FOREGROUND}
        },
        "legend": {
            "orientation": "h",
            "yanchor": "bottom",
            "y": 1.05,
            "xanchor": "left",
            "x": 0,
            "font": {"color": "white", "size": 14}
        }
    })
}
