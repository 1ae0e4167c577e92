//! Monthly separation trend, forecast, and year-over-year comparison
//!
//! Unlike the KPI filter, the trend series counts class-1 separations of ANY
//! canonical type, so administrative exits still shape the time series.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::CanonicalRecord;

/// Fewest distinct months worth fitting a line through
pub const MIN_TREND_MONTHS: usize = 3;

/// Forecast horizon in months
const FORECAST_PERIODS: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Year-month label, `YYYY-MM`
    pub ym: String,
    pub bajas: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendStats {
    pub slope: f64,
    pub r2: f64,
    pub periods: usize,
    pub total_bajas: usize,
}

/// The fitted line evaluated at each historical month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitLine {
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ym: String,
    pub bajas: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub historical: Vec<TrendPoint>,
    pub fit: Option<FitLine>,
    pub forecasts: Vec<ForecastPoint>,
    pub stats: Option<TrendStats>,
    pub has_data: bool,
}

impl TrendAnalysis {
    fn insufficient() -> Self {
        Self {
            historical: Vec::new(),
            fit: None,
            forecasts: Vec::new(),
            stats: None,
            has_data: false,
        }
    }
}

/// One month of the year-over-year comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoYPoint {
    pub ym: String,
    pub bajas: usize,
    pub bajas_anio_previo: Option<usize>,
    /// (current/previous − 1) × 100; +∞ when previous is 0 and current is
    /// not; `None` when no prior-year month exists in the series
    pub variacion_pct: Option<f64>,
}

/// Ordinary least squares over x/y. Returns (slope, intercept, r²);
/// r² is 1 when total variance is 0.
pub fn linear_regression(x: &[f64], y: &[f64]) -> (f64, f64, f64) {
    let n = x.len();
    if n < 2 {
        return (0.0, y.first().copied().unwrap_or(0.0), 0.0);
    }
    let nf = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for i in 0..n {
        sum_x += x[i];
        sum_y += y[i];
        sum_xy += x[i] * y[i];
        sum_x2 += x[i] * x[i];
    }
    let m = (nf * sum_xy - sum_x * sum_y) / (nf * sum_x2 - sum_x * sum_x);
    let b = (sum_y - m * sum_x) / nf;

    let y_mean = sum_y / nf;
    let (mut ss_tot, mut ss_res) = (0.0, 0.0);
    for i in 0..n {
        ss_tot += (y[i] - y_mean).powi(2);
        ss_res += (y[i] - (m * x[i] + b)).powi(2);
    }
    let r2 = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };
    (m, b, r2)
}

fn next_ym(ym: &str) -> Option<String> {
    let (y, m) = ym.split_once('-')?;
    let mut year: i32 = y.parse().ok()?;
    let mut month: u32 = m.parse().ok()?;
    month += 1;
    if month > 12 {
        month = 1;
        year += 1;
    }
    Some(format!("{year}-{month:02}"))
}

/// Fit the monthly separation series and forecast the next two periods.
///
/// Months with no separations are simply absent from the series, not
/// zero-filled. Below [`MIN_TREND_MONTHS`] distinct months the analysis is
/// flagged `has_data = false` and carries no fit or forecasts.
pub fn analyze(bajas_all_types: &[CanonicalRecord]) -> TrendAnalysis {
    let mut monthly: BTreeMap<String, usize> = BTreeMap::new();
    for rec in bajas_all_types {
        if let Some(d) = rec.fecha_baja {
            let ym = format!("{}-{:02}", d.year(), d.month());
            *monthly.entry(ym).or_insert(0) += 1;
        }
    }

    if monthly.len() < MIN_TREND_MONTHS {
        debug!(months = monthly.len(), "Insufficient months for trend fit");
        return TrendAnalysis::insufficient();
    }

    let historical: Vec<TrendPoint> = monthly
        .into_iter()
        .map(|(ym, bajas)| TrendPoint { ym, bajas })
        .collect();
    let x: Vec<f64> = (0..historical.len()).map(|i| i as f64).collect();
    let y: Vec<f64> = historical.iter().map(|p| p.bajas as f64).collect();
    let (m, b, r2) = linear_regression(&x, &y);

    let fit = FitLine {
        x: historical.iter().map(|p| p.ym.clone()).collect(),
        y: x.iter().map(|xi| m * xi + b).collect(),
    };

    let mut forecasts = Vec::new();
    let mut label = historical.last().map(|p| p.ym.clone()).unwrap_or_default();
    for i in 0..FORECAST_PERIODS {
        let Some(next) = next_ym(&label) else { break };
        let index = (historical.len() as u32 + i) as f64;
        forecasts.push(ForecastPoint {
            ym: next.clone(),
            bajas: m * index + b,
        });
        label = next;
    }

    TrendAnalysis {
        stats: Some(TrendStats {
            slope: m,
            r2,
            periods: historical.len(),
            total_bajas: historical.iter().map(|p| p.bajas).sum(),
        }),
        historical,
        fit: Some(fit),
        forecasts,
        has_data: true,
    }
}

/// Compare every historical month against the same calendar month one year
/// earlier in the same series.
pub fn year_over_year(historical: &[TrendPoint]) -> Vec<YoYPoint> {
    let by_ym: HashMap<&str, usize> = historical
        .iter()
        .map(|p| (p.ym.as_str(), p.bajas))
        .collect();

    historical
        .iter()
        .map(|point| {
            let previous = point
                .ym
                .split_once('-')
                .and_then(|(y, m)| y.parse::<i32>().ok().map(|y| format!("{}-{}", y - 1, m)))
                .and_then(|prev| by_ym.get(prev.as_str()).copied());

            let variacion_pct = previous.map(|prev| {
                if prev > 0 {
                    (point.bajas as f64 / prev as f64 - 1.0) * 100.0
                } else if point.bajas > 0 {
                    f64::INFINITY
                } else {
                    0.0
                }
            });

            YoYPoint {
                ym: point.ym.clone(),
                bajas: point.bajas,
                bajas_anio_previo: previous,
                variacion_pct,
            }
        })
        .collect()
}
