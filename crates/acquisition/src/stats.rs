use std::fmt;

use serde::Serialize;

use crate::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation, absent below two values
    pub stddev: Option<f64>,
}

impl SummaryStats {
    /// `None` when the series has no non-null value
    pub fn from_series(series: &TimeSeries) -> Option<Self> {
        let values: Vec<f64> = series.values().collect();
        Self::from_values(&values)
    }

    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / count as f64;
        let stddev = (count > 1).then(|| {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (count - 1) as f64;
            variance.sqrt()
        });
        Some(Self {
            count,
            min,
            max,
            mean,
            stddev,
        })
    }
}

/// Linear-interpolated quantile of `values`, `q` in `[0, 1]`
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Sky condition derived from mean downward shortwave radiation (W/m²)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cloudiness {
    VeryCloudy,
    Cloudy,
    PartlyCloudy,
    Clear,
}

impl Cloudiness {
    pub fn from_mean_radiation(mean: f64) -> Self {
        if mean < 150.0 {
            Cloudiness::VeryCloudy
        } else if mean < 250.0 {
            Cloudiness::Cloudy
        } else if mean < 350.0 {
            Cloudiness::PartlyCloudy
        } else {
            Cloudiness::Clear
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Cloudiness::VeryCloudy => "very cloudy",
            Cloudiness::Cloudy => "cloudy",
            Cloudiness::PartlyCloudy => "partly cloudy",
            Cloudiness::Clear => "clear",
        }
    }
}

impl fmt::Display for Cloudiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudinessReport {
    pub mean_radiation: f64,
    pub bucket: Cloudiness,
    /// Readings above the 75th percentile
    pub sunny_count: usize,
    /// Readings below the 25th percentile
    pub cloudy_count: usize,
    pub sunny_pct: f64,
    pub cloudy_pct: f64,
}

impl CloudinessReport {
    /// Percentages are taken over the whole series, nulls included
    pub fn from_series(series: &TimeSeries) -> Option<Self> {
        let values: Vec<f64> = series.values().collect();
        let stats = SummaryStats::from_values(&values)?;
        let q75 = quantile(&values, 0.75)?;
        let q25 = quantile(&values, 0.25)?;

        let sunny_count = values.iter().filter(|v| **v > q75).count();
        let cloudy_count = values.iter().filter(|v| **v < q25).count();
        let total = series.len() as f64;

        Some(Self {
            mean_radiation: stats.mean,
            bucket: Cloudiness::from_mean_radiation(stats.mean),
            sunny_count,
            cloudy_count,
            sunny_pct: sunny_count as f64 / total * 100.0,
            cloudy_pct: cloudy_count as f64 / total * 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn series(values: &[Option<f64>]) -> TimeSeries {
        let start = datetime!(2024-04-10 00:00 UTC);
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + time::Duration::hours(3 * i as i64), *v))
            .collect()
    }

    #[test]
    fn summary_over_non_null_values() {
        let stats = SummaryStats::from_series(&series(&[Some(2.0), None, Some(4.0), Some(6.0)]))
            .unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.stddev, Some(2.0));
    }

    #[test]
    fn single_value_has_no_stddev() {
        let stats = SummaryStats::from_values(&[5.0]).unwrap();
        assert_eq!(stats.stddev, None);
        assert!(SummaryStats::from_series(&series(&[None, None])).is_none());
    }

    #[test]
    fn quantiles_interpolate() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.75), Some(3.25));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn cloudiness_buckets_use_strict_thresholds() {
        let cases = [
            (100.0, "very cloudy"),
            (200.0, "cloudy"),
            (300.0, "partly cloudy"),
            (400.0, "clear"),
            (150.0, "cloudy"),
            (250.0, "partly cloudy"),
            (350.0, "clear"),
        ];
        for (mean, label) in cases {
            assert_eq!(Cloudiness::from_mean_radiation(mean).label(), label, "{mean}");
        }
    }

    #[test]
    fn sunny_and_cloudy_counts() {
        let report = CloudinessReport::from_series(&series(&[
            Some(0.0),
            Some(100.0),
            Some(200.0),
            Some(300.0),
            Some(400.0),
            None,
        ]))
        .unwrap();
        assert_eq!(report.mean_radiation, 200.0);
        assert_eq!(report.bucket, Cloudiness::Cloudy);
        assert_eq!(report.sunny_count, 1);
        assert_eq!(report.cloudy_count, 1);
        assert!((report.sunny_pct - 100.0 / 6.0).abs() < 1e-9);
    }
}
