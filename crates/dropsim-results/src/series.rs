//! Acceleration time series and peak extraction.

use dropsim_types::constants::STANDARD_GRAVITY;
use serde::{Deserialize, Serialize};

/// Sampled acceleration magnitude of one sensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub sensor: String,
    /// Sample times (s).
    pub times: Vec<f64>,
    /// Acceleration magnitudes (m/s²).
    pub values: Vec<f64>,
}

/// Largest sample of a series, in units of standard gravity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakG {
    pub peak_g: f64,
    pub time: f64,
    pub index: usize,
}

impl TimeSeries {
    pub fn new(sensor: impl Into<String>) -> Self {
        Self {
            sensor: sensor.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, time: f64, value: f64) {
        self.times.push(time);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples in G.
    pub fn in_g(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times
            .iter()
            .zip(&self.values)
            .map(|(&t, &a)| (t, a / STANDARD_GRAVITY))
    }

    /// Peak G. The earliest sample wins ties. Non-finite samples are skipped.
    ///
    /// ```
    /// use dropsim_results::TimeSeries;
    ///
    /// let mut series = TimeSeries::new("product");
    /// series.push(0.001, 9.80665);
    /// series.push(0.002, 98.0665);
    /// series.push(0.003, 49.0);
    /// let peak = series.peak().unwrap();
    /// assert_eq!(peak.index, 1);
    /// assert!((peak.peak_g - 10.0).abs() < 1e-12);
    /// ```
    pub fn peak(&self) -> Option<PeakG> {
        let mut best: Option<PeakG> = None;
        for (index, (time, g)) in self.in_g().enumerate() {
            if !g.is_finite() {
                continue;
            }
            if best.map_or(true, |b| g > b.peak_g) {
                best = Some(PeakG {
                    peak_g: g,
                    time,
                    index,
                });
            }
        }
        best
    }
}
