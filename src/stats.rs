use serde::Serialize;

use crate::analyzers::utility::{mean, quantile, stddev};

/// Descriptive statistics over a set of delays, in days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelaySummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl DelaySummary {
    /// Returns `None` for an empty set; its statistics are undefined.
    pub fn from_delays(delays: &[i64]) -> Option<Self> {
        if delays.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = delays.iter().map(|&d| d as f64).collect();
        sorted.sort_by(f64::total_cmp);

        let avg = mean(&sorted);

        Some(DelaySummary {
            count: sorted.len(),
            mean: avg,
            std: stddev(&sorted, avg),
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// One equal-width histogram bin, `[lower, upper)` except the last which is
/// closed on both ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Spreads `delays` over `bins` equal-width bins between the minimum and
    /// maximum. A single distinct value yields one bin.
    pub fn from_delays(delays: &[i64], bins: usize) -> Self {
        let (Some(&min), Some(&max)) = (delays.iter().min(), delays.iter().max()) else {
            return Histogram { bins: Vec::new() };
        };

        let (min, max) = (min as f64, max as f64);
        if bins == 0 || min == max {
            return Histogram {
                bins: vec![HistogramBin {
                    lower: min,
                    upper: max,
                    count: delays.len(),
                }],
            };
        }

        let width = (max - min) / bins as f64;
        let mut out: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                lower: min + width * i as f64,
                upper: if i + 1 == bins {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for &d in delays {
            let slot = (((d as f64 - min) / width) as usize).min(bins - 1);
            out[slot].count += 1;
        }

        Histogram { bins: out }
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_empty() {
        assert_eq!(DelaySummary::from_delays(&[]), None);
    }

    #[test]
    fn test_summary_values() {
        let s = DelaySummary::from_delays(&[4, -2, 1, 3]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 1.5);
        assert_eq!(s.min, -2.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.median, 2.0);
        assert_eq!(s.q25, 0.25);
        assert_eq!(s.q75, 3.25);
    }

    #[test]
    fn test_histogram_counts_everything() {
        let delays = [-3, -1, 0, 0, 2, 5, 7, 7, 10];
        let h = Histogram::from_delays(&delays, 4);

        assert_eq!(h.bins.len(), 4);
        assert_eq!(h.total(), delays.len());
        assert_eq!(h.bins[0].lower, -3.0);
        assert_eq!(h.bins[3].upper, 10.0);
        // max lands in the closed last bin
        assert!(h.bins[3].count >= 1);
    }

    #[test]
    fn test_histogram_degenerate() {
        assert!(Histogram::from_delays(&[], 30).bins.is_empty());

        let h = Histogram::from_delays(&[2, 2, 2], 30);
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].count, 3);
    }
}
