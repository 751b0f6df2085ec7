//! Onset trimming, time rebasing and truncation.
//!
//! Truncation is index based: the balance logs one sample per second, so the
//! first `max_duration_s` samples after the onset cover the experiment.

use crate::domain::AlignedSeries;

/// Drop the samples before `start_time_s` and rebase time so the onset is 0.
pub fn trim_onset(time: &[f64], weight: &[f64], start_time_s: usize) -> AlignedSeries {
    let n = time.len().min(weight.len());
    let start = start_time_s.min(n);
    let offset = start_time_s as f64;

    AlignedSeries {
        time: time[start..n].iter().map(|t| t - offset).collect(),
        weight: weight[start..n].to_vec(),
    }
}

/// Keep only the first `max_duration_s` samples.
pub fn truncate(series: &AlignedSeries, max_duration_s: usize) -> AlignedSeries {
    let n = series.len().min(max_duration_s);
    AlignedSeries {
        time: series.time[..n].to_vec(),
        weight: series.weight[..n].to_vec(),
    }
}

/// Trim the onset, rebase time and truncate to the experiment duration.
pub fn align(time: &[f64], weight: &[f64], start_time_s: usize, max_duration_s: usize) -> AlignedSeries {
    truncate(&trim_onset(time, weight, start_time_s), max_duration_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let w: Vec<f64> = (0..n).map(|i| 10.0 - i as f64 * 0.01).collect();
        (t, w)
    }

    #[test]
    fn align_drops_onset_and_rebases_time() {
        let (t, w) = ramp(100);
        let a = align(&t, &w, 30, 1000);
        assert_eq!(a.len(), 70);
        assert_eq!(a.time[0], 0.0);
        assert_eq!(a.time[69], 69.0);
        assert_eq!(a.weight[0], w[30]);
    }

    #[test]
    fn truncation_is_by_index() {
        // Irregular time stamps: truncation still keeps exactly N samples.
        let t = vec![0.0, 0.5, 3.0, 3.1, 10.0, 11.0];
        let w = vec![1.0; 6];
        let a = align(&t, &w, 1, 3);
        assert_eq!(a.time, vec![-0.5, 2.0, 2.1]);
    }

    #[test]
    fn onset_past_end_yields_empty_series() {
        let (t, w) = ramp(10);
        assert!(align(&t, &w, 10, 100).is_empty());
        assert!(align(&t, &w, 50, 100).is_empty());
    }

    #[test]
    fn realigning_with_zero_offset_is_identity() {
        let (t, w) = ramp(500);
        let once = align(&t, &w, 120, 300);
        let twice = align(&once.time, &once.weight, 0, 300);
        assert_eq!(once, twice);

        // A longer duration than the series also leaves it untouched.
        let thrice = align(&once.time, &once.weight, 0, 10_000);
        assert_eq!(once, thrice);
    }
}
