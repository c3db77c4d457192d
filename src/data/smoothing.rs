use std::collections::VecDeque;

use crate::data::domain::SmoothingWindow;

/// Trailing simple moving average with `min_periods = 1`.
///
/// Missing observations occupy a slot in the window but are left out of the
/// divisor. A window holding only missing observations yields `None`.
#[derive(Debug, Clone)]
pub struct TrailingMean {
    window_size: usize,
    buffer: VecDeque<Option<f64>>,
}

impl TrailingMean {
    pub fn new(window: SmoothingWindow) -> Self {
        let size = window.size();
        Self {
            window_size: size,
            buffer: VecDeque::with_capacity(size),
        }
    }

    /// Pushes the next observation and returns the mean of the current window.
    pub fn update(&mut self, value: Option<f64>) -> Option<f64> {
        self.buffer.push_back(value.filter(|v| !v.is_nan()));
        if self.buffer.len() > self.window_size {
            self.buffer.pop_front();
        }

        // Recomputed per step so a window of one returns its input exactly.
        let (sum, count) = self
            .buffer
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

        (count > 0).then(|| sum / count as f64)
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Smooths an ordered series with a [`TrailingMean`].
///
/// The output always has the same length as `values`.
pub fn smooth(values: &[Option<f64>], window: SmoothingWindow) -> Vec<Option<f64>> {
    let mut mean = TrailingMean::new(window);
    values.iter().map(|v| mean.update(*v)).collect()
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn assert_close(actual: &[Option<f64>], expected: &[Option<f64>]) {
        assert_eq!(actual.len(), expected.len(), "Length mismatch");
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            match (a, e) {
                (Some(a), Some(e)) => assert!(
                    (a - e).abs() < 1e-9,
                    "Mismatch at {i}: expected {e}, got {a}"
                ),
                (None, None) => {}
                _ => panic!("Mismatch at {i}: expected {e:?}, got {a:?}"),
            }
        }
    }

    #[test]
    fn test_output_length_matches_input() {
        let values = (0..45).map(|i| Some(i as f64)).collect::<Vec<_>>();
        for window in SmoothingWindow::iter() {
            assert_eq!(smooth(&values, window).len(), values.len());
            assert_eq!(smooth(&values[..3], window).len(), 3);
        }
        assert!(smooth(&[], SmoothingWindow::Seven).is_empty());
    }

    #[test]
    fn test_window_one_is_identity() {
        let values = vec![Some(0.1), None, Some(-3.7), Some(1e12), None, Some(0.3)];
        assert_eq!(smooth(&values, SmoothingWindow::One), values);
    }

    #[test]
    fn test_min_periods_one_warm_up() {
        let values = (1..=8).map(|i| Some(i as f64)).collect::<Vec<_>>();
        let out = smooth(&values, SmoothingWindow::Seven);

        // Partial windows average whatever is available.
        assert_close(
            &out,
            &[
                Some(1.0),
                Some(1.5),
                Some(2.0),
                Some(2.5),
                Some(3.0),
                Some(3.5),
                Some(4.0),
                // Full window: mean(2..=8)
                Some(5.0),
            ],
        );
    }

    #[test]
    fn test_missing_values_skip_divisor_not_span() {
        let values = vec![
            Some(10.0),
            None,
            Some(20.0),
            None,
            None,
            None,
            None,
            None,
            None,
            Some(4.0),
        ];
        let out = smooth(&values, SmoothingWindow::Seven);

        assert_close(
            &out,
            &[
                Some(10.0),
                Some(10.0),
                Some(15.0),
                Some(15.0),
                Some(15.0),
                Some(15.0),
                Some(15.0),
                // Window [1..=7]: only 20.0 remains
                Some(20.0),
                // Window [2..=8]: still 20.0
                Some(20.0),
                // Window [3..=9]: 20.0 left the span, only 4.0
                Some(4.0),
            ],
        );
    }

    #[test]
    fn test_all_missing_window_is_missing() {
        let values = vec![None, None, Some(2.0), None, None];
        let out = smooth(&values, SmoothingWindow::One);
        assert_eq!(out, values);

        let out = smooth(&[None, None], SmoothingWindow::Thirty);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn test_nan_is_treated_as_missing() {
        let out = smooth(&[Some(2.0), Some(f64::NAN), Some(4.0)], SmoothingWindow::Seven);
        assert_close(&out, &[Some(2.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut mean = TrailingMean::new(SmoothingWindow::Thirty);
        mean.update(Some(100.0));
        mean.reset();
        assert_eq!(mean.update(Some(1.0)), Some(1.0));
    }
}
