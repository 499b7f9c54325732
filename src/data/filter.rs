use nalgebra::{DMatrix, DVector};

use crate::error::PlotError;

// ---------------------------------------------------------------------------
// Savitzky-Golay smoothing
// ---------------------------------------------------------------------------

/// Savitzky-Golay smoother for a fixed window length and polynomial order.
///
/// Each output sample is the value at the window centre of the least-squares
/// polynomial fitted to the surrounding `window_length` samples. The first
/// and last `window_length / 2` samples have no full window around them; they
/// are evaluated on the polynomial fitted to the first / last full window.
///
/// Parameters are not checked here. Callers guarantee an odd window, a
/// polynomial order below the window length, and signals at least one window
/// long (see `figure::PlotRequest`).
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_length: usize,
    /// Least-squares projection `(polyorder + 1) × window_length`: maps the
    /// window samples onto polynomial coefficients in centred coordinates.
    projection: DMatrix<f64>,
}

impl SavitzkyGolay {
    pub fn new(window_length: usize, polyorder: usize) -> Result<Self, PlotError> {
        debug_assert!(window_length % 2 == 1, "window length must be odd");
        debug_assert!(polyorder < window_length, "polyorder must be below window length");

        let half = (window_length / 2) as f64;
        let vandermonde = DMatrix::from_fn(window_length, polyorder + 1, |i, j| {
            (i as f64 - half).powi(j as i32)
        });
        let projection = vandermonde.pseudo_inverse(1e-12).map_err(|e| {
            PlotError::InvalidParameter(format!(
                "cannot build Savitzky-Golay filter (window {window_length}, order {polyorder}): {e}"
            ))
        })?;

        Ok(Self {
            window_length,
            projection,
        })
    }

    /// Convolution weights producing the centre value of a window.
    pub fn coefficients(&self) -> Vec<f64> {
        self.projection.row(0).iter().copied().collect()
    }

    /// Smooth `signal`, returning a sequence of the same length.
    ///
    /// # Panics
    ///
    /// If `signal` is shorter than the window. Callers check the length
    /// first and report it as an invalid parameter.
    pub fn apply(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        let m = self.window_length;
        assert!(n >= m, "signal shorter than the filter window ({n} < {m})");

        let half = m / 2;
        let weights = self.coefficients();
        let mut out = vec![0.0; n];

        for (k, window) in signal.windows(m).enumerate() {
            out[k + half] = weights.iter().zip(window).map(|(w, y)| w * y).sum();
        }

        // Edges: evaluate the polynomial of the first / last full window.
        let head = self.fit(&signal[..m]);
        for (k, slot) in out.iter_mut().take(half).enumerate() {
            *slot = eval_poly(&head, k as f64 - half as f64);
        }
        let tail = self.fit(&signal[n - m..]);
        for k in 1..=half {
            out[n - 1 - half + k] = eval_poly(&tail, k as f64);
        }

        out
    }

    fn fit(&self, window: &[f64]) -> DVector<f64> {
        &self.projection * DVector::from_column_slice(window)
    }
}

/// Evaluate `c0 + c1 z + c2 z² + ...` by Horner's rule.
fn eval_poly(coeffs: &DVector<f64>, z: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * z + c)
}
