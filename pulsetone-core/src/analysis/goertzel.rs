use std::f64::consts::TAU;

use num_complex::Complex;

/// One DFT bin at an arbitrary frequency, evaluated over a whole block with
/// the Goertzel recurrence.
#[derive(Copy, Clone, Debug)]
pub struct GoertzelBin {
    omega: f64,
    feedback: f64,
}

impl GoertzelBin {
    pub fn new(frequency_hz: f64, sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "sample_rate > 0");

        let omega = TAU * frequency_hz / sample_rate as f64;
        Self {
            omega,
            feedback: 2.0 * omega.cos(),
        }
    }

    /// Radians per sample.
    pub fn omega(&self) -> f64 {
        self.omega
    }

    /// Bin value and block length. The value's phase is relative to the last
    /// sample; its magnitude equals the DFT magnitude.
    pub fn evaluate<I: IntoIterator<Item = f64>>(&self, samples: I) -> (Complex<f64>, usize) {
        let (mut s1, mut s2, mut n) = (0.0, 0.0, 0usize);
        for x in samples {
            let s0 = x + self.feedback * s1 - s2;
            s2 = s1;
            s1 = s0;
            n += 1;
        }

        let value = Complex::new(s1, 0.0) - Complex::from_polar(s2, -self.omega);
        (value, n)
    }

    /// Level in dB relative to a full-scale sine sitting on the bin, which
    /// yields magnitude `n / 2`. An empty block has no level.
    pub fn level_db<I: IntoIterator<Item = f64>>(&self, samples: I) -> f64 {
        match self.evaluate(samples) {
            (_, 0) => f64::NEG_INFINITY,
            (value, n) => 20.0 * (value.norm() * 2.0 / n as f64).log10(),
        }
    }
}
