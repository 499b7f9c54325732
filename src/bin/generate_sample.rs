//! Write a synthetic transient-absorbance CSV for trying out the plotter.
//!
//! Usage: `generate_sample [OUTPUT.csv]` (default `sample_ta.csv`).

use anyhow::{Context, Result};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Population after excitation at t = 0: instrument-limited rise, single
/// exponential decay. Zero before the pump arrives.
fn kinetics(delay_ps: f64) -> f64 {
    if delay_ps <= 0.0 {
        return 0.0;
    }
    (1.0 - (-delay_ps / 0.3).exp()) * (-delay_ps / 250.0).exp()
}

/// ΔA (mOD): excited-state absorption around 560 nm on top of a weaker
/// ground-state bleach near 450 nm.
fn difference_spectrum(wavelengths: &[f64], delay_ps: f64, noise: f64, rng: &mut SimpleRng) -> Vec<f64> {
    let population = kinetics(delay_ps);
    wavelengths
        .iter()
        .map(|&wl| {
            let esa = gaussian(wl, 560.0, 45.0, 8.0);
            let bleach = gaussian(wl, 450.0, 20.0, -3.0);
            population * (esa + bleach) + 1.0 + rng.gauss(0.0, noise)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_ta.csv".to_string());

    let mut rng = SimpleRng::new(42);

    // Wavelengths: 380 → 720 nm, step 1
    let wavelengths: Vec<f64> = (0..=340).map(|i| 380.0 + i as f64).collect();

    let delays: [(&str, f64); 8] = [
        ("-1ps", -1.0),
        ("0.5ps", 0.5),
        ("1ps", 1.0),
        ("5ps", 5.0),
        ("20ps", 20.0),
        ("100ps", 100.0),
        ("500ps", 500.0),
        ("1ns", 1000.0),
    ];

    let traces: Vec<Vec<f64>> = delays
        .iter()
        .map(|&(_, t)| difference_spectrum(&wavelengths, t, 0.25, &mut rng))
        .collect();

    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut header = Vec::with_capacity(delays.len() * 2);
    for (label, _) in &delays {
        header.push("Wavelength (nm)".to_string());
        header.push(format!("Signal, {label}"));
    }
    writer.write_record(&header).context("writing header")?;

    for (row, &wl) in wavelengths.iter().enumerate() {
        let mut record = Vec::with_capacity(delays.len() * 2);
        for trace in &traces {
            record.push(format!("{wl:.1}"));
            record.push(format!("{:.4}", trace[row]));
        }
        writer.write_record(&record).context("writing row")?;
    }
    writer.flush().context("flushing CSV")?;

    println!(
        "Wrote {} traces ({} wavelengths each) to {output_path}",
        delays.len(),
        wavelengths.len()
    );
    Ok(())
}
