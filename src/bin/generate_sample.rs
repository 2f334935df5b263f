//! Writes a deterministic demo CSV for trying out the analyzer.
//!
//! Columns: `region` (categorical), `temperature`, `humidity`, `sales`
//! (numeric, `sales` loosely follows temperature). A few cells are left empty
//! and one `sales` value is far out of range.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Generate a demo CSV dataset")]
struct Args {
    /// Output file
    #[arg(default_value = "sample_data.csv")]
    output: PathBuf,

    /// Number of data rows
    #[arg(long, default_value_t = 200)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Empty string for the injected gaps, otherwise two decimals.
fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let regions = ["north", "south", "east", "west"];

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record(["region", "temperature", "humidity", "sales"])?;

    let spike_row = args.rows / 2;
    let mut gaps = 0;
    for row in 0..args.rows {
        let region = rng.pick(&regions);
        let temperature = rng.gauss(21.0, 4.0);
        let humidity = (rng.gauss(55.0, 12.0)).clamp(5.0, 100.0);
        let mut sales = 120.0 + 6.5 * temperature + rng.gauss(0.0, 15.0);
        if row == spike_row {
            sales *= 25.0;
        }

        // every 17th row loses humidity, every 23rd its temperature
        let humidity = (row % 17 != 5).then_some(humidity);
        let temperature = (row % 23 != 7).then_some(temperature);
        gaps += usize::from(humidity.is_none()) + usize::from(temperature.is_none());

        writer.write_record([
            region.to_string(),
            cell(temperature),
            cell(humidity),
            cell(Some(sales)),
        ])?;
    }
    writer.flush()?;

    println!(
        "Wrote {} rows ({gaps} empty cells, one extreme sales value) to {}",
        args.rows,
        args.output.display()
    );
    Ok(())
}
