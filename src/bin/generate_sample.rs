//! Writes `sample_data.csv`: a small employee table with the problems the
//! dashboard is meant to fix (missing salaries, implausible ages, a salary
//! outlier, and a few unparsable hire dates).

use anyhow::{Context, Result};
use serde::Serialize;

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

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Employee {
    name: String,
    age: i64,
    salary: Option<f64>,
    department: &'static str,
    hired: String,
}

const FIRST_NAMES: &[&str] = &["Ana", "Luis", "Sofia", "Ivan", "Carla", "Diego", "Marta", "Pablo"];
const DEPARTMENTS: &[&str] = &["Sales", "Engineering", "Finance", "Support"];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "sample_data.csv";
    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;

    let rows = 120;
    for i in 0..rows {
        let age = rng.gauss(40.0, 14.0).round() as i64;
        let salary = if i % 11 == 3 {
            None
        } else if i == 57 {
            Some(250_000.0)
        } else {
            Some((rng.gauss(3_200.0, 650.0) * 100.0).round() / 100.0)
        };
        let hired = if i % 17 == 5 {
            "unknown".to_owned()
        } else {
            let year = 2005 + rng.next_u64() % 19;
            let month = 1 + rng.next_u64() % 12;
            let day = 1 + rng.next_u64() % 28;
            format!("{year}-{month:02}-{day:02}")
        };

        writer
            .serialize(Employee {
                name: format!("{} {i}", rng.pick(FIRST_NAMES)),
                age,
                salary,
                department: DEPARTMENTS[i % DEPARTMENTS.len()],
                hired,
            })
            .with_context(|| format!("writing row {i}"))?;
    }
    writer.flush().context("flushing output file")?;

    println!("Wrote {rows} employees to {output_path}");
    Ok(())
}
