use anyhow::{Context, Result};

use metapop_ssa::tasks::sir_metapop::{self, SirParams};

fn main() -> Result<()> {
    metapop_ssa::logging::init();

    let mut args = std::env::args().skip(1);
    let nthread: usize = args
        .next()
        .map(|s| s.parse())
        .transpose()
        .context("nthread must be a positive integer")?
        .unwrap_or(2);
    let seed: u64 = args
        .next()
        .map(|s| s.parse())
        .transpose()
        .context("seed must be an integer")?
        .unwrap_or(20_260_801);

    let nn = 4;
    let n_per_node = 1_000;
    let initial_infected = 10;
    let params = SirParams { beta: 0.4, gamma: 0.12 };
    let tspan: Vec<f64> = (0..=120).map(|d| d as f64).collect();
    let output_path = std::path::Path::new("output/sir_demo/trajectory.json");

    sir_metapop::run(nn, n_per_node, initial_infected, params, tspan, nthread, seed, output_path).context("sir_metapop simulation failed")?;

    println!("wrote trajectory to {}", output_path.display());
    Ok(())
}
