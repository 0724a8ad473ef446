pub fn run() {
    let nn = 4;
    let n_per_node = 1_000;
    let initial_infected = 10;
    let params = crate::tasks::sir_metapop::SirParams { beta: 0.4, gamma: 0.12 };
    let tspan: Vec<f64> = (0..=120).map(|d| d as f64).collect();
    let nthread = 2;
    let seed = 20_260_801;
    let output_path = std::path::Path::new("output/sir_demo/trajectory.json");

    if let Err(err) = crate::tasks::sir_metapop::run(nn, n_per_node, initial_infected, params, tspan, nthread, seed, output_path) {
        eprintln!("sir_demo failed: {err}");
        std::process::exit(1);
    }
}
