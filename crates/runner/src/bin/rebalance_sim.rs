use basket_runner::{RebalanceSimulation, SimulationConfig};

fn print_help() {
    eprintln!(
        r#"Rebalance Simulator - traders driving an index token to its targets

USAGE:
    rebalance-sim [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --print-config      Print the effective configuration and exit
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # Run the default UNI/WBTC/DAI scenario
    rebalance-sim

    # Run with config file
    rebalance-sim --config scenario.json
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut print_config = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            "--print-config" => print_config = true,
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            SimulationConfig::from_file(&path)?
        }
        None => SimulationConfig::default(),
    };
    if print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    log::info!(
        "Components: {}, traders: {}, max blocks: {}",
        config.components.len(),
        config.traders.count,
        config.max_blocks
    );

    let results = RebalanceSimulation::with_config(config)?.run().await?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    if !results.targets_met {
        std::process::exit(2);
    }
    Ok(())
}
