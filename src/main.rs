use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use million::api::{SimulateArgs, build_inputs, build_simulate_response, render_report};
use million::config::ServerConfig;
use million::core::simulate;

#[derive(Parser, Debug)]
#[command(
    name = "million",
    about = "Compound interest calculator: time or monthly contribution needed to reach R$ 1.000.000"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, help = "Overrides MILLION_PORT")]
        port: Option<u16>,
    },
    /// Run one simulation and print the result.
    Simulate {
        #[command(flatten)]
        args: SimulateArgs,
        #[arg(long, help = "Print the full JSON response instead of a table")]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Err(e) = million::api::run_http_server(&config).await {
                error!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Simulate { args, json } => {
            let input = match build_inputs(&args) {
                Ok(input) => input,
                Err(e) => {
                    error!("{e}");
                    std::process::exit(2);
                }
            };
            let result = simulate(&input);
            if json {
                let response = build_simulate_response(&input, result);
                match serde_json::to_string_pretty(&response) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        error!("Failed to serialize response: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                print!("{}", render_report(&input, &result));
            }
        }
    }
}
