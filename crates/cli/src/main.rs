use clap::{Parser, Subcommand};
use infobot::webhook::Collaborators;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "infobot")]
#[command(about = "Infobot fulfillment webhook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook server (POST / for fulfillment, GET / for health).
    Serve {
        /// Config file path (default: INFOBOT_CONFIG_PATH or ~/.infobot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Listen port (default from PORT env, config, or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Answer one webhook request read from a file (or stdin) and print the response JSON.
    Fulfill {
        /// Config file path (default: INFOBOT_CONFIG_PATH or ~/.infobot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Request JSON file; reads stdin when omitted.
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("infobot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Fulfill { config, input }) => {
            if let Err(e) = run_fulfill(config, input).await {
                log::error!("fulfill failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = infobot::config::load_config(config_path)?;
    log::debug!("config loaded from {}", path.display());
    config.server.port = port.unwrap_or_else(|| infobot::config::resolve_port(&config));
    let collaborators = Collaborators::from_config(&config);
    infobot::webhook::run_server(config, collaborators).await
}

async fn run_fulfill(config_path: Option<PathBuf>, input: Option<PathBuf>) -> anyhow::Result<()> {
    use anyhow::Context;

    let (config, _) = infobot::config::load_config(config_path)?;
    let text = match input {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading request from {}", path.display()))?,
        None => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("reading request from stdin")?;
            s
        }
    };
    let collaborators = Collaborators::from_config(&config);
    let out = infobot::webhook::fulfill_text(&text, &collaborators).await?;
    println!("{}", out);
    Ok(())
}
