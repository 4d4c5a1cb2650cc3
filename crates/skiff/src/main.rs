//! skiff - a single-operator tool-calling agent

use clap::Parser;
use tracing::error;

mod commands;

use commands::chat_command;

/// skiff - chat with an agent that can use tools
#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "A single-operator tool-calling agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Free text seeding the first turn (a fixed greeting when omitted)
    #[arg(trailing_var_arg = true)]
    prompt: Vec<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let prompt = if cli.prompt.is_empty() {
        None
    } else {
        Some(cli.prompt.join(" ").trim().to_string())
    };

    if let Err(e) = chat_command(prompt).await {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
