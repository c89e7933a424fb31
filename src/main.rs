// Membrane prediction service - main.rs
// Parses the CLI and hands off to the selected command.

use clap::Parser;
use membrane_predict::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
