//! Gophkeeper identity vault server binary.

use clap::Parser;
use gophkeeper_server::{Args, Server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match ServerConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    tracing::info!("starting gophkeeper identity vault server");

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
