use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = carddav2fb::cli::Cli::parse();
    if let Err(e) = carddav2fb::cli::run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
