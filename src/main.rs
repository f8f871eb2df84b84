use anyhow::Result;
use butterfly_ch::cli::{run, Cli};
use clap::Parser;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli)
}

/// Initialize structured logging; RUST_LOG filters, default `info`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}
