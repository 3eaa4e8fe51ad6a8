use anyhow::Context;
use spacehook::backends::LocalBackend;
use spacehook::cli::{self, Command};
use spacehook::harness::HARNESS_NAME;
use spacehook::plugin::{generator, launcher};
use spacehook::{Logger, RunConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout belongs to the plugin logger
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RunConfig::from_env().context("failed to resolve run configuration")?;
    let logger = Logger::new(HARNESS_NAME, &config);
    let cwd = std::env::current_dir().context("failed to read current directory")?;

    match cli::get_opts(&logger) {
        Command::Start { plugin_name } => {
            let dir = launcher::plugin_dir()?;
            let status = launcher::start(&LocalBackend::new(), &dir, &plugin_name, &cwd)
                .await
                .context("plugin start failed")?;
            if !status.success() {
                std::process::exit(status.code().unwrap_or(1));
            }
        }
        Command::Generate { plugin_name, phase } => {
            generator::generate(&cwd, &plugin_name, phase, &logger)?;
        }
    }

    Ok(())
}
