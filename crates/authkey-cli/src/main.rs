mod cli;
mod config;
mod storage;

use std::path::Path;

use authkey_core::{AuthKey, PathResolver, TokenSource};
use authkey_store::key_file::KeyFileStore;
use clap::Parser;
use color_eyre::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::ConfigCommand;

/// Entry point wiring the CLI to the auth key store.
fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    match cli.command.unwrap_or(cli::Command::Init) {
        cli::Command::Init => run_init(&config)?,
        cli::Command::Show => run_show(&config)?,
        cli::Command::Path => print_path(&config)?,
        cli::Command::Verify { token } => run_verify(&config, &token)?,
        cli::Command::Health => run_health_check(&config)?,
        cli::Command::Version => print_version(),
        cli::Command::Config(ConfigCommand::Init) => {
            init_config(cli.config.as_deref(), &config)?
        }
    }

    Ok(())
}

fn init_tracing() {
    // Logs go to stderr so `show` output stays pipeable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("authkey {}", env!("CARGO_PKG_VERSION"));
}

fn run_init(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config);
    store.initialize()?;
    println!("Auth key ready at {}", store.path()?.display());
    Ok(())
}

fn run_show(config: &config::Config) -> Result<()> {
    let key = storage::store_from_config(config).initialize()?;
    println!("{}", key.expose());
    Ok(())
}

fn print_path(config: &config::Config) -> Result<()> {
    let path = storage::store_from_config(config).path()?;
    println!("{}", path.display());
    Ok(())
}

fn run_verify(config: &config::Config, token: &str) -> Result<()> {
    let key = storage::store_from_config(config).initialize()?;
    check_token(&key, token)?;
    println!("Token: ok");
    Ok(())
}

fn check_token(key: &AuthKey, token: &str) -> Result<()> {
    if !key.verify(token.trim()) {
        color_eyre::eyre::bail!("token does not match the stored auth key");
    }
    Ok(())
}

/// Initializes the key, reloads it, and checks the two agree.
fn run_health_check(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config);
    run_key_health(&store)?;
    println!("Auth key: ok");
    Ok(())
}

fn run_key_health<R: PathResolver, S: TokenSource>(store: &KeyFileStore<R, S>) -> Result<()> {
    let first = store.initialize()?;
    let reloaded = store.initialize()?;

    if first != reloaded {
        color_eyre::eyre::bail!("auth key changed between loads");
    }
    check_token(&reloaded, first.expose())?;
    info!(path = %store.path()?.display(), "auth key health check passed");
    Ok(())
}

fn init_config(override_path: Option<&Path>, config: &config::Config) -> Result<()> {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => config::default_path()?,
    };
    let path = config::write_if_missing(config, &path)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
