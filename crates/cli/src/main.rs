//! hshare: share files ad hoc over HTTP behind a secret URL.

mod discovery;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use hshare_core::{AppConfig, OperatorAddress, Secret};
use hshare_server::AppState;
use shell::Shell;
use tokio::runtime::Handle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Share files over HTTP behind an unguessable URL prefix
#[derive(Parser, Debug)]
#[command(name = "hshare")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(long, env = "HSHARE_CONFIG", default_value = "hshare.toml")]
    config: String,

    /// HTTP port (overrides the port of the bind address)
    #[arg(short, long)]
    port: Option<u16>,

    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(long)]
    bind: Option<String>,

    /// Shell command line to execute on startup, e.g. -c "add *.iso"
    #[arg(short = 'c', long = "command", value_name = "COMMAND")]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout belongs to the shell.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("hshare v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    let state = AppState::new(config.clone(), Secret::generate());

    let (addr, server) = hshare_server::spawn(state.clone())
        .await
        .with_context(|| format!("failed to bind to {}", config.server.bind))?;

    let mut address = OperatorAddress::localhost(addr.port());
    if let Some(public) = &config.server.public_address {
        address.set(public.clone());
    } else if config.discovery.on_startup {
        let settings = &config.discovery;
        let ip = discovery::discover(&settings.stun_server, settings.timeout()).await;
        address.set_discovered(ip);
    }

    // The shell blocks on the terminal, so it gets a blocking thread and a
    // runtime handle for the few commands that need async I/O.
    let runtime = Handle::current();
    let commands = args.commands;
    let settings = config.discovery.clone();
    let shell_result = tokio::task::spawn_blocking(move || -> Result<()> {
        let mut shell = Shell::new(state, address, settings, runtime);
        let mut stdout = std::io::stdout();
        for line in &commands {
            shell.run_line(line, &mut stdout);
        }
        println!("server available here: {}", shell.share_root());
        shell.run_interactive()
    })
    .await
    .context("shell task failed")?;

    // In-flight downloads are dropped with the process.
    server.abort();
    tracing::info!("shutting down");
    shell_result
}

/// Merge the config file (when present), `HSHARE_` environment variables
/// and command line overrides, in that order.
fn load_config(args: &Args) -> Result<AppConfig> {
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed("HSHARE_").ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")?;

    apply_overrides(&mut config, args)?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// `--bind` replaces the whole address, then `--port` replaces its port.
fn apply_overrides(config: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config
            .server
            .set_port(port)
            .context("failed to apply --port")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("hshare").chain(argv.iter().copied())).unwrap()
    }

    fn config_file(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hshare.toml");
        std::fs::write(&path, contents).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn commands_are_repeatable() {
        let args = args(&["-c", "add *.txt", "--command", "list", "-p", "9000"]);
        assert_eq!(args.commands, ["add *.txt", "list"]);
        assert_eq!(args.port, Some(9000));
    }

    #[test]
    fn file_values_are_loaded() {
        let (_dir, path) = config_file(
            r#"
            [server]
            bind = "127.0.0.1:7000"
            chunk_size = 4096

            [log]
            capacity = 5
            "#,
        );
        let config = load_config(&args(&["--config", &path])).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7000");
        assert_eq!(config.server.chunk_size, 4096);
        assert_eq!(config.log.capacity, 5);
        assert_eq!(config.discovery.stun_server, "stun.l.google.com:19302");
    }

    #[test]
    fn cli_overrides_apply_after_file() {
        let (_dir, path) = config_file("[server]\nbind = \"127.0.0.1:7000\"\n");
        let config = load_config(&args(&["--config", &path, "-p", "9100"])).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9100");

        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args(&["--bind", "[::1]:80", "-p", "81"])).unwrap();
        assert_eq!(config.server.bind, "[::1]:81");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(&args(&["--config", &path.to_string_lossy()])).unwrap();
        assert_eq!(config.server.chunk_size, 16 * 1024);
        assert!(config.server.public_address.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let (_dir, path) = config_file("[server]\nchunk_size = 0\n");
        assert!(load_config(&args(&["--config", &path])).is_err());

        let mut config = AppConfig::default();
        let bad = args(&["--bind", "not an address", "-p", "1"]);
        assert!(apply_overrides(&mut config, &bad).is_err());
    }
}
