use anyhow::{Context, Result};
use clap::Parser;
use mdnsctl_console::{commands, BrowseManager, CommandRegistry};
use mdnsctl_engine::{DiscoveryEngine, EngineError, MdnsEngine};
use serde::Deserialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// mdnsctl - interactive control console for mDNS service discovery
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/mdnsctl.yaml")]
    config: PathBuf,

    /// Start the mDNS engine immediately instead of waiting for mdns_init
    #[arg(long)]
    init: bool,

    /// Override the hostname advertised by the engine
    #[arg(long)]
    hostname: Option<String>,

    /// Override the default instance name for services
    #[arg(long)]
    instance: Option<String>,

    /// Log filter, e.g. "info" or "mdnsctl_engine=debug"
    #[arg(long, env = "MDNSCTL_LOG", default_value = "info")]
    log_level: String,
}

#[derive(Debug, Default, Deserialize)]
struct Config {
    #[serde(default)]
    console: ConsoleConfig,
}

#[derive(Debug, Deserialize)]
struct ConsoleConfig {
    /// Hostname advertised once the engine starts.
    hostname: Option<String>,

    /// Default instance name for advertised services.
    instance: Option<String>,

    /// Start the engine at console startup.
    #[serde(default)]
    autostart: bool,

    #[serde(default = "default_prompt")]
    prompt: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            instance: None,
            autostart: false,
            prompt: default_prompt(),
        }
    }
}

fn default_prompt() -> String {
    "mdns> ".to_string()
}

fn load_config(path: &PathBuf) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_new(&args.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let config = load_config(&args.config)?;
    let hostname = args.hostname.or(config.console.hostname);
    let instance = args.instance.or(config.console.instance);

    let engine: Arc<dyn DiscoveryEngine> = Arc::new(MdnsEngine::new());
    let browser = Arc::new(BrowseManager::new(Arc::clone(&engine)));

    let mut registry = CommandRegistry::new();
    commands::register_all(&mut registry, &engine, &browser)
        .context("failed to populate command registry")?;

    if args.init || config.console.autostart {
        engine.init().context("failed to start mDNS engine")?;
        if let Some(hostname) = &hostname {
            engine.set_hostname(hostname)?;
            info!(hostname, "Hostname configured");
        }
        if let Some(instance) = &instance {
            engine.set_instance_name(instance)?;
            info!(instance, "Instance name configured");
        }
    }

    run_shell(&registry, &config.console.prompt)?;

    // Deregister every browse session before the engine goes away so no
    // callback can fire into a console that no longer exists.
    browser.stop_all();
    match engine.shutdown() {
        Ok(()) | Err(EngineError::NotRunning) => {}
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

/// The line-oriented dispatch loop: one command is fully validated,
/// handled and completed before the next line is read.
fn run_shell(registry: &CommandRegistry, prompt: &str) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", prompt);
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break; // EOF
        };
        let line = line.context("failed to read command line")?;
        let tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();

        match tokens.first().map(String::as_str) {
            None => continue,
            Some("quit") | Some("exit") => break,
            Some(_) => {
                let status = registry.dispatch(&tokens);
                debug!(status, "Command finished");
            }
        }
    }
    info!("Console shutting down");
    Ok(())
}
