//! Smart Village dev server (v0.1)
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │                 DEV SERVER                      │
//!                         │                                                 │
//!   Browser request       │  ┌─────────┐    ┌──────────┐    ┌───────────┐  │
//!   ──────────────────────┼─▶│  http   │───▶│ routing  │───▶│ upstream  │──┼──▶ API backend
//!                         │  │ server  │    │ (prefix) │    │  relay    │  │
//!                         │  └─────────┘    └────┬─────┘    └───────────┘  │
//!                         │                      │ no match                 │
//!                         │                      ▼                          │
//!                         │               ┌──────────────┐                  │
//!                         │               │ static / SPA │                  │
//!                         │               │   fallback   │                  │
//!                         │               └──────────────┘                  │
//!                         │                                                 │
//!   Build tooling         │  ┌──────────────┐                               │
//!   ──────────────────────┼─▶│ alias        │  @/lib/x → <root>/src/lib/x   │
//!                         │  │ resolver     │                               │
//!                         │  └──────────────┘                               │
//!                         └────────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use village_devserver::alias::AliasResolver;
use village_devserver::config::{self, LoadOptions};
use village_devserver::lifecycle;
use village_devserver::observability::logging;
use village_devserver::routing::Router;

#[derive(Parser)]
#[command(name = "village-devserver", version)]
#[command(about = "Development server for the Smart Village web app", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root; aliases and the static root are relative to it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Selects .env.<mode> files
    #[arg(long, global = true, default_value = "development")]
    mode: String,

    /// Listen port, overrides VITE_DEV_PORT
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Bind 127.0.0.1 instead of every interface
    #[arg(long, global = true)]
    local_only: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dev server (default)
    Serve,
    /// Resolve import specifiers through the alias table
    Resolve {
        #[arg(required = true)]
        specifiers: Vec<String>,
    },
    /// Check that every alias points at an existing directory
    CheckAliases,
    /// Print the proxy table in match order
    Routes {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            root: self.root.clone(),
            mode: self.mode.clone(),
            config_path: self.config.clone(),
            port: self.port,
            local_only: self.local_only,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let options = cli.load_options();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&options).await,
        Commands::Resolve { specifiers } => resolve(&options, &specifiers),
        Commands::CheckAliases => check_aliases(&options),
        Commands::Routes { json } => routes(&options, json),
    }
}

async fn serve(options: &LoadOptions) -> Result<(), Box<dyn Error>> {
    let config = tracing::subscriber::with_default(logging::bootstrap_subscriber(), || config::load(options))?;
    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "village-devserver starting");
    tracing::info!(
        port = config.listener.port,
        bind_all_interfaces = config.listener.bind_all_interfaces,
        routes = config.routes.len(),
        aliases = config.aliases.len(),
        connect_timeout_secs = config.timeouts.connect_secs,
        response_timeout_secs = config.timeouts.response_secs,
        "Configuration loaded"
    );

    lifecycle::serve(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn resolve(options: &LoadOptions, specifiers: &[String]) -> Result<(), Box<dyn Error>> {
    let resolver = AliasResolver::new(config::load_aliases(options)?);
    for specifier in specifiers {
        let resolved = resolver.resolve(specifier)?;
        println!("{specifier} -> {resolved}");
    }
    Ok(())
}

fn check_aliases(options: &LoadOptions) -> Result<(), Box<dyn Error>> {
    let resolver = AliasResolver::new(config::load_aliases(options)?);
    match resolver.verify_targets() {
        Ok(()) => {
            for rule in resolver.rules() {
                println!("ok  {} -> {}", rule.symbol, rule.target_directory.display());
            }
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("error: {error}");
            }
            Err(format!("{} alias target(s) missing", errors.len()).into())
        }
    }
}

fn routes(options: &LoadOptions, json: bool) -> Result<(), Box<dyn Error>> {
    let config = tracing::subscriber::with_default(logging::bootstrap_subscriber(), || config::load(options))?;
    let router = Router::from_rules(&config.routes);

    if json {
        let rules: Vec<_> = router.rules().collect();
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    for rule in router.rules() {
        let tls = if rule.verify_tls { "" } else { "  (tls unverified)" };
        println!("{:<34} -> {}{}", rule.path_prefix, rule.upstream_base_url, tls);
    }
    Ok(())
}
