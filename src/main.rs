mod config;
mod corpus;
mod engine;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Backend, ConfigFile, Overrides, RefreshMode, ServerSettings};
use corpus::Snapshot;
use server::{QueryClient, Server};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "needle")]
#[command(about = "Exact-line membership search server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the search server
    Serve {
        /// Path to the JSON configuration file
        #[arg(short, long, default_value = "needle.json")]
        config: PathBuf,

        /// Corpus file to serve (overrides the config file)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Bind host (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides the config file)
        #[arg(long)]
        port: Option<u16>,

        /// Re-check the corpus file before every query
        #[arg(long)]
        reread: Option<bool>,

        /// Corpus store backend
        #[arg(long, value_enum)]
        backend: Option<Backend>,

        /// Maximum concurrent connections (0 = unbounded)
        #[arg(long)]
        max_connections: Option<usize>,
    },
    /// Send a single query to a running server
    Query {
        /// The line to look up
        query: String,

        /// Read endpoint and TLS settings from this config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,

        /// Connect over TLS, trusting this PEM certificate bundle
        #[arg(long)]
        tls_ca: Option<PathBuf>,
    },
    /// Validate configuration and corpus readability
    Check {
        /// Path to the JSON configuration file
        #[arg(short, long, default_value = "needle.json")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            corpus,
            host,
            port,
            reread,
            backend,
            max_connections,
        } => {
            let file = ConfigFile::load(&config)?;
            let overrides = Overrides {
                corpus_path: corpus,
                host,
                port,
                reread_on_query: reread,
                backend,
                max_connections,
            };
            let settings = ServerSettings::resolve(file, overrides)?;
            init_tracing(&settings.log_level);

            let server = Server::bind(settings)?;
            server::signal::install().context("Failed to install signal handlers")?;
            server.run()
        }

        Commands::Query {
            query,
            config,
            host,
            port,
            tls_ca,
        } => {
            let file = match config {
                Some(path) => ConfigFile::load(&path)?,
                None => ConfigFile::default(),
            };
            let host = host.unwrap_or_else(|| "127.0.0.1".to_string());
            let port = port.unwrap_or(file.port);
            let ca = tls_ca.or(if file.tls.enabled {
                file.tls.cert_path.clone()
            } else {
                None
            });

            let mut client = QueryClient::new(host, port);
            if let Some(ca) = ca {
                client = client.with_tls_roots(&ca)?;
            }

            match client.send(&query) {
                Ok(response) => {
                    println!("{response}");
                    Ok(())
                }
                Err(err) => {
                    eprintln!("needle: {err}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Check { config } => {
            let file = ConfigFile::load(&config)?;
            let settings = ServerSettings::resolve(file, Overrides::default())?;

            let snapshot = Snapshot::build(&settings.corpus_path)
                .with_context(|| "Corpus is not readable".to_string())?;

            println!("Configuration OK");
            println!("  corpus:   {}", settings.corpus_path.display());
            println!("  lines:    {} distinct", snapshot.len());
            println!("  backend:  {:?}", settings.backend);
            println!(
                "  refresh:  {}",
                match settings.refresh {
                    RefreshMode::Always => "on every query",
                    RefreshMode::Once => "at startup (SIGHUP to rebuild)",
                }
            );
            println!("  bind:     {}", settings.bind_addr());
            println!(
                "  tls:      {}",
                if settings.tls.is_some() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            Ok(())
        }
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
