//! Kick demo server.
//!
//! Serves a file-routed site through the dispatch core, or prints the route
//! table discovered from a routes directory.

mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use kick::config::{load_config, validate_config, KickConfig};
use kick::host::{self, HostOptions};
use kick::observability::logging;
use kick::{Application, Router};

#[derive(Parser)]
#[command(name = "kick")]
#[command(about = "File-routed web framework demo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the demo site
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Routes directory, overriding the configuration
        #[arg(short, long)]
        routes: Option<PathBuf>,

        /// Bind address, overriding the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Print the route table discovered from a routes directory
    Routes {
        #[arg(short, long, default_value = "demos/pages")]
        routes: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            routes,
            bind,
        } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => KickConfig::default(),
            };
            if let Some(routes) = routes {
                config.routes.path = routes;
            }
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            validate_config(&config).map_err(kick::config::ConfigError::Validation)?;

            logging::init(&config.observability.log_level)?;
            tracing::info!(
                bind_address = %config.server.bind_address,
                routes = %config.routes.path.display(),
                request_timeout_secs = config.server.request_timeout_secs,
                "kick v{} starting",
                env!("CARGO_PKG_VERSION")
            );

            let app = Application::new()
                .with_routes(&config.routes.path)
                .with_artifacts(demo::artifacts())
                .with_provider(demo::provide);

            // Discover eagerly so a bad routes directory fails at startup.
            let table = app.router().routes()?;
            tracing::info!(routes = table.len(), "Routes discovered");

            let listener = TcpListener::bind(&config.server.bind_address).await?;
            host::serve(Arc::new(app), listener, HostOptions::from(&config.server)).await?;

            tracing::info!("Shutdown complete");
        }
        Commands::Routes { routes } => {
            let router = Router::with_path(routes);
            for route in router.routes()?.iter() {
                println!("{}  ->  {}", route, route.artifact());
                for middleware in route.middleware() {
                    println!("        via {}", middleware);
                }
            }
        }
    }

    Ok(())
}
