use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use andy_analyst::config::Config;
use andy_analyst::handlers;
use andy_analyst::repl;
use andy_analyst::services::render::HtmlChartRenderer;
use andy_analyst::services::{AnthropicAgentFactory, Orchestrator, Session, SessionStore};

#[derive(Parser)]
#[command(name = "andy", version, about = "Andy the Analyst: chat with your spreadsheets")]
struct Cli {
    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Terminal chat (default)
    Chat {
        /// CSV or Excel file to load on start
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Browser dashboard
    Serve {
        /// Overrides SERVER_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    let factory = Arc::new(AnthropicAgentFactory::new(&config, Arc::new(HtmlChartRenderer)));
    let orchestrator = Arc::new(Orchestrator::from_config(&config, factory));

    match cli.command.unwrap_or(Mode::Chat { file: None }) {
        Mode::Chat { file } => repl::run(Session::new(orchestrator), file).await,
        Mode::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            serve(config, orchestrator).await
        }
    }
}

async fn serve(config: Config, orchestrator: Arc<Orchestrator>) -> Result<()> {
    log::info!("🚀 Starting Andy the Analyst dashboard");
    let store = SessionStore::new(orchestrator);
    let port = config.server_port;
    let config = web::Data::new(config);
    let store = web::Data::new(store);

    log::info!("🌐 Starting server at http://127.0.0.1:{}", port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(config.clone())
            .app_data(store.clone())
            .configure(handlers::routes)
    })
    .bind(("127.0.0.1", port))
    .map_err(|e| {
        log::error!("❌ Failed to bind to port {}: {}", port, e);
        e
    })
    .with_context(|| format!("Failed to bind to port {}", port))?
    .run()
    .await
    .context("Server stopped unexpectedly")
}
