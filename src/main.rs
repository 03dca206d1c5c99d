use clap::{Parser, Subcommand};
use internboard::api::{AppState, create_router};
use internboard::config::CONFIG;
use internboard::db::Database;
use internboard::mail;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "internboard", about = "Internship listings and applicant management")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve,
    /// Create indexes and seed the default admin and site settings
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (also picks up records from the log crate)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let db = Database::init_global().await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::InitDb => db.init_defaults(&CONFIG.default_admin).await?,
        Command::Serve => serve(db.clone()).await?,
    }
    Ok(())
}

async fn serve(db: Database) -> anyhow::Result<()> {
    let config = CONFIG.clone();
    let mailer = mail::from_config(&config.mail)?;
    let state = AppState::new(db, mailer, config);
    state.uploads.ensure_dir().await?;

    let address = state.config.bind_addr.clone();
    let app = create_router(state);

    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
