//! Binary entry point: CLI flags to state wiring.

use clap::Parser;
use cotiza_search::SearchClient;
use cotiza_server::{run_server, AppState};
use cotiza_store::{StoreConfig, WorkbookStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "cotiza-server", version, about = "Quotation workbook service")]
struct Cli {
    /// Path of the live workbook file
    #[arg(long, env = "COTIZA_WORKBOOK", default_value = "data/plantilla.xlsx")]
    workbook: PathBuf,

    /// Directory for timestamped backups (default: sibling backups/)
    #[arg(long, env = "COTIZA_BACKUP_DIR")]
    backup_dir: Option<PathBuf>,

    /// Directory for exported copies (default: sibling exports/)
    #[arg(long, env = "COTIZA_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// How many backups to keep
    #[arg(long, env = "COTIZA_BACKUP_RETENTION", default_value_t = 10)]
    backup_retention: usize,

    /// Host to bind
    #[arg(long, env = "COTIZA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, env = "COTIZA_PORT", default_value_t = 8080)]
    port: u16,

    /// Base URL of the upstream search API; /search reports an error when unset
    #[arg(long, env = "COTIZA_SEARCH_URL")]
    search_url: Option<String>,

    /// Country code sent with search queries
    #[arg(long, env = "COTIZA_SEARCH_COUNTRY", default_value = "co")]
    search_country: String,

    /// Language code sent with search queries
    #[arg(long, env = "COTIZA_SEARCH_LANGUAGE", default_value = "es")]
    search_language: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cotiza_server=info,cotiza_store=info,tower_http=info".into()
            }),
        )
        .init();

    let mut config = StoreConfig::new(cli.workbook).with_retention(cli.backup_retention);
    if let Some(dir) = cli.backup_dir {
        config = config.with_backup_dir(dir);
    }
    if let Some(dir) = cli.export_dir {
        config = config.with_export_dir(dir);
    }

    let search = match cli.search_url {
        Some(url) => {
            Some(SearchClient::new(url)?.with_locale(&cli.search_country, &cli.search_language))
        }
        None => {
            warn!("no search upstream configured; /search will report an error");
            None
        }
    };

    let state = Arc::new(AppState {
        store: WorkbookStore::new(config),
        search,
    });

    run_server(&cli.host, cli.port, state).await
}
