use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use scriptsync_core::ScriptRoot;
use scriptsync_server::{router, BroadcastNotifier};
use scriptsync_session::{DtsStore, SessionRegistry};
use scriptsync_watch::{CommandEditor, NotifyWatcherFactory};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Managed root directory holding one subdirectory per script
    #[arg(long)]
    root: Option<Utf8PathBuf>,
    /// Directory the shared declaration files are written to
    #[arg(long)]
    dts_dir: Option<Utf8PathBuf>,
    /// Port for the HTTP bridge
    #[arg(short, long, default_value_t = scriptsync_config::DEFAULT_PORT)]
    port: u16,
    /// Editor command used to open pushed entry files
    #[arg(long, default_value = "code", env = "SCRIPTSYNC_EDITOR")]
    editor: String,
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    let dirs = directories::ProjectDirs::from("", "", "scriptsync")
        .ok_or_else(|| anyhow::anyhow!("could not determine a data directory"))?;
    let data_dir = Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf())
        .map_err(|p| anyhow::anyhow!("data directory {} is not UTF-8", p.display()))?;
    let root = cli.root.unwrap_or_else(|| data_dir.join("scripts"));
    let dts_dir = cli.dts_dir.unwrap_or_else(|| data_dir.join("declarations"));
    std::fs::create_dir_all(&root)?;

    let notifier = Arc::new(BroadcastNotifier::new(256));
    // Keep one subscriber alive so push events are observable in the logs
    // even before a socket transport attaches.
    let mut events = notifier.subscribe();
    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            debug!("Push event for {}: {:?}", ev.socket_id, ev.payload);
        }
    });

    let registry = Arc::new(SessionRegistry::new(
        ScriptRoot::new(root.clone()),
        DtsStore::new(dts_dir),
        Arc::new(NotifyWatcherFactory),
        notifier,
        Arc::new(CommandEditor::new(cli.editor)),
    ));

    let app = router(registry);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;
    info!(
        "scriptsync listening on {} (root: {})",
        listener.local_addr()?,
        root
    );
    axum::serve(listener, app).await?;
    Ok(())
}
