mod config;

use std::sync::Arc;

use {
    clap::Parser,
    secrecy::{ExposeSecret, Secret},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    courier_directory::{ContextStore, DomainStore, GroupStore},
    courier_flows::Dispatcher,
    courier_telegram::TelegramTransport,
};

#[derive(Parser)]
#[command(name = "courier", about = "Courier — membership-gated Telegram relay bot")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Path to the config file (default: platform config dir).
    #[arg(long, env = "COURIER_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Custom data directory (overrides default data dir).
    #[arg(long, env = "COURIER_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Bot token (overrides the config file).
    #[arg(long, env = "COURIER_BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "courier starting");

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(token) = cli.bot_token {
        config.telegram.token = Secret::new(token);
    }
    if config.telegram.token.expose_secret().is_empty() {
        anyhow::bail!(
            "no bot token configured; set COURIER_BOT_TOKEN or telegram.token in the config file"
        );
    }

    let data_dir = match cli.data_dir.or(config.data_dir.take()) {
        Some(dir) => dir,
        None => config::default_data_dir()?,
    };
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("courier.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    let pool = sqlx::SqlitePool::connect(&db_url).await?;
    courier_directory::init_schema(&pool).await?;
    info!(db = %db_path.display(), "directory ready");

    let bot = courier_telegram::build_bot(&config.telegram)?;
    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        ContextStore::new(pool.clone()),
        DomainStore::new(pool.clone()),
        GroupStore::new(pool),
        transport,
    ));

    let cancel = courier_telegram::start_polling(bot, dispatcher).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            cancel.cancel();
        },
        () = cancel.cancelled() => {
            info!("polling stopped");
        },
    }
    Ok(())
}
