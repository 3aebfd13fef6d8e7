use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use channel_watch::{
    gemini::GeminiClient,
    line::LineNotifier,
    parse_channels,
    tracing::init_tracing_subscriber,
    yt::{
        artifact::ArtifactCache, audio_handler::YtDlpFetcher, scanner::YtDlpScanner, ytdlp::YtDlp,
    },
    ChannelWatcherBuilder, Schedule, WatchConfig,
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use video_ledger::FileLedger;

#[derive(Parser)]
#[command(
    name = "channel-watch",
    about = "Turns new channel uploads into finance briefs pushed to LINE"
)]
struct Cli {
    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: String,

    /// LINE messaging channel access token
    #[arg(long, env = "LINE_CHANNEL_ACCESS_TOKEN", hide_env_values = true)]
    line_token: String,

    /// LINE user receiving the reports
    #[arg(long, env = "LINE_USER_ID", hide_env_values = true)]
    line_user_id: String,

    /// Comma separated channel urls, scanned in order
    #[arg(long, env = "TARGET_CHANNELS", default_value = "")]
    channels: String,

    /// Working directory for audio artifacts
    #[arg(long, env = "WATCH_WORKDIR", default_value = "/var/tmp/channel-watch")]
    workdir: PathBuf,

    /// Ledger of processed videos, defaults to `<workdir>/processed_videos.txt`
    #[arg(long, env = "WATCH_HISTORY_FILE")]
    history_file: Option<PathBuf>,

    /// Seconds between two polls
    #[arg(long, default_value = "60")]
    poll_interval_secs: u64,

    /// Seconds to wait after the model provider rate limited us
    #[arg(long, default_value = "900")]
    cooldown_secs: u64,

    /// Seconds between two channel scans
    #[arg(long, default_value = "2")]
    channel_delay_secs: u64,

    /// Failed attempts allowed per video before giving up until restart
    #[arg(long)]
    max_content_retries: Option<u32>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = GeminiClient::DEFAULT_MODEL)]
    model: String,

    /// yt-dlp executable
    #[arg(long, env = "YTDLP_BIN", default_value = "yt-dlp")]
    yt_dlp_bin: PathBuf,

    /// Path to yt-dlp cookies file
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    cookies_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the channels until interrupted (default)
    Watch,
    /// Run a single iteration and exit
    Run,
}

impl From<Cli> for WatchConfig {
    fn from(cli: Cli) -> Self {
        let history_file = cli
            .history_file
            .unwrap_or_else(|| cli.workdir.join(WatchConfig::HISTORY_FILE_NAME));

        WatchConfig {
            google_api_key: cli.google_api_key,
            line_token: cli.line_token,
            line_user_id: cli.line_user_id,
            channels: parse_channels(&cli.channels),
            workdir: cli.workdir,
            history_file,
            schedule: Schedule {
                poll_interval: Duration::from_secs(cli.poll_interval_secs),
                cooldown: Duration::from_secs(cli.cooldown_secs),
                channel_delay: Duration::from_secs(cli.channel_delay_secs),
            },
            max_content_retries: cli.max_content_retries,
            model: cli.model,
            yt_dlp_bin: cli.yt_dlp_bin,
            cookies_path: cli.cookies_path,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let mut cli = Cli::parse();
    init_tracing_subscriber()?;

    let command = cli.command.take().unwrap_or(Command::Watch);
    let config = WatchConfig::from(cli);
    config.validate().context("Invalid configuration")?;
    tracing::info!(?config, "Configuration loaded");

    let yt_dlp = YtDlp::new(&config.yt_dlp_bin).with_cookies(config.cookies_path.clone());
    let generator = GeminiClient::new(&config.google_api_key).with_model(&config.model);
    let notifier = LineNotifier::new(&config.line_token, &config.line_user_id);

    let mut watcher = ChannelWatcherBuilder::new()
        .ledger(FileLedger::new(&config.history_file))
        .scanner(YtDlpScanner::new(yt_dlp.clone()))
        .fetcher(YtDlpFetcher::new(yt_dlp, ArtifactCache::new(&config.workdir)))
        .generator(generator)
        .notifier(notifier)
        .channels(config.channels.clone())
        .schedule(config.schedule)
        .max_content_retries(config.max_content_retries)
        .build();

    let cancel = CancellationToken::new();

    match command {
        Command::Run => {
            tracing::info!("Running a single iteration...");
            let report = watcher
                .run_iteration(&cancel)
                .await
                .context("Iteration failed")?;
            tracing::info!(?report, "Iteration finished");
        }
        Command::Watch => {
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = ?e, "Failed to listen for interrupt");
                    return;
                }
                tracing::warn!("Interrupt received, stopping after the current step");
                shutdown.cancel();
            });

            watcher.run(cancel).await;
        }
    }

    Ok(())
}
