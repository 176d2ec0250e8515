//! ytt - YouTube channel catalog and transcript fetcher.

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use ytt::oauth::OAuthManager;

#[derive(Parser)]
#[command(name = "ytt")]
#[command(about = "YouTube channel catalog and transcript fetcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OAuth client secrets file
    #[arg(long, global = true, default_value = "secrets/oauth.json")]
    oauth: PathBuf,

    /// Cached token file
    #[arg(long, global = true, default_value = "secrets/token.json")]
    token_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Force a new authorization flow and cache the token
    Auth,

    /// List a channel's uploads, skipping shorts
    List {
        /// Channel ID (defaults to the authenticated user's channel)
        #[arg(short, long)]
        channel: Option<String>,

        /// Minimum video length, in seconds
        #[arg(long, default_value_t = 60)]
        min_duration: u64,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Download a caption track for one video
    Transcript {
        /// YouTube video ID
        video_id: String,

        /// Output directory for transcript files
        #[arg(short, long, default_value = "outputs")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let mut consent_prompt = async |url: &str| {
        eprintln!("Opening browser for authorization...");
        eprintln!("If it doesn't open automatically, go to: {url}");
        if let Err(e) = webbrowser::open(url) {
            tracing::debug!(error = %e, "could not open browser");
        }
    };

    match cli.command {
        Commands::Auth => {
            let config = ytt::config::load(&cli.oauth).await?;
            let token = OAuthManager::new(config)
                .authenticate(&mut consent_prompt)
                .await?;
            ytt::token_store::save(&cli.token_file, &token).await?;
            eprintln!("Authorization complete.");
        }
        Commands::List {
            channel,
            min_duration,
            json,
        } => {
            let client =
                ytt::obtain_authorized_client(&cli.oauth, &cli.token_file, &mut consent_prompt)
                    .await?;
            let videos = client.list_videos(channel.as_deref(), min_duration).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&videos)?);
            } else {
                for video in &videos {
                    println!(
                        "{}  {:>12}  {}  {}",
                        video.video_id,
                        video.view_count,
                        video.published_at.strftime("%Y-%m-%d"),
                        video.title
                    );
                }
            }
        }
        Commands::Transcript { video_id, output } => {
            let client =
                ytt::obtain_authorized_client(&cli.oauth, &cli.token_file, &mut consent_prompt)
                    .await?;
            let path = ytt::transcript::download_transcript(&client, &video_id, &output).await?;
            eprintln!("Transcript saved to {}", path.display());
        }
    }

    Ok(())
}
