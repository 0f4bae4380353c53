use clap::{Parser, Subcommand};
use log::{error, info};
use rscrobbler::clients::{
    LastFmClient,
    errors::{Error, Result},
};
use rscrobbler::config::Config;
use rscrobbler::scrobbler::Scrobbler;

#[derive(Parser)]
#[command(name = "rscrobbler")]
#[command(version, about = "Scrobble played tracks to Last.fm by title", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrobble one or more tracks as played now
    Scrobble {
        #[arg(required = true)]
        titles: Vec<String>,
        /// Maximum number of tracks submitted at once
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Mark a track as currently playing
    NowPlaying { title: String },
    /// Show which catalog track a title resolves to
    Search { title: String },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    info!("Building config ...");
    let config = Config::from_env()?;
    let client = connect(&config).await;

    match cli.command {
        Commands::Scrobble {
            titles,
            concurrency,
        } => {
            let report = Scrobbler::new(client)
                .with_concurrency(concurrency)
                .scrobble_all(titles)
                .await;
            for track in &report.scrobbled {
                println!("scrobbled: {track}");
            }
            for title in &report.not_found {
                println!("not found: {title}");
            }
            for e in &report.failed {
                println!("failed: {e}");
            }
        }
        Commands::NowPlaying { title } => {
            let track = client.try_update_now_playing(title.as_str()).await?;
            println!("now playing: {track}");
        }
        Commands::Search { title } => match client.search_track(&title).await? {
            Some(track) => println!("{track}"),
            None => return Err(Error::TrackNotFound(title)),
        },
    }
    Ok(())
}

// Without a session nothing else can work, so authentication failures end the process here
async fn connect(config: &Config) -> LastFmClient {
    info!("Authorizing LastFM client ...");
    match config.client_builder().connect().await {
        Ok(client) => client,
        Err(e) => {
            error!("{e}");
            if let Some(source) = std::error::Error::source(&e) {
                error!("Caused by: {source}");
            }
            std::process::exit(1);
        }
    }
}
