use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

use cinepick::{
    config::Config,
    db::{create_redis_client, Cache, CacheWriterHandle},
    models::{CandidateItem, FilterCriteria, ListMembership, MediaId, MediaKind},
    services::{
        catalog::{CatalogProvider, TmdbCatalog},
        selection::{DiscoverySession, SelectionEngine},
        watchlist::{FileStore, KeyValueWatchlist, RemoteWatchlist, WatchlistBackend, WatchlistStore},
    },
};

/// cinepick - random movie and series picker
#[derive(Parser)]
#[command(name = "discover")]
#[command(about = "Pick random titles from TMDb and keep a watchlist", long_about = None)]
struct Cli {
    /// Directory holding the local watchlist files
    #[arg(long, default_value = ".cinepick")]
    watchlist_dir: PathBuf,

    /// Bearer token for the watchlist service; uses the local files when absent
    #[arg(long, env = "CINEPICK_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Pick TV series instead of movies
    #[arg(long)]
    series: bool,

    #[arg(long, default_value = "0")]
    min_rating: f64,

    #[arg(long, default_value = "10")]
    max_rating: f64,

    #[arg(long)]
    year_from: Option<i32>,

    #[arg(long)]
    year_to: Option<i32>,

    #[arg(long, default_value = "0")]
    min_votes: u32,

    /// Genre id to require; repeat for several
    #[arg(long = "genre")]
    genres: Vec<u32>,
}

impl FilterArgs {
    fn into_filters(self) -> FilterCriteria {
        let kind = if self.series {
            MediaKind::Series
        } else {
            MediaKind::Movie
        };

        let mut filters = FilterCriteria::new(kind);
        filters.min_rating = self.min_rating;
        filters.max_rating = self.max_rating;
        filters.min_vote_count = self.min_votes;
        if let Some(year) = self.year_from {
            filters.year_from = year;
        }
        if let Some(year) = self.year_to {
            filters.year_to = year;
        }
        for genre in self.genres {
            filters.toggle_genre(genre);
        }
        filters
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Pick random titles matching the filters
    Pick {
        #[command(flatten)]
        filters: FilterArgs,

        /// How many titles to pick in one session (never repeated)
        #[arg(long, default_value = "1")]
        count: usize,

        /// Save every pick to this list (to_watch or watched)
        #[arg(long)]
        save: Option<ListMembership>,

        /// Show the YouTube trailer of each pick
        #[arg(long)]
        trailer: bool,
    },

    /// List the genre ids accepted by --genre
    Genres,

    /// Show a watchlist
    List {
        /// to_watch or watched
        #[arg(long, default_value = "to_watch")]
        status: ListMembership,
    },

    /// Move a saved title to the watched list
    Watched {
        #[arg(long)]
        id: MediaId,
    },

    /// Remove a saved title
    Remove {
        #[arg(long)]
        id: MediaId,

        #[arg(long, default_value = "to_watch")]
        status: ListMembership,
    },

    /// Show watchlist counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cinepick=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let backend: Arc<dyn WatchlistBackend> = match &cli.token {
        Some(token) => Arc::new(RemoteWatchlist::from_config(&config, token.clone())),
        None => Arc::new(KeyValueWatchlist::new(Arc::new(FileStore::new(&cli.watchlist_dir)))),
    };
    let watchlist = WatchlistStore::new(backend);

    match cli.command {
        Commands::Pick {
            filters,
            count,
            save,
            trailer,
        } => handle_pick(&config, &watchlist, filters.into_filters(), count, save, trailer).await?,
        Commands::Genres => handle_genres(&config).await?,
        Commands::List { status } => {
            for entry in watchlist.list(status).await? {
                print_item(&entry.item, &config.tmdb_image_url);
            }
        }
        Commands::Watched { id } => {
            if !watchlist.move_to_watched(id, chrono::Utc::now()).await? {
                return Err(anyhow!("Title {} is not on the to_watch list", id));
            }
            println!("Moved {} to watched", id);
        }
        Commands::Remove { id, status } => {
            if !watchlist.remove(id, status).await? {
                return Err(anyhow!("Title {} is not on the {} list", id, status));
            }
            println!("Removed {} from {}", id, status);
        }
        Commands::Stats => {
            let stats = watchlist.statistics().await?;
            println!(
                "to watch: {}  watched: {}  total: {}",
                stats.to_watch_count, stats.watched_count, stats.total_count
            );
            for (genre, count) in &stats.genre_counts {
                println!("  {:<24} {}", genre, count);
            }
        }
    }

    Ok(())
}

/// Builds the catalog, with the Redis response cache when REDIS_URL is set
async fn build_catalog(config: &Config) -> Result<(TmdbCatalog, Option<CacheWriterHandle>)> {
    let catalog = TmdbCatalog::from_config(config)?;

    match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url).context("Invalid REDIS_URL")?;
            let (cache, handle) = Cache::new(client).await;
            Ok((catalog.with_cache(cache), Some(handle)))
        }
        None => Ok((catalog, None)),
    }
}

async fn handle_pick(
    config: &Config,
    watchlist: &WatchlistStore,
    filters: FilterCriteria,
    count: usize,
    save: Option<ListMembership>,
    trailer: bool,
) -> Result<()> {
    let (catalog, cache_handle) = build_catalog(config).await?;
    let catalog: Arc<dyn CatalogProvider> = Arc::new(catalog);
    let session = DiscoverySession::new(Arc::new(SelectionEngine::new(catalog.clone())));

    for _ in 0..count {
        let item = match session.generate(&filters).await {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed");
                println!("{}", e.user_message());
                break;
            }
        };

        print_item(&item, &config.tmdb_image_url);

        if trailer {
            let videos = catalog.fetch_videos(item.kind, item.id).await?;
            if let Some(video) = videos.iter().find(|video| video.is_youtube_trailer()) {
                println!("    trailer: https://www.youtube.com/watch?v={}", video.key);
            }
        }

        match save {
            Some(ListMembership::Watched) => {
                if !watchlist.mark_watched(&item).await? {
                    println!("    already saved");
                }
            }
            Some(membership) => {
                if !watchlist.add(&item, membership).await? {
                    println!("    already saved");
                }
            }
            None => {}
        }
    }

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }
    Ok(())
}

async fn handle_genres(config: &Config) -> Result<()> {
    let (catalog, cache_handle) = build_catalog(config).await?;

    for genre in catalog.fetch_genres().await? {
        println!("{:>6}  {}", genre.id, genre.name);
    }

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }
    Ok(())
}

fn print_item(item: &CandidateItem, image_base_url: &str) {
    let year = item
        .release_year()
        .map(|year| year.to_string())
        .unwrap_or_else(|| "----".to_string());

    println!(
        "[{}] {} ({}) - {:.1}/10, {} votes",
        item.id, item.title, year, item.vote_average, item.vote_count
    );
    println!("    {}", item.overview);
    if let Some(url) = item.poster_url(image_base_url) {
        println!("    poster: {}", url);
    }
}
