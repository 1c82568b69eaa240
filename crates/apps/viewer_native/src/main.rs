mod feed;
mod http;
mod store;
mod surface;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use foundation::{Coordinate, Millis};
use reqwest::Client;
use streaming::{Fetcher, TileKey};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use viewport::{ViewportConfig, ViewportEngine, ViewportEvent};

use crate::http::{HttpPixels, HttpTiles};
use crate::store::FsStore;
use crate::surface::PngSurface;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render a view of the torus canvas to a PNG")]
struct Args {
    /// Tile server base URL (default: $TORUS_TILES_URL)
    #[arg(long)]
    tiles_url: Option<String>,

    /// Pixel API base URL; pixel mode stays empty without it
    #[arg(long)]
    pixels_url: Option<String>,

    /// Websocket URL of the tile invalidation feed
    #[arg(long)]
    feed_url: Option<String>,

    /// Tile store directory (default: $TORUS_STORE_DIR)
    #[arg(long)]
    store_dir: Option<String>,

    /// JSON viewport configuration; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(long, default_value_t = 100.0)]
    zoom: f64,

    /// World cell under the middle of the view
    #[arg(long, default_value_t = 0)]
    center_x: u32,

    #[arg(long, default_value_t = 0)]
    center_y: u32,

    /// Stop after this long without fetch completions or invalidations
    #[arg(long, default_value_t = 2000)]
    linger_ms: u64,

    #[arg(long, default_value = "frame.png")]
    out: PathBuf,
}

async fn load_config(path: Option<&Path>) -> Result<ViewportConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(ViewportConfig::default());
    };
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}

async fn next_invalidation(rx: &mut Option<mpsc::Receiver<TileKey>>) -> Option<TileKey> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn elapsed(start: Instant) -> Millis {
    Millis(start.elapsed().as_millis() as u64)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let tiles_url = args.tiles_url.clone().unwrap_or_else(|| {
        env::var("TORUS_TILES_URL").unwrap_or_else(|_| "http://127.0.0.1:3000/tiles".to_string())
    });
    let store_dir = args
        .store_dir
        .clone()
        .unwrap_or_else(|| env::var("TORUS_STORE_DIR").unwrap_or_else(|_| "data/tiles".to_string()));
    let config = load_config(args.config.as_deref()).await?;

    let client = Client::new();
    let store = Arc::new(FsStore::open(&store_dir).await?);
    let mut fetcher = Fetcher::new(tiles_url.clone(), Arc::new(HttpTiles::new(client.clone())), store.clone());
    if let Some(pixels_url) = &args.pixels_url {
        fetcher = fetcher.with_pixel_source(Arc::new(HttpPixels::new(client.clone(), pixels_url.clone())));
    }

    let mut engine = ViewportEngine::new(config, args.width, args.height, args.zoom);
    engine.set_center(Coordinate::new(args.center_x, args.center_y));
    engine.subscribe(|event| match &event.payload {
        ViewportEvent::WorldviewChanged(bounds) => info!(frame = event.frame_index, ?bounds, "worldview"),
        other => debug!(frame = event.frame_index, event = ?other, "viewport event"),
    });

    let restored = engine.restore_tiles(fetcher.restore().await);
    info!(%tiles_url, store = %store.root().display(), restored, "viewer started");

    let mut invalidations = args.feed_url.clone().map(|url| {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(feed::run(url, tx));
        rx
    });

    let start = Instant::now();
    let linger = Duration::from_millis(args.linger_ms);
    let mut surface = PngSurface::new();
    loop {
        if engine.needs_render() {
            engine.render(&mut surface, elapsed(start))?;
        }
        fetcher.start_all(engine.take_fetch_jobs());

        let busy = !fetcher.is_idle();
        let listening = invalidations.is_some();
        if !busy && !listening {
            break;
        }

        tokio::select! {
            Some(done) = fetcher.next(), if busy => {
                engine.apply(done);
            }
            key = next_invalidation(&mut invalidations), if listening => match key {
                Some(key) => {
                    engine.invalidate_tile(&key);
                }
                None => invalidations = None,
            },
            _ = tokio::time::sleep(linger) => {
                info!(in_flight = fetcher.in_flight(), "idle, stopping");
                break;
            }
        }
    }

    if engine.needs_render() {
        engine.render(&mut surface, elapsed(start))?;
    }
    if surface.write_to(&args.out).await? {
        info!(out = %args.out.display(), frames = surface.presents(), "frame written");
    }
    info!(metrics = %engine.metrics(), "done");
    Ok(())
}
