mod cache;
mod commands;
mod config;
mod constants;
mod error;
mod image_utils;
mod manager;
mod placeholder;
mod sink;
mod task;
mod thumbnail;
mod types;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use commands::generate::{generate, Cli};

pub use cache::{CacheStats, InFlightRegistry, ThumbnailMemoryCache};
pub use config::{CacheConfig, ResizeLimits};
pub use constants::MAX_TARGET_DIMENSION;
pub use error::{BuildError, CacheError, ConfigError, ThumbnailError};
pub use image_utils::{clamp_for_safety, create_thumbnail, fitted_size};
pub use manager::ThumbnailManager;
pub use placeholder::placeholder_for;
pub use sink::{ChannelSink, ReadySink, TokioSink};
pub use thumbnail::{decode_and_resize, Decoder, FileDecoder};
pub use types::{Bitmap, BitmapOrigin, CacheKey, Lookup, PixelFormat, ThumbnailPayload, ThumbnailReady};

/// CLI エントリーポイント
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr へ（RUST_LOG で上書き可能）
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thumbnail_cache=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    generate(cli)
}
