//! High-level async client that turns Terrain-RGB tiles into terrain meshes.
//!
//! This crate fetches color-encoded heightmap tiles, runs them through the
//! synchronous pipeline in [`terrain_rgb_decode`], and attaches the
//! resulting meshes to tile containers owned by the caller's scene thread.
//!
//! # Design principles
//!
//! - **Injected I/O**: Image fetching is a trait; the HTTP fetcher is one
//!   implementation
//! - **Explicit completion**: Finished tiles arrive as messages that the
//!   owning thread applies, never as callbacks mutating shared state
//! - **Sync decoding**: Decode functions are synchronous; tasks parallelize

mod error;

pub mod cache;
pub mod config;
pub mod controller;
pub mod fetch;
pub mod key;
pub mod pipeline;
pub mod request;
pub mod tile;
pub mod tiling;

pub use cache::{Cache, MemoryCache, NoCache};
pub use config::{ControllerConfig, MeshOptions, ProjectionKind, TileResolution};
pub use controller::TileController;
pub use error::{Error, Result};
pub use fetch::{HttpFetcher, ImageFetcher};
pub use key::TileKey;
pub use pipeline::{TileMeshes, build_tile_meshes};
pub use request::tile_url;
pub use tile::{ResourceInfo, Tile, TileHandle};
pub use tiling::{TileBounds, TilingScheme, WebMercatorTilingScheme};
