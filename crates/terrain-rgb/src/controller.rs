//! Per-tile fetch orchestration.
//!
//! Every [`TileController::request_tile`] call returns an empty tile at
//! once and spawns a task on the injected Tokio runtime that fetches the
//! heightmap and builds its meshes. Finished work comes back over an
//! `async_channel` as a tile-ready message. Tiles are only mutated when the
//! owning thread applies those messages with [`TileController::poll_ready`]
//! or [`TileController::wait_ready`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use terrain_rgb_decode::{GeometryRefiner, SphereProjection, SphericalSubdivision};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::{
    ControllerConfig, Error, ImageFetcher, MeshOptions, ProjectionKind, Result, Tile,
    TileBounds, TileHandle, TileKey, TileMeshes, TilingScheme, build_tile_meshes, tile_url,
};

type SharedRefiner = Arc<dyn GeometryRefiner + Send + Sync>;

/// Message sent by a finished request task.
struct TileReady {
    request: u64,
    key: TileKey,
    result: Result<TileMeshes>,
}

/// Reports a request's outcome exactly once.
///
/// If the task ends without calling [`ReadySender::send`] (it panicked or
/// was aborted), dropping the sender reports [`Error::TaskFailed`].
struct ReadySender {
    tx: async_channel::Sender<TileReady>,
    request: u64,
    key: TileKey,
    sent: bool,
}

impl ReadySender {
    fn send(mut self, result: Result<TileMeshes>) {
        self.sent = true;
        self.deliver(result);
    }

    fn deliver(&self, result: Result<TileMeshes>) {
        // Unbounded, so this only fails once the controller is gone.
        let _ = self.tx.try_send(TileReady {
            request: self.request,
            key: self.key,
            result,
        });
    }
}

impl Drop for ReadySender {
    fn drop(&mut self) {
        if !self.sent {
            self.deliver(Err(Error::TaskFailed));
        }
    }
}

/// A request whose result has not been applied yet.
struct PendingTile {
    tile: Weak<RefCell<Tile>>,
    task: JoinHandle<()>,
}

/// Fetches terrain tiles and attaches their meshes.
///
/// The controller lives on the scene thread. Fetching and meshing run on
/// the runtime behind `runtime`; at most `max_concurrent_fetches` requests
/// do so at once, the rest wait for a permit.
pub struct TileController<F: ImageFetcher, S: TilingScheme> {
    fetcher: Arc<F>,
    scheme: S,
    config: Arc<ControllerConfig>,
    refiner: SharedRefiner,
    runtime: Handle,
    permits: Arc<Semaphore>,
    ready_tx: async_channel::Sender<TileReady>,
    ready_rx: async_channel::Receiver<TileReady>,
    pending: HashMap<u64, PendingTile>,
    next_request: u64,
    redraw: Box<dyn Fn()>,
}

impl<F: ImageFetcher, S: TilingScheme> TileController<F, S> {
    /// Create a controller.
    ///
    /// `redraw` is called on the owning thread each time a tile receives
    /// terrain.
    pub fn new(
        fetcher: F,
        scheme: S,
        config: ControllerConfig,
        runtime: Handle,
        redraw: impl Fn() + 'static,
    ) -> Self {
        let refiner = Arc::new(SphericalSubdivision::from_degrees(
            config.mesh.max_subdivision_angle_deg,
        ));
        let permits = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
        let (ready_tx, ready_rx) = async_channel::unbounded();
        Self {
            fetcher: Arc::new(fetcher),
            scheme,
            config: Arc::new(config),
            refiner,
            runtime,
            permits,
            ready_tx,
            ready_rx,
            pending: HashMap::new(),
            next_request: 0,
            redraw: Box::new(redraw),
        }
    }

    /// Replace the refiner used for spherical projections.
    #[must_use]
    pub fn with_refiner(mut self, refiner: impl GeometryRefiner + Send + Sync + 'static) -> Self {
        self.refiner = Arc::new(refiner);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Requests whose results have not been applied yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Start loading `key` and return its tile.
    ///
    /// The tile is empty until the request's result is applied. Keys that
    /// are invalid or outside the configured levels are not fetched.
    pub fn request_tile(&mut self, key: TileKey) -> TileHandle {
        let bounds = self.scheme.tile_bounds(key);
        let tile = Rc::new(RefCell::new(Tile::new(key, bounds)));

        if !self.accepts(key) {
            tracing::warn!(
                "Not requesting terrain tile {}: outside levels {}..={}",
                key,
                self.config.min_level,
                self.config.max_level
            );
            return tile;
        }

        let request = self.next_request;
        self.next_request += 1;

        let url = tile_url(&self.config, key);
        let fetcher = Arc::clone(&self.fetcher);
        let config = Arc::clone(&self.config);
        let permits = Arc::clone(&self.permits);
        let ready = ReadySender {
            tx: self.ready_tx.clone(),
            request,
            key,
            sent: false,
        };
        let refinement = (self.config.projection == ProjectionKind::Spherical)
            .then(|| (Arc::clone(&self.refiner), self.scheme.sphere_projection()));

        let task = self.runtime.spawn(async move {
            let result = run_request(
                fetcher.as_ref(),
                &url,
                &bounds,
                &config.mesh,
                permits,
                refinement.as_ref(),
            )
            .await;
            ready.send(result);
        });

        self.pending.insert(
            request,
            PendingTile {
                tile: Rc::downgrade(&tile),
                task,
            },
        );
        tracing::debug!("Requested terrain tile {}", key);
        tile
    }

    /// Apply every result that is ready, without waiting.
    ///
    /// Also cancels requests whose tiles were dropped. Returns the number of
    /// tiles that received terrain.
    pub fn poll_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(ready) = self.ready_rx.try_recv() {
            if self.apply(ready) {
                applied += 1;
            }
        }
        self.cancel_stale();
        applied
    }

    /// Wait for the next result and apply it.
    ///
    /// Returns the key of the finished request (whether it succeeded or
    /// not), or `None` when nothing is pending.
    pub async fn wait_ready(&mut self) -> Option<TileKey> {
        while !self.pending.is_empty() {
            let ready = self.ready_rx.recv().await.ok()?;
            // Reports from cancelled requests.
            if !self.pending.contains_key(&ready.request) {
                continue;
            }
            let key = ready.key;
            self.apply(ready);
            return Some(key);
        }
        None
    }

    /// Abort requests whose tiles no longer exist. Returns how many.
    pub fn cancel_stale(&mut self) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, pending| {
            if pending.tile.strong_count() > 0 {
                return true;
            }
            pending.task.abort();
            false
        });
        let cancelled = before - self.pending.len();
        if cancelled > 0 {
            tracing::debug!("Cancelled {} requests for dropped tiles", cancelled);
        }
        cancelled
    }

    fn accepts(&self, key: TileKey) -> bool {
        key.is_valid() && (self.config.min_level..=self.config.max_level).contains(&key.level)
    }

    /// Apply one result to its tile. Returns whether terrain was attached.
    fn apply(&mut self, ready: TileReady) -> bool {
        let Some(pending) = self.pending.remove(&ready.request) else {
            return false;
        };
        let Some(tile) = pending.tile.upgrade() else {
            tracing::debug!("Discarding terrain tile {}: tile was dropped", ready.key);
            return false;
        };

        match ready.result {
            Ok(meshes) => {
                let mut tile = tile.borrow_mut();
                tracing::info!(
                    "Loaded terrain tile {}: {}px heightmap, {} vertices",
                    ready.key,
                    meshes.texture.size(),
                    meshes.terrain.vertex_count()
                );
                tile.add_owned_texture(meshes.texture);
                tile.add_object(meshes.terrain);
                if let Some(water) = meshes.water {
                    tile.add_object(water);
                }
                tile.invalidate_resource_info();
                drop(tile);
                (self.redraw)();
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to load terrain tile {} (morton {}): {}",
                    ready.key,
                    ready.key.morton_code(),
                    e
                );
                false
            }
        }
    }
}

/// Fetch and mesh one tile while holding a concurrency permit.
async fn run_request<F: ImageFetcher, P: SphereProjection>(
    fetcher: &F,
    url: &str,
    bounds: &TileBounds,
    options: &MeshOptions,
    permits: Arc<Semaphore>,
    refinement: Option<&(SharedRefiner, P)>,
) -> Result<TileMeshes> {
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|_| Error::Cancelled)?;
    let bytes = fetcher.fetch(url).await?;

    let refinement = refinement.map(|(refiner, projection)| {
        (
            refiner.as_ref() as &dyn GeometryRefiner,
            projection as &dyn SphereProjection,
        )
    });
    Ok(build_tile_meshes(&bytes, bounds, options, refinement)?)
}
