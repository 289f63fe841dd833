/// Ingestion pipeline configuration loaded from environment variables.
///
/// All fields have fixed defaults; override via environment in
/// production.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Tile edge length in pixels (default: `256`). Every produced tile
    /// is exactly `tile_size x tile_size`.
    pub tile_size: u32,
    /// Maximum source image area in pixels, `width * height`
    /// (default: `25_000_000`, i.e. 5000x5000).
    pub image_pixel_limit: u64,
    /// Maximum source image size in bytes (default: `20_000_000`).
    pub image_byte_limit: u64,
    /// Tiles per persistence batch, and the bound on concurrent tile
    /// uploads within a batch (default: `30`).
    pub upload_batch_size: usize,
    /// Readiness poll attempts before a forced pod exec gives up
    /// (default: `15`).
    pub pod_retry_limit: u32,
    /// Interval between readiness polls in milliseconds
    /// (default: `1000`).
    pub pod_retry_interval_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            image_pixel_limit: 25_000_000,
            image_byte_limit: 20_000_000,
            upload_batch_size: 30,
            pod_retry_limit: 15,
            pod_retry_interval_ms: 1000,
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default      |
    /// |-------------------------|--------------|
    /// | `TILE_SIZE`             | `256`        |
    /// | `IMAGE_PIXEL_LIMIT`     | `25000000`   |
    /// | `IMAGE_BYTE_LIMIT`      | `20000000`   |
    /// | `UPLOAD_BATCH_SIZE`     | `30`         |
    /// | `POD_RETRY_LIMIT`       | `15`         |
    /// | `POD_RETRY_INTERVAL_MS` | `1000`       |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            tile_size: env_or("TILE_SIZE", defaults.tile_size),
            image_pixel_limit: env_or("IMAGE_PIXEL_LIMIT", defaults.image_pixel_limit),
            image_byte_limit: env_or("IMAGE_BYTE_LIMIT", defaults.image_byte_limit),
            upload_batch_size: env_or("UPLOAD_BATCH_SIZE", defaults.upload_batch_size),
            pod_retry_limit: env_or("POD_RETRY_LIMIT", defaults.pod_retry_limit),
            pod_retry_interval_ms: env_or(
                "POD_RETRY_INTERVAL_MS",
                defaults.pod_retry_interval_ms,
            ),
        }
    }
}

/// Read an environment variable, falling back to `default` when unset.
///
/// Panics when the variable is set but unparseable -- misconfiguration
/// should fail at startup, not mid-pipeline.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
