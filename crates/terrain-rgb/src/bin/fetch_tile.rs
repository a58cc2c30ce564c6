//! Fetch one Terrain-RGB tile and save it with a mesh summary.
//!
//! Usage: `fetch_tile <level> <column> <row>`. The access token is read
//! from `TERRAIN_RGB_ACCESS_TOKEN`. Settings can be given as a JSON file
//! named by `TERRAIN_RGB_CONFIG`; missing fields keep their defaults.
//! Writes the raw image and a JSON summary to `tile_data/`.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use terrain_rgb::config::ACCESS_TOKEN_ENV;
use terrain_rgb::{
    ControllerConfig, HttpFetcher, ImageFetcher, TileKey, TileMeshes, TilingScheme,
    WebMercatorTilingScheme, build_tile_meshes, tile_url,
};
use tracing_subscriber::EnvFilter;

const OUTPUT_DIR: &str = "tile_data";
const CONFIG_ENV: &str = "TERRAIN_RGB_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let key = parse_key()?;
    let config = load_config()?;

    // Create output directory.
    let output_path = Path::new(OUTPUT_DIR);
    fs::create_dir_all(output_path)?;
    let safe_key = key.to_string().replace('/', "_");

    println!("Fetching terrain tile {key}...\n");

    // Fetch and save the raw image.
    println!("1. Fetching heightmap image...");
    let bytes = HttpFetcher::new().fetch(&tile_url(&config, key)).await?;
    let image_path = output_path.join(format!("tile_{safe_key}.{}", config.format));
    File::create(&image_path)?.write_all(&bytes)?;
    println!("   Saved {} bytes to {}", bytes.len(), image_path.display());

    // Decode and mesh.
    println!("\n2. Building meshes...");
    let bounds = WebMercatorTilingScheme.tile_bounds(key);
    let meshes = build_tile_meshes(&bytes, &bounds, &config.mesh, None)?;
    let (min, max) = meshes.elevation_range.unwrap_or_default();
    println!(
        "   {}px heightmap, elevation {min:.1}m to {max:.1}m",
        meshes.texture.size()
    );
    println!(
        "   Mesh: {} vertices, {} triangles",
        meshes.terrain.vertex_count(),
        meshes.terrain.triangle_count()
    );

    // Save the summary.
    println!("\n3. Writing summary...");
    let summary_path = output_path.join(format!("tile_{safe_key}.json"));
    save_summary(&summary_path, key, &config, &meshes)?;
    println!("   Saved summary to {}", summary_path.display());

    Ok(())
}

fn parse_key() -> Result<TileKey, Box<dyn std::error::Error>> {
    let args: Vec<u32> = std::env::args()
        .skip(1)
        .map(|arg| arg.parse())
        .collect::<Result<_, _>>()?;
    let [level, column, row] = args[..] else {
        return Err("usage: fetch_tile <level> <column> <row>".into());
    };

    let key = TileKey::new(level, column, row);
    if !key.is_valid() {
        return Err(format!("tile {key} does not exist").into());
    }
    Ok(key)
}

/// Settings from the optional config file, with the token from the environment.
fn load_config() -> Result<ControllerConfig, Box<dyn std::error::Error>> {
    let mut config = match std::env::var(CONFIG_ENV) {
        Ok(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        Err(_) => ControllerConfig::default(),
    };
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        config.access_token = token;
    }
    if config.access_token.is_empty() {
        return Err(format!("{ACCESS_TOKEN_ENV} is not set").into());
    }
    Ok(config)
}

fn save_summary(
    path: &Path,
    key: TileKey,
    config: &ControllerConfig,
    meshes: &TileMeshes,
) -> Result<(), Box<dyn std::error::Error>> {
    let (min, max) = meshes.elevation_range.unwrap_or_default();
    let summary = serde_json::json!({
        "key": key.to_string(),
        "morton_code": key.morton_code(),
        "image_size": meshes.texture.size(),
        "resolution": config.mesh.resolution,
        "min_elevation": min,
        "max_elevation": max,
        "center": [
            meshes.terrain.center().x,
            meshes.terrain.center().y,
            meshes.terrain.center().z,
        ],
        "vertex_count": meshes.terrain.vertex_count(),
        "triangle_count": meshes.terrain.triangle_count(),
        "has_water": meshes.water.is_some(),
    });
    File::create(path)?.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;
    Ok(())
}
