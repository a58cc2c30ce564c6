//! Tile request URLs.

use crate::{ControllerConfig, TileKey};

/// URL of the heightmap image for `key`.
///
/// ```text
/// {base}/{level}/{column}/{row}@2x.{format}?access_token={token}
/// ```
///
/// The `@2x` suffix only asks for 512 pixel tiles; the actual size is read
/// from the decoded image.
#[must_use]
pub fn tile_url(config: &ControllerConfig, key: TileKey) -> String {
    format!(
        "{base}/{key}{scale}.{format}?access_token={token}",
        base = config.base_url,
        scale = config.resolution.suffix(),
        format = config.format,
        token = config.access_token,
    )
}

/// `url` with the value of its `access_token` parameter hidden, for logs.
#[must_use]
pub fn redact_token(url: &str) -> String {
    const PARAM: &str = "access_token=";
    let Some(start) = url.find(PARAM).map(|i| i + PARAM.len()) else {
        return url.to_string();
    };
    let end = url[start..].find('&').map_or(url.len(), |i| start + i);
    format!("{}***{}", &url[..start], &url[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileResolution;

    #[test]
    fn builds_high_dpi_url() {
        let config = ControllerConfig::new("pk.abc");
        assert_eq!(
            tile_url(&config, TileKey::new(12, 1234, 2345)),
            "https://api.mapbox.com/v4/mapbox.terrain-rgb/12/1234/2345@2x.pngraw?access_token=pk.abc"
        );
    }

    #[test]
    fn standard_resolution_has_no_suffix() {
        let config = ControllerConfig {
            base_url: "http://localhost:8080/tiles".to_string(),
            format: "png".to_string(),
            resolution: TileResolution::Standard,
            ..ControllerConfig::new("t")
        };
        assert_eq!(
            tile_url(&config, TileKey::new(3, 1, 2)),
            "http://localhost:8080/tiles/3/1/2.png?access_token=t"
        );
    }

    #[test]
    fn redacts_token() {
        assert_eq!(
            redact_token("http://h/1/0/0.png?access_token=secret"),
            "http://h/1/0/0.png?access_token=***"
        );
        assert_eq!(
            redact_token("http://h/a?access_token=secret&x=1"),
            "http://h/a?access_token=***&x=1"
        );
        assert_eq!(redact_token("http://h/a"), "http://h/a");
    }
}
