use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CampusError, Result};

/// Backend origin used when neither the config file nor the CLI overrides it.
pub const DEFAULT_BACKEND_URL: &str = "https://mapmycampus.onrender.com";

/// Top-level configuration for the campus navigator client.
///
/// Loaded from `~/.campusnav/config.toml` by default. Every section falls
/// back to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampusConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub tour: TourConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl CampusConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CampusConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CampusError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Which surface the client drives.
    pub surface: Surface,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            surface: Surface::Map,
        }
    }
}

/// The rendering surface a chat client is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    /// 2D map with markers and walking routes.
    Map,
    /// 3D campus model with hotspots.
    Model,
    /// 3D campus model with the cinematic camera tour.
    Tour,
}

impl Surface {
    /// Whether queries from this surface are flagged as 3D.
    pub fn is_3d(&self) -> bool {
        !matches!(self, Surface::Map)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Map => "map",
            Surface::Model => "model",
            Surface::Tour => "tour",
        }
    }
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Surface {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "map" | "2d" => Ok(Surface::Map),
            "model" | "3d" => Ok(Surface::Model),
            "tour" => Ok(Surface::Tour),
            other => Err(CampusError::Config(format!("unknown surface: {}", other))),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend origin, without a trailing slash.
    pub base_url: String,
    /// Field of `GET /api/config` holding the map provider key.
    pub api_key_field: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            api_key_field: "Maps_api_key".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// 2D map surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Default center latitude.
    pub center_lat: f64,
    /// Default center longitude.
    pub center_lng: f64,
    /// Zoom used for the default view.
    pub default_zoom: u8,
    /// Zoom used when centering on a single location.
    pub location_zoom: u8,
    /// Route polyline color.
    pub route_color: String,
    /// Route polyline width in pixels.
    pub route_weight: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 8.682478,
            center_lng: 77.135406,
            default_zoom: 16,
            location_zoom: 18,
            route_color: "#00A99D".to_string(),
            route_weight: 6,
        }
    }
}

/// A named hotspot in the 3D campus model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Viewer slot the marker attaches to.
    pub slot: String,
    pub lat: f64,
    pub lng: f64,
}

impl HotspotConfig {
    fn new(name: &str, aliases: &[&str], slot: &str, lat: f64, lng: f64) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            slot: slot.to_string(),
            lat,
            lng,
        }
    }
}

/// 3D viewer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Hotspots in match order. The first hotspot whose name or alias
    /// appears in a query wins.
    pub hotspots: Vec<HotspotConfig>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            hotspots: default_hotspots(),
        }
    }
}

fn default_hotspots() -> Vec<HotspotConfig> {
    vec![
        HotspotConfig::new(
            "Lecture Hall Complex",
            &["lhc", "lecture hall"],
            "hotspot-lhc",
            8.683558,
            77.134982,
        ),
        HotspotConfig::new(
            "Physical Sciences Block",
            &["psb", "physics block"],
            "hotspot-psb",
            8.682521,
            77.135037,
        ),
        HotspotConfig::new(
            "Central Instrumentation Facility",
            &["cif", "central instrumentation"],
            "hotspot-cif",
            8.682593,
            77.137459,
        ),
        HotspotConfig::new(
            "Biological Science Block",
            &["bsb", "biology block"],
            "hotspot-bsb",
            8.681735,
            77.137355,
        ),
        HotspotConfig::new("I Cafe", &["i-cafe", "icafe"], "hotspot-icafe", 8.680666, 77.136787),
        HotspotConfig::new(
            "Agasthya Hostel",
            &["agasthya"],
            "hotspot-agasthya",
            8.68007,
            77.136576,
        ),
        HotspotConfig::new("Ponmudi Hostel", &["ponmudi"], "hotspot-ponmudi", 8.680537, 77.135906),
        HotspotConfig::new(
            "Library",
            &["central library"],
            "hotspot-library",
            8.68192,
            77.133924,
        ),
        HotspotConfig::new(
            "IISER Canteen",
            &["main canteen", "canteen"],
            "hotspot-canteen",
            8.681324,
            77.134068,
        ),
        HotspotConfig::new(
            "Thirudhara Waterfall",
            &["waterfall"],
            "hotspot-waterfall",
            8.683461,
            77.135966,
        ),
    ]
}

/// Cinematic tour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    /// Delay between rendered frames in milliseconds.
    pub frame_interval_ms: u64,
    /// Time for one full loop of the camera path in seconds.
    pub loop_duration_secs: f64,
    /// Camera height above the hotspots in metres.
    pub camera_height: f64,
    /// How far ahead along the path (fraction of a loop) the camera looks.
    pub look_ahead: f64,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            loop_duration_secs: 60.0,
            camera_height: 40.0,
            look_ahead: 0.01,
        }
    }
}

/// Speech input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition language tag.
    pub language: String,
    /// Read every final bot reply aloud.
    pub auto_speak: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            auto_speak: false,
        }
    }
}

/// Chat panel and preference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// File holding persisted UI preferences (the theme flag).
    pub preferences_path: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            preferences_path: "~/.campusnav/preferences.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CampusConfig::default();
        assert_eq!(config.backend.base_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.backend.api_key_field, "Maps_api_key");
        assert_eq!(config.map.default_zoom, 16);
        assert_eq!(config.map.location_zoom, 18);
        assert_eq!(config.general.surface, Surface::Map);
        assert!(!config.viewer.hotspots.is_empty());
        assert!(!config.speech.auto_speak);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CampusConfig = toml::from_str(
            r#"
            [backend]
            base_url = "http://localhost:8000"

            [general]
            surface = "tour"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.general.surface, Surface::Tour);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.map.route_color, "#00A99D");
    }

    #[test]
    fn test_custom_hotspots() {
        let config: CampusConfig = toml::from_str(
            r#"
            [[viewer.hotspots]]
            name = "Gate"
            slot = "hotspot-gate"
            lat = 8.67
            lng = 77.13
            "#,
        )
        .unwrap();
        assert_eq!(config.viewer.hotspots.len(), 1);
        assert!(config.viewer.hotspots[0].aliases.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = CampusConfig::default();
        config.backend.base_url = "http://127.0.0.1:9000".to_string();
        config.speech.auto_speak = true;
        config.save(&path).unwrap();

        let loaded = CampusConfig::load(&path).unwrap();
        assert_eq!(loaded.backend.base_url, "http://127.0.0.1:9000");
        assert!(loaded.speech.auto_speak);
        assert_eq!(loaded.viewer.hotspots, config.viewer.hotspots);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CampusConfig::load_or_default(&dir.path().join("absent.toml"));
        assert_eq!(config.backend.base_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[backend\nbase_url = ").unwrap();
        let err = CampusConfig::load(&path).unwrap_err();
        assert!(matches!(err, CampusError::Config(_)));
    }

    #[test]
    fn test_surface_parsing() {
        assert_eq!("map".parse::<Surface>().unwrap(), Surface::Map);
        assert_eq!("3D".parse::<Surface>().unwrap(), Surface::Model);
        assert_eq!(" tour ".parse::<Surface>().unwrap(), Surface::Tour);
        assert!("globe".parse::<Surface>().is_err());
        assert!(!Surface::Map.is_3d());
        assert!(Surface::Model.is_3d());
        assert!(Surface::Tour.is_3d());
    }
}
