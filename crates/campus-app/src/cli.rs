//! CLI argument definitions for the campus navigator.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use campus_core::config::Surface;

/// campusnav: ask the campus map chatbot from a terminal.
#[derive(Parser, Debug)]
#[command(name = "campusnav", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Backend base URL.
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,

    /// Rendering surface (map, model, tour).
    #[arg(short = 's', long = "surface")]
    pub surface: Option<Surface>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CAMPUSNAV_CONFIG env var > ~/.campusnav/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CAMPUSNAV_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the backend base URL.
    ///
    /// Priority: --backend flag > CAMPUSNAV_BACKEND env var > config file value.
    pub fn resolve_backend(&self, config_url: &str) -> String {
        if let Some(ref url) = self.backend {
            return url.clone();
        }
        if let Ok(url) = std::env::var("CAMPUSNAV_BACKEND") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        config_url.to_string()
    }

    pub fn resolve_surface(&self, config_surface: Surface) -> Surface {
        self.surface.unwrap_or(config_surface)
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value > "info".
    pub fn resolve_log_level(&self, config_level: Option<&str>) -> String {
        self.log_level
            .clone()
            .or_else(|| config_level.map(str::to_string))
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| "info".to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".campusnav").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".campusnav").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "campusnav",
            "--config",
            "/tmp/nav.toml",
            "--backend",
            "http://localhost:8000",
            "--surface",
            "3d",
            "-l",
            "debug",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/nav.toml"));
        assert_eq!(
            args.resolve_backend("https://example.org"),
            "http://localhost:8000"
        );
        assert_eq!(args.resolve_surface(Surface::Map), Surface::Model);
        assert_eq!(args.resolve_log_level(Some("warn")), "debug");
    }

    #[test]
    fn test_surface_falls_back_to_config() {
        let args = CliArgs::parse_from(["campusnav"]);
        assert_eq!(args.resolve_surface(Surface::Tour), Surface::Tour);
        assert_eq!(args.resolve_log_level(Some("warn")), "warn");
        assert_eq!(args.resolve_log_level(None), "info");
    }

    #[test]
    fn test_invalid_surface_rejected() {
        let result = CliArgs::try_parse_from(["campusnav", "--surface", "hologram"]);
        assert!(result.is_err());
    }
}
