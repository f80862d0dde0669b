//! Named hotspots in the 3D campus model and free-text matching against them.

use campus_core::config::HotspotConfig;
use campus_core::types::LatLng;

/// A named, fixed point in the 3D viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub name: String,
    pub aliases: Vec<String>,
    pub slot: String,
    pub position: LatLng,
    /// Lowercased name followed by lowercased non-empty aliases.
    needles: Vec<String>,
}

impl Hotspot {
    pub fn new(name: &str, aliases: &[String], slot: &str, position: LatLng) -> Self {
        let needles = std::iter::once(name)
            .chain(aliases.iter().map(String::as_str))
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self {
            name: name.to_string(),
            aliases: aliases.to_vec(),
            slot: slot.to_string(),
            position,
            needles,
        }
    }

    /// Whether the name or any alias appears in the (already lowercased) text.
    fn is_mentioned_in(&self, normalized: &str) -> bool {
        self.needles.iter().any(|n| normalized.contains(n.as_str()))
    }
}

impl From<&HotspotConfig> for Hotspot {
    fn from(cfg: &HotspotConfig) -> Self {
        Hotspot::new(&cfg.name, &cfg.aliases, &cfg.slot, LatLng::new(cfg.lat, cfg.lng))
    }
}

/// Ordered list of hotspots. Order decides ties: the first match wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotspotCatalog {
    hotspots: Vec<Hotspot>,
}

impl HotspotCatalog {
    pub fn new(hotspots: Vec<Hotspot>) -> Self {
        Self { hotspots }
    }

    pub fn from_config(configs: &[HotspotConfig]) -> Self {
        Self::new(configs.iter().map(Hotspot::from).collect())
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.iter()
    }

    /// Index of the first hotspot mentioned in `text`.
    pub fn position_of(&self, text: &str) -> Option<usize> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.hotspots
            .iter()
            .position(|h| h.is_mentioned_in(&normalized))
    }

    /// The first hotspot mentioned in `text`.
    pub fn find(&self, text: &str) -> Option<&Hotspot> {
        self.position_of(text).map(|i| &self.hotspots[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> HotspotCatalog {
        HotspotCatalog::new(vec![
            Hotspot::new(
                "Lecture Hall Complex",
                &["lhc".to_string(), " ".to_string()],
                "hs-lhc",
                LatLng::new(8.6835, 77.1349),
            ),
            Hotspot::new(
                "Library",
                &["central library".to_string()],
                "hs-lib",
                LatLng::new(8.6819, 77.1339),
            ),
            Hotspot::new("I Cafe", &["i-cafe".to_string()], "hs-cafe", LatLng::new(8.6806, 77.1367)),
        ])
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let c = catalog();
        assert_eq!(c.find("Where is the LIBRARY?").unwrap().slot, "hs-lib");
    }

    #[test]
    fn test_matches_alias_substring() {
        let c = catalog();
        assert_eq!(c.find("take me to lhc please").unwrap().name, "Lecture Hall Complex");
        assert_eq!(c.find("is the i-cafe open").unwrap().slot, "hs-cafe");
    }

    #[test]
    fn test_first_match_in_catalog_order_wins() {
        let c = catalog();
        // Mentions both; LHC comes first in the catalog.
        assert_eq!(c.position_of("library to lhc"), Some(0));
    }

    #[test]
    fn test_blank_alias_never_matches_everything() {
        let c = catalog();
        assert!(c.find("hostel").is_none());
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let c = catalog();
        assert!(c.find("   ").is_none());
        assert!(HotspotCatalog::default().find("library").is_none());
    }

    #[test]
    fn test_builds_from_config() {
        let cfg = HotspotConfig {
            name: "Gate".to_string(),
            aliases: vec!["main gate".to_string()],
            slot: "hs-gate".to_string(),
            lat: 8.6779,
            lng: 77.1333,
        };
        let c = HotspotCatalog::from_config(&[cfg]);
        assert_eq!(c.len(), 1);
        assert_eq!(c.find("the main gate").unwrap().position, LatLng::new(8.6779, 77.1333));
    }
}
