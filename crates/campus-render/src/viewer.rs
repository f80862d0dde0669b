//! 3D model viewer surface: a single marker dropped on named hotspots.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use campus_core::types::{Location, Route};

use crate::adapter::SpatialAdapter;
use crate::error::RenderError;
use crate::geometry::Vec3;
use crate::hotspot::HotspotCatalog;

/// Camera placement in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

/// The 3D rendering SDK, reduced to what the client uses.
pub trait ModelViewer: Send + Sync {
    /// Attach the marker to a hotspot slot and show it.
    fn place_marker(&self, slot: &str);

    fn hide_marker(&self);

    fn set_camera(&self, pose: CameraPose);
}

/// Drops the viewer marker on the hotspot a query or response names.
pub struct ViewerAdapter<V: ModelViewer> {
    viewer: V,
    catalog: HotspotCatalog,
}

impl<V: ModelViewer> ViewerAdapter<V> {
    pub fn new(viewer: V, catalog: HotspotCatalog) -> Self {
        Self { viewer, catalog }
    }

    pub fn catalog(&self) -> &HotspotCatalog {
        &self.catalog
    }

    /// Place the marker on the hotspot mentioned in `text`, or hide it.
    fn mark(&self, text: &str) -> bool {
        match self.catalog.find(text) {
            Some(hotspot) => {
                debug!(hotspot = %hotspot.name, slot = %hotspot.slot, "Hotspot matched");
                self.viewer.place_marker(&hotspot.slot);
                true
            }
            None => {
                self.viewer.hide_marker();
                false
            }
        }
    }
}

#[async_trait]
impl<V: ModelViewer> SpatialAdapter for ViewerAdapter<V> {
    fn name(&self) -> &'static str {
        "viewer"
    }

    async fn highlight_query(&self, query: &str) {
        self.mark(query);
    }

    async fn clear(&self) -> Result<(), RenderError> {
        self.viewer.hide_marker();
        Ok(())
    }

    async fn show_location(&self, location: &Location) -> Result<(), RenderError> {
        self.mark(&location.name);
        Ok(())
    }

    async fn show_route(&self, route: &Route) -> Result<(), RenderError> {
        self.mark(&route.to.name);
        Ok(())
    }
}

// =============================================================================
// In-memory viewer
// =============================================================================

/// Snapshot of what an [`InMemoryViewer`] is displaying.
#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    pub marker_slot: Option<String>,
    pub camera: Option<CameraPose>,
    pub camera_updates: u64,
}

/// A headless viewer that records every call. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryViewer {
    state: Arc<Mutex<ViewerState>>,
}

impl InMemoryViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewerState {
        self.with_state(|s| s.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ViewerState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl ModelViewer for InMemoryViewer {
    fn place_marker(&self, slot: &str) {
        info!(slot, "viewer: marker placed");
        self.with_state(|s| s.marker_slot = Some(slot.to_string()));
    }

    fn hide_marker(&self) {
        self.with_state(|s| s.marker_slot = None);
    }

    fn set_camera(&self, pose: CameraPose) {
        self.with_state(|s| {
            s.camera = Some(pose);
            s.camera_updates += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspot::Hotspot;
    use campus_core::types::{LatLng, Place};

    fn adapter(viewer: InMemoryViewer) -> ViewerAdapter<InMemoryViewer> {
        let catalog = HotspotCatalog::new(vec![
            Hotspot::new("Library", &[], "hs-lib", LatLng::new(8.6819, 77.1339)),
            Hotspot::new(
                "Physical Sciences Block",
                &["psb".to_string()],
                "hs-psb",
                LatLng::new(8.6825, 77.1350),
            ),
        ]);
        ViewerAdapter::new(viewer, catalog)
    }

    #[tokio::test]
    async fn test_query_drops_marker_on_matching_hotspot() {
        let viewer = InMemoryViewer::new();
        let a = adapter(viewer.clone());
        a.highlight_query("Where is the PSB?").await;
        assert_eq!(viewer.snapshot().marker_slot.as_deref(), Some("hs-psb"));
    }

    #[tokio::test]
    async fn test_unmatched_query_hides_marker() {
        let viewer = InMemoryViewer::new();
        let a = adapter(viewer.clone());
        a.highlight_query("library").await;
        a.highlight_query("hello there").await;
        assert!(viewer.snapshot().marker_slot.is_none());
    }

    #[tokio::test]
    async fn test_location_and_route_mark_hotspots() {
        let viewer = InMemoryViewer::new();
        let a = adapter(viewer.clone());
        let loc = Location {
            name: "Library".to_string(),
            lat: 8.6819,
            lng: 77.1339,
            description: String::new(),
        };
        a.show_location(&loc).await.unwrap();
        assert_eq!(viewer.snapshot().marker_slot.as_deref(), Some("hs-lib"));

        a.clear().await.unwrap();
        assert!(viewer.snapshot().marker_slot.is_none());

        let route = Route {
            from: Place {
                name: "Library".to_string(),
                lat: 8.6819,
                lng: 77.1339,
            },
            to: Place {
                name: "Physical Sciences Block".to_string(),
                lat: 8.6825,
                lng: 77.1350,
            },
        };
        a.show_route(&route).await.unwrap();
        assert_eq!(viewer.snapshot().marker_slot.as_deref(), Some("hs-psb"));
    }
}
