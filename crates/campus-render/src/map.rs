//! 2D map surface: markers, walking routes and the provider seam.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use campus_core::config::MapConfig;
use campus_core::types::{LatLng, Location, Route};

use crate::adapter::SpatialAdapter;
use crate::error::RenderError;
use crate::geometry::haversine_m;

/// Average walking speed used for route duration estimates.
const WALKING_SPEED_MPS: f64 = 1.4;

/// Handle to a marker placed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Walking,
}

/// A computed route ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    pub origin: LatLng,
    pub destination: LatLng,
    pub points: Vec<LatLng>,
    pub distance_m: f64,
    pub duration_secs: f64,
}

/// Polyline styling for drawn routes.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStyle {
    pub color: String,
    pub weight: u8,
}

/// The map vendor SDK, reduced to what the client uses.
///
/// Callback-style SDK calls (script load, directions) are exposed as
/// single-result async methods.
#[async_trait]
pub trait MapProvider: Send + Sync {
    /// Load the SDK with the provider key and wait until it is ready.
    async fn load(&self, api_key: &str) -> Result<(), RenderError>;

    fn set_view(&self, center: LatLng, zoom: u8);

    fn add_marker(&self, position: LatLng, title: &str) -> MarkerId;

    fn remove_marker(&self, id: MarkerId);

    async fn directions(
        &self,
        origin: LatLng,
        destination: LatLng,
        mode: TravelMode,
    ) -> Result<RoutePath, RenderError>;

    fn draw_route(&self, path: &RoutePath, style: &RouteStyle);

    fn clear_route(&self);

    /// Replace the map with static text.
    fn show_error(&self, text: &str);

    /// The container changed size.
    fn resize(&self);
}

/// Drives a [`MapProvider`] from query responses.
pub struct MapAdapter<P: MapProvider> {
    provider: P,
    config: MapConfig,
    active_markers: Mutex<Vec<MarkerId>>,
    loaded: AtomicBool,
}

impl<P: MapProvider> MapAdapter<P> {
    pub fn new(provider: P, config: MapConfig) -> Self {
        Self {
            provider,
            config,
            active_markers: Mutex::new(Vec::new()),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn default_center(&self) -> LatLng {
        LatLng::new(self.config.center_lat, self.config.center_lng)
    }

    fn ensure_loaded(&self) -> Result<(), RenderError> {
        if self.loaded.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(RenderError::Unavailable("map is not loaded".to_string()))
        }
    }

    fn route_style(&self) -> RouteStyle {
        RouteStyle {
            color: self.config.route_color.clone(),
            weight: self.config.route_weight,
        }
    }
}

#[async_trait]
impl<P: MapProvider> SpatialAdapter for MapAdapter<P> {
    fn name(&self) -> &'static str {
        "map"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn initialize(&self, api_key: Option<&str>) -> Result<(), RenderError> {
        let key = api_key.ok_or_else(|| {
            RenderError::Unavailable("map API key not provided".to_string())
        })?;
        self.provider.load(key).await?;
        self.provider
            .set_view(self.default_center(), self.config.default_zoom);
        self.loaded.store(true, Ordering::Release);
        info!(center = %self.default_center(), "Map surface ready");
        Ok(())
    }

    async fn show_unavailable(&self, message: &str) {
        self.loaded.store(false, Ordering::Release);
        self.provider.show_error(message);
    }

    async fn clear(&self) -> Result<(), RenderError> {
        let markers = {
            let mut active = self
                .active_markers
                .lock()
                .map_err(|e| RenderError::Provider(format!("marker lock poisoned: {}", e)))?;
            std::mem::take(&mut *active)
        };
        for id in &markers {
            self.provider.remove_marker(*id);
        }
        self.provider.clear_route();
        debug!(removed = markers.len(), "Map cleared");
        Ok(())
    }

    async fn show_location(&self, location: &Location) -> Result<(), RenderError> {
        self.ensure_loaded()?;
        let position = location.position();
        self.provider.set_view(position, self.config.location_zoom);
        let id = self.provider.add_marker(position, &location.name);
        self.active_markers
            .lock()
            .map_err(|e| RenderError::Provider(format!("marker lock poisoned: {}", e)))?
            .push(id);
        Ok(())
    }

    async fn show_route(&self, route: &Route) -> Result<(), RenderError> {
        self.ensure_loaded()?;
        match self
            .provider
            .directions(route.from.position(), route.to.position(), TravelMode::Walking)
            .await
        {
            Ok(path) => {
                self.provider.draw_route(&path, &self.route_style());
                Ok(())
            }
            Err(e) => {
                warn!(from = %route.from.name, to = %route.to.name, error = %e, "Directions request failed");
                Err(e)
            }
        }
    }

    async fn on_layout_change(&self) {
        if self.loaded.load(Ordering::Acquire) {
            self.provider.resize();
            self.provider
                .set_view(self.default_center(), self.config.default_zoom);
        }
    }
}

// =============================================================================
// In-memory provider
// =============================================================================

/// Snapshot of what an [`InMemoryMap`] is displaying.
#[derive(Debug, Clone, Default)]
pub struct MapState {
    pub api_key: Option<String>,
    pub center: Option<LatLng>,
    pub zoom: Option<u8>,
    pub markers: BTreeMap<MarkerId, (LatLng, String)>,
    pub route: Option<RoutePath>,
    pub routes_drawn: u64,
    pub error_text: Option<String>,
    next_marker: u64,
}

/// A headless map that records every call and logs it.
///
/// Clones share state, so a caller can keep a handle for inspection after
/// moving the provider into a [`MapAdapter`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryMap {
    state: Arc<Mutex<MapState>>,
    fail_directions: bool,
}

impl InMemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map whose directions service always fails.
    pub fn with_failing_directions() -> Self {
        Self {
            fail_directions: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> MapState {
        self.with_state(|s| s.clone())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MapState) -> T) -> T {
        // Recorded state stays readable after a panicked writer.
        let mut guard = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[async_trait]
impl MapProvider for InMemoryMap {
    async fn load(&self, api_key: &str) -> Result<(), RenderError> {
        self.with_state(|s| {
            s.api_key = Some(api_key.to_string());
            s.error_text = None;
        });
        Ok(())
    }

    fn set_view(&self, center: LatLng, zoom: u8) {
        info!(center = %center, zoom, "map: view");
        self.with_state(|s| {
            s.center = Some(center);
            s.zoom = Some(zoom);
        });
    }

    fn add_marker(&self, position: LatLng, title: &str) -> MarkerId {
        info!(position = %position, title, "map: marker added");
        self.with_state(|s| {
            s.next_marker += 1;
            let id = MarkerId(s.next_marker);
            s.markers.insert(id, (position, title.to_string()));
            id
        })
    }

    fn remove_marker(&self, id: MarkerId) {
        self.with_state(|s| {
            s.markers.remove(&id);
        });
    }

    async fn directions(
        &self,
        origin: LatLng,
        destination: LatLng,
        _mode: TravelMode,
    ) -> Result<RoutePath, RenderError> {
        if self.fail_directions {
            return Err(RenderError::RouteFailed("ZERO_RESULTS".to_string()));
        }
        let distance_m = haversine_m(origin, destination);
        Ok(RoutePath {
            origin,
            destination,
            points: vec![origin, destination],
            distance_m,
            duration_secs: distance_m / WALKING_SPEED_MPS,
        })
    }

    fn draw_route(&self, path: &RoutePath, style: &RouteStyle) {
        info!(
            from = %path.origin,
            to = %path.destination,
            distance_m = path.distance_m.round(),
            color = %style.color,
            "map: route drawn"
        );
        self.with_state(|s| {
            s.route = Some(path.clone());
            s.routes_drawn += 1;
        });
    }

    fn clear_route(&self) {
        self.with_state(|s| s.route = None);
    }

    fn show_error(&self, text: &str) {
        warn!(text, "map: unavailable");
        self.with_state(|s| s.error_text = Some(text.to_string()));
    }

    fn resize(&self) {
        debug!("map: resize");
    }
}
