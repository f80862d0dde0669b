//! Cinematic tour: a camera looping through the hotspots until stopped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use campus_core::config::TourConfig;
use campus_core::types::{LatLng, Location, Route};

use crate::adapter::SpatialAdapter;
use crate::error::RenderError;
use crate::geometry::{LocalProjection, Vec3};
use crate::hotspot::HotspotCatalog;
use crate::spline::CameraPath;
use crate::viewer::{CameraPose, ModelViewer};

struct RunningTour {
    handle: JoinHandle<()>,
    start_index: usize,
}

/// Owns the recurring per-frame camera callback.
///
/// At most one frame loop runs at a time. [`CinematicTour::stop`] aborts the
/// loop and waits for it, so no frame is rendered after it returns.
pub struct CinematicTour<V: ModelViewer + Clone + 'static> {
    viewer: V,
    points: Vec<Vec3>,
    config: TourConfig,
    frames: Arc<AtomicU64>,
    running: Mutex<Option<RunningTour>>,
}

impl<V: ModelViewer + Clone + 'static> CinematicTour<V> {
    pub fn new(viewer: V, points: Vec<Vec3>, config: TourConfig) -> Self {
        Self {
            viewer,
            points,
            config,
            frames: Arc::new(AtomicU64::new(0)),
            running: Mutex::new(None),
        }
    }

    /// Total frames rendered since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|r| r.is_some())
            .unwrap_or(false)
    }

    /// Index of the hotspot the current loop started from.
    pub fn start_index(&self) -> Option<usize> {
        self.running
            .lock()
            .ok()
            .and_then(|r| r.as_ref().map(|t| t.start_index))
    }

    /// Start (or restart) the loop with the path beginning at `start_index`.
    pub async fn start(&self, start_index: usize) -> Result<(), RenderError> {
        self.stop().await;

        let path = CameraPath::rotated(self.points.clone(), start_index)
            .ok_or_else(|| RenderError::Unavailable("tour has no waypoints".to_string()))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RenderError::Unavailable(format!("no async runtime: {}", e)))?;

        let handle = runtime.spawn(frame_loop(
            self.viewer.clone(),
            path,
            self.config.clone(),
            Arc::clone(&self.frames),
        ));

        let mut running = self
            .running
            .lock()
            .map_err(|e| RenderError::Provider(format!("tour lock poisoned: {}", e)))?;
        if let Some(previous) = running.replace(RunningTour {
            handle,
            start_index,
        }) {
            // A concurrent start won the race; only one loop may survive.
            previous.handle.abort();
        }
        info!(start_index, waypoints = self.points.len(), "Tour started");
        Ok(())
    }

    /// Cancel the frame loop and wait until it has fully stopped.
    pub async fn stop(&self) {
        let running = match self.running.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tour) = running {
            tour.handle.abort();
            let _ = tour.handle.await;
            info!(frames = self.frames_rendered(), "Tour stopped");
        }
    }
}

async fn frame_loop<V: ModelViewer>(
    viewer: V,
    path: CameraPath,
    config: TourConfig,
    frames: Arc<AtomicU64>,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(config.frame_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let loop_secs = config.loop_duration_secs.max(f64::EPSILON);
    let started = Instant::now();

    loop {
        interval.tick().await;
        let t = started.elapsed().as_secs_f64() / loop_secs;
        let pose = CameraPose {
            position: path.point_at(t),
            target: path.point_at(t + config.look_ahead),
        };
        viewer.set_camera(pose);
        let n = frames.fetch_add(1, Ordering::SeqCst) + 1;
        if n % 600 == 0 {
            debug!(frames = n, "Tour frame");
        }
    }
}

/// Runs the cinematic tour in response to query results.
///
/// Location and route replies restart the loop from the hotspot they name,
/// or from the first hotspot when nothing matches.
pub struct TourAdapter<V: ModelViewer + Clone + 'static> {
    tour: CinematicTour<V>,
    catalog: HotspotCatalog,
}

impl<V: ModelViewer + Clone + 'static> TourAdapter<V> {
    /// Project every hotspot around `origin` and raise it to camera height.
    pub fn new(viewer: V, catalog: HotspotCatalog, origin: LatLng, config: TourConfig) -> Self {
        let projection = LocalProjection::new(origin);
        let points = catalog
            .iter()
            .map(|h| projection.project(h.position, config.camera_height))
            .collect();
        Self {
            tour: CinematicTour::new(viewer, points, config),
            catalog,
        }
    }

    pub fn tour(&self) -> &CinematicTour<V> {
        &self.tour
    }

    async fn restart_at(&self, name: &str) -> Result<(), RenderError> {
        let index = self.catalog.position_of(name).unwrap_or(0);
        self.tour.start(index).await
    }
}

#[async_trait]
impl<V: ModelViewer + Clone + 'static> SpatialAdapter for TourAdapter<V> {
    fn name(&self) -> &'static str {
        "tour"
    }

    async fn initialize(&self, _api_key: Option<&str>) -> Result<(), RenderError> {
        self.tour.start(0).await
    }

    async fn clear(&self) -> Result<(), RenderError> {
        self.tour.stop().await;
        Ok(())
    }

    async fn show_location(&self, location: &Location) -> Result<(), RenderError> {
        self.restart_at(&location.name).await
    }

    async fn show_route(&self, route: &Route) -> Result<(), RenderError> {
        self.restart_at(&route.to.name).await
    }

    async fn teardown(&self) {
        self.tour.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotspot::Hotspot;
    use crate::viewer::InMemoryViewer;

    fn fast_config() -> TourConfig {
        TourConfig {
            frame_interval_ms: 2,
            loop_duration_secs: 1.0,
            camera_height: 40.0,
            look_ahead: 0.01,
        }
    }

    fn catalog() -> HotspotCatalog {
        HotspotCatalog::new(vec![
            Hotspot::new("Library", &[], "hs-lib", LatLng::new(8.6819, 77.1339)),
            Hotspot::new("I Cafe", &[], "hs-cafe", LatLng::new(8.6806, 77.1367)),
            Hotspot::new("Lecture Hall Complex", &["lhc".to_string()], "hs-lhc", LatLng::new(8.6835, 77.1349)),
        ])
    }

    fn adapter(viewer: InMemoryViewer) -> TourAdapter<InMemoryViewer> {
        TourAdapter::new(viewer, catalog(), LatLng::new(8.682478, 77.135406), fast_config())
    }

    #[tokio::test]
    async fn test_start_renders_frames() {
        let viewer = InMemoryViewer::new();
        let a = adapter(viewer.clone());
        a.initialize(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(a.tour().is_running());
        assert!(a.tour().frames_rendered() > 0);
        let pose = viewer.snapshot().camera.unwrap();
        assert!((pose.position.y - 40.0).abs() < 1e-6);
        a.teardown().await;
    }

    #[tokio::test]
    async fn test_stop_leaves_no_recurring_callback() {
        let viewer = InMemoryViewer::new();
        let a = adapter(viewer.clone());
        a.initialize(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        a.teardown().await;
        assert!(!a.tour().is_running());
        let frames_at_stop = a.tour().frames_rendered();
        let updates_at_stop = viewer.snapshot().camera_updates;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(a.tour().frames_rendered(), frames_at_stop);
        assert_eq!(viewer.snapshot().camera_updates, updates_at_stop);
    }

    #[tokio::test]
    async fn test_location_restarts_from_matched_hotspot() {
        let viewer = InMemoryViewer::new();
        let a = adapter(viewer.clone());
        a.initialize(None).await.unwrap();
        assert_eq!(a.tour().start_index(), Some(0));

        let loc = Location {
            name: "Lecture Hall Complex (LHC)".to_string(),
            lat: 8.6835,
            lng: 77.1349,
            description: String::new(),
        };
        a.clear().await.unwrap();
        assert!(!a.tour().is_running());
        a.show_location(&loc).await.unwrap();
        assert_eq!(a.tour().start_index(), Some(2));
        a.teardown().await;
    }

    #[tokio::test]
    async fn test_first_frame_starts_at_chosen_hotspot() {
        let viewer = InMemoryViewer::new();
        let config = TourConfig {
            loop_duration_secs: 600.0,
            ..fast_config()
        };
        let a = TourAdapter::new(
            viewer.clone(),
            catalog(),
            LatLng::new(8.682478, 77.135406),
            config,
        );
        a.tour().start(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        a.teardown().await;

        let cafe = LocalProjection::new(LatLng::new(8.682478, 77.135406))
            .project(LatLng::new(8.6806, 77.1367), 40.0);
        let pose = viewer.snapshot().camera.unwrap();
        // Within a few frames of t=0 the camera is still close to the cafe.
        assert!(pose.position.distance(cafe) < 150.0);
    }

    #[tokio::test]
    async fn test_empty_catalog_cannot_start() {
        let a = TourAdapter::new(
            InMemoryViewer::new(),
            HotspotCatalog::default(),
            LatLng::new(0.0, 0.0),
            fast_config(),
        );
        let err = a.initialize(None).await.unwrap_err();
        assert!(matches!(err, RenderError::Unavailable(_)));
        assert!(!a.tour().is_running());
    }

    #[tokio::test]
    async fn test_restart_keeps_single_loop() {
        let viewer = InMemoryViewer::new();
        let a = adapter(viewer.clone());
        a.tour().start(0).await.unwrap();
        a.tour().start(1).await.unwrap();
        a.tour().start(2).await.unwrap();
        assert_eq!(a.tour().start_index(), Some(2));
        a.teardown().await;
        let frames = a.tour().frames_rendered();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(a.tour().frames_rendered(), frames);
    }
}
