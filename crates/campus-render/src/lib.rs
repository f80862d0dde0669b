//! Rendering adapters for the campus navigator.
//!
//! Each surface consumes `location` and `route` replies through the
//! [`SpatialAdapter`] trait:
//!
//! - [`map`]: 2D map with markers and walking routes
//! - [`viewer`]: 3D campus model with a hotspot marker
//! - [`tour`]: cinematic camera loop through the hotspots
//!
//! Vendor SDKs sit behind [`MapProvider`] and [`ModelViewer`]; the in-memory
//! implementations record what would be displayed.

pub mod adapter;
pub mod error;
pub mod geometry;
pub mod hotspot;
pub mod map;
pub mod spline;
pub mod tour;
pub mod viewer;

pub use adapter::SpatialAdapter;
pub use error::RenderError;
pub use hotspot::{Hotspot, HotspotCatalog};
pub use map::{
    InMemoryMap, MapAdapter, MapProvider, MapState, MarkerId, RoutePath, RouteStyle, TravelMode,
};
pub use tour::{CinematicTour, TourAdapter};
pub use viewer::{CameraPose, InMemoryViewer, ModelViewer, ViewerAdapter};
