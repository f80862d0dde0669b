//! The seam between the chat controller and the rendering surfaces.

use async_trait::async_trait;
use campus_core::types::{Location, Route};

use crate::error::RenderError;

/// A rendering surface driven by query responses.
///
/// Adapters hold no state that outlives a single query except the markers
/// currently on display; the controller calls [`SpatialAdapter::clear`]
/// before every `location` or `route` response.
#[async_trait]
pub trait SpatialAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether [`SpatialAdapter::initialize`] needs the backend's map key.
    fn requires_api_key(&self) -> bool {
        false
    }

    /// Bring the surface up. Key-dependent surfaces receive the key here.
    async fn initialize(&self, _api_key: Option<&str>) -> Result<(), RenderError> {
        Ok(())
    }

    /// Replace the surface with static error text.
    async fn show_unavailable(&self, _message: &str) {}

    /// React to the raw query text as soon as it is submitted.
    async fn highlight_query(&self, _query: &str) {}

    /// Remove every marker and route currently displayed.
    async fn clear(&self) -> Result<(), RenderError>;

    async fn show_location(&self, location: &Location) -> Result<(), RenderError>;

    async fn show_route(&self, route: &Route) -> Result<(), RenderError>;

    /// The chat panel was collapsed or expanded.
    async fn on_layout_change(&self) {}

    /// Release recurring work (render loops, listeners).
    async fn teardown(&self) {}
}
