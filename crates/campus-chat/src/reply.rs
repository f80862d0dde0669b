//! Bot wording for every reply the controller puts in the transcript.

use campus_core::config::Surface;
use campus_core::types::QueryResponse;

/// Text of the placeholder shown while a query is in flight.
pub const THINKING_TEXT: &str = "Thinking";

pub const FAILURE_TEXT: &str =
    "😥 Sorry, something went wrong. I couldn't connect to my brain. Please try again later.";

pub const ROUTE_FAILURE_TEXT: &str = "😥 Could not calculate the route. Please try again.";

pub const MAP_CONFIG_ERROR_TEXT: &str = "Error: Could not load map configuration from the server.";

pub const SUPERSEDED_TEXT: &str = "(Superseded by a newer question.)";

pub fn welcome_text(surface: Surface) -> &'static str {
    match surface {
        Surface::Map => "Welcome! Ask for a location or a route on campus.",
        Surface::Model => {
            "Welcome to the 3D View! Click on a location or ask me anything about the campus."
        }
        Surface::Tour => {
            "Welcome to the campus tour! Sit back, or ask me about any building to fly there."
        }
    }
}

/// The transcript text for a decoded response.
pub fn compose_reply(response: &QueryResponse, surface: Surface) -> String {
    match response {
        // Every sentence of the description starts on its own paragraph.
        QueryResponse::Location(location) => format!(
            "📍 {} is marked on the map. {}",
            location.name, location.description
        )
        .replace(". ", ". <br><br>"),
        QueryResponse::Route(route) if surface.is_3d() => format!(
            "🗺️ To get from {} to {}, you would follow the route shown on the 2D map.",
            route.from.name, route.to.name
        ),
        QueryResponse::Route(route) => format!(
            "🗺️ Showing walking route from {} to {}.",
            route.from.name, route.to.name
        ),
        QueryResponse::Greeting { message }
        | QueryResponse::Answer { message }
        | QueryResponse::Message { message }
        | QueryResponse::Error { message } => message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::types::{Location, Place, Route};

    fn route() -> QueryResponse {
        QueryResponse::Route(Route {
            from: Place {
                name: "PSB".to_string(),
                lat: 8.6825,
                lng: 77.1350,
            },
            to: Place {
                name: "BSB".to_string(),
                lat: 8.6830,
                lng: 77.1360,
            },
        })
    }

    #[test]
    fn test_location_reply() {
        let response = QueryResponse::Location(Location {
            name: "Library".to_string(),
            lat: 1.0,
            lng: 2.0,
            description: "Books".to_string(),
        });
        assert_eq!(
            compose_reply(&response, Surface::Map),
            "📍 Library is marked on the map. <br><br>Books"
        );
    }

    #[test]
    fn test_location_reply_breaks_every_sentence() {
        let response = QueryResponse::Location(Location {
            name: "Library".to_string(),
            lat: 1.0,
            lng: 2.0,
            description: "Three floors. Open till 10 p.m. daily".to_string(),
        });
        assert_eq!(
            compose_reply(&response, Surface::Model),
            "📍 Library is marked on the map. <br><br>Three floors. <br><br>Open till 10 p.m. <br><br>daily"
        );
    }

    #[test]
    fn test_route_reply_depends_on_surface() {
        assert_eq!(
            compose_reply(&route(), Surface::Map),
            "🗺️ Showing walking route from PSB to BSB."
        );
        let three_d = "🗺️ To get from PSB to BSB, you would follow the route shown on the 2D map.";
        assert_eq!(compose_reply(&route(), Surface::Model), three_d);
        assert_eq!(compose_reply(&route(), Surface::Tour), three_d);
    }

    #[test]
    fn test_conversational_replies_are_verbatim() {
        for response in [
            QueryResponse::Greeting {
                message: "Hi <b>there</b>".to_string(),
            },
            QueryResponse::Answer {
                message: "Hi <b>there</b>".to_string(),
            },
            QueryResponse::Message {
                message: "Hi <b>there</b>".to_string(),
            },
            QueryResponse::Error {
                message: "Hi <b>there</b>".to_string(),
            },
        ] {
            assert_eq!(compose_reply(&response, Surface::Tour), "Hi <b>there</b>");
        }
    }

    #[test]
    fn test_welcome_text_per_surface() {
        assert!(welcome_text(Surface::Map).contains("route"));
        assert!(welcome_text(Surface::Model).contains("3D View"));
        assert_ne!(welcome_text(Surface::Tour), welcome_text(Surface::Map));
    }
}
