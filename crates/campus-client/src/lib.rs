//! Backend client for the campus navigator.
//!
//! Implements the two endpoints the chat client depends on:
//! `GET /api/config` and `POST /api/query`.

pub mod backend;
pub mod error;
pub mod http;

pub use backend::QueryBackend;
pub use error::ClientError;
pub use http::HttpBackend;
