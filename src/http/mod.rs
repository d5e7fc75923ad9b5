//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route handlers)
//!     → request.rs (request ID generation and propagation)
//!     → upstream client operation
//!     → response.rs (error → status + JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdMaker, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
