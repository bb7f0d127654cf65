//! Demo fixture server.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request id, trace layer)
//!     → handler (fixed reply after a configured delay)
//!     → Send to client
//! ```

pub mod server;

pub use server::{DemoServer, X_REQUEST_ID};
