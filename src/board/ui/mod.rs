//! HTTP bindings for the board.
//!
//! Currently supports:
//!
//! - **Axum** (enabled by default with the `axum-ui` feature)
//!
//! Other frameworks can call the functions in
//! [`handlers`](crate::board::handlers) directly.

#[cfg(feature = "axum-ui")]
mod axum;

#[cfg(feature = "axum-ui")]
pub use self::axum::board_api;
