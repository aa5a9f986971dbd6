//! # nexushub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** over the engine's read-only snapshots
//!   (`/api/devices`, `/api/rack`, `/api/overview`, …)
//! - Accept **manual commands** (`POST /api/rack/fan-max`,
//!   `POST /api/access/unlock`, …) and answer with the resulting status
//! - Stream alerts as **Server-Sent Events** at `/api/alerts/stream`
//!
//! ## Dependency rule
//! Depends on `nexushub-app` (engine and port traits) and `nexushub-domain`
//! (for types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
