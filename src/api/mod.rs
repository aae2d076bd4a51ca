//! HTTP API for the exam solver.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/analyze` - Upload an exam photo (multipart) and get the analysis
//! - `POST /api/cache/invalidate` - Drop the cached analysis for one content hash
//! - `POST /api/cache/clear` - Drop all cached analyses

mod routes;
mod types;

pub use routes::serve;
pub use types::*;
