//! formfit Server - HTTP REST API for template registration and form matching
//!
//! This crate exposes a [`formfit::FormRegistry`] over JSON/HTTP:
//!
//! - **Templates**: create templates, list them, inspect the field index
//! - **Matching**: find the template a submitted form satisfies, or get the
//!   inferred field types back when none does
//! - **Validation**: check a single value against `date`, `phone`, `email`
//!   or `text`
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! # Features
//!
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: `.env`, an optional `server.{toml,yaml,json}` file and
//!   `FORMFIT_SERVER__*` environment variables
//! - **Error Handling**: `{"error": {"code", "message"}}` bodies with stable codes
//! - **Graceful Shutdown**: Proper signal handling for production deployments
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//! - `POST /create_template` - Register a template
//! - `GET /templates` - List templates
//! - `GET /indexes` - List field index entries
//! - `POST /get_form` - Match a submitted form
//! - `POST /explain_form` - Match with a per-candidate trace
//! - `POST /clear_db` - Remove all templates and index entries
//! - `POST /validate/{type}` - Validate one value

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
