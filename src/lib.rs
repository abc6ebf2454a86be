//! # Registrar API
//!
//! Administrative backend for a university registrar, built with Axum and
//! PostgreSQL. It owns two pieces of the academic domain:
//!
//! - **Roles and permissions**: a fixed permission catalog of
//!   `(module, action)` capabilities, roles holding subsets of it, and the
//!   authorization check built on top.
//! - **Semesters**: academic terms with date windows, a single current
//!   semester and a small set of lifecycle transitions.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Demo data seeding for the CLI binary
//! ├── modules/          # Feature modules
//! │   ├── authorization/ # Capability check
//! │   ├── permissions/  # Catalog listing
//! │   ├── roles/        # Role management and default roles
//! │   └── semesters/    # Semester CRUD and lifecycle
//! ├── store/            # Repository traits, in-memory and Postgres backends
//! ├── db.rs             # Application state bootstrap
//! ├── docs.rs           # OpenAPI document
//! ├── logging.rs        # Tracing setup and request logging
//! ├── metrics.rs        # Prometheus metrics
//! ├── router.rs         # Route tree and global layers
//! └── validator.rs      # Validated JSON extractor
//! ```
//!
//! Each feature module follows the same layout: `controller.rs` for HTTP
//! handlers, `service.rs` for business rules, `router.rs` for the Axum
//! router and `model.rs` re-exporting its types from `registrar-models`.
//!
//! ## Storage
//!
//! Services only see the [`store`] traits. `STORAGE_BACKEND=memory` (the
//! default) keeps everything in process; `STORAGE_BACKEND=postgres` uses
//! `DATABASE_URL` and runs the bundled migrations on startup.
//!
//! ## Workspace Crates
//!
//! - [`registrar_core`]: errors, the permission catalog, serde helpers
//! - [`registrar_config`]: environment configuration
//! - [`registrar_db`]: connection pool and migrations
//! - [`registrar_models`]: domain models and DTOs

pub mod cli;
pub mod db;
pub mod docs;
pub mod logging;
pub mod metrics;
pub mod modules;
pub mod router;
pub mod state;
pub mod store;
pub mod validator;

// Re-export workspace crates for convenience
pub use registrar_config;
pub use registrar_core;
pub use registrar_db;
pub use registrar_models;
