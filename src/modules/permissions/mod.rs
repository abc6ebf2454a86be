//! Permission catalog endpoints (read-only).

pub mod controller;
pub mod router;
