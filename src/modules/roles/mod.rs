//! Roles module.
//!
//! Role CRUD, capability grants and the default role set. Capability sets are
//! always validated against the permission catalog; system roles cannot be
//! deleted.

pub mod controller;
pub mod defaults;
pub mod model;
pub mod router;
pub mod service;
