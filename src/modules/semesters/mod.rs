//! Semesters module.
//!
//! Semester CRUD plus the lifecycle transitions (`set-current`, `close`,
//! `reopen`, registration open/close). Status is derived per read by
//! [`lifecycle`].

pub mod controller;
pub mod lifecycle;
pub mod model;
pub mod router;
pub mod service;
