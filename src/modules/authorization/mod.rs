//! Authorization module.
//!
//! Answers whether a role may perform an action on a module. The decision
//! itself lives in [`engine`]; the controller exposes it per role id.

pub mod controller;
pub mod engine;
pub mod router;
