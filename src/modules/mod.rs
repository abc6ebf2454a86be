pub mod authorization;
pub mod permissions;
pub mod roles;
pub mod semesters;
