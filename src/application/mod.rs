//! Application services: permission filtering, guarded writes and booking routing.

pub mod access;
pub mod email_routing;
pub mod error;
pub mod repos;
pub mod roster;
