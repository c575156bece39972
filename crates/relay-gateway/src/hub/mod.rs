//! Hubs and groups
//!
//! A hub is a namespace of peers and groups. Each peer belongs to at most one
//! group at a time; groups are created on first join and kept when empty.

mod directory;
mod group;
mod hub;

pub use directory::HubDirectory;
pub use group::Group;
pub use hub::Hub;
