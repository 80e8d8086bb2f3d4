// Route handlers grouped by resource. Each module exposes a `routes()`
// function returning its sub-router; main.rs nests them under /api.
pub mod auth;
pub mod comments;
pub mod forums;
pub mod groups;
pub mod media;
pub mod polls;
pub mod users;
