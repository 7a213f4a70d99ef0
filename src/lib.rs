// Library exports for the advocacy site
// The binary and the integration tests both build on these modules

pub mod arcade;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod schema;
pub mod state;
pub mod users;
