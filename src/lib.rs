//! Account core for the site: registration, credential checks and
//! remember-token sessions over a Postgres `users` table.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod state;
pub mod users;
