pub mod access;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod session;
