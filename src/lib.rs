pub mod app;
pub mod auth;
pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod expenses;
pub mod state;

#[cfg(test)]
mod memory;
