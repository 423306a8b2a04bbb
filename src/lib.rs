pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod services;
pub mod state;
pub mod store;
