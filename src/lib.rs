pub mod account;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod view;
