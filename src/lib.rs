pub mod accounts;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod request;
pub mod service;
pub mod signing;
pub mod vault;
