pub mod config;
pub mod feed;
pub mod models;
pub mod repositories;
pub mod services;
