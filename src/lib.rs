pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod integrations;
pub mod models;
pub mod realtime;
pub mod responses;
pub mod snapshot;
