pub mod config;
pub mod error;
pub mod forwarder;
pub mod frontend;
pub mod provider;
pub mod resolver;
pub mod routes;
pub mod server;
