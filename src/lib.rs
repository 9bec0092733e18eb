pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;
