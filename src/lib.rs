//! Server-rendered storefront in front of the sales backend API.

pub mod backend;
pub mod config;
pub mod error;
pub mod forms;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;
pub mod views;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
