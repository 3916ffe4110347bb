pub mod config;
pub mod constants;
pub mod extractors;
pub mod kt;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
