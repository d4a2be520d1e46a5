pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
