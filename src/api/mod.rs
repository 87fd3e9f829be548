pub mod auth;
pub mod handlers;
pub mod response;
mod routes;

pub use routes::create_router;
