pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod response;
pub mod routes;
pub mod validation;

pub use routes::{build_router, build_service, ApiState};
