//! HTTP API handlers: exposes discovery state as JSON.

pub mod status;

use herald_services::Discovery;

pub use status::{handle_functions, handle_routes, handle_status};

#[derive(Clone)]
pub struct ApiState {
    pub discovery: Discovery,
}
