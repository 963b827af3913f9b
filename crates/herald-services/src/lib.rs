//! herald-services: registry, discovery, and the transport façade they sit on.

pub mod discovery;
pub mod handler;
pub mod local;
pub mod registry;
pub mod transport;

pub use discovery::{Discovery, DiscoveryError};
pub use handler::{Context, FunctionHandler, HandlerKind};
pub use local::{LocalBus, LocalTransport};
pub use registry::{Registry, RouteInfo};
pub use transport::{SharedTransport, Transport};
