//! Gateways: connection profiles and the registry that federates them

pub mod registry;
pub mod types;

pub use registry::{CONNECTION_PROFILE_FILE, GATEWAY_REGISTRY, GatewayRegistry};
pub use types::{Gateway, GatewayRegistryEntry, TransactionDataDirectory};
