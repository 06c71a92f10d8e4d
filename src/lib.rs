//! Fabric Registry - Topology catalog for Hyperledger Fabric deployments
//!
//! This library records which nodes, wallets and gateways make up a Fabric
//! network and reconciles them across several kinds of backing store:
//! - Hand-curated node directories
//! - Directory trees written by Ansible provisioning
//! - Live Microfab component directories over HTTP
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │        WalletRegistry      │     GatewayRegistry     │
//! │   stored + derived entries, local entries first     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   EnvironmentRegistry  ──►  EnvironmentFactory       │
//! │   Directory │ Ansible │ Microfab │ Noop              │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   FileRegistry<T>  │  node update planner  │ wallets │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod environments;
pub mod error;
pub mod files;
pub mod gateways;
pub mod nodes;
pub mod registry;
pub mod wallets;
pub mod workspace;

pub use config::Config;
pub use environments::{
    Environment, EnvironmentEntry, EnvironmentFactory, EnvironmentFlags, EnvironmentRegistry,
};
pub use error::{Error, Result};
pub use gateways::{Gateway, GatewayRegistry, GatewayRegistryEntry};
pub use nodes::{Node, NodeType};
pub use registry::{FileRegistry, RegistryEntry, RegistryEvent, SubscriptionId};
pub use wallets::{Identity, WalletRegistry, WalletRegistryEntry, WalletStore};
pub use workspace::Workspace;
