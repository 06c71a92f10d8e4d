//! Wallets: identity stores and the registry that federates them
//!
//! Wallets are either registered directly (`<root>/wallets/<name>/.config.json`)
//! or derived live from Ansible and Microfab environments. Derived wallets
//! have their identities reconciled into a [`WalletStore`] on every listing.

pub mod reconcile;
pub mod registry;
pub mod store;
pub mod types;

pub use reconcile::{identities_to_import, reconcile_identities, same_identity};
pub use registry::{WALLET_REGISTRY, WalletRegistry};
pub use store::{FileSystemWallet, FileSystemWalletProvider, WalletProvider, WalletStore};
pub use types::{Identity, WalletAndIdentities, WalletIdentity, WalletRegistryEntry};
