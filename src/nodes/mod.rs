//! Network node model
//!
//! Nodes are the peers, orderers, certificate authorities and state databases
//! that make up an environment, along with the cluster-aware update planner
//! environments use when a node changes.

pub mod types;
pub mod update;

pub use types::{Node, NodeType};
pub use update::{NodeUpdatePlan, plan_node_update};
