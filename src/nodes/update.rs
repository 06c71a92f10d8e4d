//! Cluster-aware node update planning
//!
//! Planning is pure: it takes the current node set and the incoming node and
//! returns the rename and writes an environment must perform, in order.

use super::types::Node;

/// File operations required to apply a node update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUpdatePlan {
    /// Old and new node name when an externally managed node was renamed
    pub rename: Option<(String, String)>,
    /// Nodes to write, incoming node first
    pub writes: Vec<Node>,
}

/// Compute the writes needed to store `incoming` into `current`
///
/// Externally managed nodes are matched on `api_url`: a match donates its
/// wallet and identity when the incoming node has none, and a differing name
/// becomes a rename. Orderers with a cluster name propagate wallet, identity
/// and visibility to every other orderer in the cluster.
#[must_use]
pub fn plan_node_update(current: &[Node], incoming: &Node, externally_managed: bool) -> NodeUpdatePlan {
    let mut node = incoming.clone();
    let mut rename = None;

    if externally_managed {
        if let Some(existing) = current.iter().find(|n| n.api_url == node.api_url) {
            if node.wallet.is_none() {
                node.wallet.clone_from(&existing.wallet);
            }
            if node.identity.is_none() {
                node.identity.clone_from(&existing.identity);
            }
            if existing.name != node.name {
                rename = Some((existing.name.clone(), node.name.clone()));
            }
        }
    }

    let renamed_from = rename.as_ref().map(|(old, _)| old.as_str());
    let mut writes = Vec::new();

    if let Some(cluster) = node.orderer_cluster() {
        for sibling in current.iter().filter(|n| {
            n.orderer_cluster() == Some(cluster)
                && n.name != node.name
                && Some(n.name.as_str()) != renamed_from
        }) {
            let mut updated = sibling.clone();
            updated.wallet.clone_from(&node.wallet);
            updated.identity.clone_from(&node.identity);
            updated.hidden = node.hidden;
            writes.push(updated);
        }
    }

    writes.insert(0, node);
    NodeUpdatePlan { rename, writes }
}
