use crate::node::NodeId;
use std::fmt;

/// Unique identifier of the wireless link between two nodes
///
/// Reachability is symmetric so the link is too: for all nodes `n1` and
/// `n2` the identifier `(n1, n2)` is the same as the identifier `(n2, n1)`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId {
    smaller_id: NodeId,
    larger_id: NodeId,
}

impl LinkId {
    /// create the link identifier from the given node tuple.
    ///
    /// ```
    /// # use hopsim_core::{link::LinkId, node::NodeId};
    /// # let n1 = NodeId::ZERO;
    /// # let n2 = NodeId::ONE;
    /// LinkId::new((n1, n2))
    /// # ;
    /// ```
    pub fn new((a, b): (NodeId, NodeId)) -> Self {
        if a < b {
            Self {
                smaller_id: a,
                larger_id: b,
            }
        } else {
            Self {
                smaller_id: b,
                larger_id: a,
            }
        }
    }

    /// get the [`NodeId`]s that compose this link identifier
    ///
    /// The smaller identifier always comes first, whatever the order used
    /// at construction.
    #[inline]
    pub fn into_nodes(self) -> (NodeId, NodeId) {
        (self.smaller_id, self.larger_id)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<->{}", self.smaller_id, self.larger_id)
    }
}
