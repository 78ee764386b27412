/// Errors raised by the pool primitives. Contracts map these into their own
/// `FunctionError` enums so callers can assert on the specific failure kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The candidate slot is neither a free (inactive) node nor the arena tail.
    InvalidFreeIndex,
    /// The supplied neighbor indices would break the ascending price order.
    OutOfOrderInsert,
    /// The supplied predecessor is not an active node.
    InvalidNeighbor,
    /// The node targeted for removal is not active.
    NodeNotActive,
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFreeIndex => write!(f, "Invalid free index"),
            Self::OutOfOrderInsert => write!(f, "Out-of-order insert"),
            Self::InvalidNeighbor => write!(f, "Previous node is not active"),
            Self::NodeNotActive => write!(f, "Node is not active"),
        }
    }
}

impl std::error::Error for PoolError {}
