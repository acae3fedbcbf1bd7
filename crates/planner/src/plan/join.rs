use serde::{Deserialize, Serialize};

use crate::plan::table::Table;

/// Equi-join type carried through to worker-input descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    /// Inner equi-join.
    Inner,
    /// Left-outer equi-join.
    EquiLeft,
    /// Right-outer equi-join.
    EquiRight,
    /// Full-outer equi-join.
    EquiFull,
}

impl JoinType {
    /// The join type after the two sides are swapped.
    pub fn flip(self) -> Self {
        match self {
            Self::Inner => Self::Inner,
            Self::EquiLeft => Self::EquiRight,
            Self::EquiRight => Self::EquiLeft,
            Self::EquiFull => Self::EquiFull,
        }
    }
}

/// Join execution algorithm.
///
/// User plans carry only `Broadcast` and `Partitioned`; the chain variants
/// are assigned by the compiler when it fuses consecutive broadcast joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinAlgorithm {
    /// Replicate the small side to every worker of the large side.
    Broadcast,
    /// Hash-partition both sides to a common fan-out.
    Partitioned,
    /// Consecutive broadcast joins fused into one worker.
    BroadcastChain,
    /// A broadcast chain fused in front of a partitioned probe.
    PartitionedChain,
}

/// Which side of a join is the small (build) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinEndian {
    /// The left child is the small side.
    SmallLeft,
    /// The left child is the large side.
    LargeLeft,
}

/// One equi-join node of the plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    /// Left child.
    pub left: Box<Table>,
    /// Right child.
    pub right: Box<Table>,
    /// Key column ids within the left child's columns.
    pub left_key_column_ids: Vec<usize>,
    /// Key column ids within the right child's columns.
    pub right_key_column_ids: Vec<usize>,
    /// Bitmask over the left child's columns selecting join outputs.
    pub left_projection: Vec<bool>,
    /// Bitmask over the right child's columns selecting join outputs.
    pub right_projection: Vec<bool>,
    /// Output aliases for the projected left columns.
    pub left_column_alias: Vec<String>,
    /// Output aliases for the projected right columns.
    pub right_column_alias: Vec<String>,
    /// Join type.
    pub join_type: JoinType,
    /// Join algorithm.
    pub join_algo: JoinAlgorithm,
    /// Which side is small.
    pub join_endian: JoinEndian,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_swaps_outer_sides() {
        assert_eq!(JoinType::Inner.flip(), JoinType::Inner);
        assert_eq!(JoinType::EquiLeft.flip(), JoinType::EquiRight);
        assert_eq!(JoinType::EquiRight.flip(), JoinType::EquiLeft);
        assert_eq!(JoinType::EquiFull.flip(), JoinType::EquiFull);
    }

    #[test]
    fn wire_names_are_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&JoinType::EquiLeft).unwrap(),
            "\"EQUI_LEFT\""
        );
        assert_eq!(
            serde_json::to_string(&JoinAlgorithm::BroadcastChain).unwrap(),
            "\"BROADCAST_CHAIN\""
        );
        assert_eq!(
            serde_json::to_string(&JoinEndian::SmallLeft).unwrap(),
            "\"SMALL_LEFT\""
        );
    }
}
