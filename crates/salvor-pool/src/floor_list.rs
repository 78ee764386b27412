//! Floor-price ordered list: an arena-backed doubly-linked list ascending by
//! price. Nodes never move; removal flips `active` and relinks, and the freed
//! slot is reused before the arena grows.
//!
//! `insert` verifies caller-supplied neighbor indices instead of searching,
//! so the on-chain cost of a listing is O(1) regardless of pool size. Clients
//! precompute neighbors off-chain (or via the `locate_insertion` view).

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::PoolError;

/// Null sentinel for head/tail when the list is empty.
pub const NO_NODE: u32 = u32::MAX;

#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq,
)]
pub struct ListingNode {
    pub price: u128,
    /// Index of the previous (cheaper-or-equal) node; self-referencing at the head.
    pub prev: u32,
    /// Index of the next (costlier-or-equal) node; self-referencing at the tail.
    pub next: u32,
    /// false = free slot, eligible for reuse.
    pub active: bool,
    /// Opaque handle to the listed asset.
    pub payload_id: u64,
}

#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, PartialEq,
)]
pub struct FloorList {
    nodes: Vec<ListingNode>,
    /// Head: the cheapest active listing. NO_NODE when empty.
    floor_index: u32,
    /// Tail: the costliest active listing. NO_NODE when empty.
    highest_index: u32,
    active_count: u32,
}

impl Default for FloorList {
    fn default() -> Self {
        Self::new()
    }
}

impl FloorList {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            floor_index: NO_NODE,
            highest_index: NO_NODE,
            active_count: 0,
        }
    }

    // ── Views ────────────────────────────────────────────────────────

    pub fn floor_price(&self) -> Option<u128> {
        self.node(self.floor_index).map(|n| n.price)
    }

    pub fn highest_price(&self) -> Option<u128> {
        self.node(self.highest_index).map(|n| n.price)
    }

    pub fn floor_index(&self) -> Option<u32> {
        (self.floor_index != NO_NODE).then_some(self.floor_index)
    }

    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    /// Arena length, including free slots.
    pub fn len(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    pub fn node(&self, index: u32) -> Option<&ListingNode> {
        self.nodes.get(index as usize).filter(|n| n.active)
    }

    /// Active nodes in ascending price order, with their arena indices.
    pub fn ascending(&self) -> Vec<(u32, &ListingNode)> {
        let mut out = Vec::with_capacity(self.active_count as usize);
        let mut cursor = self.floor_index;
        while cursor != NO_NODE {
            let node = &self.nodes[cursor as usize];
            out.push((cursor, node));
            if node.next == cursor {
                break;
            }
            cursor = node.next;
        }
        out
    }

    /// Compute `(free_index, previous_index)` for inserting `price`, honoring
    /// FIFO order among equal prices. Head inserts use the
    /// `previous_index == free_index` sentinel convention.
    pub fn locate_insertion(&self, price: u128) -> (u32, u32) {
        let free_index = self
            .nodes
            .iter()
            .position(|n| !n.active)
            .map(|i| i as u32)
            .unwrap_or_else(|| self.len());

        if self.active_count == 0 {
            return (free_index, free_index);
        }
        if price < self.nodes[self.floor_index as usize].price {
            return (free_index, free_index);
        }

        let mut cursor = self.floor_index;
        loop {
            let node = &self.nodes[cursor as usize];
            if node.next == cursor || self.nodes[node.next as usize].price > price {
                return (free_index, cursor);
            }
            cursor = node.next;
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Insert a node at the caller-chosen position. Verification only, no
    /// search: `free_index` must be a free slot or the arena tail (append),
    /// and `previous_index` must be the correct ordered predecessor
    /// (`previous_index == free_index` means "insert at the head").
    /// Returns the node's arena index.
    pub fn insert(
        &mut self,
        price: u128,
        payload_id: u64,
        free_index: u32,
        previous_index: u32,
    ) -> Result<u32, PoolError> {
        let len = self.len();
        let appending = free_index == len;
        if !appending {
            let reusable = self
                .nodes
                .get(free_index as usize)
                .is_some_and(|n| !n.active);
            if !reusable {
                return Err(PoolError::InvalidFreeIndex);
            }
        }

        let (prev, next) = if self.active_count == 0 {
            // Sole node: self-referencing both ways.
            (free_index, free_index)
        } else if previous_index == free_index {
            // Head insert: must strictly undercut the current floor, so equal
            // prices keep FIFO order behind the incumbent.
            let head = self.floor_index;
            if price >= self.nodes[head as usize].price {
                return Err(PoolError::OutOfOrderInsert);
            }
            (free_index, head)
        } else {
            let prev_node = self
                .nodes
                .get(previous_index as usize)
                .filter(|n| n.active)
                .ok_or(PoolError::InvalidNeighbor)?;
            if prev_node.price > price {
                return Err(PoolError::OutOfOrderInsert);
            }
            if previous_index == self.highest_index {
                // Tail append: the new node becomes its own successor.
                (previous_index, free_index)
            } else {
                let next_index = prev_node.next;
                if self.nodes[next_index as usize].price < price {
                    return Err(PoolError::OutOfOrderInsert);
                }
                (previous_index, next_index)
            }
        };

        let node = ListingNode {
            price,
            prev,
            next,
            active: true,
            payload_id,
        };
        if appending {
            self.nodes.push(node);
        } else {
            self.nodes[free_index as usize] = node;
        }

        // Relink neighbors and head/tail pointers.
        if self.active_count == 0 {
            self.floor_index = free_index;
            self.highest_index = free_index;
        } else if prev == free_index {
            self.nodes[next as usize].prev = free_index;
            self.floor_index = free_index;
        } else if next == free_index {
            self.nodes[prev as usize].next = free_index;
            self.highest_index = free_index;
        } else {
            self.nodes[prev as usize].next = free_index;
            self.nodes[next as usize].prev = free_index;
        }

        self.active_count += 1;
        Ok(free_index)
    }

    /// Unlink an active node and mark its slot free. Returns the removed node.
    pub fn remove(&mut self, node_index: u32) -> Result<ListingNode, PoolError> {
        let node = self
            .nodes
            .get(node_index as usize)
            .filter(|n| n.active)
            .cloned()
            .ok_or(PoolError::NodeNotActive)?;

        if self.active_count == 1 {
            self.floor_index = NO_NODE;
            self.highest_index = NO_NODE;
        } else if node_index == self.floor_index {
            let new_head = node.next;
            self.nodes[new_head as usize].prev = new_head;
            self.floor_index = new_head;
        } else if node_index == self.highest_index {
            let new_tail = node.prev;
            self.nodes[new_tail as usize].next = new_tail;
            self.highest_index = new_tail;
        } else {
            self.nodes[node.prev as usize].next = node.next;
            self.nodes[node.next as usize].prev = node.prev;
        }

        self.nodes[node_index as usize].active = false;
        self.active_count -= 1;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices(list: &FloorList) -> Vec<u128> {
        list.ascending().iter().map(|(_, n)| n.price).collect()
    }

    fn prices_descending(list: &FloorList) -> Vec<u128> {
        let mut out = Vec::new();
        let mut cursor = match list.ascending().last() {
            Some((i, _)) => *i,
            None => return out,
        };
        loop {
            let node = list.node(cursor).unwrap();
            out.push(node.price);
            if node.prev == cursor {
                break;
            }
            cursor = node.prev;
        }
        out
    }

    fn insert_at(list: &mut FloorList, price: u128, payload_id: u64) -> u32 {
        let (free, prev) = list.locate_insertion(price);
        list.insert(price, payload_id, free, prev).unwrap()
    }

    #[test]
    fn first_insert_becomes_head_and_tail() {
        let mut list = FloorList::new();
        let idx = list.insert(50, 1, 0, 0).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(list.floor_price(), Some(50));
        assert_eq!(list.highest_price(), Some(50));
        let node = list.node(0).unwrap();
        assert_eq!((node.prev, node.next), (0, 0));
    }

    #[test]
    fn head_insert_requires_strict_undercut() {
        let mut list = FloorList::new();
        list.insert(50, 1, 0, 0).unwrap();
        // 30 undercuts 50: head insert via the previous==free sentinel.
        list.insert(30, 2, 1, 1).unwrap();
        assert_eq!(list.floor_price(), Some(30));
        // 40 >= 30 cannot claim the head.
        assert_eq!(list.insert(40, 3, 2, 2), Err(PoolError::OutOfOrderInsert));
    }

    #[test]
    fn interior_insert_verifies_both_neighbors() {
        let mut list = FloorList::new();
        let a = insert_at(&mut list, 10, 1);
        insert_at(&mut list, 30, 2);
        // 20 after 10 is fine.
        list.insert(20, 3, list.len(), a).unwrap();
        assert_eq!(prices(&list), vec![10, 20, 30]);
        // 40 after 10 would land before 20: rejected, not repositioned.
        assert_eq!(
            list.insert(40, 4, list.len(), a),
            Err(PoolError::OutOfOrderInsert)
        );
    }

    #[test]
    fn bad_free_index_is_rejected() {
        let mut list = FloorList::new();
        let idx = insert_at(&mut list, 10, 1);
        // Occupied slot.
        assert_eq!(list.insert(20, 2, idx, idx), Err(PoolError::InvalidFreeIndex));
        // Past the arena tail.
        assert_eq!(list.insert(20, 2, 5, idx), Err(PoolError::InvalidFreeIndex));
    }

    #[test]
    fn inactive_predecessor_is_rejected() {
        let mut list = FloorList::new();
        let a = insert_at(&mut list, 10, 1);
        insert_at(&mut list, 20, 2);
        list.remove(a).unwrap();
        assert_eq!(list.insert(15, 3, a, a + 10), Err(PoolError::InvalidNeighbor));
    }

    #[test]
    fn equal_prices_keep_fifo_order() {
        let mut list = FloorList::new();
        insert_at(&mut list, 10, 1);
        insert_at(&mut list, 10, 2);
        insert_at(&mut list, 10, 3);
        let order: Vec<u64> = list.ascending().iter().map(|(_, n)| n.payload_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn removal_relinks_and_frees_the_slot() {
        let mut list = FloorList::new();
        let a = insert_at(&mut list, 10, 1);
        let b = insert_at(&mut list, 20, 2);
        let c = insert_at(&mut list, 30, 3);

        list.remove(b).unwrap();
        assert_eq!(prices(&list), vec![10, 30]);
        assert_eq!(prices_descending(&list), vec![30, 10]);
        assert_eq!(list.active_count(), 2);

        // The freed slot is reused before the arena grows.
        let (free, prev) = list.locate_insertion(15);
        assert_eq!(free, b);
        assert_eq!(prev, a);
        list.insert(15, 4, free, prev).unwrap();
        assert_eq!(prices(&list), vec![10, 15, 30]);
        assert_eq!(list.len(), 3);

        // Double removal fails.
        list.remove(c).unwrap();
        assert_eq!(list.remove(c), Err(PoolError::NodeNotActive));
    }

    #[test]
    fn removing_head_and_tail_updates_endpoints() {
        let mut list = FloorList::new();
        let a = insert_at(&mut list, 10, 1);
        insert_at(&mut list, 20, 2);
        let c = insert_at(&mut list, 30, 3);

        list.remove(a).unwrap();
        assert_eq!(list.floor_price(), Some(20));
        list.remove(c).unwrap();
        assert_eq!(list.highest_price(), Some(20));
        assert_eq!(prices(&list), vec![20]);
    }

    #[test]
    fn removing_the_sole_node_resets_sentinels() {
        let mut list = FloorList::new();
        let a = insert_at(&mut list, 10, 1);
        list.remove(a).unwrap();
        assert_eq!(list.floor_price(), None);
        assert_eq!(list.floor_index(), None);
        assert_eq!(list.active_count(), 0);

        // The list is usable again after draining.
        insert_at(&mut list, 99, 2);
        assert_eq!(list.floor_price(), Some(99));
    }

    #[test]
    fn remove_and_reinsert_preserves_relative_order() {
        let mut list = FloorList::new();
        for (i, p) in [40u128, 10, 30, 20, 50].iter().enumerate() {
            insert_at(&mut list, *p, i as u64);
        }
        assert_eq!(prices(&list), vec![10, 20, 30, 40, 50]);

        let (idx, _) = *list
            .ascending()
            .iter()
            .find(|(_, n)| n.price == 30)
            .unwrap();
        list.remove(idx).unwrap();
        assert_eq!(prices(&list), vec![10, 20, 40, 50]);

        insert_at(&mut list, 30, 9);
        assert_eq!(prices(&list), vec![10, 20, 30, 40, 50]);
        assert_eq!(prices_descending(&list), vec![50, 40, 30, 20, 10]);
    }
}
