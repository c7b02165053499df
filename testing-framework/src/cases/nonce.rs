use std::collections::HashMap;
use zion_common::crypto::Address;

/// Per-case nonce table
///
/// Created empty for every case pack and dropped with it. Each sender's
/// first mutating action gets nonce 0, the next one 1 and so on.
#[derive(Debug, Default)]
pub struct NonceAllocator {
    next: HashMap<Address, u64>,
}

impl NonceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next nonce for `sender` and advance its counter
    pub fn allocate(&mut self, sender: Address) -> u64 {
        let next = self.next.entry(sender).or_insert(0);
        let nonce = *next;
        *next += 1;
        nonce
    }

    /// Next nonce that `allocate` would return, without consuming it
    pub fn peek(&self, sender: &Address) -> u64 {
        self.next.get(sender).copied().unwrap_or(0)
    }

    /// Number of distinct senders seen so far
    pub fn senders(&self) -> usize {
        self.next.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn address(id: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = id;
        Address::new(bytes)
    }

    #[test]
    fn test_first_allocation_is_zero() {
        let mut allocator = NonceAllocator::new();
        assert_eq!(allocator.peek(&address(1)), 0);
        assert_eq!(allocator.allocate(address(1)), 0);
        assert_eq!(allocator.peek(&address(1)), 1);
    }

    #[test]
    fn test_sequential_allocations() {
        let mut allocator = NonceAllocator::new();
        let nonces: Vec<u64> = (0..5).map(|_| allocator.allocate(address(7))).collect();
        assert_eq!(nonces, vec![0, 1, 2, 3, 4]);
        assert_eq!(allocator.senders(), 1);
    }

    #[test]
    fn test_senders_are_independent() {
        let mut allocator = NonceAllocator::new();
        assert_eq!(allocator.allocate(address(1)), 0);
        assert_eq!(allocator.allocate(address(2)), 0);
        assert_eq!(allocator.allocate(address(1)), 1);
        assert_eq!(allocator.allocate(address(2)), 1);
        assert_eq!(allocator.allocate(address(2)), 2);
        assert_eq!(allocator.senders(), 2);
    }

    proptest! {
        #[test]
        fn prop_each_sender_counts_from_zero(senders in proptest::collection::vec(0u8..4, 0..64)) {
            let mut allocator = NonceAllocator::new();
            let mut expected: HashMap<u8, u64> = HashMap::new();
            for id in senders {
                let want = expected.entry(id).or_insert(0);
                prop_assert_eq!(allocator.allocate(address(id)), *want);
                *want += 1;
            }
        }
    }
}
