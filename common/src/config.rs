use crate::crypto::Address;

// Default gas price: 1 gwei
pub const DEFAULT_GAS_PRICE: u128 = 1_000_000_000;
// Fixed gas limit used for every contract call, no estimation
pub const DEFAULT_GAS_LIMIT: u64 = 10_000_000;

// Chain id of the Zion network, used for EIP-155 replay protection
pub const ZION_CHAIN_ID: u64 = 1000;

// Node manager system contract lives at 0x...1000
pub const NODE_MANAGER_CONTRACT: Address = Address::new([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x10, 0x00,
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_manager_contract_address() {
        assert_eq!(
            NODE_MANAGER_CONTRACT.to_string(),
            "0x0000000000000000000000000000000000001000"
        );
    }
}
