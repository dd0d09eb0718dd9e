use serde::Serialize;

use crate::network::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chain {
    pub id: u64,
    pub name: &'static str,
    pub network: Network,
}

pub const ARBITRUM: Chain = Chain {
    id: 42161,
    name: "Arbitrum One",
    network: Network::Evm,
};

pub const ARBITRUM_SEPOLIA: Chain = Chain {
    id: 421614,
    name: "Arbitrum Sepolia",
    network: Network::Evm,
};

pub const CHAIN_LIST: &[Chain] = &[ARBITRUM, ARBITRUM_SEPOLIA];

pub fn find_chain(id: u64) -> Option<&'static Chain> {
    CHAIN_LIST.iter().find(|chain| chain.id == id)
}
