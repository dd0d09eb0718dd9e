use serde::Serialize;

use crate::chain::{ARBITRUM, ARBITRUM_SEPOLIA};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    /// `None` for the chain's native asset.
    pub address: Option<&'static str>,
}

pub const SUPPORTED_TOKENS: &[&str] = &["PYUSD", "USDC", "USDT"];

const fn erc20(
    name: &'static str,
    symbol: &'static str,
    decimals: u8,
    address: &'static str,
) -> Token {
    Token {
        name,
        symbol,
        decimals,
        address: Some(address),
    }
}

pub const ARBITRUM_TOKENS: &[Token] = &[
    erc20("PayPal USD", "PYUSD", 18, "0x3c2B8Be99c50593081EAA2A724F0B8285F5aba8f"),
    erc20("USD Coin", "USDC", 6, "0xFF970A61A04b1cA14834A43f5dE4533eBDDB5CC8"),
    erc20("Tether", "USDT", 6, "0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
];

pub const ARBITRUM_SEPOLIA_TOKENS: &[Token] = &[
    erc20("PayPal USD", "PYUSD", 18, "0xB47e6A5f8b33b3F17603C83a0535A9dcD7E32681"),
    erc20("USD Coin", "USDC", 6, "0x07865c6E87B9F70255377e024ace6630C1Eaa37F"),
    erc20("Tether", "USDT", 6, "0x07865c6E87B9F70255377e024ace6630C1Eaa37F"),
];

pub fn chain_tokens(chain_id: u64) -> &'static [Token] {
    match chain_id {
        id if id == ARBITRUM.id => ARBITRUM_TOKENS,
        id if id == ARBITRUM_SEPOLIA.id => ARBITRUM_SEPOLIA_TOKENS,
        _ => &[],
    }
}

pub fn find_token(chain_id: u64, symbol: &str) -> Option<&'static Token> {
    chain_tokens(chain_id)
        .iter()
        .find(|token| token.symbol == symbol)
}
