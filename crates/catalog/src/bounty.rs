use serde::Serialize;

use crate::chain::Chain;
use crate::token::Token;

/// A reward pledged against an issue. Escrow lives outside this service, so
/// nothing here produces bounties yet; the shape is what clients render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounty {
    pub id: String,
    pub chain: Chain,
    pub token: Token,
    /// Raw token amount as a `0x`-prefixed hex string.
    pub amount: String,
    pub created_by: String,
}
