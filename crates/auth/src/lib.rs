//! Wallet sign-in: EIP-4361 messages, EIP-191 signature recovery, and the
//! session tokens handed out afterwards.

pub mod address;
pub mod error;
pub mod nonce;
pub mod signature;
pub mod siwe;
pub mod token;

pub use address::{is_address, is_hex, to_checksum_address};
pub use error::AuthError;
pub use nonce::generate_nonce;
pub use signature::verify_personal_signature;
pub use siwe::SiweMessage;
pub use token::{AuthUser, TokenIssuer};
