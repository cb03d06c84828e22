//! Account identity and balance values
//!
//! - `AccountId`: 32-byte wallet public key with a base58 text form
//! - `Balance`: native-unit amount with its 3-digit display form

pub mod types;
pub mod balance;

pub use types::{AccountId, PUBKEY_LEN};
pub use balance::{Balance, Lamports, LAMPORTS_PER_SOL};
