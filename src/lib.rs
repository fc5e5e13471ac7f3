//! Offline electronic cash.
//!
//! A coin minted by [`coin::Coin::mint`] embeds its owner's identity in `RIS_LENGTH` pairs of
//! secret shares: each pair XORs to `marker:identity`, and only hash commitments to the shares
//! are published in the coin's canonical string. The bank signs that string blindly
//! ([`blind_signature`]), a merchant accepts the coin by challenging one random side of every
//! pair ([`spend`]), and two transcripts of the same coin let the bank recover a double
//! spender's identity after the fact ([`detect`]).
//!
//! Double spending is *detected*, never prevented: a single spend reveals one share per pair,
//! which says nothing about the owner, while two independent spends disagree on at least one
//! side with probability `1 - 2^-RIS_LENGTH` and the disclosed pair XORs back to the identity.

pub mod blind_signature;
pub mod coin;
pub mod detect;
pub mod helpers;
pub mod spend;
