//! Chaum RSA blind signatures, the withdrawal collaborator.
//!
//! The coin protocol only relies on the contract `verify(unblind(sign(blind(m))), m) == true`
//! for honestly generated coins, and treats a failing `verify` as a hard rejection. The
//! arithmetic here is textbook RSA blinding: the bank signs `H(m) * r^e mod n` without learning
//! `H(m)`, and the owner divides the blinding factor back out.

mod error;
mod keys;
mod rsa;

pub use error::KeyError;
pub use keys::{BankKeyPair, BankPublicKey, BankSecretKey, MIN_MODULUS_BITS, PUBLIC_EXPONENT};
pub use rsa::{blind, sign, unblind, verify, BlindedMessage, BlindedSignature, Signature, UnblindFactor};
