use crate::blind_signature::keys::{random_below, BankKeyPair, BankPublicKey};
use blake2::{Blake2b512, Digest};
use log::*;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// `H(m) mod n`: the Blake2b-512 digest of the message, read as a big-endian integer and
/// reduced into the signing group.
fn message_digest(message: &[u8], public: &BankPublicKey) -> BigUint {
    let digest = Blake2b512::digest(message);
    BigUint::from_bytes_be(&digest) % public.modulus()
}

/// A message hidden under a blinding factor, ready for the bank to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindedMessage(BigUint);

/// The bank's signature over a blinded message. Useless until unblinded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindedSignature(BigUint);

/// The owner's half of the blinding: `r^-1 mod n`, applied after signing. Revealing it links
/// the blinded message to the coin, so it stays with the owner and its debug output is opaque.
#[derive(Clone, PartialEq, Eq)]
pub struct UnblindFactor {
    r_inv: BigUint,
}

impl Debug for UnblindFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UnblindFactor(<redacted>)")
    }
}

/// An unblinded bank signature, valid against the original message.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(BigUint);

impl Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", self.as_hex())
    }
}

impl Signature {
    pub fn as_hex(&self) -> String {
        hex::encode(self.0.to_bytes_be())
    }
}

impl Serialize for Signature {
    /// Serializes the signature as a hex-encoded string.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        let bytes =
            hex::decode(hex_str).map_err(|e| serde::de::Error::custom(format!("Invalid hex string: {e}")))?;
        Ok(Signature(BigUint::from_bytes_be(&bytes)))
    }
}

/// Blind `message` under a fresh random factor. Returns the value to hand to the bank and the
/// unblinding factor the owner keeps.
pub fn blind<R: CryptoRng + RngCore>(
    message: &[u8],
    public: &BankPublicKey,
    rng: &mut R,
) -> (BlindedMessage, UnblindFactor) {
    let n = public.modulus();
    let m = message_digest(message, public);
    loop {
        let r = random_below(n, rng);
        // r must be invertible mod n; anything else is rejected and redrawn
        let Some(r_inv) = r.modinv(n) else {
            continue;
        };
        let blinded = (&m * r.modpow(public.exponent(), n)) % n;
        return (BlindedMessage(blinded), UnblindFactor { r_inv });
    }
}

/// The bank signs a blinded message it cannot read.
pub fn sign(blinded: &BlindedMessage, keys: &BankKeyPair) -> BlindedSignature {
    trace!("bank signing a blinded message");
    BlindedSignature(blinded.0.modpow(keys.signing_exponent(), keys.modulus()))
}

/// Strip the blinding factor, yielding a signature over the original message.
pub fn unblind(
    blinded_signature: &BlindedSignature,
    factor: &UnblindFactor,
    public: &BankPublicKey,
) -> Signature {
    Signature((&blinded_signature.0 * &factor.r_inv) % public.modulus())
}

/// Check `signature` against `message` under the bank's public parameters. A `false` here is a
/// hard rejection signal for the caller.
pub fn verify(signature: &Signature, message: &[u8], public: &BankPublicKey) -> bool {
    signature.0.modpow(public.exponent(), public.modulus()) == message_digest(message, public)
}
