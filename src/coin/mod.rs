pub mod codec;
mod error;

pub use error::MalformedCoinError;

use crate::blind_signature::Signature;
use crate::helpers::xor_bytes;
use crate::spend::Side;
use blake2::{Blake2b512, Digest};
use log::*;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Number of share pairs per coin, and therefore the number of challenge bits a merchant draws.
///
/// Two independent honest spends of the same coin go undetected only if every one of the
/// `RIS_LENGTH` challenge bits agrees across both spends, i.e. with probability `2^-RIS_LENGTH`.
pub const RIS_LENGTH: usize = 10;

/// Issuer tag leading every canonical coin string.
pub const BANK_TAG: &str = "TENDER";

/// Literal prefix of every `left XOR right` share pair, ahead of `:identity`.
pub const IDENTITY_MARKER: &[u8] = b"owner";

/// Separates the identity marker from the identity payload inside a share pair.
pub const MARKER_DELIMITER: u8 = b':';

/// Separates the fields of the canonical coin string.
pub const FIELD_DELIMITER: char = '-';

/// Separates individual hash commitments inside a canonical string field.
pub const HASH_DELIMITER: char = ',';

/// The byte string every share pair of a coin XORs to: `marker || ':' || identity`.
pub(crate) fn identity_payload(owner_identity: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(IDENTITY_MARKER.len() + 1 + owner_identity.len());
    payload.extend_from_slice(IDENTITY_MARKER);
    payload.push(MARKER_DELIMITER);
    payload.extend_from_slice(owner_identity);
    payload
}

/// `marker || ':'`, what a recovered XOR must start with to incriminate an owner.
pub(crate) fn marker_prefix() -> Vec<u8> {
    let mut prefix = IDENTITY_MARKER.to_vec();
    prefix.push(MARKER_DELIMITER);
    prefix
}

/// Hex-encoded Blake2b-512 commitment to a single share.
pub(crate) fn commit(share: &[u8]) -> String {
    hex::encode(Blake2b512::digest(share))
}

/// One left/right pair of secret shares. `left XOR right` is `marker:identity` by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePair {
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    left: Vec<u8>,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    right: Vec<u8>,
}

/// An electronic coin.
///
/// The public face of a coin is its canonical string (see [`codec`]): issuer tag, amount, guid
/// and the two lists of hash commitments. The shares themselves, and the owner identity they
/// encode, stay with the owner; a spend discloses exactly one share per pair.
///
/// Lifecycle: minted → blinded and signed by the bank ([`crate::blind_signature`]) → signature
/// attached with [`Coin::attach_signature`] → spendable any number of times. Nothing in this
/// type prevents a second spend; double spending is detected afterwards by
/// [`crate::detect::detect_double_spend`]. The revoked flag is advisory only, set by whatever
/// process acts on a detector verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    guid: String,
    amount: u64,
    #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
    owner_identity: Vec<u8>,
    shares: Vec<SharePair>,
    left_hashes: Vec<String>,
    right_hashes: Vec<String>,
    signature: Option<Signature>,
    revoked: bool,
}

impl Coin {
    /// Mint a coin with a fresh random guid. See [`Coin::mint_with_guid`].
    pub fn mint<R: CryptoRng + RngCore>(
        owner_identity: &[u8],
        amount: u64,
        rng: &mut R,
    ) -> Result<Self, MalformedCoinError> {
        let mut guid_bytes = [0u8; 16];
        rng.fill_bytes(&mut guid_bytes);
        Self::mint_with_guid(owner_identity, hex::encode(guid_bytes), amount, rng)
    }

    /// Mint a coin for `owner_identity` under an externally assigned `guid`.
    ///
    /// Generates `RIS_LENGTH` share pairs: the left share of each pair is fresh randomness, the
    /// right share is `left XOR (marker || ':' || identity)`, and both are committed to with
    /// Blake2b-512. Delimiter collisions in the guid are rejected here, so encoding a minted
    /// coin cannot fail later.
    pub fn mint_with_guid<R: CryptoRng + RngCore>(
        owner_identity: &[u8],
        guid: String,
        amount: u64,
        rng: &mut R,
    ) -> Result<Self, MalformedCoinError> {
        if owner_identity.is_empty() {
            return Err(MalformedCoinError::EmptyIdentity);
        }
        if guid.is_empty() {
            return Err(MalformedCoinError::EmptyGuid);
        }
        if guid.contains(FIELD_DELIMITER) {
            return Err(MalformedCoinError::DelimiterCollision("guid".into()));
        }
        let payload = identity_payload(owner_identity);
        let mut shares = Vec::with_capacity(RIS_LENGTH);
        let mut left_hashes = Vec::with_capacity(RIS_LENGTH);
        let mut right_hashes = Vec::with_capacity(RIS_LENGTH);
        for _ in 0..RIS_LENGTH {
            let mut left = vec![0u8; payload.len()];
            rng.fill_bytes(&mut left);
            let right = xor_bytes(&left, &payload);
            left_hashes.push(commit(&left));
            right_hashes.push(commit(&right));
            shares.push(SharePair { left, right });
        }
        debug!("minted coin {guid} over {RIS_LENGTH} share pairs");
        Ok(Coin {
            guid,
            amount,
            owner_identity: owner_identity.to_vec(),
            shares,
            left_hashes,
            right_hashes,
            signature: None,
            revoked: false,
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn left_hashes(&self) -> &[String] {
        &self.left_hashes
    }

    pub fn right_hashes(&self) -> &[String] {
        &self.right_hashes
    }

    /// The coin's canonical string, the message the bank signature covers.
    pub fn canonical(&self) -> String {
        codec::encode(self)
    }

    /// Disclose the share on the given side of pair `index`, as the owner does when answering a
    /// merchant challenge. `None` if `index` is out of range.
    pub fn share_at(&self, side: Side, index: usize) -> Option<&[u8]> {
        let pair = self.shares.get(index)?;
        Some(match side {
            Side::Left => pair.left.as_slice(),
            Side::Right => pair.right.as_slice(),
        })
    }

    /// Attach the unblinded bank signature. Overwrites any previous signature.
    pub fn attach_signature(&mut self, signature: Signature) {
        self.signature = Some(signature);
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Advisory flag only; spending is not blocked by this core either way.
    pub fn mark_revoked(&mut self) {
        warn!("coin {} flagged as revoked", self.guid);
        self.revoked = true;
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    #[cfg(test)]
    pub(crate) fn tamper_left_hash(&mut self, index: usize, value: String) {
        self.left_hashes[index] = value;
    }

    #[cfg(test)]
    pub(crate) fn tamper_right_hash(&mut self, index: usize, value: String) {
        self.right_hashes[index] = value;
    }
}
