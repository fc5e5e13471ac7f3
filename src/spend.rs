//! Merchant-side coin acceptance.
//!
//! A merchant verifies the bank signature over the coin's canonical string, then challenges one
//! random side of every share pair and checks each disclosure against its published commitment.
//! Acceptance is all-or-nothing: either every challenge verifies and the merchant keeps the full
//! transcript, or the coin is rejected with nothing retained.

use crate::blind_signature::{verify, BankPublicKey};
use crate::coin::{codec, commit, Coin, MalformedCoinError, RIS_LENGTH};
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpendError {
    #[error("the bank signature on the coin is missing or does not verify")]
    InvalidSignature,
    #[error("malformed coin: {0}")]
    Malformed(#[from] MalformedCoinError),
    #[error("disclosed share at index {index} does not match its commitment")]
    Forgery { index: usize },
}

/// Which share of a pair a challenge selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Source of the merchant's per-index challenge bits.
///
/// The detector's `1 - 2^-RIS_LENGTH` recall guarantee holds only if draws are fair and
/// independent across indices and across spends; a biased source degrades detection, never the
/// validity of an honest single spend.
pub trait ChallengeSource {
    fn draw(&mut self) -> Side;
}

/// Fair challenge bits from a CSPRNG. The normal merchant configuration.
pub struct RngChallenge<R> {
    rng: R,
}

impl<R: rand::CryptoRng + rand::RngCore> RngChallenge<R> {
    pub fn new(rng: R) -> Self {
        RngChallenge { rng }
    }
}

impl<R: rand::CryptoRng + rand::RngCore> ChallengeSource for RngChallenge<R> {
    fn draw(&mut self) -> Side {
        if self.rng.next_u32() & 1 == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// A fixed, cycling sequence of sides. Lets tests pin down the exact transcript a spend
/// produces.
pub struct FixedChallenge {
    sides: Vec<Side>,
    cursor: usize,
}

impl FixedChallenge {
    /// Panics if `sides` is empty.
    pub fn new(sides: Vec<Side>) -> Self {
        assert!(!sides.is_empty(), "FixedChallenge needs at least one side");
        FixedChallenge { sides, cursor: 0 }
    }

    pub fn all(side: Side) -> Self {
        Self::new(vec![side])
    }
}

impl ChallengeSource for FixedChallenge {
    fn draw(&mut self) -> Side {
        let side = self.sides[self.cursor % self.sides.len()];
        self.cursor += 1;
        side
    }
}

/// The reveal transcript of one accepted spend: the disclosed share of every pair, in index
/// order. Which side each disclosure came from is deliberately not recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    guid: String,
    amount: u64,
    #[serde(serialize_with = "crate::helpers::vec_to_hex", deserialize_with = "crate::helpers::vec_from_hex")]
    disclosed: Vec<Vec<u8>>,
}

impl Transcript {
    /// Assemble a transcript from parts, as when one arrives from another merchant for
    /// double-spend arbitration.
    pub fn new(guid: String, amount: u64, disclosed: Vec<Vec<u8>>) -> Self {
        Transcript { guid, amount, disclosed }
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn disclosed(&self) -> &[Vec<u8>] {
        &self.disclosed
    }

    pub fn len(&self) -> usize {
        self.disclosed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disclosed.is_empty()
    }
}

/// Run the acceptance protocol against a signed coin.
///
/// Verifies the bank signature over the canonical string, decodes the commitment lists, then for
/// each of the `RIS_LENGTH` indices draws a side from `challenges`, asks the coin for that share
/// and checks it against the published commitment. Any failure aborts with no transcript; the
/// protocol records no state, so repeated calls against the same coin are independent.
pub fn spend<C: ChallengeSource>(
    coin: &Coin,
    bank: &BankPublicKey,
    challenges: &mut C,
) -> Result<Transcript, SpendError> {
    let canonical = coin.canonical();
    let Some(signature) = coin.signature() else {
        warn!("rejecting unsigned coin {}", coin.guid());
        return Err(SpendError::InvalidSignature);
    };
    if !verify(signature, canonical.as_bytes(), bank) {
        warn!("bank signature on coin {} failed verification", coin.guid());
        return Err(SpendError::InvalidSignature);
    }
    let commitments = codec::decode(&canonical)?;
    let mut disclosed = Vec::with_capacity(RIS_LENGTH);
    for index in 0..RIS_LENGTH {
        let side = challenges.draw();
        let Some(share) = coin.share_at(side, index) else {
            warn!("coin {} refused to disclose a share at index {index}", coin.guid());
            return Err(SpendError::Forgery { index });
        };
        let expected = match side {
            Side::Left => &commitments.left_hashes()[index],
            Side::Right => &commitments.right_hashes()[index],
        };
        if commit(share) != *expected {
            warn!("share {index} of coin {} does not match its commitment", coin.guid());
            return Err(SpendError::Forgery { index });
        }
        disclosed.push(share.to_vec());
    }
    debug!("accepted coin {} for {}, {} shares disclosed", coin.guid(), coin.amount(), disclosed.len());
    Ok(Transcript { guid: coin.guid().to_string(), amount: coin.amount(), disclosed })
}
