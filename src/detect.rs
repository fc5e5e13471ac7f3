//! After-the-fact double-spend arbitration.
//!
//! Given two spend transcripts of the same coin, the first index where the disclosures differ
//! must hold the left and right share of one pair, and their XOR reconstructs
//! `marker:identity`. The detector is a pure function: no state, no clock, no key material.

use crate::coin::{marker_prefix, RIS_LENGTH};
use crate::helpers::xor_bytes;
use crate::spend::Transcript;
use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMismatchError {
    #[error("transcript for coin '{found}' submitted in a claim about coin '{expected}'")]
    GuidMismatch { expected: String, found: String },
    #[error("transcript has {found} disclosures, expected {RIS_LENGTH}")]
    WrongLength { found: usize },
}

/// Verdict on a double-spend claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoubleSpendOutcome {
    /// The coin's owner spent it twice; the identity embedded in the coin has been recovered.
    OwnerCheater {
        #[serde(serialize_with = "crate::helpers::to_hex", deserialize_with = "crate::helpers::from_hex")]
        identity: Vec<u8>,
    },
    /// The differing disclosures do not form a valid share pair, so at least one merchant
    /// submitted a transcript inconsistent with the coin's commitments.
    MerchantCheater,
    /// The transcripts are identical at every index: no identity is recoverable, and whoever
    /// claims a double spend is resubmitting the same transcript.
    FalseClaim,
}

/// Compare two transcripts of the coin identified by `guid` and classify the claim.
///
/// Scans indices in order and XORs the disclosures at the first index where they differ. A
/// result carrying the identity marker incriminates the owner; anything else incriminates a
/// merchant; no differing index at all is a false claim.
///
/// Two honest spends agree on every index with probability `2^-RIS_LENGTH`, which bounds the
/// false-claim rate against a genuine double spender. The marker check is literal
/// prefix-matching on the XOR of two byte strings, so an inconsistent pair whose XOR happens to
/// start with the marker would still read as an owner verdict.
pub fn detect_double_spend(
    guid: &str,
    first: &Transcript,
    second: &Transcript,
) -> Result<DoubleSpendOutcome, InputMismatchError> {
    for transcript in [first, second] {
        if transcript.guid() != guid {
            return Err(InputMismatchError::GuidMismatch {
                expected: guid.to_string(),
                found: transcript.guid().to_string(),
            });
        }
        if transcript.len() != RIS_LENGTH {
            return Err(InputMismatchError::WrongLength { found: transcript.len() });
        }
    }
    let prefix = marker_prefix();
    for index in 0..RIS_LENGTH {
        let a = &first.disclosed()[index];
        let b = &second.disclosed()[index];
        if a == b {
            continue;
        }
        let recovered = xor_bytes(a, b);
        return Ok(if recovered.starts_with(&prefix) {
            warn!("double spend of coin {guid} confirmed at index {index}, owner identity recovered");
            DoubleSpendOutcome::OwnerCheater { identity: recovered[prefix.len()..].to_vec() }
        } else {
            warn!("transcripts for coin {guid} disagree at index {index} without forming a share pair");
            DoubleSpendOutcome::MerchantCheater
        });
    }
    debug!("transcripts for coin {guid} are identical, rejecting the claim");
    Ok(DoubleSpendOutcome::FalseClaim)
}
