//! Canonical coin string: `TAG-amount-guid-lh_0,..,lh_N-rh_0,..,rh_N`.
//!
//! This string is what the bank blind-signs and what a merchant verifies against, so encoding
//! must be exact and decoding strict. Delimiter collisions are impossible for minted coins (the
//! amount is numeric and the guid is checked at mint), which makes [`encode`] infallible.

use crate::coin::error::MalformedCoinError;
use crate::coin::{Coin, BANK_TAG, FIELD_DELIMITER, HASH_DELIMITER, RIS_LENGTH};

/// The public commitment data recovered from a canonical string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCommitments {
    left_hashes: Vec<String>,
    right_hashes: Vec<String>,
}

impl DecodedCommitments {
    pub fn left_hashes(&self) -> &[String] {
        &self.left_hashes
    }

    pub fn right_hashes(&self) -> &[String] {
        &self.right_hashes
    }
}

pub fn encode(coin: &Coin) -> String {
    let left = coin.left_hashes().join(&HASH_DELIMITER.to_string());
    let right = coin.right_hashes().join(&HASH_DELIMITER.to_string());
    let d = FIELD_DELIMITER;
    format!("{BANK_TAG}{d}{}{d}{}{d}{left}{d}{right}", coin.amount(), coin.guid())
}

/// Parse and validate a canonical string, returning both commitment lists.
///
/// Rejects foreign issuer tags and hash lists that are not exactly [`RIS_LENGTH`] long; both
/// checks happen before any challenge is issued against the coin.
pub fn decode(canonical: &str) -> Result<DecodedCommitments, MalformedCoinError> {
    let fields = canonical.split(FIELD_DELIMITER).collect::<Vec<_>>();
    if fields.len() != 5 {
        return Err(MalformedCoinError::WrongFieldCount(fields.len()));
    }
    if fields[0] != BANK_TAG {
        return Err(MalformedCoinError::WrongIssuer(fields[0].to_string()));
    }
    let left_hashes = split_hashes(fields[3], "left")?;
    let right_hashes = split_hashes(fields[4], "right")?;
    Ok(DecodedCommitments { left_hashes, right_hashes })
}

fn split_hashes(field: &str, side: &str) -> Result<Vec<String>, MalformedCoinError> {
    let hashes = field.split(HASH_DELIMITER).map(str::to_string).collect::<Vec<_>>();
    if hashes.len() != RIS_LENGTH {
        return Err(MalformedCoinError::WrongHashCount { side: side.into(), found: hashes.len() });
    }
    Ok(hashes)
}
