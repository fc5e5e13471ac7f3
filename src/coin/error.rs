use crate::coin::{BANK_TAG, RIS_LENGTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedCoinError {
    #[error("canonical coin string has {0} fields, expected 5")]
    WrongFieldCount(usize),
    #[error("coin was issued by '{0}', expected '{BANK_TAG}'")]
    WrongIssuer(String),
    #[error("coin carries {found} hash commitments on the {side} side, expected {RIS_LENGTH}")]
    WrongHashCount { side: String, found: usize },
    #[error("the {0} must not contain the field delimiter '-'")]
    DelimiterCollision(String),
    #[error("the guid must not be empty")]
    EmptyGuid,
    #[error("the owner identity must not be empty")]
    EmptyIdentity,
}
