use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("RSA modulus of {requested} bits is too small, the minimum is {min} bits")]
    ModulusTooSmall { requested: usize, min: usize },
}
