use serde::{Deserialize, Deserializer, Serialize};

pub fn to_hex<S>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    hex::encode(bytes).serialize(s)
}

pub fn from_hex<'de, D>(de: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let hex_str = String::deserialize(de)?;
    hex::decode(hex_str).map_err(|e| serde::de::Error::custom(format!("Invalid hex string: {e}")))
}

pub fn vec_to_hex<S>(list: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let hex_strings = list.iter().map(|bytes| hex::encode(bytes)).collect::<Vec<_>>();
    hex_strings.serialize(s)
}

pub fn vec_from_hex<'de, D>(de: D) -> Result<Vec<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let hex_strings = Vec::<String>::deserialize(de)?;
    hex_strings
        .into_iter()
        .map(|hex_str| {
            hex::decode(hex_str).map_err(|e| serde::de::Error::custom(format!("Invalid hex string: {e}")))
        })
        .collect()
}

/// XOR two byte strings position by position.
///
/// If the inputs differ in length the result is truncated to the shorter one. Everywhere the
/// protocol XORs honestly constructed values the lengths match by construction; length-mangled
/// adversarial input simply fails the marker check downstream.
pub fn xor_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}
