//! Deserializers that accept numbers sent either as JSON numbers or as
//! numeric strings. Browser forms serialized with `Object.fromEntries`
//! post every field as a string.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(v) => Ok(v),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got {:?}", s))),
    }
}

/// Non-negative whole count (e.g. number of panels).
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(v) => {
            if v.fract() != 0.0 || v < 0.0 || v > u32::MAX as f64 {
                Err(de::Error::custom(format!(
                    "expected a non-negative whole number, got {}",
                    v
                )))
            } else {
                Ok(v as u32)
            }
        }
        NumberOrText::Text(s) => s.trim().parse::<u32>().map_err(|_| {
            de::Error::custom(format!("expected a non-negative whole number, got {:?}", s))
        }),
    }
}
