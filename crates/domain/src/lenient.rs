//! Lenient field deserializers for store records.
//!
//! The backing store is schemaless, so these accept the shapes seen in
//! practice and fall back instead of failing the whole record.

use serde::{Deserialize, Deserializer};

use crate::time::Timestamp;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Flag(bool),
}

pub(crate) fn value<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Flag(b) => b.to_string(),
    }))
}

pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(matches!(Option::<Scalar>::deserialize(d)?, Some(Scalar::Flag(true))))
}

pub(crate) fn timestamp<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Timestamp>, D::Error> {
    let raw = Option::<Scalar>::deserialize(d)?;
    Ok(match raw {
        Some(Scalar::Text(text)) => chrono::DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|ts| ts.with_timezone(&chrono::Utc)),
        _ => None,
    })
}
