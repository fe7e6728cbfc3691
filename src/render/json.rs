use serde::Serialize;

use crate::error::MedSafeError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, MedSafeError> {
    Ok(serde_json::to_string_pretty(value)?)
}
