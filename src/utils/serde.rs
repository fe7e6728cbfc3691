use serde::{Deserialize, Deserializer};

/// Deserializes an absent or `null` field as `T::default()`.
///
/// Pair with `#[serde(default)]` so a missing key and an explicit `null` behave the same.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::null_as_default;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "null_as_default")]
        items: Vec<String>,
    }

    #[test]
    fn null_as_default_covers_missing_null_and_present() {
        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert!(missing.items.is_empty());

        let null: Holder = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(null.items.is_empty());

        let present: Holder = serde_json::from_str(r#"{"items": ["A", "B"]}"#).unwrap();
        assert_eq!(present.items, vec!["A", "B"]);
    }
}
