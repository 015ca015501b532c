use thiserror::Error;

use crate::ConditionMap;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed widget conditions: {0}")]
    Json(#[from] serde_json::Error),
}

/// Widget parameter encoding of a condition mapping.
///
/// Widget directives cannot contain braces or double quotes, so the JSON
/// form is stored with `{ } " \` replaced by `[ ] ` |`. Inside a directive
/// the brackets are further escaped as `^[` and `^]`.
///
/// The mapping is lossy for list values: `encode` leaves JSON array brackets
/// as they are and `decode` reads every `[` as `{`. Only mappings with
/// scalar values, which is what the admin form saves, decode back.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConditionsCodec;

impl ConditionsCodec {
    /// Decode a persisted condition mapping. Blank input decodes to an empty
    /// mapping; plain JSON is accepted as is.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if the unescaped text is not a JSON
    /// object of condition records.
    pub fn decode(&self, raw: &str) -> Result<ConditionMap, CodecError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(ConditionMap::new());
        }
        if raw.starts_with('{') {
            return Ok(serde_json::from_str(raw)?);
        }
        let json: String = raw
            .replace("^[", "[")
            .replace("^]", "]")
            .chars()
            .map(|c| match c {
                '[' => '{',
                ']' => '}',
                '`' => '"',
                '|' => '\\',
                other => other,
            })
            .collect();
        Ok(serde_json::from_str(&json)?)
    }

    /// Encode a condition mapping for storage as a widget parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if serialization fails.
    pub fn encode(&self, conditions: &ConditionMap) -> Result<String, CodecError> {
        let json = serde_json::to_string(conditions)?;
        Ok(json
            .chars()
            .map(|c| match c {
                '{' => '[',
                '}' => ']',
                '"' => '`',
                '\\' => '|',
                other => other,
            })
            .collect())
    }
}
