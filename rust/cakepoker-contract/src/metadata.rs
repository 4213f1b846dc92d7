//! Token metadata document and its `data:` URI encoding
//!
//! `tokenURI` returns `data:application/json;base64,<payload>` where the payload is
//! a JSON object with `name`, `description`, `image` and `attributes`.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MetadataError;

/// Number of attributes every PokerHand token carries.
pub const ATTRIBUTE_COUNT: usize = 6;

const JSON_DATA_PREFIX: &str = "data:application/json;base64,";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    /// Entry layout is left open; any JSON value is accepted.
    #[serde(default)]
    pub attributes: Vec<Value>,
}

impl TokenMetadata {
    /// Encode as a self-contained `data:application/json;base64,` URI.
    pub fn to_data_uri(&self) -> Result<String, MetadataError> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{JSON_DATA_PREFIX}{}", STANDARD.encode(json)))
    }

    /// Decode a `data:` URI: the payload is whatever follows the last `;` and then the last `,`.
    pub fn from_data_uri(uri: &str) -> Result<Self, MetadataError> {
        let tail = uri.rsplit(';').next().unwrap_or_default();
        let payload = tail.rsplit(',').next().unwrap_or_default().trim();
        if payload.is_empty() {
            return Err(MetadataError::EmptyUri);
        }
        let json = STANDARD.decode(payload)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Check the fields every minted token must expose.
    pub fn validate(&self) -> Result<(), MetadataError> {
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("image", &self.image),
        ] {
            if value.is_empty() {
                return Err(MetadataError::EmptyField(field));
            }
        }
        if self.attributes.len() != ATTRIBUTE_COUNT {
            return Err(MetadataError::AttributeCount {
                expected: ATTRIBUTE_COUNT,
                found: self.attributes.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TokenMetadata {
        TokenMetadata {
            name: "PokerHand #0".into(),
            description: "five cards".into(),
            image: "data:image/svg+xml;base64,PHN2Zy8+".into(),
            attributes: (0..6).map(|i| json!({ "slot": i })).collect(),
        }
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = sample().to_data_uri().unwrap();
        assert!(uri.starts_with("data:application/json;base64,"));
        assert_eq!(TokenMetadata::from_data_uri(&uri).unwrap(), sample());
    }

    #[test]
    fn test_decode_accepts_any_attribute_shape() {
        let doc = r#"{"name":"n","description":"d","image":"i","attributes":[1,"two",null,{},[],true]}"#;
        let uri = format!("data:application/json;base64,{}", STANDARD.encode(doc));
        let meta = TokenMetadata::from_data_uri(&uri).unwrap();
        assert_eq!(meta.attributes.len(), 6);
        meta.validate().unwrap();
    }

    #[test]
    fn test_decode_bare_payload() {
        // no scheme at all, the whole string is the payload
        let encoded = STANDARD.encode(serde_json::to_vec(&sample()).unwrap());
        assert_eq!(TokenMetadata::from_data_uri(&encoded).unwrap(), sample());
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            TokenMetadata::from_data_uri("data:application/json;base64,"),
            Err(MetadataError::EmptyUri)
        ));
        assert!(matches!(
            TokenMetadata::from_data_uri("data:application/json;base64,@@@"),
            Err(MetadataError::Base64(_))
        ));
        let not_json = format!("data:application/json;base64,{}", STANDARD.encode("nope"));
        assert!(matches!(
            TokenMetadata::from_data_uri(&not_json),
            Err(MetadataError::Json(_))
        ));
    }

    #[test]
    fn test_validate() {
        let mut meta = sample();
        meta.image.clear();
        assert!(matches!(meta.validate(), Err(MetadataError::EmptyField("image"))));

        let mut meta = sample();
        meta.attributes.pop();
        assert!(matches!(
            meta.validate(),
            Err(MetadataError::AttributeCount { expected: 6, found: 5 })
        ));
    }
}
