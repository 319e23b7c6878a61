use regex::Regex;

use crate::checksum::Checksum;
use crate::error::ModelResult;

const HASH_LENGTH: usize = 8;

/// Builds link targets of the form `{format}-{specification}-{entity}-{hash}`.
///
/// The readable part is lowercased with every run of characters other than
/// letters and digits replaced by `-`. The hash is taken from the entity's
/// identifying IRIs, so equal labels still get distinct anchors.
#[derive(Debug, Clone)]
pub struct AnchorBuilder {
    separators: Regex,
    specification_label: String,
}

impl AnchorBuilder {
    pub fn new(specification_label: &str) -> ModelResult<Self> {
        Ok(Self {
            separators: Regex::new(r"[^\p{L}\p{N}]+")?,
            specification_label: specification_label.to_string(),
        })
    }

    pub fn sanitize(&self, value: &str) -> String {
        self.separators
            .replace_all(&value.to_lowercase(), "-")
            .trim_matches('-')
            .to_string()
    }

    /// `key` identifies the entity; for properties include the owner IRI
    pub fn anchor(&self, format: &str, entity_label: &str, key: &str) -> String {
        let readable = self.sanitize(&format!("{}-{}-{}", format, self.specification_label, entity_label));
        format!("{}-{}", readable, Checksum::of(key).short(HASH_LENGTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        let anchors = AnchorBuilder::new("Turistické cíle").unwrap();
        assert_eq!(anchors.sanitize("  Turistický Cíl / Adresa "), "turistický-cíl-adresa");
    }

    #[test]
    fn test_same_label_different_entities() {
        let anchors = AnchorBuilder::new("Spec").unwrap();
        let first = anchors.anchor("json-schema", "Name", "http://x/1");
        let second = anchors.anchor("json-schema", "Name", "http://x/2");
        assert_ne!(first, second);
        assert!(first.starts_with("json-schema-spec-name-"));
        assert_eq!(first, anchors.anchor("json-schema", "Name", "http://x/1"));
    }
}
