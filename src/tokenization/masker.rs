//! Masking engine
//!
//! Walks a document, replaces the text of every field selected by the rule
//! set with a token and records `token -> original text`.

use super::audit::hash_value;
use super::disambiguator::disambiguate;
use super::mapping::TokenMapping;
use super::rules::RuleSet;
use crate::document::{Document, DocumentSchema};
use crate::domain::{FieldId, GroupId, PhimaskError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// What to do when a token is already mapped to a different original
///
/// Only mapping entries count as collisions. A token that equals the literal
/// text of an unmasked field in the same document is always skipped, whatever
/// the policy, since restoration would rewrite that field too. Literal text in
/// other documents that share the store is not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Advance the occurrence number until the token is free
    #[default]
    Disambiguate,
    /// Fail the document
    Reject,
    /// Replace the earlier entry
    Overwrite,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disambiguate => write!(f, "disambiguate"),
            Self::Reject => write!(f, "reject"),
            Self::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disambiguate" => Ok(Self::Disambiguate),
            "reject" => Ok(Self::Reject),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(format!(
                "Invalid collision policy '{s}'. Expected disambiguate, reject or overwrite"
            )),
        }
    }
}

/// A field that was replaced by a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedField {
    pub group_id: GroupId,
    pub field_id: FieldId,
    pub token: String,
    /// SHA-256 of the original text, taken before any later overwrite
    pub value_hash: String,
}

/// Result of masking one document
#[derive(Debug, Clone, Default)]
pub struct MaskingOutcome {
    /// Entries produced by this document only
    pub mapping: TokenMapping,
    /// Masked fields in document order
    pub masked: Vec<MaskedField>,
    /// Rule-matched fields left alone because their text was blank
    pub empty_skipped: usize,
}

impl MaskingOutcome {
    /// Number of masked fields
    pub fn masked_count(&self) -> usize {
        self.masked.len()
    }
}

/// Masking engine bound to a rule set
#[derive(Debug, Clone)]
pub struct MaskingEngine {
    rules: RuleSet,
    schema: DocumentSchema,
    policy: CollisionPolicy,
}

impl MaskingEngine {
    /// Create an engine with the default schema and collision policy
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            schema: DocumentSchema::default(),
            policy: CollisionPolicy::default(),
        }
    }

    /// Use a different document schema
    pub fn with_schema(mut self, schema: DocumentSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Use a different collision policy
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Mask a document in place
    pub fn mask(&self, document: &mut Document) -> Result<MaskingOutcome> {
        self.mask_against(document, &TokenMapping::new())
    }

    /// Mask a document in place, treating `reserved` as already-issued tokens
    ///
    /// `reserved` is normally the current content of the mapping store. It is
    /// only consulted for collisions; the returned mapping holds this
    /// document's entries alone.
    ///
    /// # Errors
    ///
    /// Returns [`PhimaskError::TokenCollision`] under [`CollisionPolicy::Reject`].
    /// The document may be partially masked in that case and must be discarded.
    pub fn mask_against(
        &self,
        document: &mut Document,
        reserved: &TokenMapping,
    ) -> Result<MaskingOutcome> {
        let mut outcome = MaskingOutcome::default();
        let mut occurrences: HashMap<(GroupId, FieldId), u32> = HashMap::new();
        let literals = self.literal_texts(document);

        document.visit_fields_mut::<PhimaskError, _>(&self.schema, |slot| {
            let (Some(group), Some(field)) = (slot.group_id(), slot.field_id()) else {
                return Ok(());
            };
            let Some(label) = self.rules.label_for(group, field) else {
                return Ok(());
            };
            let Some(original) = slot.text().filter(|t| !t.trim().is_empty()) else {
                outcome.empty_skipped += 1;
                return Ok(());
            };
            let original = original.into_owned();

            let group_id = GroupId::new(group).map_err(PhimaskError::Other)?;
            let field_id = FieldId::new(field).map_err(PhimaskError::Other)?;

            let count = occurrences
                .entry((group_id.clone(), field_id.clone()))
                .or_insert(0);
            *count += 1;

            let token = self.resolve_token(
                label,
                count,
                &original,
                &outcome.mapping,
                reserved,
                &literals,
                (&group_id, &field_id),
            )?;

            let value_hash = hash_value(&original);
            outcome.mapping.insert(token.clone(), original);
            slot.set_text(token.clone());
            outcome.masked.push(MaskedField {
                group_id,
                field_id,
                token,
                value_hash,
            });
            Ok(())
        })?;

        tracing::debug!(
            masked = outcome.masked.len(),
            empty_skipped = outcome.empty_skipped,
            policy = %self.policy,
            "Document masked"
        );
        Ok(outcome)
    }

    /// Text of every field the rule set leaves unmasked
    fn literal_texts(&self, document: &Document) -> HashSet<String> {
        document
            .fields(&self.schema)
            .into_iter()
            .filter_map(|field| {
                let text = field.text?;
                let masked = match (field.group_id.as_deref(), field.field_id.as_deref()) {
                    (Some(group), Some(field)) => {
                        self.rules.label_for(group, field).is_some() && !text.trim().is_empty()
                    }
                    _ => false,
                };
                (!masked).then_some(text)
            })
            .collect()
    }

    /// Pick the token for one field value
    ///
    /// The occurrence counter is first advanced past tokens that appear as
    /// literal field text. Under [`CollisionPolicy::Disambiguate`] it is then
    /// advanced past every token taken by a different original, so later
    /// occurrences of the same field continue from there.
    #[allow(clippy::too_many_arguments)]
    fn resolve_token(
        &self,
        label: &str,
        count: &mut u32,
        original: &str,
        document_mapping: &TokenMapping,
        reserved: &TokenMapping,
        literals: &HashSet<String>,
        location: (&GroupId, &FieldId),
    ) -> Result<String> {
        let taken_by_other = |token: &str| {
            let other = document_mapping.get(token).or_else(|| reserved.get(token));
            other.is_some_and(|existing| existing != original)
        };

        let mut token = disambiguate(label, *count);
        while literals.contains(&token) {
            *count += 1;
            token = disambiguate(label, *count);
        }
        if !taken_by_other(&token) {
            return Ok(token);
        }

        match self.policy {
            CollisionPolicy::Disambiguate => {
                while taken_by_other(&token) || literals.contains(&token) {
                    *count += 1;
                    token = disambiguate(label, *count);
                }
                tracing::debug!(
                    group_id = %location.0,
                    field_id = %location.1,
                    token = %token,
                    "Token advanced past collision"
                );
                Ok(token)
            }
            CollisionPolicy::Reject => Err(PhimaskError::TokenCollision {
                token,
                group_id: location.0.to_string(),
                field_id: location.1.to_string(),
            }),
            CollisionPolicy::Overwrite => {
                tracing::warn!(
                    group_id = %location.0,
                    field_id = %location.1,
                    token = %token,
                    "Token already mapped, overwriting earlier entry"
                );
                Ok(token)
            }
        }
    }
}
