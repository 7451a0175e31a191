//! Masking rule set
//!
//! A two-level table `group id -> field id -> replacement label`, loaded once
//! per invocation from JSON (the default) or TOML (by `.toml` extension).
//!
//! ```json
//! {
//!   "2010BA": { "NM103": "SUBSCRIBER_LAST_NAME", "NM109": "MEMBER_ID" },
//!   "N1": { "1035": "PATIENT_NAME" }
//! }
//! ```

use crate::domain::{FieldId, GroupId, PhimaskError, Result};
use std::collections::BTreeMap;
use std::path::Path;

const INLINE_SOURCE: &str = "<inline>";
const XML_SPECIAL: [char; 3] = ['<', '>', '&'];

/// Raw on-disk shape before validation
type RawRules = BTreeMap<String, BTreeMap<String, String>>;

/// Validated masking rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    groups: BTreeMap<GroupId, BTreeMap<FieldId, String>>,
}

/// A replacement label shared by more than one (group, field) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateLabel {
    /// The shared label
    pub label: String,
    /// Every pair using it, in rule order
    pub locations: Vec<(GroupId, FieldId)>,
}

impl RuleSet {
    /// Load a rule set from a file
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PhimaskError::RuleSetLoad`] if the file cannot be read,
    /// parsed, or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|e| load_error(&source, e))?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let raw: RawRules = if is_toml {
            toml::from_str(&content).map_err(|e| load_error(&source, e))?
        } else {
            serde_json::from_str(&content).map_err(|e| load_error(&source, e))?
        };

        let rules = Self::from_raw(raw, &source)?;
        tracing::debug!(
            path = %source,
            groups = rules.group_count(),
            rules = rules.rule_count(),
            "Loaded rule set"
        );
        Ok(rules)
    }

    /// Parse a rule set from JSON content
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawRules =
            serde_json::from_str(content).map_err(|e| load_error(INLINE_SOURCE, e))?;
        Self::from_raw(raw, INLINE_SOURCE)
    }

    /// Parse a rule set from TOML content
    ///
    /// Each group is a table: `[2010BA]` followed by `NM103 = "LAST_NAME"`.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawRules = toml::from_str(content).map_err(|e| load_error(INLINE_SOURCE, e))?;
        Self::from_raw(raw, INLINE_SOURCE)
    }

    fn from_raw(raw: RawRules, source: &str) -> Result<Self> {
        let mut groups = BTreeMap::new();

        for (group, fields) in raw {
            let group_id = GroupId::new(group).map_err(|e| load_error(source, e))?;
            let mut labels = BTreeMap::new();

            for (field, label) in fields {
                let field_id = FieldId::new(field).map_err(|e| load_error(source, e))?;
                if label.trim().is_empty() {
                    return Err(load_error(
                        source,
                        format!("empty replacement label for {group_id}/{field_id}"),
                    ));
                }
                if label.contains(XML_SPECIAL) {
                    return Err(load_error(
                        source,
                        format!("replacement label for {group_id}/{field_id} contains <, > or &"),
                    ));
                }
                labels.insert(field_id, label);
            }

            groups.insert(group_id, labels);
        }

        Ok(Self { groups })
    }

    /// Replacement label for a (group, field) pair
    pub fn label_for(&self, group_id: &str, field_id: &str) -> Option<&str> {
        self.groups
            .get(group_id)
            .and_then(|fields| fields.get(field_id))
            .map(String::as_str)
    }

    /// Whether any rule targets this group
    pub fn has_group(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    /// Number of groups with at least one entry
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of (group, field) rules
    pub fn rule_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Whether the rule set has no rules
    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }

    /// Iterate `(group, field, label)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupId, &FieldId, &str)> {
        self.groups.iter().flat_map(|(group, fields)| {
            fields
                .iter()
                .map(move |(field, label)| (group, field, label.as_str()))
        })
    }

    /// Labels used by more than one (group, field) pair
    ///
    /// Tokens built from a shared label can collide in the mapping store.
    pub fn duplicate_labels(&self) -> Vec<DuplicateLabel> {
        let mut by_label: BTreeMap<&str, Vec<(GroupId, FieldId)>> = BTreeMap::new();
        for (group, field, label) in self.iter() {
            by_label
                .entry(label)
                .or_default()
                .push((group.clone(), field.clone()));
        }

        by_label
            .into_iter()
            .filter(|(_, locations)| locations.len() > 1)
            .map(|(label, locations)| DuplicateLabel {
                label: label.to_string(),
                locations,
            })
            .collect()
    }
}

fn load_error(source: &str, reason: impl std::fmt::Display) -> PhimaskError {
    PhimaskError::RuleSetLoad {
        path: source.to_string(),
        reason: reason.to_string(),
    }
}
