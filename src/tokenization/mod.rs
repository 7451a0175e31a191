//! Reversible field tokenization
//!
//! [`MaskingEngine`] replaces rule-selected field values with deterministic
//! tokens (`LABEL`, `LABEL_2`, ...) and returns the `token -> original`
//! entries; [`RestorationEngine`] puts the originals back. Both operate on a
//! parsed [`Document`](crate::document::Document) in place.
//!
//! ```
//! use phimask::document::Document;
//! use phimask::tokenization::{MaskingEngine, RestorationEngine, RuleSet};
//!
//! let rules = RuleSet::from_json(r#"{"N1": {"1035": "PATIENT_NAME"}}"#).unwrap();
//! let mut document = Document::parse(r#"<loop id="N1"><ele id="1035">Alice</ele></loop>"#).unwrap();
//!
//! let outcome = MaskingEngine::new(rules).mask(&mut document).unwrap();
//! assert_eq!(outcome.mapping.get("PATIENT_NAME"), Some("Alice"));
//!
//! RestorationEngine::new(outcome.mapping).restore(&mut document);
//! ```

pub mod audit;
pub mod disambiguator;
pub mod mapping;
pub mod masker;
pub mod restorer;
pub mod rules;

pub use audit::AuditLogger;
pub use disambiguator::disambiguate;
pub use mapping::{MappingStore, TokenMapping};
pub use masker::{CollisionPolicy, MaskedField, MaskingEngine, MaskingOutcome};
pub use restorer::{RestorationEngine, RestorationOutcome};
pub use rules::{DuplicateLabel, RuleSet};
