//! Domain types for phimask.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`GroupId`], [`FieldId`])
//! - **Error types** ([`PhimaskError`], [`DocumentError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Group and field identifiers are distinct newtypes so a rule lookup cannot
//! swap them by accident:
//!
//! ```rust
//! use phimask::domain::{FieldId, GroupId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let group = GroupId::new("2010BA")?;
//! let field = FieldId::new("NM103")?;
//!
//! // This won't compile - the types are distinct
//! // let wrong: GroupId = field;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{DocumentError, PhimaskError};
pub use ids::{FieldId, GroupId};
pub use result::Result;
