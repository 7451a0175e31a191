//! Token disambiguation
//!
//! The first occurrence of a field keeps the bare replacement label; every
//! later occurrence of the same (group, field) pair in the same document gets
//! its occurrence number appended.

/// Build the token for the `occurrence`-th masked value of a field
///
/// Occurrence numbers start at 1. An occurrence of 0 is treated as the first.
///
/// # Examples
///
/// ```
/// use phimask::tokenization::disambiguate;
///
/// assert_eq!(disambiguate("PATIENT_NAME", 1), "PATIENT_NAME");
/// assert_eq!(disambiguate("PATIENT_NAME", 2), "PATIENT_NAME_2");
/// ```
pub fn disambiguate(base: &str, occurrence: u32) -> String {
    if occurrence <= 1 {
        base.to_string()
    } else {
        format!("{base}_{occurrence}")
    }
}
