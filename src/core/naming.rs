//! Naming convention for state handlers.
//!
//! Handlers are declared as `s<ordinal>_<descriptive_name>`, for example
//! `s3_next_query_in_cache`. The ordinal fixes declaration order, the
//! descriptive name is the canonical name, and its acronym (`NQIC`) is the
//! short code used by transition tables.

use crate::builder::BuildError;

/// Suffixes that mark a descriptive name as a terminal state.
pub const TERMINAL_SUFFIXES: [&str; 2] = ["_complete", "_end"];

const MAX_ORDINAL_DIGITS: usize = 3;

/// A declared handler name split into ordinal and canonical name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateName {
    pub ordinal: u32,
    pub name: String,
}

/// Parse a declared name of the form `s<ordinal>_<descriptive_name>`.
///
/// # Example
///
/// ```rust
/// use flowstate::core::parse_state_name;
///
/// let parsed = parse_state_name("s12_add_query_to_stack").unwrap();
/// assert_eq!(parsed.ordinal, 12);
/// assert_eq!(parsed.name, "add_query_to_stack");
/// ```
pub fn parse_state_name(declared: &str) -> Result<StateName, BuildError> {
    let malformed = || BuildError::MalformedStateName {
        name: declared.to_string(),
    };

    let rest = declared.strip_prefix('s').ok_or_else(malformed)?;
    let (digits, name) = rest.split_once('_').ok_or_else(malformed)?;

    if digits.is_empty()
        || digits.len() > MAX_ORDINAL_DIGITS
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }

    let words_valid = name.split('_').all(|word| {
        !word.is_empty()
            && word
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    });
    if !words_valid {
        return Err(malformed());
    }

    let ordinal = digits.parse().map_err(|_| malformed())?;

    Ok(StateName {
        ordinal,
        name: name.to_string(),
    })
}

/// First letter of each underscore-separated word, upper-cased.
pub fn acronym(name: &str) -> String {
    name.split('_')
        .filter_map(|word| word.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// `next_query_in_cache` becomes `NextQueryInCache`.
pub fn camel_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn is_terminal_name(name: &str) -> bool {
    TERMINAL_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}
