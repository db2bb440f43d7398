//! Transition expression grammar.
//!
//! ```text
//! expression  := ""                      use the sequential default
//!              | code                    unconditional target
//!              | branch ("," branch)?    query targets
//! branch      := ("T" | "F") (":" | "->") code
//! ```
//!
//! Branch letters are case-insensitive and whitespace around tokens is
//! ignored. A query branch left out falls back to the default target.

use crate::builder::BuildError;
use std::str::FromStr;

/// Parsed form of one transition expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionExpr {
    Default,
    Unconditional(String),
    Conditional {
        on_true: Option<String>,
        on_false: Option<String>,
    },
}

impl TransitionExpr {
    pub fn parse(text: &str) -> Result<Self, BuildError> {
        let malformed = |reason: &str| BuildError::MalformedExpression {
            expression: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::Default);
        }

        if !trimmed.contains([',', ':']) && !trimmed.contains("->") {
            if trimmed.contains(char::is_whitespace) {
                return Err(malformed("state codes cannot contain whitespace"));
            }
            return Ok(Self::Unconditional(trimmed.to_string()));
        }

        let mut on_true = None;
        let mut on_false = None;

        for pair in trimmed.split(',') {
            let (letter, code) = pair
                .split_once("->")
                .or_else(|| pair.split_once(':'))
                .ok_or_else(|| malformed("each branch must look like T:<code> or F:<code>"))?;

            let code = code.trim();
            if code.is_empty() {
                return Err(malformed("branch target is empty"));
            }

            let slot = match letter.trim().to_ascii_uppercase().as_str() {
                "T" => &mut on_true,
                "F" => &mut on_false,
                _ => return Err(malformed("branch letter must be T or F")),
            };
            if slot.is_some() {
                return Err(malformed("branch given more than once"));
            }
            *slot = Some(code.to_string());
        }

        Ok(Self::Conditional { on_true, on_false })
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self, Self::Conditional { .. })
    }
}

impl FromStr for TransitionExpr {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
