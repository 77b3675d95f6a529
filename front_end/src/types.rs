//! Variable and label names of the register machine
//!
//! Both are small `Copy` values with a total order: variables by leading
//! letter (`x` < `y` < `z`) and then by index, labels numerically with
//! `EXIT` last.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A machine variable
///
/// Variant order matters: the derived `Ord` yields `x1 < x2 < y < z1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Variable {
    /// `x<n>`, bound positionally from the input vector
    Input(u32),
    /// `y`, the single output
    Output,
    /// `z<n>`, scratch storage
    Work(u32),
}

impl Variable {
    /// Index of an input variable, `None` for `y` and work variables
    pub fn input_index(&self) -> Option<u32> {
        match self {
            Variable::Input(n) => Some(*n),
            _ => None,
        }
    }

    /// Index of a work variable
    pub fn work_index(&self) -> Option<u32> {
        match self {
            Variable::Work(n) => Some(*n),
            _ => None,
        }
    }

    /// True when the text has the shape of a variable token
    pub fn looks_like(text: &str) -> bool {
        text.parse::<Variable>().is_ok()
    }
}

fn indexed(rest: &str) -> Option<u32> {
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u32>().ok().filter(|n| *n > 0)
}

impl FromStr for Variable {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text == "y" {
            return Ok(Variable::Output);
        }
        let parsed = if let Some(rest) = text.strip_prefix('x') {
            indexed(rest).map(Variable::Input)
        } else if let Some(rest) = text.strip_prefix('z') {
            indexed(rest).map(Variable::Work)
        } else {
            None
        };
        parsed.ok_or_else(|| DocumentError::MalformedVariable(s.to_string()))
    }
}

impl TryFrom<String> for Variable {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Variable> for String {
    fn from(value: Variable) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Variable::Input(n) => write!(f, "x{}", n),
            Variable::Output => write!(f, "y"),
            Variable::Work(n) => write!(f, "z{}", n),
        }
    }
}

/// An instruction label or jump target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Label {
    /// The instruction carries no label
    #[default]
    None,
    /// `L<n>`
    Numbered(u32),
    /// Jumping here terminates the program
    Exit,
}

impl Label {
    pub fn is_none(&self) -> bool {
        matches!(self, Label::None)
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            Label::Numbered(n) => Some(*n),
            _ => None,
        }
    }

    /// Parse an optional label field; absent or blank text means no label
    pub fn parse_optional(text: Option<&str>) -> Result<Label, DocumentError> {
        match text.map(str::trim) {
            None | Some("") => Ok(Label::None),
            Some(text) => text.parse(),
        }
    }
}

impl FromStr for Label {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.eq_ignore_ascii_case("EXIT") {
            return Ok(Label::Exit);
        }
        text.strip_prefix('L')
            .and_then(indexed)
            .map(Label::Numbered)
            .ok_or_else(|| DocumentError::MalformedLabel(s.to_string()))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Label::None => Ok(()),
            Label::Numbered(n) => write!(f, "L{}", n),
            Label::Exit => write!(f, "EXIT"),
        }
    }
}
