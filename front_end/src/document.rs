//! Program documents
//!
//! A document carries one program plus the functions it defines, all as
//! raw instruction records. Nothing here resolves names or validates jump
//! targets; that happens when a document is compiled.
//!
//! ```json
//! {
//!   "name": "addition",
//!   "instructions": [
//!     { "opcode": "ASSIGNMENT", "variable": "y", "arguments": { "assignedVariable": "x1" } }
//!   ],
//!   "functions": []
//! }
//! ```

use crate::error::DocumentError;
use crate::parser::Parser;
use crate::types::Variable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const JNZ_LABEL: &str = "JNZLabel";
pub const GOTO_LABEL: &str = "gotoLabel";
pub const ASSIGNED_VARIABLE: &str = "assignedVariable";
pub const CONSTANT_VALUE: &str = "constantValue";
pub const JZ_LABEL: &str = "JZLabel";
pub const JE_CONSTANT_LABEL: &str = "JEConstantLabel";
pub const VARIABLE_NAME: &str = "variableName";
pub const JE_VARIABLE_LABEL: &str = "JEVariableLabel";
pub const FUNCTION_NAME: &str = "functionName";
pub const FUNCTION_ARGUMENTS: &str = "functionArguments";
pub const JE_FUNCTION_LABEL: &str = "JEFunctionLabel";

/// Instruction opcodes as written in documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Neutral,
    Increase,
    Decrease,
    JumpNotZero,
    ZeroVariable,
    GotoLabel,
    Assignment,
    ConstantAssignment,
    JumpZero,
    JumpEqualConstant,
    JumpEqualVariable,
    Quote,
    JumpEqualFunction,
}

impl Opcode {
    pub const ALL: [Opcode; 13] = [
        Opcode::Neutral,
        Opcode::Increase,
        Opcode::Decrease,
        Opcode::JumpNotZero,
        Opcode::ZeroVariable,
        Opcode::GotoLabel,
        Opcode::Assignment,
        Opcode::ConstantAssignment,
        Opcode::JumpZero,
        Opcode::JumpEqualConstant,
        Opcode::JumpEqualVariable,
        Opcode::Quote,
        Opcode::JumpEqualFunction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Neutral => "NEUTRAL",
            Opcode::Increase => "INCREASE",
            Opcode::Decrease => "DECREASE",
            Opcode::JumpNotZero => "JUMP_NOT_ZERO",
            Opcode::ZeroVariable => "ZERO_VARIABLE",
            Opcode::GotoLabel => "GOTO_LABEL",
            Opcode::Assignment => "ASSIGNMENT",
            Opcode::ConstantAssignment => "CONSTANT_ASSIGNMENT",
            Opcode::JumpZero => "JUMP_ZERO",
            Opcode::JumpEqualConstant => "JUMP_EQUAL_CONSTANT",
            Opcode::JumpEqualVariable => "JUMP_EQUAL_VARIABLE",
            Opcode::Quote => "QUOTE",
            Opcode::JumpEqualFunction => "JUMP_EQUAL_FUNCTION",
        }
    }

    pub fn requires_variable(&self) -> bool {
        !matches!(self, Opcode::GotoLabel)
    }

    /// Argument keys that must be present in the instruction's `arguments` map
    pub fn required_arguments(&self) -> &'static [&'static str] {
        match self {
            Opcode::Neutral | Opcode::Increase | Opcode::Decrease | Opcode::ZeroVariable => &[],
            Opcode::JumpNotZero => &[JNZ_LABEL],
            Opcode::GotoLabel => &[GOTO_LABEL],
            Opcode::Assignment => &[ASSIGNED_VARIABLE],
            Opcode::ConstantAssignment => &[CONSTANT_VALUE],
            Opcode::JumpZero => &[JZ_LABEL],
            Opcode::JumpEqualConstant => &[CONSTANT_VALUE, JE_CONSTANT_LABEL],
            Opcode::JumpEqualVariable => &[VARIABLE_NAME, JE_VARIABLE_LABEL],
            Opcode::Quote => &[FUNCTION_NAME],
            Opcode::JumpEqualFunction => &[FUNCTION_NAME, JE_FUNCTION_LABEL],
        }
    }
}

impl FromStr for Opcode {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Opcode::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DocumentError::UnknownOpcode(s.to_string()))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One raw instruction record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionDocument {
    pub opcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, String>,
}

impl InstructionDocument {
    pub fn new(opcode: &str) -> Self {
        Self {
            opcode: opcode.to_string(),
            ..Self::default()
        }
    }

    pub fn with_variable(mut self, variable: &str) -> Self {
        self.variable = Some(variable.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_argument(mut self, key: &str, value: &str) -> Self {
        self.arguments.insert(key.to_string(), value.to_string());
        self
    }

    pub fn opcode(&self) -> Result<Opcode, DocumentError> {
        self.opcode.parse()
    }

    /// Parse the opcode and check that every field it needs is present
    pub fn validate(&self) -> Result<Opcode, DocumentError> {
        let opcode = self.opcode()?;
        let has_variable = self.variable.as_deref().is_some_and(|v| !v.trim().is_empty());
        if opcode.requires_variable() && !has_variable {
            return Err(DocumentError::MissingArgument {
                opcode: self.opcode.clone(),
                argument: "variable",
            });
        }
        for &key in opcode.required_arguments() {
            self.required(key)?;
        }
        Ok(opcode)
    }

    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).map(String::as_str)
    }

    /// Fetch an argument the opcode cannot do without
    pub fn required(&self, key: &'static str) -> Result<&str, DocumentError> {
        self.argument(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| DocumentError::MissingArgument {
                opcode: self.opcode.clone(),
                argument: key,
            })
    }

    /// Highest input index this record mentions, either as its variable or
    /// inside any argument (including argument expressions)
    pub fn max_input_index(&self) -> u32 {
        let own = self
            .variable
            .as_deref()
            .and_then(|v| v.parse::<Variable>().ok())
            .and_then(|v| v.input_index())
            .unwrap_or(0);

        self.arguments
            .iter()
            .map(|(key, value)| {
                if key == FUNCTION_ARGUMENTS {
                    input_indices_in_expression(value)
                } else {
                    value
                        .parse::<Variable>()
                        .ok()
                        .and_then(|v| v.input_index())
                        .unwrap_or(0)
                }
            })
            .fold(own, u32::max)
    }

    /// Names of the functions this record calls, outermost first
    pub fn called_functions(&self) -> Vec<String> {
        let Ok(opcode) = self.opcode() else {
            return Vec::new();
        };
        if !matches!(opcode, Opcode::Quote | Opcode::JumpEqualFunction) {
            return Vec::new();
        }
        let mut names: Vec<String> = self.argument(FUNCTION_NAME).map(str::trim).map(String::from).into_iter().collect();
        if let Some(expression) = self.argument(FUNCTION_ARGUMENTS) {
            // Arity does not change which names appear, only how they group.
            if let Ok(args) = Parser::from_source(expression).parse_arguments(0) {
                names.extend(args.iter().flat_map(|a| a.call_names()).map(String::from));
            }
        }
        names
    }
}

/// Scan an argument expression for `x<n>` tokens without parsing its shape
fn input_indices_in_expression(expression: &str) -> u32 {
    expression
        .split(|c: char| c == '(' || c == ')' || c == ',' || c.is_whitespace())
        .filter_map(|token| token.parse::<Variable>().ok())
        .filter_map(|v| v.input_index())
        .max()
        .unwrap_or(0)
}

/// Arity of a definition: the highest input index referenced anywhere
pub fn arity_of(instructions: &[InstructionDocument]) -> usize {
    instructions
        .iter()
        .map(InstructionDocument::max_input_index)
        .max()
        .unwrap_or(0) as usize
}

/// A named function definition shipped inside a program document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_string: Option<String>,
    pub instructions: Vec<InstructionDocument>,
}

impl FunctionDocument {
    pub fn new(name: &str, instructions: Vec<InstructionDocument>) -> Self {
        Self {
            name: name.to_string(),
            user_string: None,
            instructions,
        }
    }

    pub fn arity(&self) -> usize {
        arity_of(&self.instructions)
    }

    /// Display name, falling back to the registered name
    pub fn display_name(&self) -> &str {
        self.user_string.as_deref().unwrap_or(&self.name)
    }
}

/// A program together with the functions it defines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDocument {
    pub name: String,
    pub instructions: Vec<InstructionDocument>,
    #[serde(default)]
    pub functions: Vec<FunctionDocument>,
}

impl ProgramDocument {
    pub fn new(name: &str, instructions: Vec<InstructionDocument>) -> Self {
        Self {
            name: name.to_string(),
            instructions,
            functions: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: FunctionDocument) -> Self {
        self.functions.push(function);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        let document: ProgramDocument = serde_json::from_str(text)?;
        tracing::debug!(
            program = %document.name,
            instructions = document.instructions.len(),
            functions = document.functions.len(),
            "program document parsed"
        );
        Ok(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn arity(&self) -> usize {
        arity_of(&self.instructions)
    }
}
