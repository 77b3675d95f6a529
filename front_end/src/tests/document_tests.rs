use crate::document::*;
use crate::error::DocumentError;

const ADDITION: &str = r#"{
  "name": "addition",
  "instructions": [
    { "opcode": "ASSIGNMENT", "variable": "y", "arguments": { "assignedVariable": "x1" } },
    { "opcode": "ASSIGNMENT", "variable": "z1", "arguments": { "assignedVariable": "x2" } },
    { "opcode": "JUMP_ZERO", "variable": "z1", "label": "L1", "arguments": { "JZLabel": "EXIT" } },
    { "opcode": "INCREASE", "variable": "y" },
    { "opcode": "DECREASE", "variable": "z1" },
    { "opcode": "GOTO_LABEL", "arguments": { "gotoLabel": "L1" } }
  ]
}"#;

#[test]
fn test_parse_document() {
    let document = ProgramDocument::from_json_str(ADDITION).unwrap();
    assert_eq!(document.name, "addition");
    assert_eq!(document.instructions.len(), 6);
    assert!(document.functions.is_empty());
    assert_eq!(document.instructions[2].label.as_deref(), Some("L1"));
    assert_eq!(document.instructions[2].argument(JZ_LABEL), Some("EXIT"));
    assert_eq!(document.arity(), 2);
}

#[test]
fn test_opcode_schema() {
    assert_eq!("jump_not_zero".parse::<Opcode>().unwrap(), Opcode::JumpNotZero);
    assert!(!Opcode::GotoLabel.requires_variable());
    assert_eq!(
        Opcode::JumpEqualVariable.required_arguments(),
        &[VARIABLE_NAME, JE_VARIABLE_LABEL]
    );
    assert!(matches!(
        "MULTIPLY".parse::<Opcode>(),
        Err(DocumentError::UnknownOpcode(name)) if name == "MULTIPLY"
    ));
}

#[test]
fn test_required_argument_is_reported() {
    let instruction = InstructionDocument::new("JUMP_ZERO").with_variable("x1");
    match instruction.required(JZ_LABEL) {
        Err(DocumentError::MissingArgument { opcode, argument }) => {
            assert_eq!(opcode, "JUMP_ZERO");
            assert_eq!(argument, JZ_LABEL);
        }
        other => panic!("expected a missing argument error, got {:?}", other),
    }
}

#[test]
fn test_validate_checks_the_whole_schema() {
    let record = InstructionDocument::new("JUMP_EQUAL_VARIABLE")
        .with_variable("x1")
        .with_argument(VARIABLE_NAME, "x2");
    assert!(matches!(
        record.validate(),
        Err(DocumentError::MissingArgument { argument: JE_VARIABLE_LABEL, .. })
    ));
    let complete = record.with_argument(JE_VARIABLE_LABEL, "L1");
    assert_eq!(complete.validate().unwrap(), Opcode::JumpEqualVariable);

    let goto = InstructionDocument::new("GOTO_LABEL").with_argument(GOTO_LABEL, "EXIT");
    assert_eq!(goto.validate().unwrap(), Opcode::GotoLabel);

    let blank = InstructionDocument::new("DECREASE").with_variable("  ");
    assert!(matches!(
        blank.validate(),
        Err(DocumentError::MissingArgument { argument: "variable", .. })
    ));
}

#[test]
fn test_function_arity_counts_argument_expressions() {
    let function = FunctionDocument::new(
        "Wrapper",
        vec![InstructionDocument::new("QUOTE")
            .with_variable("y")
            .with_argument(FUNCTION_NAME, "Plus")
            .with_argument(FUNCTION_ARGUMENTS, "(Successor, x3), x1")],
    );
    assert_eq!(function.arity(), 3);
    assert_eq!(function.display_name(), "Wrapper");
}

#[test]
fn test_called_functions_include_nested_calls() {
    let instruction = InstructionDocument::new("JUMP_EQUAL_FUNCTION")
        .with_variable("x1")
        .with_argument(FUNCTION_NAME, "Minus")
        .with_argument(FUNCTION_ARGUMENTS, "(Plus, x1, CONST7), x2")
        .with_argument(JE_FUNCTION_LABEL, "L2");
    assert_eq!(instruction.called_functions(), vec!["Minus", "Plus", "CONST7"]);
}

#[test]
fn test_document_round_trips_through_json() {
    let document = ProgramDocument::new(
        "const",
        vec![InstructionDocument::new("CONSTANT_ASSIGNMENT")
            .with_variable("y")
            .with_argument(CONSTANT_VALUE, "7")],
    )
    .with_function(FunctionDocument::new("Id", vec![]));

    let text = document.to_json_string().unwrap();
    assert_eq!(ProgramDocument::from_json_str(&text).unwrap(), document);
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(matches!(
        ProgramDocument::from_json_str("{ \"name\": 3 }"),
        Err(DocumentError::Json(_))
    ));
}
