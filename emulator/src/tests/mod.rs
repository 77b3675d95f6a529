
use front_end::document::*;
use middle_end::registry::Registry;
use middle_end::ProgramContext;
use std::sync::Arc;

/// `y <- x1 + x2`
fn addition() -> ProgramDocument {
    ProgramDocument::new(
        "addition",
        vec![
            InstructionDocument::new("ASSIGNMENT")
                .with_variable("y")
                .with_argument(ASSIGNED_VARIABLE, "x1"),
            InstructionDocument::new("JUMP_ZERO")
                .with_variable("x2")
                .with_label("L1")
                .with_argument(JZ_LABEL, "EXIT"),
            InstructionDocument::new("DECREASE").with_variable("x2"),
            InstructionDocument::new("INCREASE").with_variable("y"),
            InstructionDocument::new("GOTO_LABEL").with_argument(GOTO_LABEL, "L1"),
        ],
    )
}

fn loaded() -> ProgramContext {
    let mut ctx = ProgramContext::new(Arc::new(Registry::new()), "test");
    ctx.load(&addition()).unwrap();
    ctx
}
