use super::support::*;
use crate::instruction::{Instruction, InstructionKind, Label, OriginId, Variable};
use crate::lowering::ExpansionContext;
use crate::program::Program;
use std::collections::HashSet;

#[test]
fn test_context_is_seeded_past_existing_names() {
    let program = compile(&repeated_double());
    let mut ctx = ExpansionContext::seeded_from(program.instructions());
    assert_eq!(ctx.fresh_label(), Label::Numbered(2));
    assert_eq!(ctx.fresh_work(), Variable::Work(3));
    assert_eq!(ctx.fresh_work(), Variable::Work(4));
}

#[test]
fn test_zero_variable_lowering() {
    let program = Program::new(
        "zero",
        vec![Instruction::labelled(
            Label::Numbered(3),
            InstructionKind::ZeroVariable { variable: Variable::Input(1) },
        )],
    );

    let expanded = program.expand(1);
    assert_eq!(
        bodies(&expanded),
        vec!["L3: x1 <- x1", "L4: x1 <- x1 - 1", "IF x1 != 0 GOTO L4"]
    );
    assert_eq!(
        expanded.render_line(0).unwrap(),
        "#1 (B) [ L3    ] x1 <- x1 (0) <<< #1 (S) [ L3    ] x1 <- 0 (1)"
    );
}

#[test]
fn test_primitive_instruction_is_returned_unchanged() {
    let instruction = Instruction::new(InstructionKind::Increase { variable: Variable::Output });
    let mut ctx = ExpansionContext::seeded_from(&[]);
    let lowered = instruction.expand(&mut ctx, OriginId(0));
    assert_eq!(lowered, vec![instruction]);
}

#[test]
fn test_self_assignment_lowers_to_neutral() {
    let program = Program::new(
        "self",
        vec![Instruction::new(InstructionKind::Assignment {
            variable: Variable::Work(1),
            source: Variable::Work(1),
        })],
    );
    assert_eq!(bodies(&program.expand(1)), vec!["z1 <- z1"]);
}

#[test]
fn test_addition_first_level() {
    let program = compile(&addition());
    let expanded = program.expand(1);
    assert_eq!(
        bodies(&expanded),
        vec![
            "y <- 0",
            "IF x1 != 0 GOTO L2",
            "GOTO L4",
            "L2: x1 <- x1 - 1",
            "z1 <- z1 + 1",
            "IF x1 != 0 GOTO L2",
            "L3: z1 <- z1 - 1",
            "y <- y + 1",
            "x1 <- x1 + 1",
            "IF z1 != 0 GOTO L3",
            "L4: y <- y",
            "L1: IF x2 != 0 GOTO L5",
            "GOTO EXIT",
            "L5: x2 <- x2",
            "x2 <- x2 - 1",
            "y <- y + 1",
            "z2 <- z2 + 1",
            "IF z2 != 0 GOTO L1",
        ]
    );
    // untouched primitives keep no origin
    assert_eq!(expanded.instructions()[14].origin, None);
    assert!(expanded.instructions()[0].origin.is_some());
}

#[test]
fn test_provenance_chain_spans_levels() {
    let program = compile(&addition());
    let expanded = program.expand(2);
    assert_eq!(
        expanded.render_line(0).unwrap(),
        "#1 (B) [       ] y <- y (0) <<< #1 (S) [       ] y <- 0 (1) <<< #1 (S) [       ] y <- x1 (4)"
    );
    assert_eq!(expanded.provenance(&expanded.instructions()[0]).len(), 2);
}

#[test]
fn test_quotation_inlines_renamed_body() {
    let document = front_end::document::ProgramDocument::new("succ", vec![quote("y", "Successor", "x1")])
        .with_function(successor());
    let program = compile(&document);

    let expanded = program.expand(1);
    assert_eq!(
        bodies(&expanded),
        vec!["y <- y", "z1 <- 0", "z2 <- x1", "z1 <- z2", "z1 <- z1 + 1", "L1: y <- z1"]
    );
    assert_eq!(program.execute(&[4]).cycles, 10);
    assert_eq!(expanded.execute(&[4]).y, 5);
}

#[test]
fn test_quotation_keeps_label_on_first_child() {
    let document = front_end::document::ProgramDocument::new(
        "labelled",
        vec![
            quote("z1", "CONST7", "").with_label("L1"),
            ins("GOTO_LABEL").with_argument(front_end::document::GOTO_LABEL, "EXIT"),
        ],
    )
    .with_function(const7());
    let expanded = compile(&document).expand(1);
    assert_eq!(expanded.instructions()[0].label, Label::Numbered(1));
    assert_eq!(bodies(&expanded)[0], "L1: z1 <- z1");
}

#[test]
fn test_callee_exit_becomes_fresh_label() {
    let program = compile(&repeated_double());
    let expanded = program.expand(1);

    // only the loop's own exit jump still targets EXIT
    let exits: Vec<String> = expanded
        .instructions()
        .iter()
        .filter(|i| i.target_label() == Label::Exit)
        .map(ToString::to_string)
        .collect();
    assert_eq!(exits, vec!["GOTO EXIT"]);
    assert!(expanded.labels().contains(&Label::Exit));
}

#[test]
fn test_expansion_keeps_labels_unique_and_defined() {
    for document in [addition(), repeated_double(), nested_calls(), jump_on_successor()] {
        let program = compile(&document);
        for level in 0..=program.max_expansion_level() {
            let expanded = program.expand(level);
            let mut seen = HashSet::new();
            for instruction in expanded.instructions() {
                if !instruction.label.is_none() {
                    assert!(
                        seen.insert(instruction.label),
                        "{} defines {} twice at level {}",
                        program.name(),
                        instruction.label,
                        level
                    );
                }
            }
            expanded.verify_legal().unwrap();
        }
    }
}

#[test]
fn test_full_expansion_is_primitive() {
    for document in [addition(), repeated_double(), nested_calls(), jump_on_successor()] {
        let program = compile(&document);
        let expanded = program.expand(program.max_expansion_level());
        assert_eq!(expanded.max_expansion_level(), 0, "{}", program.name());
        assert!(expanded.instructions().iter().all(Instruction::is_basic));
    }
}

#[test]
fn test_expansion_stops_early_once_primitive() {
    let program = compile(&addition());
    let full = program.expand(program.max_expansion_level());
    assert_eq!(program.expand(10), full);
}

#[test]
fn test_every_level_computes_the_same_output() {
    let cases: Vec<(front_end::document::ProgramDocument, Vec<u64>, u64)> = vec![
        (addition(), vec![3, 2], 5),
        (repeated_double(), vec![3, 2], 12),
        (nested_calls(), vec![3], 11),
        (jump_on_successor(), vec![4, 3], 2),
        (jump_on_successor(), vec![1, 3], 1),
    ];

    for (document, input, expected) in cases {
        let program = compile(&document);
        for level in 0..=program.max_expansion_level() {
            let result = program.expand(level).execute(&input);
            assert_eq!(
                result.y, expected,
                "{} on {:?} at level {}",
                program.name(),
                input,
                level
            );
        }
    }
}

#[test]
fn test_inlined_body_is_reset_between_calls() {
    // Double adds onto its own y, so a second inlined call must start from zero
    let program = compile(&repeated_double());
    let expanded = program.expand(1);
    assert_eq!(expanded.execute(&[2, 5]).y, 20);
}
