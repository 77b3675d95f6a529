use crate::types::{Label, Variable};

#[test]
fn test_variable_parsing() {
    assert_eq!("y".parse::<Variable>().unwrap(), Variable::Output);
    assert_eq!("x12".parse::<Variable>().unwrap(), Variable::Input(12));
    assert_eq!("z3".parse::<Variable>().unwrap(), Variable::Work(3));

    for bad in ["x", "x0", "z-1", "Y", "w1", "x1a", ""] {
        assert!(bad.parse::<Variable>().is_err(), "`{}` should be rejected", bad);
    }
}

#[test]
fn test_variable_order_is_letter_then_number() {
    let mut vars = vec![
        Variable::Work(2),
        Variable::Output,
        Variable::Input(10),
        Variable::Work(1),
        Variable::Input(2),
    ];
    vars.sort();
    let names: Vec<String> = vars.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["x2", "x10", "y", "z1", "z2"]);
}

#[test]
fn test_label_parsing_and_order() {
    assert_eq!("L7".parse::<Label>().unwrap(), Label::Numbered(7));
    assert_eq!("EXIT".parse::<Label>().unwrap(), Label::Exit);
    assert!("L0".parse::<Label>().is_err());
    assert!("7".parse::<Label>().is_err());
    assert!("Lx".parse::<Label>().is_err());

    let mut labels = vec![Label::Exit, Label::Numbered(10), Label::Numbered(2)];
    labels.sort();
    assert_eq!(labels, vec![Label::Numbered(2), Label::Numbered(10), Label::Exit]);
}

#[test]
fn test_optional_label() {
    assert_eq!(Label::parse_optional(None).unwrap(), Label::None);
    assert_eq!(Label::parse_optional(Some("  ")).unwrap(), Label::None);
    assert_eq!(Label::parse_optional(Some("L3")).unwrap(), Label::Numbered(3));
    assert_eq!(Label::None.to_string(), "");
}
