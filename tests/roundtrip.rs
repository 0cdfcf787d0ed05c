use approx::assert_relative_eq;
use sbmlmath::{
    parse_formula, read_math_from_str, to_formula, write_math_to_string, AstKind, AstNode,
    ErrorLog, Operator, ReadOptions, SbmlNamespace, WriteOptions,
};

fn read(text: &str) -> AstNode {
    let mut log = ErrorLog::new();
    let node = read_math_from_str(text, &ReadOptions::default(), &mut log);
    assert!(log.is_empty(), "{}", log.as_error_message());
    node.unwrap_or_else(|| panic!("no math read from {text}"))
}

fn write(node: &AstNode) -> String {
    write_math_to_string(node, &WriteOptions::default()).unwrap()
}

const MATHML: &[&str] = &[
    r#"<apply><plus/><ci>x</ci><cn type="integer">3</cn></apply>"#,
    r#"<apply><times/><cn>2.5</cn><ci>k</ci><ci>S</ci></apply>"#,
    r#"<apply><divide/><cn type="e-notation">1.5<sep/>-3</cn><cn type="rational">1<sep/>3</cn></apply>"#,
    r#"<apply><root/><degree><cn type="integer">3</cn></degree><ci>x</ci></apply>"#,
    r#"<apply><log/><logbase><cn type="integer">2</cn></logbase><ci>x</ci></apply>"#,
    r#"<apply><power/><exponentiale/><apply><minus/><ci>t</ci></apply></apply>"#,
    r#"<piecewise><piece><ci>a</ci><apply><lt/><ci>x</ci><cn>0</cn></apply></piece><otherwise><ci>b</ci></otherwise></piecewise>"#,
    r#"<lambda><bvar><ci>x</ci></bvar><bvar><ci>y</ci></bvar><apply><times/><ci>x</ci><ci>y</ci></apply></lambda>"#,
    r#"<apply><and/><true/><apply><not/><false/></apply><apply><geq/><ci>x</ci><pi/></apply></apply>"#,
    r#"<apply><csymbol encoding="text" definitionURL="http://www.sbml.org/sbml/symbols/delay">delay</csymbol><ci>x</ci><cn>1</cn></apply>"#,
    r#"<apply><times/><csymbol encoding="text" definitionURL="http://www.sbml.org/sbml/symbols/time">t</csymbol><csymbol encoding="text" definitionURL="http://www.sbml.org/sbml/symbols/avogadro">NA</csymbol></apply>"#,
    r#"<apply><ci>f</ci><ci>a</ci><apply><sin/><ci>b</ci></apply></apply>"#,
    r#"<semantics><ci>x</ci><annotation encoding="text">a note</annotation></semantics>"#,
    r#"<apply><minus/><infinity/></apply>"#,
    r#"<apply><times/><ci>k</ci><cn>INF</cn></apply>"#,
    r#"<apply><plus/><cn> -INF </cn><notanumber/></apply>"#,
    r#"<apply><ci definitionURL="http://example.org/f">f</ci><ci>a</ci></apply>"#,
];

#[test]
fn plus_reads_and_writes_back() {
    let _ = env_logger::builder().is_test(true).try_init();
    let node = read(r#"<apply><plus/><ci>x</ci><cn type="integer">3</cn></apply>"#);
    assert_eq!(node.operator_kind(), Some(Operator::Plus));
    assert_eq!(node.num_children(), 2);
    assert_eq!(node.child(0).unwrap().identifier(), Some("x"));
    assert_eq!(node.child(1).unwrap().kind(), &AstKind::Integer(3));

    let text = write(&node);
    assert!(text.contains("<apply>"));
    assert!(text.contains("<plus"));
    assert!(text.contains("<ci> x </ci>"));
    assert!(text.contains(r#"<cn type="integer"> 3 </cn>"#));
    assert_eq!(read(&text), node);
}

#[test]
fn mathml_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    for text in MATHML {
        let first = read(text);
        let second = read(&write(&first));
        assert!(
            first.equivalent(&second),
            "{text} became {}",
            write(&second)
        );
    }
}

#[test]
fn formula_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    // infix text has no rationals or annotations
    for text in MATHML
        .iter()
        .filter(|text| !text.contains("rational") && !text.contains("semantics"))
    {
        let tree = read(text);
        let formula = to_formula(&tree);
        let reparsed = parse_formula(&formula)
            .unwrap_or_else(|e| panic!("could not parse '{formula}': {e}"));
        assert!(
            tree.equivalent(&reparsed),
            "'{formula}' reparsed as '{}'",
            to_formula(&reparsed)
        );
    }
}

#[test]
fn formula_to_mathml_and_back() {
    let formulas = [
        "k1 * S1 / (Km + S1)",
        "-(a - b) ^ 2",
        "x >= 0 && (y < 1 || !z)",
        "piecewise(0, t < 10, 1)",
        "root(3, x) + sqrt(y) + log(2, x) + log10(y)",
        "1.5e-3 * rateOf(S1)",
    ];
    for formula in formulas {
        let tree = parse_formula(formula).unwrap();
        let back = read(&write(&tree));
        assert!(tree.equivalent(&back), "{formula} became {back}");
        assert_eq!(to_formula(&back), to_formula(&tree));
    }
}

#[test]
fn infinities_survive_both_forms() {
    let _ = env_logger::builder().is_test(true).try_init();
    for formula in ["k * INF", "-INF", "x - INF", "infinity + notanumber"] {
        let tree = parse_formula(formula).unwrap();
        let back = read(&write(&tree));
        assert!(tree.equivalent(&back), "{formula} became {back}");
        let reparsed = parse_formula(&to_formula(&back)).unwrap();
        assert!(reparsed.equivalent(&back), "{formula} became {reparsed}");
    }
    let tree = read(r#"<cn> -INF </cn>"#);
    assert_eq!(tree.kind(), &AstKind::Real(f64::NEG_INFINITY));
    assert_eq!(read(&write(&tree)).kind(), tree.kind());
}

#[test]
fn function_definition_url_is_kept() {
    let text = r#"<apply><ci definitionURL="http://example.org/f">f</ci><ci>a</ci></apply>"#;
    let tree = read(text);
    let back = read(&write(&tree));
    assert_eq!(back, tree);
    match back.kind() {
        AstKind::Function(ident) => {
            assert_eq!(ident.definition_url.as_deref(), Some("http://example.org/f"))
        }
        other => panic!("expected a function, got {other}"),
    }
}

#[test]
fn e_notation_value() {
    let node = read(r#"<cn type="e-notation">1.5<sep/>3</cn>"#);
    assert_relative_eq!(node.value().unwrap(), 1500.0);
    let node = read(r#"<cn type="e-notation">-2<sep/>-2</cn>"#);
    assert_relative_eq!(node.value().unwrap(), -0.02);
}

#[test]
fn deep_copy_is_independent() {
    let original = read(MATHML[1]);
    let mut copy = original.deep_copy();
    copy.child_mut(0).unwrap().set_kind(AstKind::Integer(7)).unwrap();
    copy.remove_child(2).unwrap();
    assert_eq!(original, read(MATHML[1]));
    assert_ne!(original, copy);
}

#[test]
fn units_are_written_at_level_three() {
    let mut node = AstNode::real(2.0);
    node.set_units("mole").unwrap();
    let options = WriteOptions {
        namespace: SbmlNamespace::new(3, 1),
        ..Default::default()
    };
    let text = write_math_to_string(&node, &options).unwrap();
    assert!(text.contains(r#"xmlns:sbml="http://www.sbml.org/sbml/level3/version1/core""#));
    assert!(text.contains(r#"sbml:units="mole""#));
    assert_eq!(read(&text).units(), Some("mole"));
}
