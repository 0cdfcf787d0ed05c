use sbmlmath::validation::{
    EqualityArgs, FunctionArgumentCount, LocalParameterScope, MathCheck, PiecewiseTypes,
};
use sbmlmath::{
    parse_formula, read_math_from_str, AstNode, ElementKind, ErrorCode, ErrorLog, MathElement,
    MathValidator, Model, ReadOptions, SbmlNamespace,
};

fn read(text: &str) -> AstNode {
    let mut log = ErrorLog::new();
    let node = read_math_from_str(text, &ReadOptions::default(), &mut log);
    assert!(log.is_empty(), "{}", log.as_error_message());
    node.unwrap()
}

fn only(check: impl MathCheck + 'static) -> MathValidator {
    let mut validator = MathValidator::empty();
    validator.add_check(Box::new(check));
    validator
}

#[test]
fn eq_of_number_and_boolean() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut model = Model::default();
    model.add_parameter("x");
    let math = read("<apply><eq/><ci>x</ci><true/></apply>");
    let element = MathElement::new(ElementKind::Constraint).with_id("c1");
    let log = only(EqualityArgs).validate(&model, [(&element, &math)]);
    assert_eq!(log.len(), 1);
    assert!(log.contains(ErrorCode::ArgsToEqNeedSameType));
    assert!(log.has_error_contains("<constraint> 'c1'"));
}

#[test]
fn piecewise_with_mixed_branches() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut model = Model::default();
    model.add_parameter("x");
    let math = read(
        r#"<piecewise>
            <piece><apply><plus/><ci>x</ci><cn>1</cn></apply><apply><gt/><ci>x</ci><cn>0</cn></apply></piece>
            <piece><apply><lt/><ci>x</ci><cn>5</cn></apply><apply><leq/><ci>x</ci><cn>0</cn></apply></piece>
        </piecewise>"#,
    );
    let element = MathElement::new(ElementKind::AssignmentRule);
    let log = only(PiecewiseTypes).validate(&model, [(&element, &math)]);
    assert_eq!(log.len(), 1);
    assert!(log.contains(ErrorCode::PiecewiseNeedsConsistentTypes));
}

fn function_call_model(level: u32, version: u32) -> (Model, AstNode) {
    let mut model = Model::new(SbmlNamespace::new(level, version));
    model.add_parameter("a");
    let definition = read(
        "<lambda><bvar><ci>x</ci></bvar><bvar><ci>y</ci></bvar>\
         <apply><plus/><ci>x</ci><ci>y</ci></apply></lambda>",
    );
    model.add_function_definition("f", definition);
    (model, read("<apply><ci>f</ci><ci>a</ci></apply>"))
}

#[test]
fn function_called_with_too_few_arguments() {
    let _ = env_logger::builder().is_test(true).try_init();
    let element = MathElement::new(ElementKind::AssignmentRule);
    for (level, version, expected) in [(2, 3, 0), (2, 4, 1), (3, 1, 1), (3, 2, 1)] {
        let (model, math) = function_call_model(level, version);
        let log = only(FunctionArgumentCount).validate(&model, [(&element, &math)]);
        assert_eq!(log.len(), expected, "L{level}V{version}");
        assert_eq!(
            log.num_with_code(ErrorCode::InvalidNoArgsPassedToFunctionDef),
            expected
        );
    }
}

#[test]
fn local_parameter_scope() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut model = Model::default();
    model.add_compartment("cell").add_species("S1");
    let r1 = model.add_reaction("r1");
    let r2 = model.add_reaction("r2");
    model.add_local_parameter(r1, "k1").unwrap();
    let math = read("<apply><times/><ci>k1</ci><ci>S1</ci><ci>cell</ci></apply>");
    let validator = only(LocalParameterScope);

    let own = MathElement::new(ElementKind::KineticLaw { reaction: r1 });
    assert!(validator.validate(&model, [(&own, &math)]).is_empty());

    let other = MathElement::new(ElementKind::KineticLaw { reaction: r2 });
    let log = validator.validate(&model, [(&other, &math)]);
    assert_eq!(log.len(), 1);
    assert!(log.contains(ErrorCode::KineticLawParametersAreLocalOnly));

    let rule = MathElement::new(ElementKind::AssignmentRule).with_id("S1");
    assert_eq!(validator.validate(&model, [(&rule, &math)]).len(), 1);
}

#[test]
fn full_rule_set_on_a_model() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut model = Model::new(SbmlNamespace::new(3, 2));
    model.add_compartment("cell").add_species("S1").add_parameter("Vmax");
    let r1 = model.add_reaction("r1");
    model.add_local_parameter(r1, "Km").unwrap();
    model.add_function_definition("mm", parse_formula("lambda(s, v, k, v * s / (k + s))").unwrap());

    let fd = MathElement::new(ElementKind::FunctionDefinition).with_id("mm");
    let fd_math = parse_formula("lambda(s, v, k, v * s / (k + s))").unwrap();
    let law = MathElement::new(ElementKind::KineticLaw { reaction: r1 });
    let law_math = parse_formula("cell * mm(S1, Vmax, Km)").unwrap();
    let trigger = MathElement::new(ElementKind::Trigger);
    let trigger_math = parse_formula("S1 > 10 && time >= 5").unwrap();

    let validator = MathValidator::default();
    let log = validator.validate(
        &model,
        [(&fd, &fd_math), (&law, &law_math), (&trigger, &trigger_math)],
    );
    assert!(log.is_empty(), "{}", log.as_error_message());

    let bad_rule = MathElement::new(ElementKind::RateRule).with_id("S1");
    let bad_math = parse_formula("mm(S1, Vmax) + lambda(q, q) + undeclared").unwrap();
    let log = validator.validate(&model, [(&bad_rule, &bad_math)]);
    assert!(log.contains(ErrorCode::InvalidNoArgsPassedToFunctionDef));
    assert!(log.contains(ErrorCode::LambdaOnlyAllowedInFunctionDef));
    assert!(log.contains(ErrorCode::ApplyCiMustBeModelComponent));
    assert_eq!(validator.validate(&model, [(&bad_rule, &bad_math)]), log);
}
