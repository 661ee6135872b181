use ail_core::{Checker, Diagnostics, ErrorKind, ModuleIndex, VerifiedUnit};

fn check(src: &str) -> Result<VerifiedUnit, Diagnostics> {
    let program = ail_parse::parse_source(src).expect("parse");
    Checker::new().check_unit(&program, &ModuleIndex::new())
}

fn error_kinds(src: &str) -> Vec<ErrorKind> {
    check(src).expect_err("expected diagnostics").kinds()
}

#[test_log::test]
fn literals_have_fixed_types() {
    assert!(check("fn f():i32 = ^1\n").is_ok());
    assert!(check("fn f():f64 = ^1.5\n").is_ok());
    assert_eq!(error_kinds("fn f():i32 = ^1.5\n"), vec![ErrorKind::TypeMismatch]);
    assert_eq!(error_kinds("fn f():i64 = ^1\n"), vec![ErrorKind::TypeMismatch]);
}

#[test_log::test]
fn integer_literals_must_fit_i32() {
    assert_eq!(error_kinds("fn f():i32 = ^3000000000\n"), vec![ErrorKind::TypeMismatch]);
    assert!(check("fn f():i32 = ^-2147483648\n").is_ok());
}

#[test_log::test]
fn arithmetic_needs_identical_operands() {
    let src = "fn f(a:i32, b:f64):f64 = ^a + b\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);

    let src = "fn f(a:i64):i64 = ^a + 1\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);

    assert!(check("fn f(a:i64, b:i64):i64 = ^a * b - a\n").is_ok());
}

#[test_log::test]
fn remainder_is_integer_only() {
    assert_eq!(
        error_kinds("fn f(a:f64, b:f64):f64 = ^a % b\n"),
        vec![ErrorKind::TypeMismatch]
    );
    assert!(check("fn f(a:u8, b:u8):u8 = ^a % b\n").is_ok());
}

#[test_log::test]
fn ordering_is_numeric_and_equality_is_structural() {
    assert!(check("fn f(s:str):bool = ^s == \"a\"\n").is_ok());
    assert!(check("fn f(a:f32, b:f32):bool = ^a <= b\n").is_ok());
    assert_eq!(
        error_kinds("fn f(a:bool, b:bool):bool = ^a < b\n"),
        vec![ErrorKind::TypeMismatch]
    );
    assert_eq!(
        error_kinds("fn f(a:i32, b:u32):bool = ^a == b\n"),
        vec![ErrorKind::TypeMismatch]
    );
}

#[test_log::test]
fn truth_values_must_be_bool() {
    let src = "fn f(a:i32):i32 =\n  a ? ^1\n  ^0\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::NoImplicitCoercion]);

    assert_eq!(
        error_kinds("fn f(a:i32):bool = ^!a\n"),
        vec![ErrorKind::NoImplicitCoercion]
    );
    assert_eq!(
        error_kinds("fn f(a:i32):bool = ^a && true\n"),
        vec![ErrorKind::NoImplicitCoercion]
    );
}

#[test_log::test]
fn negation_needs_a_signed_operand() {
    assert!(check("fn f(a:i8):i8 = ^-a\n").is_ok());
    assert_eq!(error_kinds("fn f(a:u8):u8 = ^-a\n"), vec![ErrorKind::TypeMismatch]);
}

#[test_log::test]
fn calls_check_arity_and_arguments() {
    let src = "fn g(a:i32):i32 = ^a\n\nfn f():i32 = ^g(1, 2)\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::ArityMismatch]);

    let src = "fn g(a:i32, b:bool):i32 = ^a\n\nfn f():i32 = ^g(true, 1)\n";
    assert_eq!(
        error_kinds(src),
        vec![ErrorKind::TypeMismatch, ErrorKind::TypeMismatch]
    );
}

#[test_log::test]
fn locals_are_not_callable_and_functions_are_not_values() {
    let src = "fn f(a:i32):i32 = ^a(1)\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);

    let src = "fn g():i32 = ^1\n\nfn f():i32 = ^g\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);
}

#[test_log::test]
fn record_literals_need_every_field_once() {
    let point = "type P = {x:f64, y:f64}\n\n";
    assert!(check(&format!("{point}fn f():P = ^P.{{x:1.0, y:2.0}}\n")).is_ok());
    assert_eq!(
        error_kinds(&format!("{point}fn f():P = ^P.{{x:1.0}}\n")),
        vec![ErrorKind::ArityMismatch]
    );
    assert_eq!(
        error_kinds(&format!("{point}fn f():P = ^P.{{x:1.0, y:2.0, z:3.0}}\n")),
        vec![ErrorKind::UnknownType]
    );
    assert_eq!(
        error_kinds(&format!("{point}fn f():P = ^P.{{x:1.0, y:2.0, x:3.0}}\n")),
        vec![ErrorKind::DuplicateBinding]
    );
    assert_eq!(
        error_kinds(&format!("{point}fn f():P = ^P.{{x:1, y:2.0}}\n")),
        vec![ErrorKind::TypeMismatch]
    );
}

#[test_log::test]
fn field_access() {
    let point = "type P = {x:f64, y:f64}\n\n";
    assert!(check(&format!("{point}fn f(p:P):f64 = ^p.x\n")).is_ok());
    assert_eq!(
        error_kinds(&format!("{point}fn f(p:P):f64 = ^p.z\n")),
        vec![ErrorKind::UnknownType]
    );
    assert_eq!(
        error_kinds("fn f(a:i32):i32 = ^a.x\n"),
        vec![ErrorKind::TypeMismatch]
    );
}

#[test_log::test]
fn constructors_follow_the_expected_type() {
    let src = "type Box<T> = Full(T) | Empty\n\nfn f():Box<i32> =\n  b:Box<i32> = Empty\n  ^b\n";
    assert!(check(src).is_ok());

    let src = "type Box<T> = Full(T) | Empty\n\nfn f():Box<str> = ^Full.(1)\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);
}

#[test_log::test]
fn constructor_arguments_infer_type_parameters() {
    let src = "type Box<T> = Full(T) | Empty\n\nfn f():bool = ^Full.(1) == Full.(2)\n";
    assert!(check(src).is_ok());

    let src = "type Box<T> = Full(T) | Empty\n\nfn f():bool = ^Empty == Empty\n";
    let kinds = error_kinds(src);
    assert!(kinds.iter().all(|k| *k == ErrorKind::TypeMismatch), "{kinds:?}");
}

#[test_log::test]
fn constructor_arity_is_exact() {
    let src = "type O = Some(i32) | None\n\nfn f():O = ^Some.(1, 2)\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::ArityMismatch]);
}

#[test_log::test]
fn assignment_needs_a_mutable_binding() {
    let src = "fn f():i32 =\n  n:i32 = 1\n  n = 2\n  ^n\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::ImmutableAssignment]);

    let src = "fn f():i32 =\n  n!:i32 = 1\n  n = n + 1\n  ^n\n";
    assert!(check(src).is_ok());

    let src = "fn f(n!:i32):i32 =\n  n = 2.0\n  ^n\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);
}

#[test_log::test]
fn bare_return_only_in_unit_bodies() {
    assert!(check("fn f():() = ^\n").is_ok());
    assert!(check("test t = ^\n").is_ok());
    assert_eq!(error_kinds("fn f():i32 = ^\n"), vec![ErrorKind::TypeMismatch]);
    assert_eq!(error_kinds("test t = ^1\n"), vec![ErrorKind::TypeMismatch]);
}

#[test_log::test]
fn patterns_are_checked_against_the_scrutinee() {
    let src = "type A = X | Y\n\ntype B = Z\n\nfn f(a:A):i32 =\n  a | Z -> ^1 | _ -> ^2\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);

    let src = "type O = Some(i32) | None\n\nfn f(o:O):i32 =\n  o | Some(a, b) -> ^a | None -> ^0\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::ArityMismatch]);
}

#[test_log::test]
fn pattern_bindings_take_payload_types() {
    let src = "type R<T, E> = Ok(T) | Err(E)\n\nfn f(r:R<i32, str>):str =\n  r | Ok(v) -> ^v | Err(e) -> ^e\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::TypeMismatch]);
}

#[test_log::test]
fn type_arguments_are_counted() {
    let src = "type Box<T> = Full(T) | Empty\n\nfn f(b:Box):i32 = ^1\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::ArityMismatch]);
    assert_eq!(error_kinds("fn f(b:i32<i32>):i32 = ^1\n"), vec![ErrorKind::ArityMismatch]);
}

#[test_log::test]
fn verified_units_carry_a_type_table() {
    let unit = check("fn f(a:i32):i32 = ^a + 1\n").expect("verifies");
    assert!(unit.types.expr_count() >= 3);
    assert!(unit.warnings.is_empty());
}
