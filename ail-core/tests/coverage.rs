use ail_core::{
    CheckConfig, Checker, Diagnostics, ErrorKind, FaultKind, ModuleIndex, Severity, VerifiedUnit,
};

const TYPES: &str = "type Color = Red | Green | Blue\n\ntype O = Some(i32) | None\n\ntype R<T, E> = Ok(T) | Err(E)\n\n";

fn check_with(body: &str, config: CheckConfig) -> Result<VerifiedUnit, Diagnostics> {
    let src = format!("{TYPES}{body}");
    let program = ail_parse::parse_source(&src).expect("parse");
    Checker::with_config(config).check_unit(&program, &ModuleIndex::new())
}

fn check(body: &str) -> Result<VerifiedUnit, Diagnostics> {
    check_with(body, CheckConfig::default())
}

fn error_kinds(body: &str) -> Vec<ErrorKind> {
    check(body).expect_err("expected diagnostics").kinds()
}

fn warning_kinds(body: &str) -> Vec<ErrorKind> {
    check(body).expect("verifies").warnings.kinds()
}

#[test_log::test]
fn every_variant_covered() {
    let src = "fn f(c:Color):i32 =\n  c | Red -> ^1 | Green -> ^2 | Blue -> ^3\n";
    let unit = check(src).expect("verifies");
    assert!(unit.warnings.is_empty());
}

#[test_log::test]
fn missing_variant_is_named() {
    let src = "fn f(c:Color):i32 =\n  c | Red -> ^1 | Blue -> ^3\n";
    let err = check(src).expect_err("non-exhaustive");
    assert_eq!(err.kinds(), vec![ErrorKind::NonExhaustiveMatch]);
    let message = &err.as_slice()[0].message;
    assert!(message.contains("`Green`"), "{message}");
    assert!(message.contains("`Color`"), "{message}");
}

#[test_log::test]
fn wildcards_and_bindings_cover_the_rest() {
    assert!(check("fn f(c:Color):i32 =\n  c | Red -> ^1 | _ -> ^2\n").is_ok());
    assert!(check("fn f(c:Color):Color =\n  c | Red -> ^Blue | other -> ^other\n").is_ok());
}

#[test_log::test]
fn nested_shapes_are_reported_as_witnesses() {
    let src = "fn f(r:R<O, str>):i32 =\n  r | Ok(Some(v)) -> ^v | Err(e) -> ^0\n";
    let err = check(src).expect_err("non-exhaustive");
    assert_eq!(err.kinds(), vec![ErrorKind::NonExhaustiveMatch]);
    let message = &err.as_slice()[0].message;
    assert!(message.contains("`Ok(None)`"), "{message}");
}

#[test_log::test]
fn arms_after_a_catch_all_are_unreachable() {
    let src = "fn f(c:Color):i32 =\n  c | _ -> ^1 | Red -> ^2\n";
    let unit = check(src).expect("warnings only");
    assert_eq!(unit.warnings.kinds(), vec![ErrorKind::UnreachableArm]);
    assert_eq!(unit.warnings.as_slice()[0].severity, Severity::Warning);
}

#[test_log::test]
fn repeated_arms_are_unreachable() {
    let src = "fn f(o:O):i32 =\n  o | Some(v) -> ^v | None -> ^0 | Some(_) -> ^1\n";
    assert_eq!(warning_kinds(src), vec![ErrorKind::UnreachableArm]);
}

#[test_log::test]
fn returning_expression_covers_the_body() {
    assert!(check("fn f(a:i32):i32 = ^a\n").is_ok());
}

#[test_log::test]
fn guarded_return_then_falling_off_the_end() {
    let src = "fn f(b:bool):i32 =\n  b ? ^1\n  0\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::IncompleteReturnCoverage]);
}

#[test_log::test]
fn unit_bodies_still_need_an_explicit_return() {
    let src = "fn f():() =\n  x:i32 = 1\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::IncompleteReturnCoverage]);
}

#[test_log::test]
fn coverage_failure_points_at_the_declaration_name() {
    let src = "fn f(b:bool):i32 =\n  b ? ^1\n  0\n";
    let err = check(src).expect_err("falls off");
    let d = &err.as_slice()[0];
    let name_at = TYPES.len() + "fn ".len();
    assert_eq!(d.span.offset(), name_at);
    assert_eq!(d.decl.as_deref(), Some("f"));
}

#[test_log::test]
fn match_arms_that_do_not_return_continue() {
    let src = "fn f(c:Color):i32 =\n  n!:i32 = 0\n  c | Red -> n = 1 | _ -> n = 2\n  ^n\n";
    assert!(check(src).is_ok());

    let src = "fn f(c:Color):i32 =\n  c | Red -> ^1 | _ -> 0\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::IncompleteReturnCoverage]);
}

#[test_log::test]
fn statements_after_a_return_are_unreachable() {
    let src = "fn f():i32 =\n  ^1\n  x:i32 = 2\n  ^x\n";
    // One warning per unreachable run.
    assert_eq!(warning_kinds(src), vec![ErrorKind::UnreachableStatement]);
}

#[test_log::test]
fn unreachable_reports_can_be_disabled() {
    let config = CheckConfig {
        report_unreachable: false,
        ..CheckConfig::default()
    };
    let src = "fn f(c:Color):i32 =\n  c | _ -> ^1 | Red -> ^2\n  ^3\n";
    let unit = check_with(src, config).expect("verifies");
    assert!(unit.warnings.is_empty());
}

#[test_log::test]
fn panic_ends_a_path_and_is_annotated() {
    let src = "test t =\n  panic!(\"boom\")\n";
    let unit = check(src).expect("verifies");
    assert!(unit.warnings.is_empty());
    assert_eq!(
        unit.faults[0].kind,
        FaultKind::ExplicitPanic {
            message: Some("boom".to_string())
        }
    );
}

#[test_log::test]
fn scenario_result_match() {
    let ok = "fn f(r:R<i32, str>):i32 =\n  r | Ok(v) -> ^v | Err(e) -> panic!\n";
    assert!(check(ok).is_ok());

    let missing = "fn f(r:R<i32, str>):i32 =\n  r | Ok(v) -> ^v\n";
    let err = check(missing).expect_err("non-exhaustive");
    assert_eq!(err.kinds(), vec![ErrorKind::NonExhaustiveMatch]);
    assert!(err.as_slice()[0].message.contains("`Err(_)`"));
}
