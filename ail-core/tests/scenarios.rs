use std::sync::Arc;

use ail_core::{
    Checker, Diagnostics, ErrorKind, ModuleExports, ModuleIndex, Severity, TypeDef, TypeShape,
    Unit, VerifiedUnit, Workspace,
};
use pretty_assertions::assert_eq;

const RESULT: &str = "type Result<T, E> = Ok(T) | Err(E)\n\n";

fn check(src: &str) -> Result<VerifiedUnit, Diagnostics> {
    let program = ail_parse::parse_source(src).expect("parse");
    Checker::new().check_unit(&program, &ModuleIndex::new())
}

#[test_log::test]
fn guarded_error_return_falls_off_the_end() {
    let src = format!("{RESULT}fn f(a:i32, b:i32):Result<i32, str> = b == 0 ? ^Err.\"z\"\n");
    let err = check(&src).expect_err("incomplete");
    assert_eq!(err.kinds(), vec![ErrorKind::IncompleteReturnCoverage]);
}

#[test_log::test]
fn completing_the_division_verifies() {
    let src = format!(
        "{RESULT}fn f(a:i32, b:i32):Result<i32, str> =\n  b == 0 ? ^Err.\"z\"\n  ^Ok.(a / b)\n"
    );
    assert!(check(&src).is_ok());
}

#[test_log::test]
fn record_moved_into_another_binding() {
    let src = "type Point = {x:f64, y:f64}\n\nfn f():f64 =\n  p:Point = Point.{x:1.0, y:2.0}\n  q:Point = p\n  ^p.x\n";
    let err = check(src).expect_err("moved");
    assert_eq!(err.kinds(), vec![ErrorKind::UseAfterMove]);
    assert_eq!(err.as_slice()[0].decl.as_deref(), Some("f"));
}

#[test_log::test]
fn result_match_needs_both_arms() {
    let head = format!("{RESULT}fn f(r:Result<i32, str>):i32 =\n  r | Ok(v) -> ^v");
    assert!(check(&format!("{head} | Err(e) -> panic!\n")).is_ok());
    assert_eq!(
        check(&format!("{head}\n")).expect_err("non-exhaustive").kinds(),
        vec![ErrorKind::NonExhaustiveMatch]
    );
}

#[test_log::test]
fn colliding_imports_across_a_workspace() {
    let foo = ail_parse::parse_source("module foo\n\ntype A = {v:i32}\n").expect("parse");
    let bar = ail_parse::parse_source("module bar\n\ntype A = {v:i32}\n").expect("parse");
    let app = ail_parse::parse_source("module app\n\nuse foo::A\nuse bar::A\n").expect("parse");
    let report = Workspace::new().check(&[
        Unit::new("foo", foo),
        Unit::new("bar", bar),
        Unit::new("app", app),
    ]);
    let app = report.get("app").expect("app");
    assert_eq!(app.diagnostics().kinds(), vec![ErrorKind::ImportNameCollision]);
}

#[test_log::test]
fn verified_units_format_canonically() {
    let src = "module m\nuse b::Y\ntype Color = Red | Green\nfn pick(c:Color):i32 = c | Red -> ^1 | Green -> ^2\ntest t = ^\n";
    let mut exports = ModuleExports::new("b");
    exports.types.insert(
        "Y".to_string(),
        Arc::new(TypeDef {
            module: "b".to_string(),
            name: "Y".to_string(),
            params: Vec::new(),
            shape: TypeShape::Product(Vec::new()),
        }),
    );
    let mut index = ModuleIndex::new();
    index.insert(exports);

    let program = ail_parse::parse_source(src).expect("parse");
    let unit = Checker::new().check_unit(&program, &index).expect("verifies");
    let text = unit.canonical_text();
    assert_eq!(
        text,
        "module m\n\nuse b::Y\n\ntype Color = Red | Green\n\nfn pick(c:Color):i32 =\n  c | Red -> ^1 | Green -> ^2\n\ntest t =\n  ^\n"
    );

    let again = ail_parse::parse_source(&text).expect("reparse");
    let reverified = Checker::new().check_unit(&again, &index).expect("re-verifies");
    assert_eq!(reverified.canonical_text(), text);
}

#[test_log::test]
fn source_checks_report_layout_drift() {
    let checker = Checker::new();
    let index = ModuleIndex::new();

    let unit = checker
        .check_source("fn f():i32 = ^1\n", &index)
        .expect("parse")
        .expect("verifies");
    assert_eq!(unit.warnings.kinds(), vec![ErrorKind::NotCanonical]);
    assert_eq!(unit.warnings.as_slice()[0].severity, Severity::Info);

    let unit = checker
        .check_source("fn f():i32 =\n  ^1\n", &index)
        .expect("parse")
        .expect("verifies");
    assert!(unit.warnings.is_empty());
}

#[test_log::test]
fn source_checks_surface_parse_errors() {
    assert!(Checker::new().check_source("fn (:\n", &ModuleIndex::new()).is_err());
}
