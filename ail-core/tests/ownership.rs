use ail_core::{Checker, Diagnostics, ErrorKind, ModuleIndex, VerifiedUnit};

const PRELUDE: &str = "type P = {x:f64}\n\ntype O = A | B\n\nfn take(p:P):f64 = ^p.x\n\n";

fn check(body: &str) -> Result<VerifiedUnit, Diagnostics> {
    let src = format!("{PRELUDE}{body}");
    let program = ail_parse::parse_source(&src).expect("parse");
    Checker::new().check_unit(&program, &ModuleIndex::new())
}

fn error_kinds(body: &str) -> Vec<ErrorKind> {
    check(body).expect_err("expected diagnostics").kinds()
}

#[test_log::test]
fn single_use_is_fine() {
    let unit = check("fn f(p:P):f64 = ^take(p)\n").expect("verifies");
    assert_eq!(unit.moves.len(), 1);
}

#[test_log::test]
fn second_use_on_a_straight_path_is_use_after_move() {
    let src = "fn f(p:P):f64 =\n  a:f64 = take(p)\n  ^take(p)\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::UseAfterMove]);
}

#[test_log::test]
fn declaring_from_a_binding_moves_it() {
    let src = "fn f(p:P):f64 =\n  q:P = p\n  ^p.x\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::UseAfterMove]);
}

#[test_log::test]
fn copy_values_never_move() {
    assert!(check("fn f(s:str):str =\n  a:str = s\n  ^s\n").is_ok());
    assert!(check("fn f(n:i32):i32 =\n  a:i32 = n\n  ^n + a\n").is_ok());
}

#[test_log::test]
fn operators_and_conditions_only_read() {
    assert!(check("fn f(a:P, b:P):bool =\n  c:bool = a == b\n  ^a == b\n").is_ok());
    assert!(check("fn f(a:P, b:P):P =\n  a == b ? ^a\n  ^b\n").is_ok());
}

#[test_log::test]
fn field_reads_need_a_live_value() {
    assert!(check("fn f(p:P):f64 =\n  a:f64 = p.x\n  ^p.x\n").is_ok());
}

const OUTER: &str = "type Outer = {inner:P}\n\n";

#[test_log::test]
fn move_typed_fields_cannot_be_taken_by_access() {
    let src = format!("{OUTER}fn f(o:Outer):P = ^o.inner\n");
    assert_eq!(error_kinds(&src), vec![ErrorKind::InvalidFieldAccessOnMove]);
    let src = format!("{OUTER}fn f(o:Outer):f64 = ^take(o.inner)\n");
    assert_eq!(error_kinds(&src), vec![ErrorKind::InvalidFieldAccessOnMove]);
}

#[test_log::test]
fn reading_through_a_move_typed_field_is_invalid() {
    let src = format!("{OUTER}fn f(o:Outer):f64 = ^o.inner.x\n");
    assert_eq!(error_kinds(&src), vec![ErrorKind::InvalidFieldAccessOnMove]);
    let src = format!("{OUTER}fn f(o:Outer, p:P):bool = ^o.inner == p\n");
    assert_eq!(error_kinds(&src), vec![ErrorKind::InvalidFieldAccessOnMove]);
}

#[test_log::test]
fn moved_on_one_branch_stays_usable_after_the_merge() {
    let src = "fn f(p:P, b:bool):f64 =\n  b ? take(p)\n  ^take(p)\n";
    let unit = check(src).expect("verifies");
    assert_eq!(unit.moves.len(), 2);
}

#[test_log::test]
fn moved_on_every_arm_is_moved() {
    let src = "fn f(p:P, o:O):f64 =\n  o | A -> take(p) | B -> take(p)\n  ^take(p)\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::UseAfterMove]);
}

#[test_log::test]
fn moved_on_some_arms_stays_usable_after_the_merge() {
    let src = "fn f(p:P, o:O):f64 =\n  o | A -> take(p) | B -> 0.0\n  ^take(p)\n";
    assert!(check(src).is_ok());
}

#[test_log::test]
fn branches_that_return_do_not_reach_the_merge() {
    let src = "fn f(p:P, b:bool):f64 =\n  b ? ^take(p)\n  ^take(p)\n";
    assert!(check(src).is_ok());
}

#[test_log::test]
fn matching_consumes_the_scrutinee() {
    let src = "fn f(o:O):O =\n  o | A -> panic! | B -> o\n  ^o\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::UseAfterMove]);
}

#[test_log::test]
fn assignment_makes_a_binding_live_again() {
    let src = "fn f(p!:P, q:P):f64 =\n  a:f64 = take(p)\n  p = q\n  ^take(p)\n";
    assert!(check(src).is_ok());
}

#[test_log::test]
fn each_moved_value_is_reported_once() {
    let src = "fn f(p:P):f64 =\n  a:f64 = take(p)\n  b:f64 = take(p)\n  ^take(p)\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::UseAfterMove]);
}

#[test_log::test]
fn type_parameters_are_move() {
    let src = "type Box<T> = Full(T) | Empty\n\nfn f(b:Box<i32>):Box<i32> =\n  c:Box<i32> = b\n  ^b\n";
    assert_eq!(error_kinds(src), vec![ErrorKind::UseAfterMove]);
}
