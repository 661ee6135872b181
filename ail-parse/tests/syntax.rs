use ail_ast::{Decl, ExprKind, Pattern, Shape, Stmt};
use ail_parse::{FormatCheck, ParseConfig, check_format, parse_source, parse_source_with_config};
use pretty_assertions::assert_eq;

fn fn_body(src: &str) -> Vec<Stmt> {
    let program = parse_source(src).expect("parse");
    program
        .decls
        .into_iter()
        .find_map(|d| match d {
            Decl::Fn(f) => Some(f.body.stmts),
            _ => None,
        })
        .expect("a function")
}

#[test]
fn chained_comparisons_are_rejected() {
    let src = "fn f(x:i32, y:i32, z:i32):bool = ^x < y < z\n";
    let err = parse_source(src).expect_err("expected parse error");
    let msg = err.to_string();
    assert!(
        msg.contains("chained comparisons"),
        "unexpected error message: {msg}"
    );
}

#[test]
fn product_and_sum_types_parse() {
    let src = "type Point = {x:f64, y:f64}\ntype Result<T, E> = Ok(T) | Err(E)\ntype Unit = {}\n";
    let program = parse_source(src).expect("parse");
    let shapes: Vec<&Shape> = program
        .decls
        .iter()
        .filter_map(|d| match d {
            Decl::Type(t) => Some(&t.shape),
            _ => None,
        })
        .collect();
    assert!(matches!(shapes[0], Shape::Product(f) if f.len() == 2));
    assert!(matches!(shapes[1], Shape::Sum(v) if v.len() == 2 && v[0].payload.len() == 1));
    assert!(matches!(shapes[2], Shape::Product(f) if f.is_empty()));
}

#[test]
fn guard_and_match_statements() {
    let body = fn_body(
        "fn f(a:i32, b:i32, r:Result<i32, str>):Result<i32, str> =\n  b == 0 ? ^Err.\"z\"\n  r | Ok(v) -> ^Ok.(v) | Err(_) -> panic!\n",
    );
    assert_eq!(body.len(), 2);

    let Stmt::Guard(g) = &body[0] else {
        panic!("expected guard, got {:?}", body[0]);
    };
    let Stmt::Return(ret) = g.action.as_ref() else {
        panic!("guard action should be a return");
    };
    let Some(ExprKind::VariantCtor { variant, args }) = ret.expr.as_ref().map(|e| &e.kind) else {
        panic!("expected constructor");
    };
    assert_eq!(variant.node, "Err");
    assert!(matches!(&args[0].kind, ExprKind::StringLit(s) if s == "z"));

    let Stmt::Match(m) = &body[1] else {
        panic!("expected match");
    };
    assert_eq!(m.arms.len(), 2);
    assert!(matches!(&m.arms[1].pat, Pattern::Ctor { subpatterns, .. } if matches!(subpatterns[0], Pattern::Wildcard { .. })));
    assert!(matches!(m.arms[1].action.as_ref(), Stmt::Panic(_)));
}

#[test]
fn declarations_assignments_and_mutability() {
    let body = fn_body("fn f():() =\n  n!:i32 = 1\n  n = n + 1\n  m:i32 = n\n  ^\n");
    assert!(matches!(&body[0], Stmt::Decl(d) if d.mutable));
    assert!(matches!(&body[1], Stmt::Assign(a) if a.target.node == "n"));
    assert!(matches!(&body[2], Stmt::Decl(d) if !d.mutable));
    assert!(matches!(&body[3], Stmt::Return(r) if r.expr.is_none()));
}

#[test]
fn record_literal_and_field_access() {
    let body = fn_body("fn f():f64 =\n  p:Point = Point.{x:1.0, y:2.0}\n  ^p.x\n");
    let Stmt::Decl(d) = &body[0] else {
        panic!("expected declaration");
    };
    assert!(matches!(&d.expr.kind, ExprKind::RecordLit { fields, .. } if fields.len() == 2));
    let Stmt::Return(r) = &body[1] else {
        panic!("expected return");
    };
    assert!(matches!(r.expr.as_ref().map(|e| &e.kind), Some(ExprKind::Field { .. })));
}

#[test]
fn use_paths_accept_both_separators() {
    let program = parse_source("use foo::A\nuse bar.baz.B\n").expect("parse");
    let paths: Vec<String> = program
        .decls
        .iter()
        .filter_map(|d| match d {
            Decl::Use(u) => Some(u.full_path()),
            _ => None,
        })
        .collect();
    assert_eq!(paths, vec!["foo::A".to_string(), "bar::baz::B".to_string()]);
}

#[test]
fn lowercase_type_names_are_rejected() {
    let err = parse_source("type point = {x:f64}\n").expect_err("expected parse error");
    assert!(err.to_string().contains("parse error"));
}

#[test]
fn unsupported_edition_is_rejected() {
    let config = ParseConfig {
        edition: Some("v9".to_string()),
    };
    let err = parse_source_with_config("test t = ^\n", &config).expect_err("edition");
    assert!(err.to_string().contains("unsupported edition"));

    let config = ParseConfig {
        edition: Some("v0".to_string()),
    };
    parse_source_with_config("test t = ^\n", &config).expect("v0 parses");
}

#[test]
fn nested_indentation_is_rejected() {
    let err = parse_source("fn f():() =\n  ^\n    ^\n").expect_err("nested");
    assert!(err.to_string().contains("parse error"));
}

#[test]
fn check_format_reports_canonical_text() {
    let canonical = "module app\n\nuse std::io\n\nfn f(a:i32):i32 =\n  ^a + 1\n";
    assert_eq!(check_format(canonical).expect("parse"), FormatCheck::Canonical);

    let sloppy = "module app\nuse std::io\nfn f(a : i32) : i32 = ^a+1\n";
    let FormatCheck::NotCanonical { formatted, diff } = check_format(sloppy).expect("parse") else {
        panic!("expected NotCanonical");
    };
    assert_eq!(formatted, canonical);
    assert!(!diff.is_empty());
}

#[test]
fn an_already_parsed_program_is_compared_without_reparsing() {
    let sloppy = "module app\nuse std::io\nfn f(a : i32) : i32 = ^a+1\n";
    let program = parse_source(sloppy).expect("parse");
    let check = ail_parse::check_program_format(sloppy, &program);
    assert_eq!(check, check_format(sloppy).expect("parse"));
    assert!(!check.is_canonical());

    let canonical = ail_parse::format_program(&program);
    assert!(ail_parse::check_program_format(&canonical, &program).is_canonical());
}

#[test]
fn formatted_output_reparses_to_the_same_text() {
    let src = "type Opt<T> = Some(T) | None\nfn get(o:Opt<i32>, d:i32):i32 =\n  o | Some(v) -> ^v | None -> ^d\ntest defaults =\n  n:i32 = get(None, 3)\n  n != 3 ? panic!(\"default\")\n  ^\n";
    let first = ail_parse::format_program(&parse_source(src).expect("parse"));
    let second = ail_parse::format_program(&parse_source(&first).expect("reparse"));
    assert_eq!(first, second);
}
