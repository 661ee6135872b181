use ail_core::{CheckConfig, ErrorKind, Unit, Workspace, WorkspaceReport};
use pretty_assertions::assert_eq;

const GEO: &str = "module geo\n\ntype Point = {x:f64, y:f64}\n\nfn origin():Point = ^Point.{x:0.0, y:0.0}\n";

const APP: &str = "module app\n\nuse geo::Point\nuse geo::origin\n\nfn f():f64 =\n  p:Point = origin()\n  ^p.x\n";

fn unit(name: &str, src: &str) -> Unit {
    Unit::new(name, ail_parse::parse_source(src).expect("parse"))
}

fn check(units: &[Unit]) -> WorkspaceReport {
    Workspace::new().check(units)
}

fn kinds(report: &WorkspaceReport, name: &str) -> Vec<ErrorKind> {
    report
        .get(name)
        .expect("unit in report")
        .diagnostics()
        .kinds()
}

#[test_log::test]
fn dependencies_are_checked_first() {
    let report = check(&[unit("app.ail", APP), unit("geo.ail", GEO)]);
    assert!(report.is_ok(), "{report:#?}");
    assert_eq!(report.units[0].name, "app.ail");
    assert_eq!(report.units[0].module.as_deref(), Some("app"));
    assert_eq!(report.error_count(), 0);
}

#[test_log::test]
fn imported_record_types_keep_their_module() {
    let app = "module app\n\nuse geo::Point\n\nfn f():Point = ^Point.{x:1.0, y:2.0}\n";
    let report = check(&[unit("geo.ail", GEO), unit("app.ail", app)]);
    let verified = report.get("app.ail").and_then(|u| u.result.as_ref().ok());
    assert!(verified.is_some());
}

#[test_log::test]
fn same_final_segment_from_two_modules_collides() {
    let foo = "module foo\n\ntype A = {v:i32}\n";
    let bar = "module bar\n\ntype A = {w:i32}\n";

    let app = "module app\n\nuse foo::A\nuse bar::A\n";
    let report = check(&[unit("foo", foo), unit("bar", bar), unit("app", app)]);
    assert_eq!(kinds(&report, "app"), vec![ErrorKind::ImportNameCollision]);

    let app = "module app\n\nuse foo::A\nuse foo::A\n";
    let report = check(&[unit("foo", foo), unit("bar", bar), unit("app", app)]);
    assert!(report.is_ok(), "{report:#?}");
}

#[test_log::test]
fn shared_variant_names_are_ambiguous_only_at_use() {
    let foo = "module foo\n\ntype A = X | Y\n";
    let bar = "module bar\n\ntype B = X | Z\n";

    let app = "module app\n\nuse foo::A\nuse bar::B\n\nfn f():A = ^Y\n\nfn g():B = ^Z\n";
    let report = check(&[unit("foo", foo), unit("bar", bar), unit("app", app)]);
    assert!(report.is_ok(), "{report:#?}");

    let app = "module app\n\nuse foo::A\nuse bar::B\n\nfn f():A = ^X\n";
    let report = check(&[unit("foo", foo), unit("bar", bar), unit("app", app)]);
    assert_eq!(kinds(&report, "app"), vec![ErrorKind::UnresolvedName]);
    let message = report
        .get("app")
        .and_then(|u| u.diagnostics().iter().next().map(|d| d.message.clone()));
    assert_eq!(
        message.as_deref(),
        Some("ambiguous variant `X`: provided by `foo::A` and `bar::B`")
    );
}

#[test_log::test]
fn two_units_cannot_declare_one_module() {
    let report = check(&[unit("geo.ail", GEO), unit("copy.ail", "module geo\n"), unit("app.ail", APP)]);
    assert_eq!(kinds(&report, "copy.ail"), vec![ErrorKind::DuplicateModule]);
    assert!(report.get("geo.ail").is_some_and(|u| u.is_ok()));
    assert!(report.get("app.ail").is_some_and(|u| u.is_ok()));
}

#[test_log::test]
fn import_cycles_are_rejected() {
    let a = "module a\n\nuse b::g\n\nfn f():i32 = ^1\n";
    let b = "module b\n\nuse a::f\n\nfn g():i32 = ^f()\n";
    let c = "module c\n\nuse a::f\n\nfn h():i32 = ^f()\n";
    let report = check(&[unit("a", a), unit("b", b), unit("c", c)]);

    assert_eq!(kinds(&report, "a"), vec![ErrorKind::CyclicImport]);
    assert_eq!(kinds(&report, "b"), vec![ErrorKind::CyclicImport]);
    assert!(report.get("c").is_some_and(|u| u.is_ok()), "{report:#?}");
}

#[test_log::test]
fn failed_units_still_export() {
    let geo = format!("{GEO}\nfn broken():i32 = ^true\n");
    let report = check(&[unit("geo.ail", &geo), unit("app.ail", APP)]);
    assert_eq!(kinds(&report, "geo.ail"), vec![ErrorKind::TypeMismatch]);
    assert!(report.get("app.ail").is_some_and(|u| u.is_ok()), "{report:#?}");
    assert_eq!(report.error_count(), 1);
}

#[test_log::test]
fn unknown_modules_stay_unresolved() {
    let report = check(&[unit("app.ail", APP)]);
    let found = kinds(&report, "app.ail");
    assert_eq!(&found[..2], &[ErrorKind::UnresolvedImport, ErrorKind::UnresolvedImport]);
}

#[test_log::test]
fn sequential_checking_gives_the_same_report() {
    let units = [unit("app.ail", APP), unit("geo.ail", GEO)];
    let config = CheckConfig {
        parallel: false,
        ..CheckConfig::default()
    };
    let sequential = Workspace::with_config(config).check(&units);
    let parallel = check(&units);
    assert_eq!(sequential.is_ok(), parallel.is_ok());
    assert_eq!(sequential.error_count(), parallel.error_count());
}
