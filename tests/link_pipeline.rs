//! End-to-end tests of the link pipeline over builder-made compilation units.

use insta::assert_snapshot;
use kiln::{Ast, AstBuilder, DiagnosticKind, KilnDatabase, LinkOptions, compile, link_unit};
use kiln_ast::{Ownership, StmtId};
use kiln_core::{Diagnostic, Span, Symbol};
use kiln_link::{BranchMovePolicy, ConstFolder, CursorHost, LinkConfig, display_type};
use salsa::Setter as _;

fn render(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `struct Res` owned with destructor `free(&Res)`, and a bodiless
/// `take(Res)` that consumes one.
fn owned_resource(b: &mut AstBuilder) {
    b.structure(
        "Res",
        Ownership::Owned {
            destructor: Some(Symbol::new("free")),
        },
    );
    let free = b.function("free");
    let r = b.ty("Res");
    let r = b.ty_ref(r);
    b.param(free, "r", r);
    let take = b.function("take");
    let r = b.ty("Res");
    b.param(take, "r", r);
}

/// `take(a);`
fn take_a(b: &mut AstBuilder) -> StmtId {
    let a = b.name("a");
    let call = b.call("take", [a]);
    b.expr_stmt(call)
}

fn link_kinds(db: &KilnDatabase, ast: &Ast, config: LinkConfig) -> Vec<DiagnosticKind> {
    let mut sink = Vec::new();
    link_unit(db, ast, config, &mut ConstFolder, &mut sink).expect("well-formed AST");
    sink.iter().map(|d: &Diagnostic| d.kind).collect()
}

/// ```text
/// fn id<T>(x: T) -> T { return x; }
/// fn main() { id(1); id("s"); id(2); }
/// ```
fn identity_unit() -> Ast {
    let mut b = AstBuilder::new();
    let id = b.function("id");
    b.generic(id, "T");
    let t = b.ty("T");
    b.param(id, "x", t);
    let t = b.ty("T");
    b.returns(id, t);
    let x = b.name("x");
    let ret = b.ret(Some(x));
    let body = b.block([ret]);
    b.body(id, body);

    let main = b.function("main");
    let one = b.int(1);
    let c1 = b.call("id", [one]);
    let s = b.string("s");
    let c2 = b.call("id", [s]);
    let two = b.int(2);
    let c3 = b.call("id", [two]);
    let stmts = [c1, c2, c3].map(|c| b.expr_stmt(c));
    let body = b.block(stmts);
    b.body(main, body);
    b.finish()
}

#[test]
fn test_identity_unit() {
    let ast = identity_unit();
    let db = KilnDatabase::default();
    let (program, diags) = compile(&db, &ast, &LinkOptions::default());
    let program = program.expect("well-formed AST");
    assert!(diags.is_empty(), "{diags:?}");
    assert_snapshot!(program.render_iterations(&db, &ast), @r"
    id iter0 <int>
    id iter1 <str>
    ");
}

/// ```text
/// struct Box<T> { value: T }
/// fn wrap<T>(x: T) -> Box<T> { return Box { value: x }; }
/// fn main() { let a = wrap(1); let b = wrap("s"); }
/// ```
#[test]
fn test_generic_body_instantiates_per_caller_iteration() {
    let mut b = AstBuilder::new();
    let boxed = b.structure("Box", Ownership::Copy);
    b.generic(boxed, "T");
    let t = b.ty("T");
    b.field(boxed, "value", t);

    let wrap = b.function("wrap");
    b.generic(wrap, "T");
    let t = b.ty("T");
    b.param(wrap, "x", t);
    let t = b.ty("T");
    let box_t = b.ty_app("Box", [t]);
    b.returns(wrap, box_t);
    let box_ty = b.ty("Box");
    let x = b.name("x");
    let construct = b.construct(box_ty, [("value", x)]);
    let ret = b.ret(Some(construct));
    let body = b.block([ret]);
    b.body(wrap, body);

    let main = b.function("main");
    let one = b.int(1);
    let first = b.call("wrap", [one]);
    let (declare_a, _) = b.let_("a", None, Some(first));
    let s = b.string("s");
    let second = b.call("wrap", [s]);
    let (declare_b, b_local) = b.let_("b", None, Some(second));
    let body = b.block([declare_a, declare_b]);
    b.body(main, body);
    let ast = b.finish();

    let db = KilnDatabase::default();
    let (program, diags) = compile(&db, &ast, &LinkOptions::default());
    let mut program = program.expect("well-formed AST");
    assert!(diags.is_empty(), "{diags:?}");
    assert_snapshot!(program.render_iterations(&db, &ast), @r"
    Box iter0 <int> depth=1
    Box iter1 <str> depth=1
    wrap iter0 <int>
    wrap iter1 <str>
    ");

    let b_ty = program.type_of_decl(&db, b_local).expect("typed local");
    assert_eq!(display_type(&db, &ast, b_ty), "Box<str>");

    // Walking `wrap` once per iteration sees a concrete constructor type.
    let mut seen = Vec::new();
    let indices: Vec<_> = program.iterations(wrap).map(|it| it.index).collect();
    for index in indices {
        let active = program.activate(wrap, index);
        let ty = active.known_type(&db, construct).expect("linked");
        seen.push(display_type(&db, &ast, ty));
    }
    assert_eq!(seen, ["Box<int>", "Box<str>"]);
    assert_eq!(program.active_iteration(wrap), None);
}

/// ```text
/// struct Res owned(free) {}
/// fn free(r: &Res);
/// fn take(r: Res);
/// fn main() { let a = Res {}; take(a); take(a); foo; }
/// ```
#[test]
fn test_diagnostics_are_collected_in_source_order() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);

    let main = b.function("main");
    let res = b.ty("Res");
    let init = b.construct(res, []);
    let (declare_a, _) = b.let_("a", None, Some(init));
    b.at(Span::new(20, 21));
    let a = b.name("a");
    let call = b.call("take", [a]);
    let first = b.expr_stmt(call);
    b.at(Span::new(32, 33));
    let a = b.name("a");
    let call = b.call("take", [a]);
    let second = b.expr_stmt(call);
    b.at(Span::new(40, 43));
    let foo = b.name("foo");
    let third = b.expr_stmt(foo);
    let body = b.block([declare_a, first, second, third]);
    b.body(main, body);
    let ast = b.finish();

    let db = KilnDatabase::default();
    let (program, diags) = compile(&db, &ast, &LinkOptions::default());
    assert!(program.is_ok());
    assert_snapshot!(render(&diags), @r"
    ERROR [MoveChecking] 32..33: use of moved value `a` (moved at 20..21)
    ERROR [NameResolution] 40..43: unresolved name `foo`
    ");
}

/// ```text
/// fn main(c: bool) { let a = Res {}; if c { take(a); } else { take(a); } take(a); }
/// ```
#[test]
fn test_branch_policy_is_a_database_input() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);

    let main = b.function("main");
    let bool_ty = b.ty("bool");
    b.param(main, "c", bool_ty);
    let res = b.ty("Res");
    let init = b.construct(res, []);
    let (declare_a, _) = b.let_("a", None, Some(init));
    let in_then = take_a(&mut b);
    let then_body = b.block([in_then]);
    let in_else = take_a(&mut b);
    let else_body = b.block([in_else]);
    let c = b.name("c");
    let branch = b.if_(c, then_body, Some(else_body));
    let after = take_a(&mut b);
    let body = b.block([declare_a, branch, after]);
    b.body(main, body);
    let ast = b.finish();

    let mut db = KilnDatabase::default();
    let config = db.link_config(&LinkOptions::default());
    assert!(link_kinds(&db, &ast, config).is_empty());

    config
        .set_branch_moves(&mut db)
        .to(BranchMovePolicy::Intersection);
    assert_eq!(
        link_kinds(&db, &ast, config),
        [DiagnosticKind::UseAfterMove]
    );
}

/// ```text
/// struct Node<T> { next: *Node<Box<T>> }
/// struct Box<T> { value: T }
/// fn main() { let n: Node<int>; }
/// ```
#[test]
fn test_instantiation_limit_is_reported_once_per_declaration() {
    let mut b = AstBuilder::new();
    let node = b.structure("Node", Ownership::Copy);
    b.generic(node, "T");
    let t = b.ty("T");
    let box_t = b.ty_app("Box", [t]);
    let node_box = b.ty_app("Node", [box_t]);
    let next = b.ty_ptr(node_box);
    b.field(node, "next", next);
    let boxed = b.structure("Box", Ownership::Copy);
    b.generic(boxed, "T");
    let t = b.ty("T");
    b.field(boxed, "value", t);

    let main = b.function("main");
    let int = b.ty("int");
    let node_int = b.ty_app("Node", [int]);
    let (declare_n, _) = b.let_("n", Some(node_int), None);
    let body = b.block([declare_n]);
    b.body(main, body);
    let ast = b.finish();

    let db = KilnDatabase::default();
    let options = LinkOptions {
        max_instantiation_depth: 2,
        ..LinkOptions::default()
    };
    let (program, diags) = compile(&db, &ast, &options);
    let program = program.expect("well-formed AST");
    let limits: Vec<_> = diags
        .iter()
        .filter(|d| d.kind == DiagnosticKind::InstantiationLimit)
        .collect();
    assert_eq!(limits.len(), 2, "{diags:?}");
    assert_snapshot!(program.render_iterations(&db, &ast), @r"
    Node iter0 <int>
    Node iter1 <Box<int>> depth=1
    Node iter2 <Box<Box<int>>> depth=2
    Box iter0 <int> depth=1
    Box iter1 <Box<int>> depth=2
    ");
}
