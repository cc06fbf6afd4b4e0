use kiln_ast::{Ast, AstBuilder, DeclId, ExprId, Ownership, StmtId, Type};
use kiln_core::{Diagnostic, DiagnosticKind, Span, Symbol};

use super::Linker;
use crate::comptime::{ConstFolder, ConstValue};
use crate::config::{BranchMovePolicy, LinkConfig, LinkOptions};
use crate::cursor::CursorHost;
use crate::query::{Instance, LinkedProgram, ScheduledDrop, UsageSite, display_type};

fn link_with<'db>(
    db: &'db salsa::DatabaseImpl,
    ast: &Ast,
    options: &LinkOptions,
) -> (LinkedProgram<'db>, Vec<Diagnostic>) {
    let config = LinkConfig::from_options(db, options);
    let mut sink = Vec::new();
    let mut evaluator = ConstFolder;
    let program = Linker::new(db, ast, config, &mut evaluator, &mut sink)
        .link()
        .expect("well-formed AST");
    (program, sink)
}

fn link<'db>(db: &'db salsa::DatabaseImpl, ast: &Ast) -> (LinkedProgram<'db>, Vec<Diagnostic>) {
    link_with(db, ast, &LinkOptions::default())
}

fn kinds(diags: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diags.iter().map(|d| d.kind).collect()
}

/// `struct Res` owned with destructor `free(&Res)`, and a bodiless
/// `take(Res)` that consumes one.
fn owned_resource(b: &mut AstBuilder) -> (DeclId, DeclId) {
    let res = b.structure(
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
    (res, free)
}

/// `struct Box<T> { value: T }`
fn generic_box(b: &mut AstBuilder) -> DeclId {
    let boxed = b.structure("Box", Ownership::Copy);
    b.generic(boxed, "T");
    let t = b.ty("T");
    b.field(boxed, "value", t);
    boxed
}

fn new_res(b: &mut AstBuilder) -> ExprId {
    let ty = b.ty("Res");
    b.construct(ty, [])
}

fn take(b: &mut AstBuilder, place: ExprId) -> StmtId {
    let call = b.call("take", [place]);
    b.expr_stmt(call)
}

#[test]
fn test_identity_iterations_are_deduplicated() {
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
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(
        program.render_iterations(&db, &ast),
        "id iter0 <int>\nid iter1 <str>\n"
    );
    assert_eq!(program.call_iteration(c1), program.call_iteration(c3));
    assert_ne!(program.call_iteration(c1), program.call_iteration(c2));
    assert_eq!(program.known_type(&db, c2), Some(Type::str(&db)));
}

#[test]
fn test_unresolved_name() {
    let mut b = AstBuilder::new();
    let main = b.function("main");
    let foo = b.name("foo");
    let stmt = b.expr_stmt(foo);
    let body = b.block([stmt]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UnresolvedSymbol]);
    assert_eq!(diags[0].message, "unresolved name `foo`");
    assert_eq!(program.linked_declaration(foo), None);
}

#[test]
fn test_duplicate_function_is_ignored() {
    let mut b = AstBuilder::new();
    let first = b.function("f");
    let int = b.ty("int");
    b.param(first, "x", int);
    let second = b.function("f");
    let int = b.ty("int");
    b.param(second, "y", int);

    let main = b.function("main");
    let callee = b.name("f");
    let one = b.int(1);
    let call = b.call_expr(callee, [], [one]);
    let stmt = b.expr_stmt(call);
    let body = b.block([stmt]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::StructuralAmbiguity]);
    assert_eq!(program.linked_declaration(callee), Some(first));
}

/// ```text
/// fn f(x: int) -> int;
/// fn f(x: int) -> Box<str>;
/// fn main() { f(1); }
/// ```
#[test]
fn test_duplicate_signature_instantiates_nothing() {
    let mut b = AstBuilder::new();
    let boxed = generic_box(&mut b);
    let first = b.function("f");
    let int = b.ty("int");
    b.param(first, "x", int);
    let int = b.ty("int");
    b.returns(first, int);
    let second = b.function("f");
    let int = b.ty("int");
    b.param(second, "x", int);
    let s = b.ty("str");
    let box_str = b.ty_app("Box", [s]);
    b.returns(second, box_str);

    let main = b.function("main");
    let one = b.int(1);
    let call = b.call("f", [one]);
    let stmt = b.expr_stmt(call);
    let body = b.block([stmt]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::StructuralAmbiguity]);
    assert_eq!(program.iterations(boxed).count(), 0);
    assert_eq!(program.known_type(&db, call), Some(Type::int(&db)));
}

#[test]
fn test_redeclaration_with_other_parameters_shadows() {
    let mut b = AstBuilder::new();
    let first = b.function("f");
    let int = b.ty("int");
    b.param(first, "x", int);
    let second = b.function("f");
    let s = b.ty("str");
    b.param(second, "x", s);

    let main = b.function("main");
    let callee = b.name("f");
    let arg = b.string("hi");
    let call = b.call_expr(callee, [], [arg]);
    let stmt = b.expr_stmt(call);
    let body = b.block([stmt]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(program.linked_declaration(callee), Some(second));
}

#[test]
fn test_field_types_propagate_from_host() {
    let mut b = AstBuilder::new();
    generic_box(&mut b);
    let pair = b.structure("Pair", Ownership::Copy);
    b.generic(pair, "U");
    for name in ["left", "right"] {
        let u = b.ty("U");
        let boxed = b.ty_app("Box", [u]);
        b.field(pair, name, boxed);
    }

    let main = b.function("main");
    let int = b.ty("int");
    let pair_int = b.ty_app("Pair", [int]);
    let (declare_p, _) = b.let_("p", Some(pair_int), None);
    let p = b.name("p");
    let left = b.member_of(p, "left");
    let (declare_l, l) = b.let_("l", None, Some(left));
    let body = b.block([declare_p, declare_l]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(
        program.render_iterations(&db, &ast),
        "Box iter0 <int> depth=1\nPair iter0 <int>\n"
    );
    // `left` and `right` share one subscription.
    assert_eq!(program.registry().subscriber_count(), 1);
    let l_ty = program.type_of_decl(&db, l).expect("typed local");
    assert_eq!(display_type(&db, &ast, l_ty), "Box<int>");
}

#[test]
fn test_dependent_construct_follows_active_iteration() {
    let mut b = AstBuilder::new();
    let boxed = generic_box(&mut b);
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
    let call = b.call("wrap", [one]);
    let (declare_w, w) = b.let_("w", None, Some(call));
    let body = b.block([declare_w]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (mut program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(
        program.render_iterations(&db, &ast),
        "Box iter0 <int> depth=1\nwrap iter0 <int>\n"
    );
    assert_eq!(program.call_target(construct), Some(boxed));
    assert!(matches!(
        program.usage(UsageSite::Expr(construct)).map(|u| u.instance),
        Some(Instance::Dependent(_))
    ));
    let w_ty = program.type_of_decl(&db, w).expect("typed local");
    assert_eq!(display_type(&db, &ast, w_ty), "Box<int>");

    let wrap_iter = program.call_iteration(call).expect("closed call");
    let ctx = program.context(wrap, wrap_iter);
    let box_iter = program.call_iteration_in(construct, &ctx);
    assert!(box_iter.is_some());
    {
        let active = program.activate(wrap, wrap_iter);
        assert_eq!(active.call_iteration(construct), box_iter);
        let ty = active.known_type(&db, construct).expect("linked");
        assert_eq!(display_type(&db, &ast, ty), "Box<int>");
    }
    assert_eq!(program.active_iteration(wrap), None);
    let open = program.known_type(&db, construct).expect("linked");
    assert_eq!(display_type(&db, &ast, open), "Box<T>");
}

#[test]
fn test_use_after_move() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let main = b.function("main");
    let init = new_res(&mut b);
    let (declare_a, _) = b.let_("a", None, Some(init));
    let a1 = b.name("a");
    let first = take(&mut b, a1);
    let a2 = b.name("a");
    let second = take(&mut b, a2);
    let body = b.block([declare_a, first, second]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UseAfterMove]);
    assert!(
        diags[0].message.starts_with("use of moved value `a`"),
        "{}",
        diags[0].message
    );
    assert!(program.drops_at(body).is_empty());
}

#[test]
fn test_place_passed_twice_in_one_call() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let take2 = b.function("take2");
    for name in ["r", "s"] {
        let res = b.ty("Res");
        b.param(take2, name, res);
    }
    let main = b.function("main");
    let init = new_res(&mut b);
    let (declare_a, _) = b.let_("a", None, Some(init));
    b.at(Span::new(10, 11));
    let a1 = b.name("a");
    b.at(Span::new(13, 14));
    let a2 = b.name("a");
    let call = b.call("take2", [a1, a2]);
    let stmt = b.expr_stmt(call);
    let body = b.block([declare_a, stmt]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UseAfterMove]);
    assert_eq!(diags[0].span, Span::new(13, 14));
    assert_eq!(diags[0].message, "use of moved value `a` (moved at 10..11)");
}

#[test]
fn test_place_moved_into_two_fields() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let pair = b.structure("Pair", Ownership::Copy);
    for name in ["l", "r"] {
        let res = b.ty("Res");
        b.field(pair, name, res);
    }
    let main = b.function("main");
    let init = new_res(&mut b);
    let (declare_a, _) = b.let_("a", None, Some(init));
    let a1 = b.name("a");
    let a2 = b.name("a");
    let pair_ty = b.ty("Pair");
    let literal = b.construct(pair_ty, [("l", a1), ("r", a2)]);
    let (declare_p, _) = b.let_("p", None, Some(literal));
    let body = b.block([declare_a, declare_p]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UseAfterMove]);
}

#[test]
fn test_distinct_fields_in_one_call() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let take2 = b.function("take2");
    for name in ["r", "s"] {
        let res = b.ty("Res");
        b.param(take2, name, res);
    }
    let holder = b.structure("Holder", Ownership::Copy);
    for name in ["x", "y"] {
        let res = b.ty("Res");
        b.field(holder, name, res);
    }
    let main = b.function("main");
    let holder_ty = b.ty("Holder");
    let (declare_h, _) = b.let_("h", Some(holder_ty), None);
    let h = b.name("h");
    let x = b.member_of(h, "x");
    let h = b.name("h");
    let y = b.member_of(h, "y");
    let call = b.call("take2", [x, y]);
    let stmt = b.expr_stmt(call);
    let body = b.block([declare_h, stmt]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
}

#[test]
fn test_assignment_reinitializes() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let main = b.function("main");
    let init = new_res(&mut b);
    let (declare_a, _) = b.let_mut("a", None, Some(init));
    let a1 = b.name("a");
    let first = take(&mut b, a1);
    let target = b.name("a");
    let fresh = new_res(&mut b);
    let assign = b.assign(target, fresh);
    let a2 = b.name("a");
    let second = take(&mut b, a2);
    let body = b.block([declare_a, first, assign, second]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
}

#[test]
fn test_partial_moves() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let holder = b.structure("Holder", Ownership::Copy);
    for name in ["x", "y"] {
        let res = b.ty("Res");
        b.field(holder, name, res);
    }
    let main = b.function("main");
    let holder_ty = b.ty("Holder");
    let (declare_h, _) = b.let_("h", Some(holder_ty), None);
    let mut stmts = vec![declare_h];
    for field in ["x", "y", "x"] {
        let h = b.name("h");
        let place = b.member_of(h, field);
        stmts.push(take(&mut b, place));
    }
    let body = b.block(stmts);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UseAfterMove]);
    assert!(diags[0].message.contains("`h.x`"), "{}", diags[0].message);
}

/// `fn main(c: bool) { let a = Res {}; if c { take(a); } else { take(a); } take(a); }`
fn moved_in_both_arms() -> Ast {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let main = b.function("main");
    let bool_ty = b.ty("bool");
    b.param(main, "c", bool_ty);
    let init = new_res(&mut b);
    let (declare_a, _) = b.let_("a", None, Some(init));
    let a = b.name("a");
    let in_then = take(&mut b, a);
    let then_body = b.block([in_then]);
    let a = b.name("a");
    let in_else = take(&mut b, a);
    let else_body = b.block([in_else]);
    let c = b.name("c");
    let branch = b.if_(c, then_body, Some(else_body));
    let a = b.name("a");
    let after = take(&mut b, a);
    let body = b.block([declare_a, branch, after]);
    b.body(main, body);
    b.finish()
}

#[test]
fn test_branch_arms_are_isolated() {
    let ast = moved_in_both_arms();
    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
}

#[test]
fn test_intersection_policy_keeps_common_moves() {
    let ast = moved_in_both_arms();
    let db = salsa::DatabaseImpl::default();
    let options = LinkOptions {
        branch_moves: BranchMovePolicy::Intersection,
        ..LinkOptions::default()
    };
    let (_, diags) = link_with(&db, &ast, &options);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UseAfterMove]);
}

/// `fn main(c: bool) { let a = Res {}; while c { take(a); } }`
#[test]
fn test_loop_body_is_linked_once() {
    let mut b = AstBuilder::new();
    owned_resource(&mut b);
    let main = b.function("main");
    let bool_ty = b.ty("bool");
    b.param(main, "c", bool_ty);
    let init = new_res(&mut b);
    let (declare_a, _) = b.let_("a", None, Some(init));
    let a = b.name("a");
    let in_loop = take(&mut b, a);
    let loop_body = b.block([in_loop]);
    let c = b.name("c");
    let looped = b.while_(c, loop_body);
    let body = b.block([declare_a, looped]);
    b.body(main, body);
    let ast = b.finish();

    for branch_moves in [BranchMovePolicy::RestorePreBranch, BranchMovePolicy::Intersection] {
        let db = salsa::DatabaseImpl::default();
        let options = LinkOptions {
            branch_moves,
            ..LinkOptions::default()
        };
        let (_, diags) = link_with(&db, &ast, &options);
        // The second trip around the loop is not modelled.
        assert!(diags.is_empty(), "{branch_moves:?}: {diags:?}");
    }
}

#[test]
fn test_drops_in_reverse_declaration_order() {
    let mut b = AstBuilder::new();
    let (_, free) = owned_resource(&mut b);
    let main = b.function("main");
    let init = new_res(&mut b);
    let (declare_a, a) = b.let_("a", None, Some(init));
    let init = new_res(&mut b);
    let (declare_b, second) = b.let_("b", None, Some(init));
    let body = b.block([declare_a, declare_b]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(
        program.drops_at(body),
        &[
            ScheduledDrop {
                decl: second,
                destructor: free
            },
            ScheduledDrop {
                decl: a,
                destructor: free
            },
        ]
    );
}

#[test]
fn test_missing_destructor() {
    let mut b = AstBuilder::new();
    b.structure("Handle", Ownership::Owned { destructor: None });
    let main = b.function("main");
    let ty = b.ty("Handle");
    let init = b.construct(ty, []);
    let (declare_h, _) = b.let_("h", None, Some(init));
    let body = b.block([declare_h]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::MissingDestructor]);
}

#[test]
fn test_static_if_links_only_the_taken_arm() {
    let mut b = AstBuilder::new();
    let main = b.function("main");
    let yes = b.boolean(true);
    let (declare_debug, debug) = b.comptime_let("DEBUG", yes);
    let then_body = b.block([]);
    let missing = b.name("missing");
    let in_else = b.expr_stmt(missing);
    let else_body = b.block([in_else]);
    let cond = b.name("DEBUG");
    let branch = b.static_if(cond, then_body, Some(else_body));
    let body = b.block([declare_debug, branch]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(program.static_branch(branch), Some(true));
    assert_eq!(program.constant(debug), Some(&ConstValue::Bool(true)));
}

#[test]
fn test_undecidable_static_if_links_every_arm() {
    let mut b = AstBuilder::new();
    let main = b.function("main");
    let bool_ty = b.ty("bool");
    b.param(main, "c", bool_ty);
    let missing = b.name("missing");
    let in_then = b.expr_stmt(missing);
    let then_body = b.block([in_then]);
    let cond = b.name("c");
    let branch = b.static_if(cond, then_body, None);
    let body = b.block([branch]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::UnresolvedSymbol]);
    assert_eq!(program.static_branch(branch), None);
}

#[test]
fn test_switch_with_two_defaults() {
    let mut b = AstBuilder::new();
    let main = b.function("main");
    let scrutinee = b.int(1);
    let value = b.int(1);
    let case_body = b.block([]);
    let first_default = b.block([]);
    let second_default = b.block([]);
    let arms = [
        b.case_arm([value], case_body),
        b.default_arm(first_default),
        b.default_arm(second_default),
    ];
    let switch = b.switch(scrutinee, arms);
    let body = b.block([switch]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::StructuralAmbiguity]);
    assert_eq!(diags[0].message, "multiple `default` cases in switch");
}

#[test]
fn test_bound_violation() {
    let mut b = AstBuilder::new();
    b.interface("Shape");
    let circle = b.structure("Circle", Ownership::Copy);
    let shape = b.ty("Shape");
    b.implements(circle, shape);
    let area = b.function("area");
    let bound = b.ty("Shape");
    b.generic_with(area, "T", Some(bound), None);
    let t = b.ty("T");
    b.param(area, "x", t);

    let main = b.function("main");
    let one = b.int(1);
    let bad = b.call("area", [one]);
    let circle_ty = b.ty("Circle");
    let value = b.construct(circle_ty, []);
    let good = b.call("area", [value]);
    let stmts = [bad, good].map(|c| b.expr_stmt(c));
    let body = b.block(stmts);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (_, diags) = link(&db, &ast);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::TypeMismatch]);
    assert_eq!(
        diags[0].message,
        "`int` does not satisfy the bound `Shape` of `T`"
    );
}

#[test]
fn test_qualified_call_into_namespace() {
    let mut b = AstBuilder::new();
    let math = b.namespace("math");
    let max = b.function("max");
    b.generic(max, "T");
    for name in ["a", "b"] {
        let t = b.ty("T");
        b.param(max, name, t);
    }
    let t = b.ty("T");
    b.returns(max, t);
    b.nest(math, max);

    let main = b.function("main");
    let callee = b.path(&["math", "max"]);
    let one = b.int(1);
    let two = b.int(2);
    let call = b.call_expr(callee, [], [one, two]);
    let int = b.ty("int");
    let (declare_m, m) = b.let_("m", Some(int), Some(call));
    let body = b.block([declare_m]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(program.call_target(call), Some(max));
    assert_eq!(program.type_of_decl(&db, m), Some(Type::int(&db)));
    assert_eq!(program.render_iterations(&db, &ast), "max iter0 <int>\n");
}

#[test]
fn test_default_generic_argument() {
    let mut b = AstBuilder::new();
    let map = b.structure("Map", Ownership::Copy);
    b.generic(map, "K");
    let int = b.ty("int");
    b.generic_with(map, "V", None, Some(int));
    let main = b.function("main");
    let s = b.ty("str");
    let map_str = b.ty_app("Map", [s]);
    let (declare_m, _) = b.let_("m", Some(map_str), None);
    let body = b.block([declare_m]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    assert!(diags.is_empty(), "{diags:?}");
    assert_eq!(program.render_iterations(&db, &ast), "Map iter0 <str, int>\n");
}

#[test]
fn test_polymorphic_recursion_is_bounded() {
    let mut b = AstBuilder::new();
    generic_box(&mut b);
    let node = b.structure("Node", Ownership::Copy);
    b.generic(node, "T");
    let t = b.ty("T");
    let box_t = b.ty_app("Box", [t]);
    let node_box = b.ty_app("Node", [box_t]);
    let next = b.ty_ptr(node_box);
    b.field(node, "next", next);

    let main = b.function("main");
    let int = b.ty("int");
    let node_int = b.ty_app("Node", [int]);
    let (declare_n, _) = b.let_("n", Some(node_int), None);
    let body = b.block([declare_n]);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let options = LinkOptions {
        max_instantiation_depth: 4,
        ..LinkOptions::default()
    };
    let (program, diags) = link_with(&db, &ast, &options);
    assert_eq!(program.iterations(node).count(), 5);
    assert_eq!(
        kinds(&diags),
        vec![
            DiagnosticKind::InstantiationLimit,
            DiagnosticKind::InstantiationLimit
        ]
    );
}

/// ```text
/// struct Point { x: int, y: int }
/// fn f(a: int);
/// fn main() { f(1, 2); Point { x: 1 }; Point { x: 1, y: 2, z: 3 }; }
/// ```
#[test]
fn test_call_and_literal_shape_errors() {
    let mut b = AstBuilder::new();
    let point = b.structure("Point", Ownership::Copy);
    for name in ["x", "y"] {
        let int = b.ty("int");
        b.field(point, name, int);
    }
    let f = b.function("f");
    let int = b.ty("int");
    b.param(f, "a", int);

    let main = b.function("main");
    let (one, two) = (b.int(1), b.int(2));
    let call = b.call("f", [one, two]);
    let ty = b.ty("Point");
    let one = b.int(1);
    let partial = b.construct(ty, [("x", one)]);
    let ty = b.ty("Point");
    let (one, two, three) = (b.int(1), b.int(2), b.int(3));
    let extra = b.construct(ty, [("x", one), ("y", two), ("z", three)]);
    let stmts = [call, partial, extra].map(|e| b.expr_stmt(e));
    let body = b.block(stmts);
    b.body(main, body);
    let ast = b.finish();

    let db = salsa::DatabaseImpl::default();
    let (program, diags) = link(&db, &ast);
    let rendered = diags
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(rendered, @r"
    ERROR [TypeChecking] 0..0: `f` takes 1 argument but 2 were supplied
    ERROR [TypeChecking] 0..0: missing field `y` in `Point` literal
    ERROR [NameResolution] 0..0: no field `z` in struct `Point`
    ");
    assert_eq!(program.call_target(partial), Some(point));
    let ty = program.known_type(&db, extra).expect("linked");
    assert_eq!(display_type(&db, &ast, ty), "Point");
}
