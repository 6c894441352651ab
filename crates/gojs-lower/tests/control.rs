use gojs_core::ast::{
    AssignOp, AstBuilder, BinOp, Block, BranchKind, ExprFuncLit, ExprKind, FuncBody, Ident, Stmt,
    StmtDefer, StmtFor, StmtGo, StmtIf, StmtKind, StmtLabeled, StmtReturn, StmtSelect,
    StmtSend,
};
use gojs_core::semantic::ObjectKind;
use gojs_core::types::{Signature, Type};

mod support;

use support::assertions::{assert_code, count_lines};
use support::lower::{call_stmt, declare_func, lower, lower_stmts};

/// `for i := 0; i < n; i++ { body }`
fn counted_loop(b: &mut AstBuilder, name: &str, n: i64, body: Vec<Stmt>) -> Stmt {
    let i = b.define(name, Type::int());
    let zero = b.int(0);
    let init = b.assign(vec![i], AssignOp::Define, vec![zero]);
    let i = b.ident(name);
    let limit = b.int(n);
    let cond = b.binary(BinOp::Lss, i, limit);
    let i = b.ident(name);
    let post = b.inc(i);
    b.stmt(StmtKind::For(StmtFor {
        init: Some(Box::new(init)),
        cond: Some(cond),
        post: Some(Box::new(post)),
        body: Block::new(body),
    }))
}

#[test]
fn continue_runs_the_post_statement_first() {
    let mut b = AstBuilder::new();
    declare_func(&mut b, "f", vec![Type::int()]);
    // Body statements refer to `i`, so it is declared before they are built.
    let i = b.define("i", Type::int());
    let zero = b.int(0);
    let init = b.assign(vec![i], AssignOp::Define, vec![zero]);
    let use_i = b.ident("i");
    let one = b.int(1);
    let cond = b.binary(BinOp::Eql, use_i, one);
    let cont = b.branch(BranchKind::Continue, None);
    let skip = b.stmt(StmtKind::If(StmtIf {
        init: None,
        cond,
        body: Block::new(vec![cont]),
        else_branch: None,
    }));
    let use_i = b.ident("i");
    let work = call_stmt(&mut b, "f", vec![use_i]);
    let i = b.ident("i");
    let three = b.int(3);
    let loop_cond = b.binary(BinOp::Lss, i, three);
    let i = b.ident("i");
    let post = b.inc(i);
    let stmt = b.stmt(StmtKind::For(StmtFor {
        init: Some(Box::new(init)),
        cond: Some(loop_cond),
        post: Some(Box::new(post)),
        body: Block::new(vec![skip, work]),
    }));

    let code = lower_stmts(b, vec![stmt]);
    assert_code(
        &code,
        &[
            "i = 0;",
            "while (i < 3) {",
            "  if (i === 1) {",
            "    i = i + (1);",
            "    continue;",
            "  }",
            "  f(i);",
            "  i = i + (1);",
            "}",
        ],
    );
    assert_eq!(count_lines(&code, "i = i + (1);"), 2);
}

#[test]
fn labeled_continue_runs_the_outer_post_statement() {
    let mut b = AstBuilder::new();
    let cont = b.branch(BranchKind::Continue, Some("Outer"));
    let brk = b.branch(BranchKind::Break, Some("Outer"));
    let inner = counted_loop(&mut b, "j", 2, vec![cont, brk]);
    let outer = counted_loop(&mut b, "i", 3, vec![inner]);
    let stmt = b.stmt(StmtKind::Labeled(StmtLabeled {
        label: Ident::new("Outer"),
        stmt: Box::new(outer),
    }));

    assert_code(
        &lower_stmts(b, vec![stmt]),
        &[
            "i = 0;",
            "Outer: while (i < 3) {",
            "  j = 0;",
            "  while (j < 2) {",
            "    i = i + (1);",
            "    continue Outer;",
            "    break Outer;",
            "    j = j + (1);",
            "  }",
            "  i = i + (1);",
            "}",
        ],
    );
}

fn defer(b: &mut AstBuilder, fun: gojs_core::ast::Expr, args: Vec<gojs_core::ast::Expr>) -> Stmt {
    let call = b.call_of(fun, args);
    b.stmt(StmtKind::Defer(StmtDefer { call }))
}

#[test]
fn deferred_calls_are_pushed_in_source_order() {
    let mut b = AstBuilder::new();
    declare_func(&mut b, "f", vec![]);
    declare_func(&mut b, "g", vec![Type::int()]);
    b.var("x", Type::int());
    let file = Type::named("File", Type::structure(vec![("fd", Type::int())]));
    b.var("file", Type::pointer(file));

    let f = b.ident("f");
    let first = defer(&mut b, f, vec![]);
    let g = b.ident("g");
    let x = b.ident("x");
    let second = defer(&mut b, g, vec![x]);
    let recover = b.ident("recover");
    let third = defer(&mut b, recover, vec![]);
    let recv = b.ident("file");
    let close = b.selector(recv, "Close", Type::signature(vec![], vec![]));
    let fourth = defer(&mut b, close, vec![]);
    let fmt = b.package("fmt");
    let println = b.selector(fmt, "Println", Type::signature(vec![Type::string()], vec![]));
    let hello = b.string("x");
    let fifth = defer(&mut b, println, vec![hello]);
    let panic = b.ident("panic");
    let boom = b.string("boom");
    let sixth = defer(&mut b, panic, vec![boom]);

    let body = lower(
        b,
        &support::lower::func(vec![first, second, third, fourth, fifth, sixth]),
    );
    assert_code(
        &body.code,
        &[
            "Go$deferred.push({ fun: f, args: [] });",
            "Go$deferred.push({ fun: g, args: [x] });",
            "Go$deferred.push({ fun: Go$recover, args: [] });",
            "Go$deferred.push({ recv: file, method: \"Close\", args: [] });",
            "Go$deferred.push({ fun: fmt.Println, args: [\"x\"] });",
            "Go$deferred.push({ fun: function(_arg) { throw new Go$Panic(new Go$String(_arg)); }, args: [\"boom\"] });",
        ],
    );
    assert_eq!(body.locals, vec!["_arg"]);
}

fn returning(results: Vec<Type>, stmts: Vec<Stmt>) -> FuncBody {
    FuncBody::new(Signature::new(vec![], results), Block::new(stmts))
}

fn ret(b: &mut AstBuilder, results: Vec<gojs_core::ast::Expr>) -> Stmt {
    b.stmt(StmtKind::Return(StmtReturn { results }))
}

#[test]
fn returns_convert_each_value() {
    let mut b = AstBuilder::new();
    b.var("x", Type::int());
    let bare = ret(&mut b, vec![]);
    assert_code(&lower(b, &returning(vec![], vec![bare])).code, &["return;"]);

    let mut b = AstBuilder::new();
    b.var("x", Type::int());
    let x = b.ident("x");
    let boxed = ret(&mut b, vec![x]);
    assert_code(
        &lower(b, &returning(vec![Type::empty_interface()], vec![boxed])).code,
        &["return new Go$Int(x);"],
    );

    let mut b = AstBuilder::new();
    let one = b.int(1);
    let a = b.string("a");
    let pair = ret(&mut b, vec![one, a]);
    assert_code(
        &lower(b, &returning(vec![Type::int(), Type::string()], vec![pair])).code,
        &["return [1, \"a\"];"],
    );
}

#[test]
fn multi_value_calls_pass_through() {
    let mut b = AstBuilder::new();
    let results = vec![Type::int(), Type::int()];
    b.declare(
        "divmod",
        ObjectKind::Func,
        Type::signature(vec![], results.clone()),
    );
    let fun = b.ident("divmod");
    let call = b.call(fun, vec![], Type::Tuple(results.clone()));
    let stmt = ret(&mut b, vec![call]);

    assert_code(
        &lower(b, &returning(results, vec![stmt])).code,
        &["return divmod();"],
    );
}

#[test]
fn named_results_are_assigned_then_returned() {
    let mut b = AstBuilder::new();
    let q = b.define("q", Type::int());
    let r = b.define("r", Type::int());
    let one = b.int(1);
    let two = b.int(2);
    let explicit = ret(&mut b, vec![one, two]);
    let bare = ret(&mut b, vec![]);
    let func = returning(vec![Type::int(), Type::int()], vec![explicit, bare])
        .with_named_results(vec![q, r]);

    assert_code(
        &lower(b, &func).code,
        &[
            "Go$tuple = [1, 2];",
            "q = Go$tuple[0];",
            "r = Go$tuple[1];",
            "return [q, r];",
            "return [q, r];",
        ],
    );
}

#[test]
fn unsupported_statements_become_runtime_stubs() {
    let mut b = AstBuilder::new();
    declare_func(&mut b, "worker", vec![]);
    b.var("ch", Type::chan(Type::int()));
    let goto = b.branch(BranchKind::Goto, Some("L"));
    let select = b.stmt(StmtKind::Select(StmtSelect { clauses: vec![] }));
    let worker = b.ident("worker");
    let call = b.call_of(worker, vec![]);
    let spawn = b.stmt(StmtKind::Go(StmtGo { call }));
    let ch = b.ident("ch");
    let one = b.int(1);
    let send = b.stmt(StmtKind::Send(StmtSend { chan: ch, value: one }));

    assert_code(
        &lower_stmts(b, vec![goto, select, spawn, send]),
        &[
            "throw new Go$Panic(\"Statement not supported: goto\");",
            "throw new Go$Panic(\"Statement not supported: select\");",
            "throw new Go$Panic(\"Statement not supported: go\");",
            "throw new Go$Panic(\"Statement not supported: send\");",
        ],
    );
}

#[test]
fn function_literals_hoist_their_own_locals() {
    let mut b = AstBuilder::new();
    b.var("xs", Type::slice(Type::int()));
    let a = b.define("a", Type::int());
    let xs = b.ident("xs");
    let inner_range = b.stmt(StmtKind::Range(gojs_core::ast::StmtRange {
        key: None,
        value: Some(a),
        define: true,
        x: xs,
        body: Block::new(vec![]),
    }));
    let lit = b.expr(
        ExprKind::FuncLit(ExprFuncLit {
            func: Box::new(FuncBody::new(
                Signature::new(vec![], vec![]),
                Block::new(vec![inner_range]),
            )),
        }),
        Some(Type::signature(vec![], vec![])),
    );
    let call = b.call(lit, vec![], Type::Tuple(vec![]));
    let stmt = b.expr_stmt(call);

    let body = lower(b, &support::lower::func(vec![stmt]));
    assert_code(
        &body.code,
        &[
            "(function() {",
            "  var _ref, _i;",
            "  _ref = xs;",
            "  _i = 0;",
            "  for (; _i < _ref.length; _i++) {",
            "    a = _ref.array[_ref.offset + _i];",
            "  }",
            "})();",
        ],
    );
    assert!(body.locals.is_empty());
}
