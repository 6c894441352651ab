use gojs_core::ast::{
    AssignOp, AstBuilder, Block, BranchKind, Expr, Ident, Stmt, StmtFor, StmtKind, StmtLabeled,
    StmtRange,
};
use gojs_core::error::Error;
use gojs_core::types::{BasicKind, Type};

mod support;

use support::assertions::{assert_code, assert_error_code, count_lines};
use support::lower::{call_stmt, declare_func, func, lower, lower_stmts, try_lower};

fn range(
    b: &mut AstBuilder,
    key: Option<Expr>,
    value: Option<Expr>,
    x: Expr,
    body: Vec<Stmt>,
) -> Stmt {
    b.stmt(StmtKind::Range(StmtRange {
        key,
        value,
        define: true,
        x,
        body: Block::new(body),
    }))
}

#[test]
fn strings_advance_by_decoded_width() {
    let mut b = AstBuilder::new();
    b.var("s", Type::string());
    declare_func(&mut b, "p", vec![Type::int(), Type::Basic(BasicKind::Int32)]);
    let i = b.define("i", Type::int());
    let r = b.define("r", Type::Basic(BasicKind::Int32));
    let use_i = b.ident("i");
    let use_r = b.ident("r");
    let body = call_stmt(&mut b, "p", vec![use_i, use_r]);
    let s = b.ident("s");
    let stmt = range(&mut b, Some(i), Some(r), s, vec![body]);

    let lowered = lower(b, &func(vec![stmt]));
    assert_code(
        &lowered.code,
        &[
            "_ref = s;",
            "_i = 0;",
            "for (; _i < _ref.length; _i += _rune[1]) {",
            "  _rune = Go$decodeRune(_ref, _i);",
            "  r = _rune[0];",
            "  i = _i;",
            "  p(i, r);",
            "}",
        ],
    );
    assert_eq!(lowered.locals, vec!["_ref", "_i", "_rune"]);
}

#[test]
fn maps_iterate_a_key_snapshot() {
    let mut b = AstBuilder::new();
    let map = Type::map(Type::string(), Type::int());
    b.var("m", map);
    declare_func(&mut b, "f", vec![Type::string(), Type::int()]);
    let k = b.define("k", Type::string());
    let v = b.define("v", Type::int());

    // m["c"] = 3 inside the loop writes the live map only.
    let m = b.ident("m");
    let c = b.string("c");
    let slot = b.index(m, c, Type::int());
    let three = b.int(3);
    let insert = b.assign(vec![slot], AssignOp::Assign, vec![three]);
    let use_k = b.ident("k");
    let use_v = b.ident("v");
    let visit = call_stmt(&mut b, "f", vec![use_k, use_v]);
    let m = b.ident("m");
    let stmt = range(&mut b, Some(k), Some(v), m, vec![insert, visit]);

    let code = lower_stmts(b, vec![stmt]);
    assert_code(
        &code,
        &[
            "_ref = m;",
            "_i = 0;",
            "_keys = _ref !== null ? Go$keys(_ref) : [];",
            "for (; _i < _keys.length; _i++) {",
            "  _entry = _ref[_keys[_i]];",
            "  if (_entry === undefined) { continue; }",
            "  v = _entry.v;",
            "  k = _entry.k;",
            "  _key = \"c\";",
            "  m[_key] = { k: _key, v: 3 };",
            "  f(k, v);",
            "}",
        ],
    );
    assert_eq!(code.matches("Go$keys").count(), 1);
}

#[test]
fn slice_elements_are_copied_into_the_value() {
    let mut b = AstBuilder::new();
    let point = Type::named(
        "Point",
        Type::structure(vec![("x", Type::int()), ("y", Type::int())]),
    );
    b.var("pts", Type::slice(point.clone()));
    let blank = b.blank();
    let p = b.define("p", point);
    let pts = b.ident("pts");
    let stmt = range(&mut b, Some(blank), Some(p), pts, vec![]);

    assert_code(
        &lower_stmts(b, vec![stmt]),
        &[
            "_ref = pts;",
            "_i = 0;",
            "for (; _i < _ref.length; _i++) {",
            "  p = Go$clone(_ref.array[_ref.offset + _i]);",
            "}",
        ],
    );
}

#[test]
fn arrays_use_their_constant_length() {
    let mut b = AstBuilder::new();
    let array = Type::array(Type::int(), 3);
    b.var("arr", array.clone());
    b.var("pa", Type::pointer(array));
    let i = b.define("i", Type::int());
    let arr = b.ident("arr");
    let by_value = range(&mut b, Some(i), None, arr, vec![]);
    let blank = b.blank();
    let e = b.define("e", Type::int());
    let pa = b.ident("pa");
    let by_pointer = range(&mut b, Some(blank), Some(e), pa, vec![]);

    assert_code(
        &lower_stmts(b, vec![by_value, by_pointer]),
        &[
            "_ref = arr;",
            "_i = 0;",
            "for (; _i < 3; _i++) {",
            "  i = _i;",
            "}",
            "_ref1 = pa;",
            "_i1 = 0;",
            "for (; _i1 < 3; _i1++) {",
            "  e = _ref1[_i1];",
            "}",
        ],
    );
}

#[test]
fn channels_become_a_runtime_stub() {
    let mut b = AstBuilder::new();
    b.var("ch", Type::chan(Type::int()));
    let v = b.define("v", Type::int());
    let ch = b.ident("ch");
    let stmt = range(&mut b, None, Some(v), ch, vec![]);

    assert_code(
        &lower_stmts(b, vec![stmt]),
        &[
            "_ref = ch;",
            "_i = 0;",
            "throw new Go$Panic(\"Channels not supported\");",
        ],
    );
}

#[test]
fn ranging_over_other_types_is_an_error() {
    let mut b = AstBuilder::new();
    b.var("n", Type::int());
    let n = b.ident("n");
    let stmt = range(&mut b, None, None, n, vec![]);

    let err = try_lower(b, &func(vec![stmt])).unwrap_err();
    assert!(matches!(err, Error::UnsupportedRange { ref ty, .. } if ty == "int"));
    assert_error_code(&err, "gojs::unsupported_range");
}

#[test]
fn labeled_continue_skips_inner_post_statements() {
    let mut b = AstBuilder::new();
    b.var("xs", Type::slice(Type::int()));
    b.var("j", Type::int());

    let j = b.ident("j");
    let post = b.inc(j);
    let cont = b.branch(BranchKind::Continue, Some("Outer"));
    let inner = b.stmt(StmtKind::For(StmtFor {
        init: None,
        cond: None,
        post: Some(Box::new(post)),
        body: Block::new(vec![cont]),
    }));
    let xs = b.ident("xs");
    let ranged = range(&mut b, None, None, xs, vec![inner]);
    let stmt = b.stmt(StmtKind::Labeled(StmtLabeled {
        label: Ident::new("Outer"),
        stmt: Box::new(ranged),
    }));

    let code = lower_stmts(b, vec![stmt]);
    assert_code(
        &code,
        &[
            "_ref = xs;",
            "_i = 0;",
            "Outer: for (; _i < _ref.length; _i++) {",
            "  while (true) {",
            "    continue Outer;",
            "    j = j + (1);",
            "  }",
            "}",
        ],
    );
    assert_eq!(count_lines(&code, "j = j + (1);"), 1);
}
