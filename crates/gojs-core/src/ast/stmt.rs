use crate::ast::{BinOp, Expr, ExprCall, Ident, NodeId};
use crate::span::Span;
use crate::types::Signature;

common_struct! {
    pub struct Stmt {
        pub id: NodeId,
        #[serde(default)]
        pub span: Span,
        pub kind: StmtKind,
    }
}

common_enum! {
    /// The closed set of statement kinds the engine lowers.
    pub enum StmtKind {
        Block(Block),
        If(StmtIf),
        Switch(StmtSwitch),
        TypeSwitch(StmtTypeSwitch),
        For(StmtFor),
        Range(StmtRange),
        Branch(StmtBranch),
        Return(StmtReturn),
        Defer(StmtDefer),
        Expr(Expr),
        Decl(StmtDecl),
        Labeled(StmtLabeled),
        Assign(StmtAssign),
        IncDec(StmtIncDec),
        Select(StmtSelect),
        Go(StmtGo),
        Send(StmtSend),
        Empty,
    }
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind) -> Self {
        Self {
            id,
            span: Span::null(),
            kind,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            StmtKind::Block(_) => "block",
            StmtKind::If(_) => "if",
            StmtKind::Switch(_) => "switch",
            StmtKind::TypeSwitch(_) => "type switch",
            StmtKind::For(_) => "for",
            StmtKind::Range(_) => "range",
            StmtKind::Branch(branch) => branch.kind.keyword(),
            StmtKind::Return(_) => "return",
            StmtKind::Defer(_) => "defer",
            StmtKind::Expr(_) => "expression",
            StmtKind::Decl(_) => "declaration",
            StmtKind::Labeled(_) => "labeled",
            StmtKind::Assign(_) => "assignment",
            StmtKind::IncDec(_) => "increment/decrement",
            StmtKind::Select(_) => "select",
            StmtKind::Go(_) => "go",
            StmtKind::Send(_) => "send",
            StmtKind::Empty => "empty",
        }
    }

    pub fn is_fallthrough(&self) -> bool {
        matches!(
            &self.kind,
            StmtKind::Branch(StmtBranch {
                kind: BranchKind::Fallthrough,
                ..
            })
        )
    }
}

common_struct! {
    #[derive(Default)]
    pub struct Block {
        pub stmts: Vec<Stmt>,
    }
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

common_struct! {
    pub struct StmtIf {
        pub init: Option<Box<Stmt>>,
        pub cond: Expr,
        pub body: Block,
        /// Either a block or another `if`.
        pub else_branch: Option<Box<Stmt>>,
    }
}

common_struct! {
    /// One `case`/`default` arm; an empty `list` marks `default`.
    pub struct CaseClause {
        pub id: NodeId,
        #[serde(default)]
        pub span: Span,
        pub list: Vec<Expr>,
        pub body: Vec<Stmt>,
    }
}

impl CaseClause {
    pub fn is_default(&self) -> bool {
        self.list.is_empty()
    }
}

common_struct! {
    pub struct StmtSwitch {
        pub init: Option<Box<Stmt>>,
        pub tag: Option<Expr>,
        pub clauses: Vec<CaseClause>,
    }
}

common_struct! {
    /// `switch binding := subject.(type) { ... }`
    pub struct StmtTypeSwitch {
        pub init: Option<Box<Stmt>>,
        pub binding: Option<Ident>,
        pub subject: Expr,
        pub clauses: Vec<CaseClause>,
    }
}

common_struct! {
    pub struct StmtFor {
        pub init: Option<Box<Stmt>>,
        pub cond: Option<Expr>,
        pub post: Option<Box<Stmt>>,
        pub body: Block,
    }
}

common_struct! {
    pub struct StmtRange {
        pub key: Option<Expr>,
        pub value: Option<Expr>,
        /// `:=` rather than `=`
        #[serde(default)]
        pub define: bool,
        pub x: Expr,
        pub body: Block,
    }
}

common_enum! {
    #[derive(Copy, Eq)]
    pub enum BranchKind {
        Break,
        Continue,
        Goto,
        Fallthrough,
    }
}

impl BranchKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

common_struct! {
    pub struct StmtBranch {
        pub kind: BranchKind,
        pub label: Option<Ident>,
    }
}

common_struct! {
    pub struct StmtReturn {
        pub results: Vec<Expr>,
    }
}

common_struct! {
    pub struct StmtDefer {
        pub call: ExprCall,
    }
}

common_struct! {
    pub struct ValueSpec {
        pub names: Vec<Expr>,
        pub values: Vec<Expr>,
    }
}

common_struct! {
    pub struct TypeSpec {
        pub id: NodeId,
        pub name: Ident,
    }
}

common_enum! {
    pub enum DeclSpec {
        Var(ValueSpec),
        Const(ValueSpec),
        Type(TypeSpec),
    }
}

common_struct! {
    pub struct StmtDecl {
        pub specs: Vec<DeclSpec>,
    }
}

common_struct! {
    pub struct StmtLabeled {
        pub label: Ident,
        pub stmt: Box<Stmt>,
    }
}

common_enum! {
    #[derive(Copy, Eq)]
    pub enum AssignOp {
        Assign,
        Define,
        AddAssign,
        SubAssign,
        MulAssign,
        QuoAssign,
        RemAssign,
        AndAssign,
        OrAssign,
        XorAssign,
        ShlAssign,
        ShrAssign,
        AndNotAssign,
    }
}

impl AssignOp {
    /// The binary operator behind a compound assignment.
    pub fn binary_op(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign | AssignOp::Define => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::QuoAssign => Some(BinOp::Quo),
            AssignOp::RemAssign => Some(BinOp::Rem),
            AssignOp::AndAssign => Some(BinOp::And),
            AssignOp::OrAssign => Some(BinOp::Or),
            AssignOp::XorAssign => Some(BinOp::Xor),
            AssignOp::ShlAssign => Some(BinOp::Shl),
            AssignOp::ShrAssign => Some(BinOp::Shr),
            AssignOp::AndNotAssign => Some(BinOp::AndNot),
        }
    }
}

common_struct! {
    pub struct StmtAssign {
        pub lhs: Vec<Expr>,
        pub op: AssignOp,
        pub rhs: Vec<Expr>,
    }
}

common_struct! {
    pub struct StmtIncDec {
        pub x: Expr,
        pub inc: bool,
    }
}

common_struct! {
    pub struct CommClause {
        /// `None` for `default`.
        pub comm: Option<Box<Stmt>>,
        pub body: Vec<Stmt>,
    }
}

common_struct! {
    pub struct StmtSelect {
        pub clauses: Vec<CommClause>,
    }
}

common_struct! {
    pub struct StmtGo {
        pub call: ExprCall,
    }
}

common_struct! {
    pub struct StmtSend {
        pub chan: Expr,
        pub value: Expr,
    }
}

common_struct! {
    /// A function body together with the facts the engine needs about its
    /// declaration.
    pub struct FuncBody {
        pub sig: Signature,
        pub params: Vec<Ident>,
        /// Named result bindings, when the signature declares them.
        pub results: Option<Vec<Expr>>,
        pub body: Block,
    }
}

impl FuncBody {
    pub fn new(sig: Signature, body: Block) -> Self {
        Self {
            sig,
            params: Vec::new(),
            results: None,
            body,
        }
    }

    pub fn with_params(mut self, params: Vec<Ident>) -> Self {
        self.params = params;
        self
    }

    pub fn with_named_results(mut self, results: Vec<Expr>) -> Self {
        self.results = Some(results);
        self
    }
}
