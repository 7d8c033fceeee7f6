use crate::token::Span;

/// Root of a parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub body: Vec<Stmt>,
    /// Comments removed from the token stream, in source order.
    pub comments: Vec<Comment>,
    pub span: Span,
}

/// Line (`; ...`) or block (`/* ... */`) comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub block: bool,
    pub span: Span,
}

/// Statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// An expression used as a statement.
    Expression(Expr),
    Command(CommandStatement),
    Block(BlockStatement),
    If(IfStatement),
    While(WhileStatement),
    Loop(LoopStatement),
    For(ForStatement),
    Try(TryStatement),
    Hotkey(HotkeyStatement),
    Hotstring(HotstringStatement),
    Label(LabeledStatement),
    Function(FunctionDeclaration),
}

/// Command syntax: `MsgBox, Hello %name%`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandStatement {
    pub name: Identifier,
    /// `#Include` style directive.
    pub hash: bool,
    /// Legacy literals or forced expressions; `None` for an empty slot.
    pub arguments: Vec<Option<Expr>>,
    pub span: Span,
}

/// `{ ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `if <test> <consequent> [else <alternate>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub test: Expr,
    pub consequent: Box<Stmt>,
    pub alternate: Option<Box<Stmt>>,
    pub span: Span,
}

/// `while <test> <body>`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub test: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// Loop flavour selected by the first parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    Count,
    Files,
    Parse,
    Read,
    Reg,
}

/// `loop [kind,] <params> <body> [until <test>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStatement {
    pub kind: LoopKind,
    pub arguments: Vec<Option<Expr>>,
    pub body: Box<Stmt>,
    pub until: Option<Expr>,
    pub span: Span,
}

/// `for <key>[, <value>] in <iterable> <body> [until <test>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub key: Identifier,
    pub value: Option<Identifier>,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub until: Option<Expr>,
    pub span: Span,
}

/// `try <block> [catch [e] <handler>] [finally <finalizer>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub block: Box<Stmt>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Identifier>,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// A key in a hotkey trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub name: String,
    /// Fires on release (`key up`).
    pub up: bool,
    pub span: Span,
}

/// `[modifiers][prefix &] key:: [action]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HotkeyStatement {
    /// Modifier symbols in source order, e.g. `^!`.
    pub modifiers: String,
    pub prefix: Option<Key>,
    pub key: Key,
    pub action: Option<Box<Stmt>>,
    pub span: Span,
}

/// `:options:trigger::replacement`.
#[derive(Debug, Clone, PartialEq)]
pub struct HotstringStatement {
    /// Individual options, e.g. `["*", "B0"]`.
    pub options: Vec<String>,
    pub trigger: LegacyLiteral,
    /// Replacement text, for hotstrings without the `X` option.
    pub replacement: Option<LegacyLiteral>,
    /// Statement executed by an `X` hotstring.
    pub action: Option<Box<Stmt>>,
    pub span: Span,
}

/// `Name:` subroutine label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledStatement {
    pub name: String,
    pub span: Span,
}

/// `name(params) { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub params: Vec<Option<Expr>>,
    pub body: BlockStatement,
    pub span: Span,
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(Identifier),
    Literal(Literal),
    LegacyLiteral(LegacyLiteral),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    ImplicitConcat(ImplicitConcatExpression),
    Conditional(ConditionalExpression),
    Call(CallExpression),
    Member(MemberExpression),
    Group(GroupExpression),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Variadic(VariadicExpression),
    LegacyAssignment(LegacyAssignmentExpression),
    LegacyComparison(LegacyComparisonExpression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Value of a quoted string, number, or boolean literal.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Boolean(bool),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    /// Source text, quotes included.
    pub raw: String,
    pub span: Span,
}

/// Unquoted free text, as in command parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyLiteral {
    /// Reassembled and unescaped text.
    pub value: String,
    /// Exact source slice.
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: String,
    pub argument: Box<Expr>,
    /// `false` for postfix `++`/`--`.
    pub prefix: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: String,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

/// Two operands juxtaposed without an operator, e.g. `"a" b`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitConcatExpression {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

/// `test ? consequent : alternate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub test: Box<Expr>,
    pub consequent: Box<Expr>,
    pub alternate: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Expr>,
    pub arguments: Vec<Option<Expr>>,
    pub span: Span,
}

/// `object.property` or `object[property]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    pub object: Box<Expr>,
    pub property: Box<Expr>,
    pub computed: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupExpression {
    pub expression: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression {
    pub elements: Vec<Option<Expr>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
    pub span: Span,
}

/// `key: value` inside an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: Expr,
    pub value: Expr,
    pub span: Span,
}

/// `args*` in a call or parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct VariadicExpression {
    pub argument: Box<Expr>,
    pub span: Span,
}

/// `name = text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyAssignmentExpression {
    pub left: Identifier,
    pub right: Option<LegacyLiteral>,
    pub span: Span,
}

/// `if name [not] in|contains|is text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyComparisonExpression {
    /// Lowercase operator words, e.g. `not in`.
    pub operator: String,
    pub left: Identifier,
    pub right: LegacyLiteral,
    pub span: Span,
}

impl Stmt {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Expression(e) => e.span(),
            Self::Command(s) => s.span,
            Self::Block(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::Loop(s) => s.span,
            Self::For(s) => s.span,
            Self::Try(s) => s.span,
            Self::Hotkey(s) => s.span,
            Self::Hotstring(s) => s.span,
            Self::Label(s) => s.span,
            Self::Function(s) => s.span,
        }
    }
}

impl Expr {
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Identifier(e) => e.span,
            Self::Literal(e) => e.span,
            Self::LegacyLiteral(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::ImplicitConcat(e) => e.span,
            Self::Conditional(e) => e.span,
            Self::Call(e) => e.span,
            Self::Member(e) => e.span,
            Self::Group(e) => e.span,
            Self::Array(e) => e.span,
            Self::Object(e) => e.span,
            Self::Variadic(e) => e.span,
            Self::LegacyAssignment(e) => e.span,
            Self::LegacyComparison(e) => e.span,
        }
    }
}

impl LiteralValue {
    /// String payload, if this is a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Number(_) | Self::Boolean(_) => None,
        }
    }
}
