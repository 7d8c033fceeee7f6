//! Read-only traversal over the AST.
//!
//! [`NodeRef`] gives every node a uniform handle so rules can be keyed on a
//! [`NodeType`] and [`walk`] can visit a tree without matching on each
//! statement and expression kind.

use crate::ast::{
    BlockStatement, CatchClause, Expr, Identifier, Key, LegacyLiteral, Property, Script, Stmt,
};
use crate::token::Span;

/// Kind of an AST node, as seen by the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Script,
    CommandStatement,
    BlockStatement,
    IfStatement,
    WhileStatement,
    LoopStatement,
    ForStatement,
    TryStatement,
    CatchClause,
    HotkeyStatement,
    Key,
    HotstringStatement,
    LabeledStatement,
    FunctionDeclaration,
    Identifier,
    Literal,
    LegacyLiteral,
    UnaryExpression,
    BinaryExpression,
    ImplicitConcatExpression,
    ConditionalExpression,
    CallExpression,
    MemberExpression,
    GroupExpression,
    ArrayExpression,
    ObjectExpression,
    Property,
    VariadicExpression,
    LegacyAssignmentExpression,
    LegacyComparisonExpression,
}

/// Borrowed handle to any AST node.
///
/// Build statement and expression handles with [`NodeRef::stmt`] and
/// [`NodeRef::expr`]: expression statements, blocks, identifiers and legacy
/// literals always surface as their dedicated variants.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Script(&'a Script),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
    Block(&'a BlockStatement),
    CatchClause(&'a CatchClause),
    Key(&'a Key),
    Property(&'a Property),
    Identifier(&'a Identifier),
    LegacyLiteral(&'a LegacyLiteral),
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub const fn stmt(stmt: &'a Stmt) -> Self {
        match stmt {
            Stmt::Expression(expr) => Self::expr(expr),
            Stmt::Block(block) => Self::Block(block),
            _ => Self::Stmt(stmt),
        }
    }

    #[must_use]
    pub const fn expr(expr: &'a Expr) -> Self {
        match expr {
            Expr::Identifier(id) => Self::Identifier(id),
            Expr::LegacyLiteral(literal) => Self::LegacyLiteral(literal),
            _ => Self::Expr(expr),
        }
    }

    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match *self {
            Self::Script(_) => NodeType::Script,
            Self::Stmt(stmt) => match stmt {
                Stmt::Expression(expr) => Self::expr(expr).node_type(),
                Stmt::Command(_) => NodeType::CommandStatement,
                Stmt::Block(_) => NodeType::BlockStatement,
                Stmt::If(_) => NodeType::IfStatement,
                Stmt::While(_) => NodeType::WhileStatement,
                Stmt::Loop(_) => NodeType::LoopStatement,
                Stmt::For(_) => NodeType::ForStatement,
                Stmt::Try(_) => NodeType::TryStatement,
                Stmt::Hotkey(_) => NodeType::HotkeyStatement,
                Stmt::Hotstring(_) => NodeType::HotstringStatement,
                Stmt::Label(_) => NodeType::LabeledStatement,
                Stmt::Function(_) => NodeType::FunctionDeclaration,
            },
            Self::Expr(expr) => match expr {
                Expr::Identifier(_) => NodeType::Identifier,
                Expr::Literal(_) => NodeType::Literal,
                Expr::LegacyLiteral(_) => NodeType::LegacyLiteral,
                Expr::Unary(_) => NodeType::UnaryExpression,
                Expr::Binary(_) => NodeType::BinaryExpression,
                Expr::ImplicitConcat(_) => NodeType::ImplicitConcatExpression,
                Expr::Conditional(_) => NodeType::ConditionalExpression,
                Expr::Call(_) => NodeType::CallExpression,
                Expr::Member(_) => NodeType::MemberExpression,
                Expr::Group(_) => NodeType::GroupExpression,
                Expr::Array(_) => NodeType::ArrayExpression,
                Expr::Object(_) => NodeType::ObjectExpression,
                Expr::Variadic(_) => NodeType::VariadicExpression,
                Expr::LegacyAssignment(_) => NodeType::LegacyAssignmentExpression,
                Expr::LegacyComparison(_) => NodeType::LegacyComparisonExpression,
            },
            Self::Block(_) => NodeType::BlockStatement,
            Self::CatchClause(_) => NodeType::CatchClause,
            Self::Key(_) => NodeType::Key,
            Self::Property(_) => NodeType::Property,
            Self::Identifier(_) => NodeType::Identifier,
            Self::LegacyLiteral(_) => NodeType::LegacyLiteral,
        }
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        match *self {
            Self::Script(script) => script.span,
            Self::Stmt(stmt) => stmt.span(),
            Self::Expr(expr) => expr.span(),
            Self::Block(block) => block.span,
            Self::CatchClause(clause) => clause.span,
            Self::Key(key) => key.span,
            Self::Property(property) => property.span,
            Self::Identifier(id) => id.span,
            Self::LegacyLiteral(literal) => literal.span,
        }
    }

    /// Direct children in source order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        let mut out = Vec::new();
        match *self {
            Self::Script(script) => out.extend(script.body.iter().map(Self::stmt)),
            Self::Block(block) => out.extend(block.body.iter().map(Self::stmt)),
            Self::Stmt(stmt) => stmt_children(stmt, &mut out),
            Self::Expr(expr) => expr_children(expr, &mut out),
            Self::CatchClause(clause) => {
                out.extend(clause.param.as_ref().map(Self::Identifier));
                out.push(Self::stmt(&clause.body));
            }
            Self::Property(property) => {
                out.push(Self::expr(&property.key));
                out.push(Self::expr(&property.value));
            }
            Self::Key(_) | Self::Identifier(_) | Self::LegacyLiteral(_) => {}
        }
        out
    }
}

fn optional<'a>(items: &'a [Option<Expr>]) -> impl Iterator<Item = NodeRef<'a>> {
    items.iter().flatten().map(NodeRef::expr)
}

fn stmt_children<'a>(stmt: &'a Stmt, out: &mut Vec<NodeRef<'a>>) {
    match stmt {
        Stmt::Expression(expr) => out.push(NodeRef::expr(expr)),
        Stmt::Block(block) => out.extend(block.body.iter().map(NodeRef::stmt)),
        Stmt::Command(cmd) => {
            out.push(NodeRef::Identifier(&cmd.name));
            out.extend(optional(&cmd.arguments));
        }
        Stmt::If(stmt) => {
            out.push(NodeRef::expr(&stmt.test));
            out.push(NodeRef::stmt(&stmt.consequent));
            out.extend(stmt.alternate.as_deref().map(NodeRef::stmt));
        }
        Stmt::While(stmt) => {
            out.push(NodeRef::expr(&stmt.test));
            out.push(NodeRef::stmt(&stmt.body));
        }
        Stmt::Loop(stmt) => {
            out.extend(optional(&stmt.arguments));
            out.push(NodeRef::stmt(&stmt.body));
            out.extend(stmt.until.as_ref().map(NodeRef::expr));
        }
        Stmt::For(stmt) => {
            out.push(NodeRef::Identifier(&stmt.key));
            out.extend(stmt.value.as_ref().map(NodeRef::Identifier));
            out.push(NodeRef::expr(&stmt.iterable));
            out.push(NodeRef::stmt(&stmt.body));
            out.extend(stmt.until.as_ref().map(NodeRef::expr));
        }
        Stmt::Try(stmt) => {
            out.push(NodeRef::stmt(&stmt.block));
            out.extend(stmt.handler.as_ref().map(NodeRef::CatchClause));
            out.extend(stmt.finalizer.as_deref().map(NodeRef::stmt));
        }
        Stmt::Hotkey(stmt) => {
            out.extend(stmt.prefix.as_ref().map(NodeRef::Key));
            out.push(NodeRef::Key(&stmt.key));
            out.extend(stmt.action.as_deref().map(NodeRef::stmt));
        }
        Stmt::Hotstring(stmt) => {
            out.push(NodeRef::LegacyLiteral(&stmt.trigger));
            out.extend(stmt.replacement.as_ref().map(NodeRef::LegacyLiteral));
            out.extend(stmt.action.as_deref().map(NodeRef::stmt));
        }
        Stmt::Label(_) => {}
        Stmt::Function(func) => {
            out.push(NodeRef::Identifier(&func.name));
            out.extend(optional(&func.params));
            out.push(NodeRef::Block(&func.body));
        }
    }
}

fn expr_children<'a>(expr: &'a Expr, out: &mut Vec<NodeRef<'a>>) {
    match expr {
        Expr::Identifier(_) | Expr::Literal(_) | Expr::LegacyLiteral(_) => {}
        Expr::Unary(e) => out.push(NodeRef::expr(&e.argument)),
        Expr::Binary(e) => {
            out.push(NodeRef::expr(&e.left));
            out.push(NodeRef::expr(&e.right));
        }
        Expr::ImplicitConcat(e) => {
            out.push(NodeRef::expr(&e.left));
            out.push(NodeRef::expr(&e.right));
        }
        Expr::Conditional(e) => {
            out.push(NodeRef::expr(&e.test));
            out.push(NodeRef::expr(&e.consequent));
            out.push(NodeRef::expr(&e.alternate));
        }
        Expr::Call(e) => {
            out.push(NodeRef::expr(&e.callee));
            out.extend(optional(&e.arguments));
        }
        Expr::Member(e) => {
            out.push(NodeRef::expr(&e.object));
            out.push(NodeRef::expr(&e.property));
        }
        Expr::Group(e) => out.push(NodeRef::expr(&e.expression)),
        Expr::Array(e) => out.extend(optional(&e.elements)),
        Expr::Object(e) => out.extend(e.properties.iter().map(NodeRef::Property)),
        Expr::Variadic(e) => out.push(NodeRef::expr(&e.argument)),
        Expr::LegacyAssignment(e) => {
            out.push(NodeRef::Identifier(&e.left));
            out.extend(e.right.as_ref().map(NodeRef::LegacyLiteral));
        }
        Expr::LegacyComparison(e) => {
            out.push(NodeRef::Identifier(&e.left));
            out.push(NodeRef::LegacyLiteral(&e.right));
        }
    }
}

/// Visit `root` and every node below it, parents before children.
pub fn walk<'a>(root: NodeRef<'a>, visit: &mut impl FnMut(NodeRef<'a>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(node);
        stack.extend(node.children().into_iter().rev());
    }
}
