use crate::span::Span;
use std::fmt;

/// Every node is an expression; evaluation always yields a value. The
/// canonical text produced by `Display` is for diagnostics and tests only,
/// never for execution.
#[derive(Debug, Clone)]
pub enum Node {
    Block(Block),
    Identifier {
        name: String,
        span: Span,
    },
    /// An option name outside a let position, e.g. the `x?` in `let x?`.
    OptionName {
        name: String,
        span: Span,
    },
    Let {
        binding: Binding,
        /// Absent only for an option name bound without an initializer.
        value: Option<Box<Node>>,
        span: Span,
    },
    Assign {
        /// Identifier or Index; the parser accepts nothing else.
        target: Box<Node>,
        value: Box<Node>,
        span: Span,
    },
    Return {
        value: Box<Node>,
        span: Span,
    },
    Integer {
        value: i64,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    StringLit {
        value: String,
        span: Span,
    },
    List {
        elements: Vec<Node>,
        span: Span,
    },
    Map {
        pairs: Vec<(Node, Node)>,
        span: Span,
    },
    Prefix {
        op: PrefixOp,
        operand: Box<Node>,
        span: Span,
    },
    Infix {
        op: InfixOp,
        left: Box<Node>,
        right: Box<Node>,
        span: Span,
    },
    /// Ordered condition sets; the parser guarantees at least one.
    IfElse {
        arms: Vec<ConditionSet>,
        span: Span,
    },
    Function {
        params: Vec<Binding>,
        body: Block,
        span: Span,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
        span: Span,
    },
    Index {
        target: Box<Node>,
        index: Box<Node>,
        span: Span,
    },
    /// Placeholder emitted when no expression could be parsed; carries no
    /// behavior and evaluates to the absent option.
    Placeholder {
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub struct Block {
    pub nodes: Vec<Node>,
    pub span: Span,
}

impl Block {
    pub fn new(span: Span) -> Self {
        Self {
            nodes: Vec::new(),
            span,
        }
    }

    pub fn push_node(&mut self, node: Node) {
        self.span = self.span.merge(node.span());
        self.nodes.push(node);
    }
}

/// A let-bound or parameter name; `optional` marks a trailing-`?` name.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub optional: bool,
    pub span: Span,
}

/// One `if (cond) { ... }` arm. A bare trailing `else` has no condition and
/// always matches.
#[derive(Debug, Clone)]
pub struct ConditionSet {
    pub condition: Option<Node>,
    pub consequence: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Minus,
    Bang,
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Minus => "-",
            PrefixOp::Bang => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl InfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Plus => "+",
            InfixOp::Minus => "-",
            InfixOp::Star => "*",
            InfixOp::Slash => "/",
            InfixOp::Percent => "%",
            InfixOp::BitAnd => "&",
            InfixOp::BitOr => "|",
            InfixOp::BitXor => "^",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::LtEq => "<=",
            InfixOp::GtEq => ">=",
        }
    }
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Block(block) => block.span,
            Node::Identifier { span, .. }
            | Node::OptionName { span, .. }
            | Node::Let { span, .. }
            | Node::Assign { span, .. }
            | Node::Return { span, .. }
            | Node::Integer { span, .. }
            | Node::Boolean { span, .. }
            | Node::StringLit { span, .. }
            | Node::List { span, .. }
            | Node::Map { span, .. }
            | Node::Prefix { span, .. }
            | Node::Infix { span, .. }
            | Node::IfElse { span, .. }
            | Node::Function { span, .. }
            | Node::Call { span, .. }
            | Node::Index { span, .. }
            | Node::Placeholder { span } => *span,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for node in &self.nodes {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{node}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "{}?", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Block(block) => write!(f, "{block}"),
            Node::Identifier { name, .. } => write!(f, "{name}"),
            Node::OptionName { name, .. } => write!(f, "{name}?"),
            Node::Let { binding, value, .. } => match value {
                Some(value) => write!(f, "let {binding} = {value}"),
                None => write!(f, "let {binding}"),
            },
            Node::Assign { target, value, .. } => write!(f, "({target} = {value})"),
            Node::Return { value, .. } => write!(f, "return {value}"),
            Node::Integer { value, .. } => write!(f, "{value}"),
            Node::Boolean { value, .. } => write!(f, "{value}"),
            Node::StringLit { value, .. } => write!(f, "{value:?}"),
            Node::List { elements, .. } => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Node::Map { pairs, .. } => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Node::Prefix { op, operand, .. } => write!(f, "({}{operand})", op.symbol()),
            Node::Infix {
                op, left, right, ..
            } => write!(f, "({left} {} {right})", op.symbol()),
            Node::IfElse { arms, .. } => {
                debug_assert!(!arms.is_empty(), "if-else chain with no condition sets");
                for (i, arm) in arms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " else ")?;
                    }
                    if let Some(condition) = &arm.condition {
                        write!(f, "if {condition} ")?;
                    }
                    write!(f, "{{ {} }}", arm.consequence)?;
                }
                Ok(())
            }
            Node::Function { params, body, .. } => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") => {{ {body} }}")
            }
            Node::Call { callee, args, .. } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Node::Index { target, index, .. } => write!(f, "({target}[{index}])"),
            Node::Placeholder { .. } => write!(f, "<error>"),
        }
    }
}
