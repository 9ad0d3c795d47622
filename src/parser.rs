use crate::ast::{Binding, Block, ConditionSet, InfixOp, Node, PrefixOp};
use crate::diagnostics::ParseError;
use crate::lexer;
use crate::span::Span;
use crate::token::{Keyword, Token, TokenKind};

/// Binding strength of infix positions, weakest first. The derived `Ord`
/// drives precedence climbing; every operator is left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Lowest,
    Assign,
    Logic,
    Bitwise,
    Equals,
    Compare,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn rank_of(kind: &TokenKind) -> Rank {
    match kind {
        TokenKind::Equals => Rank::Assign,
        TokenKind::AmpersandAmpersand | TokenKind::PipePipe => Rank::Logic,
        TokenKind::Ampersand | TokenKind::Pipe | TokenKind::Caret => Rank::Bitwise,
        TokenKind::EqualEqual | TokenKind::BangEqual => Rank::Equals,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
            Rank::Compare
        }
        TokenKind::Plus | TokenKind::Minus => Rank::Sum,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Rank::Product,
        TokenKind::LeftParen => Rank::Call,
        TokenKind::LeftBracket => Rank::Index,
        _ => Rank::Lowest,
    }
}

fn infix_op(kind: &TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::Plus => InfixOp::Plus,
        TokenKind::Minus => InfixOp::Minus,
        TokenKind::Star => InfixOp::Star,
        TokenKind::Slash => InfixOp::Slash,
        TokenKind::Percent => InfixOp::Percent,
        TokenKind::Ampersand => InfixOp::BitAnd,
        TokenKind::Pipe => InfixOp::BitOr,
        TokenKind::Caret => InfixOp::BitXor,
        TokenKind::AmpersandAmpersand => InfixOp::And,
        TokenKind::PipePipe => InfixOp::Or,
        TokenKind::EqualEqual => InfixOp::Eq,
        TokenKind::BangEqual => InfixOp::NotEq,
        TokenKind::Less => InfixOp::Lt,
        TokenKind::Greater => InfixOp::Gt,
        TokenKind::LessEqual => InfixOp::LtEq,
        TokenKind::GreaterEqual => InfixOp::GtEq,
        _ => return None,
    };
    Some(op)
}

/// Parse result: the recovered program plus every diagnostic collected along
/// the way. The program is only trustworthy when `errors` is empty, but it
/// is always structurally complete (failed lines become placeholders).
#[derive(Debug)]
pub struct ParseReport {
    pub program: Block,
    pub errors: Vec<ParseError>,
}

pub fn parse_program(source: &str) -> ParseReport {
    parse_tokens(lexer::lex(source))
}

pub fn parse_tokens(tokens: Vec<Token>) -> ParseReport {
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        // The lexer always terminates its stream; this covers callers that
        // hand-build token vectors.
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            tokens.push(Token::new(TokenKind::Eof, Span::new(0, 0, 1, 1)));
        }
        Self {
            tokens,
            index: 0,
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseReport {
        let mut program = Block::new(self.cur().span);
        loop {
            match self.cur().kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                    continue;
                }
                _ => {}
            }
            let line_span = self.cur().span;
            match self.parse_line() {
                Ok(node) => {
                    program.push_node(node);
                    self.advance();
                }
                Err(error) => {
                    self.errors.push(error);
                    program.push_node(Node::Placeholder { span: line_span });
                    self.synchronize();
                }
            }
        }
        ParseReport {
            program,
            errors: self.errors,
        }
    }

    /// One statement, which must run to the end of its line.
    fn parse_line(&mut self) -> Result<Node, ParseError> {
        let node = self.parse_expression(Rank::Lowest)?;
        match self.peek().kind {
            TokenKind::Newline | TokenKind::Eof | TokenKind::RightBrace => Ok(node),
            _ => Err(self.unexpected(self.peek(), "NEWLINE")),
        }
    }

    /// Skips to the next statement boundary after a failed line.
    fn synchronize(&mut self) {
        while !matches!(self.cur().kind, TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
    }

    /// Precedence climbing. On entry the current token starts the
    /// expression; on exit it is the expression's last token.
    fn parse_expression(&mut self, rank: Rank) -> Result<Node, ParseError> {
        let mut left = self.parse_prefix()?;
        while self.peek().kind != TokenKind::Newline && rank < rank_of(&self.peek().kind) {
            self.advance();
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Node, ParseError> {
        let token = self.cur().clone();
        match token.kind {
            TokenKind::Identifier(name) => Ok(Node::Identifier {
                name,
                span: token.span,
            }),
            TokenKind::OptionIdent(name) => Ok(Node::OptionName {
                name,
                span: token.span,
            }),
            TokenKind::IntegerLiteral(ref digits) => {
                let value = digits.parse::<i64>().map_err(|_| ParseError::IllegalToken {
                    message: format!("integer literal `{digits}` out of range"),
                    line: token.span.line,
                    column: token.span.column,
                    span: token.span,
                })?;
                Ok(Node::Integer {
                    value,
                    span: token.span,
                })
            }
            TokenKind::StringLiteral(value) => Ok(Node::StringLit {
                value,
                span: token.span,
            }),
            TokenKind::Keyword(Keyword::True) => Ok(Node::Boolean {
                value: true,
                span: token.span,
            }),
            TokenKind::Keyword(Keyword::False) => Ok(Node::Boolean {
                value: false,
                span: token.span,
            }),
            TokenKind::Keyword(Keyword::Let) => self.parse_let(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::If) => self.parse_if_else(),
            TokenKind::Minus => self.parse_prefix_op(PrefixOp::Minus),
            TokenKind::Bang => self.parse_prefix_op(PrefixOp::Bang),
            TokenKind::LeftParen => {
                // A `(` opens either a grouped expression or a function
                // literal's parameter list; only the token after the
                // matching `)` tells them apart.
                if self.after_matching_paren() == Some(&TokenKind::FatArrow) {
                    self.parse_function_literal()
                } else {
                    self.parse_group()
                }
            }
            TokenKind::LeftBracket => self.parse_list_literal(),
            TokenKind::LeftBrace => self.parse_map_literal(),
            TokenKind::Illegal(message) => Err(ParseError::IllegalToken {
                message,
                line: token.span.line,
                column: token.span.column,
                span: token.span,
            }),
            _ => Err(ParseError::NoPrefixParser {
                found: token.kind.literal(),
                line: token.span.line,
                column: token.span.column,
                span: token.span,
            }),
        }
    }

    fn parse_infix(&mut self, left: Node) -> Result<Node, ParseError> {
        let kind = self.cur().kind.clone();
        match kind {
            TokenKind::LeftParen => self.parse_call(left),
            TokenKind::LeftBracket => self.parse_index(left),
            TokenKind::Equals => self.parse_assign(left),
            ref kind => match infix_op(kind) {
                Some(op) => {
                    let op_rank = rank_of(kind);
                    self.advance();
                    let right = self.parse_expression(op_rank)?;
                    let span = left.span().merge(right.span());
                    Ok(Node::Infix {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    })
                }
                None => Err(self.unexpected(self.cur(), "OPERATOR")),
            },
        }
    }

    fn parse_prefix_op(&mut self, op: PrefixOp) -> Result<Node, ParseError> {
        let start = self.cur().span;
        self.advance();
        let operand = self.parse_expression(Rank::Prefix)?;
        let span = start.merge(operand.span());
        Ok(Node::Prefix {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_let(&mut self) -> Result<Node, ParseError> {
        let start = self.cur().span;
        self.advance();
        let binding = self.binding_from_cur()?;
        // An option name may be declared bare; a plain name needs a value.
        if binding.optional && self.peek().kind != TokenKind::Equals {
            let span = start.merge(binding.span);
            return Ok(Node::Let {
                binding,
                value: None,
                span,
            });
        }
        self.expect_peek(TokenKind::Equals, "ASSIGN")?;
        self.advance();
        let value = self.parse_expression(Rank::Lowest)?;
        let span = start.merge(value.span());
        Ok(Node::Let {
            binding,
            value: Some(Box::new(value)),
            span,
        })
    }

    fn parse_return(&mut self) -> Result<Node, ParseError> {
        let start = self.cur().span;
        self.advance();
        let value = self.parse_expression(Rank::Lowest)?;
        let span = start.merge(value.span());
        Ok(Node::Return {
            value: Box::new(value),
            span,
        })
    }

    fn parse_assign(&mut self, target: Node) -> Result<Node, ParseError> {
        if !matches!(
            target,
            Node::Identifier { .. } | Node::OptionName { .. } | Node::Index { .. }
        ) {
            return Err(self.unexpected(self.cur(), "IDENT or INDEX before ASSIGN"));
        }
        self.advance();
        let value = self.parse_expression(Rank::Assign)?;
        let span = target.span().merge(value.span());
        Ok(Node::Assign {
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    fn parse_group(&mut self) -> Result<Node, ParseError> {
        self.advance();
        let inner = self.parse_expression(Rank::Lowest)?;
        self.expect_peek(TokenKind::RightParen, "RPAREN")?;
        Ok(inner)
    }

    fn parse_list_literal(&mut self) -> Result<Node, ParseError> {
        let start = self.cur().span;
        let elements = self.parse_expression_list(TokenKind::RightBracket, "RBRACKET")?;
        let span = start.merge(self.cur().span);
        Ok(Node::List { elements, span })
    }

    fn parse_map_literal(&mut self) -> Result<Node, ParseError> {
        let start = self.cur().span;
        let mut pairs = Vec::new();
        while self.peek().kind != TokenKind::RightBrace {
            self.advance();
            let key = self.parse_expression(Rank::Lowest)?;
            self.expect_peek(TokenKind::Colon, "COLON")?;
            self.advance();
            let value = self.parse_expression(Rank::Lowest)?;
            pairs.push((key, value));
            if self.peek().kind != TokenKind::RightBrace {
                self.expect_peek(TokenKind::Comma, "COMMA")?;
            }
        }
        self.expect_peek(TokenKind::RightBrace, "RBRACE")?;
        let span = start.merge(self.cur().span);
        Ok(Node::Map { pairs, span })
    }

    fn parse_if_else(&mut self) -> Result<Node, ParseError> {
        let start = self.cur().span;
        let mut arms = vec![self.parse_condition_set()?];
        let mut end = self.cur().span;
        while self.peek().kind == TokenKind::Keyword(Keyword::Else) {
            self.advance();
            if self.peek().kind == TokenKind::Keyword(Keyword::If) {
                self.advance();
                arms.push(self.parse_condition_set()?);
                end = self.cur().span;
            } else {
                // Bare trailing else: an unconditioned arm closes the chain.
                self.expect_peek(TokenKind::LeftBrace, "LBRACE")?;
                let consequence = self.parse_block()?;
                end = self.cur().span;
                arms.push(ConditionSet {
                    condition: None,
                    consequence,
                });
                break;
            }
        }
        Ok(Node::IfElse {
            arms,
            span: start.merge(end),
        })
    }

    /// `(condition) { consequence }` with the `if` already current.
    fn parse_condition_set(&mut self) -> Result<ConditionSet, ParseError> {
        self.expect_peek(TokenKind::LeftParen, "LPAREN")?;
        self.advance();
        let condition = self.parse_expression(Rank::Lowest)?;
        self.expect_peek(TokenKind::RightParen, "RPAREN")?;
        self.expect_peek(TokenKind::LeftBrace, "LBRACE")?;
        let consequence = self.parse_block()?;
        Ok(ConditionSet {
            condition: Some(condition),
            consequence,
        })
    }

    fn parse_function_literal(&mut self) -> Result<Node, ParseError> {
        let start = self.cur().span;
        let mut params = Vec::new();
        if self.peek().kind == TokenKind::RightParen {
            self.advance();
        } else {
            loop {
                self.advance();
                params.push(self.binding_from_cur()?);
                if self.peek().kind != TokenKind::Comma {
                    break;
                }
                self.advance();
            }
            self.expect_peek(TokenKind::RightParen, "RPAREN")?;
        }
        self.expect_peek(TokenKind::FatArrow, "FAT_ARROW")?;
        self.expect_peek(TokenKind::LeftBrace, "LBRACE")?;
        let body = self.parse_block()?;
        let span = start.merge(self.cur().span);
        Ok(Node::Function { params, body, span })
    }

    /// `{ ... }` with the brace already current; leaves the closing brace
    /// current on exit.
    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let mut block = Block::new(self.cur().span);
        self.advance();
        loop {
            match self.cur().kind {
                TokenKind::RightBrace => break,
                TokenKind::Eof => return Err(self.unexpected(self.cur(), "RBRACE")),
                TokenKind::Newline => {
                    self.advance();
                    continue;
                }
                _ => {}
            }
            let node = self.parse_line()?;
            block.push_node(node);
            self.advance();
        }
        block.span = block.span.merge(self.cur().span);
        Ok(block)
    }

    fn parse_call(&mut self, callee: Node) -> Result<Node, ParseError> {
        let args = self.parse_expression_list(TokenKind::RightParen, "RPAREN")?;
        let span = callee.span().merge(self.cur().span);
        Ok(Node::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    fn parse_index(&mut self, target: Node) -> Result<Node, ParseError> {
        self.advance();
        let index = self.parse_expression(Rank::Lowest)?;
        self.expect_peek(TokenKind::RightBracket, "RBRACKET")?;
        let span = target.span().merge(self.cur().span);
        Ok(Node::Index {
            target: Box::new(target),
            index: Box::new(index),
            span,
        })
    }

    /// Comma-separated expressions with the opener current; leaves the
    /// closer current on exit.
    fn parse_expression_list(
        &mut self,
        end: TokenKind,
        end_name: &'static str,
    ) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        if self.peek().kind == end {
            self.advance();
            return Ok(items);
        }
        self.advance();
        items.push(self.parse_expression(Rank::Lowest)?);
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            self.advance();
            items.push(self.parse_expression(Rank::Lowest)?);
        }
        self.expect_peek(end, end_name)?;
        Ok(items)
    }

    fn binding_from_cur(&mut self) -> Result<Binding, ParseError> {
        let token = self.cur();
        match &token.kind {
            TokenKind::Identifier(name) => Ok(Binding {
                name: name.clone(),
                optional: false,
                span: token.span,
            }),
            TokenKind::OptionIdent(name) => Ok(Binding {
                name: name.clone(),
                optional: true,
                span: token.span,
            }),
            _ => Err(self.unexpected(token, "IDENT")),
        }
    }

    /// Scans past the matching `)` without consuming anything and reports
    /// the token that follows it.
    fn after_matching_paren(&self) -> Option<&TokenKind> {
        let mut depth = 1usize;
        let mut i = self.index + 1;
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.tokens.get(i + 1).map(|t| &t.kind);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            i += 1;
        }
        None
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.tokens[(self.index + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn expect_peek(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(self.peek(), expected))
        }
    }

    fn unexpected(&self, token: &Token, expected: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            found: token.kind.literal(),
            line: token.span.line,
            column: token.span.column,
            span: token.span,
        }
    }
}
