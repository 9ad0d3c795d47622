use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    If,
    Else,
    Return,
    True,
    False,
}

impl Keyword {
    pub fn lexeme(self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::Return => "return",
            Keyword::True => "true",
            Keyword::False => "false",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Produced instead of aborting the scan; the payload is a diagnostic.
    Illegal(String),
    Eof,
    /// Statement separator, not whitespace.
    Newline,

    Identifier(String),
    /// Identifier lexed with a trailing `?`; the payload omits the `?`.
    OptionIdent(String),
    IntegerLiteral(String),
    StringLiteral(String),
    Keyword(Keyword),

    Equals,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Ampersand,
    Pipe,
    Caret,
    AmpersandAmpersand,
    PipePipe,
    EqualEqual,
    BangEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    FatArrow,

    Comma,
    Colon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
}

impl TokenKind {
    /// Uppercase kind tag used in "Expected <KIND>" parse faults.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Illegal(_) => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Identifier(_) => "IDENT",
            TokenKind::OptionIdent(_) => "OPTION",
            TokenKind::IntegerLiteral(_) => "INT",
            TokenKind::StringLiteral(_) => "STRING",
            TokenKind::Keyword(Keyword::Let) => "LET",
            TokenKind::Keyword(Keyword::If) => "IF",
            TokenKind::Keyword(Keyword::Else) => "ELSE",
            TokenKind::Keyword(Keyword::Return) => "RETURN",
            TokenKind::Keyword(Keyword::True) => "TRUE",
            TokenKind::Keyword(Keyword::False) => "FALSE",
            TokenKind::Equals => "ASSIGN",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "ASTERISK",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "MODULO",
            TokenKind::Bang => "BANG",
            TokenKind::Ampersand => "AMP",
            TokenKind::Pipe => "PIPE",
            TokenKind::Caret => "CARET",
            TokenKind::AmpersandAmpersand => "DOUBLE_AMP",
            TokenKind::PipePipe => "DOUBLE_PIPE",
            TokenKind::EqualEqual => "EQ",
            TokenKind::BangEqual => "NEQ",
            TokenKind::Less => "LT",
            TokenKind::Greater => "GT",
            TokenKind::LessEqual => "LTEQ",
            TokenKind::GreaterEqual => "GTEQ",
            TokenKind::FatArrow => "FAT_ARROW",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::LeftParen => "LPAREN",
            TokenKind::RightParen => "RPAREN",
            TokenKind::LeftBrace => "LBRACE",
            TokenKind::RightBrace => "RBRACE",
            TokenKind::LeftBracket => "LBRACKET",
            TokenKind::RightBracket => "RBRACKET",
        }
    }

    /// Source text of the token, used when quoting it in diagnostics.
    pub fn literal(&self) -> String {
        match self {
            TokenKind::Illegal(text) => text.clone(),
            TokenKind::Eof => "<eof>".to_string(),
            TokenKind::Newline => "\\n".to_string(),
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::OptionIdent(name) => format!("{name}?"),
            TokenKind::IntegerLiteral(digits) => digits.clone(),
            TokenKind::StringLiteral(value) => value.clone(),
            TokenKind::Keyword(kw) => kw.lexeme().to_string(),
            TokenKind::Equals => "=".to_string(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::Percent => "%".to_string(),
            TokenKind::Bang => "!".to_string(),
            TokenKind::Ampersand => "&".to_string(),
            TokenKind::Pipe => "|".to_string(),
            TokenKind::Caret => "^".to_string(),
            TokenKind::AmpersandAmpersand => "&&".to_string(),
            TokenKind::PipePipe => "||".to_string(),
            TokenKind::EqualEqual => "==".to_string(),
            TokenKind::BangEqual => "!=".to_string(),
            TokenKind::Less => "<".to_string(),
            TokenKind::Greater => ">".to_string(),
            TokenKind::LessEqual => "<=".to_string(),
            TokenKind::GreaterEqual => ">=".to_string(),
            TokenKind::FatArrow => "=>".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::LeftParen => "(".to_string(),
            TokenKind::RightParen => ")".to_string(),
            TokenKind::LeftBrace => "{".to_string(),
            TokenKind::RightBrace => "}".to_string(),
            TokenKind::LeftBracket => "[".to_string(),
            TokenKind::RightBracket => "]".to_string(),
        }
    }
}
