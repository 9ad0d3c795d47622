use crate::span::Span;
use crate::token::{Keyword, Token, TokenKind};

/// Scans the whole source up front. The scan never aborts: unterminated
/// strings and unexpected characters become `TokenKind::Illegal` tokens so
/// the parser can report them in order.
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).lex()
}

struct Lexer<'a> {
    source: &'a str,
    index: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn lex(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_blanks();
            let ch = match self.peek_char() {
                Some(ch) => ch,
                None => break,
            };
            let token = if is_ident_start(ch) {
                self.lex_identifier()
            } else if ch.is_ascii_digit() {
                self.lex_number()
            } else {
                match ch {
                    '"' => self.lex_string(),
                    '\n' => self.simple_token(TokenKind::Newline),
                    '{' => self.simple_token(TokenKind::LeftBrace),
                    '}' => self.simple_token(TokenKind::RightBrace),
                    '(' => self.simple_token(TokenKind::LeftParen),
                    ')' => self.simple_token(TokenKind::RightParen),
                    '[' => self.simple_token(TokenKind::LeftBracket),
                    ']' => self.simple_token(TokenKind::RightBracket),
                    ',' => self.simple_token(TokenKind::Comma),
                    ':' => self.simple_token(TokenKind::Colon),
                    '+' => self.simple_token(TokenKind::Plus),
                    '-' => self.simple_token(TokenKind::Minus),
                    '*' => self.simple_token(TokenKind::Star),
                    '/' => self.simple_token(TokenKind::Slash),
                    '%' => self.simple_token(TokenKind::Percent),
                    '^' => self.simple_token(TokenKind::Caret),
                    '=' => match self.peek_second_char() {
                        Some('=') => self.multi_char_token(2, TokenKind::EqualEqual),
                        Some('>') => self.multi_char_token(2, TokenKind::FatArrow),
                        _ => self.simple_token(TokenKind::Equals),
                    },
                    '!' => {
                        if self.peek_second_char() == Some('=') {
                            self.multi_char_token(2, TokenKind::BangEqual)
                        } else {
                            self.simple_token(TokenKind::Bang)
                        }
                    }
                    '&' => {
                        if self.peek_second_char() == Some('&') {
                            self.multi_char_token(2, TokenKind::AmpersandAmpersand)
                        } else {
                            self.simple_token(TokenKind::Ampersand)
                        }
                    }
                    '|' => {
                        if self.peek_second_char() == Some('|') {
                            self.multi_char_token(2, TokenKind::PipePipe)
                        } else {
                            self.simple_token(TokenKind::Pipe)
                        }
                    }
                    '<' => {
                        if self.peek_second_char() == Some('=') {
                            self.multi_char_token(2, TokenKind::LessEqual)
                        } else {
                            self.simple_token(TokenKind::Less)
                        }
                    }
                    '>' => {
                        if self.peek_second_char() == Some('=') {
                            self.multi_char_token(2, TokenKind::GreaterEqual)
                        } else {
                            self.simple_token(TokenKind::Greater)
                        }
                    }
                    other => self.simple_token(TokenKind::Illegal(format!(
                        "unexpected character `{other}`"
                    ))),
                }
            };
            tokens.push(token);
        }
        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.index, self.index, self.line, self.column),
        ));
        tokens
    }

    fn lex_identifier(&mut self) -> Token {
        let start_index = self.index;
        let start_line = self.line;
        let start_col = self.column;
        let mut ident = String::new();
        while let Some(ch) = self.peek_char() {
            if is_ident_char(ch) {
                ident.push(ch);
                self.advance_char();
            } else {
                break;
            }
        }
        // A trailing `?` welds onto the identifier, making it an option name.
        if self.peek_char() == Some('?') {
            self.advance_char();
            let span = Span::new(start_index, self.index, start_line, start_col);
            return Token::new(TokenKind::OptionIdent(ident), span);
        }
        let span = Span::new(start_index, self.index, start_line, start_col);
        let kind = keyword(&ident)
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Identifier(ident));
        Token::new(kind, span)
    }

    fn lex_number(&mut self) -> Token {
        let start_index = self.index;
        let start_line = self.line;
        let start_col = self.column;
        let mut literal = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                literal.push(ch);
                self.advance_char();
            } else {
                break;
            }
        }
        let span = Span::new(start_index, self.index, start_line, start_col);
        Token::new(TokenKind::IntegerLiteral(literal), span)
    }

    fn lex_string(&mut self) -> Token {
        let start_index = self.index;
        let start_line = self.line;
        let start_col = self.column;
        self.advance_char(); // opening "
        let mut value = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance_char();
                    let span = Span::new(start_index, self.index, start_line, start_col);
                    return Token::new(TokenKind::StringLiteral(value), span);
                }
                Some('\\') => {
                    self.advance_char();
                    match self.advance_char() {
                        Some(esc) => {
                            let ch = match esc {
                                'n' => '\n',
                                'r' => '\r',
                                't' => '\t',
                                '\\' => '\\',
                                '"' => '"',
                                other => other,
                            };
                            value.push(ch);
                        }
                        None => break,
                    }
                }
                // Strings may not span lines; the newline stays in the
                // stream so it still separates statements.
                Some('\n') | None => break,
                Some(ch) => {
                    self.advance_char();
                    value.push(ch);
                }
            }
        }
        let span = Span::new(start_index, self.index, start_line, start_col);
        Token::new(
            TokenKind::Illegal("unterminated string literal".to_string()),
            span,
        )
    }

    /// Spaces, tabs and carriage returns only. Newlines are tokens.
    fn skip_blanks(&mut self) {
        while matches!(self.peek_char(), Some(' ' | '\t' | '\r')) {
            self.advance_char();
        }
    }

    fn simple_token(&mut self, kind: TokenKind) -> Token {
        let start_index = self.index;
        let start_line = self.line;
        let start_col = self.column;
        self.advance_char();
        let span = Span::new(start_index, self.index, start_line, start_col);
        Token::new(kind, span)
    }

    fn multi_char_token(&mut self, len: usize, kind: TokenKind) -> Token {
        let start_index = self.index;
        let start_line = self.line;
        let start_col = self.column;
        for _ in 0..len {
            self.advance_char();
        }
        let span = Span::new(start_index, self.index, start_line, start_col);
        Token::new(kind, span)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.index..].chars().next()
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut iter = self.source[self.index..].chars();
        iter.next()?;
        iter.next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.index += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

fn is_ident_char(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn keyword(ident: &str) -> Option<Keyword> {
    match ident {
        "let" => Some(Keyword::Let),
        "if" => Some(Keyword::If),
        "else" => Some(Keyword::Else),
        "return" => Some(Keyword::Return),
        "true" => Some(Keyword::True),
        "false" => Some(Keyword::False),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<&'static str> {
        lex(source).iter().map(|t| t.kind.name()).collect()
    }

    #[test]
    fn scans_a_function_binding() {
        assert_eq!(
            kinds("let add = (a, b) => { a + b }"),
            [
                "LET", "IDENT", "ASSIGN", "LPAREN", "IDENT", "COMMA", "IDENT", "RPAREN",
                "FAT_ARROW", "LBRACE", "IDENT", "PLUS", "IDENT", "RBRACE", "EOF"
            ]
        );
    }

    #[test]
    fn two_char_operators_win_over_their_prefixes() {
        assert_eq!(
            kinds("== = => != ! && & || | <= < >= >"),
            [
                "EQ", "ASSIGN", "FAT_ARROW", "NEQ", "BANG", "DOUBLE_AMP", "AMP", "DOUBLE_PIPE",
                "PIPE", "LTEQ", "LT", "GTEQ", "GT", "EOF"
            ]
        );
    }

    #[test]
    fn option_identifiers_keep_their_base_name() {
        let tokens = lex("x? y");
        assert_eq!(tokens[0].kind, TokenKind::OptionIdent("x".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::Identifier("y".to_string()));
    }

    #[test]
    fn newlines_are_tokens_and_positions_advance() {
        let tokens = lex("a\n bb");
        assert_eq!(tokens[0].kind, TokenKind::Identifier("a".to_string()));
        assert_eq!((tokens[0].span.line, tokens[0].span.column), (1, 1));
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::Identifier("bb".to_string()));
        assert_eq!((tokens[2].span.line, tokens[2].span.column), (2, 2));
        assert_eq!((tokens[2].span.start, tokens[2].span.end), (3, 5));
    }

    #[test]
    fn string_escapes() {
        let tokens = lex("\"a\\tb\\\"c\"");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral("a\tb\"c".to_string()));
    }

    #[test]
    fn unterminated_strings_become_illegal_tokens() {
        let tokens = lex("\"open\nnext");
        assert!(matches!(tokens[0].kind, TokenKind::Illegal(_)));
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::Identifier("next".to_string()));
    }
}
