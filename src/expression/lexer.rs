//! Tokenizer for query expressions.

use super::ast::{ArithmeticOp, MetadataField};
use super::error::{SyntaxError, SyntaxErrorKind};

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `.` on its own (identity, or the start of `.[`)
    Dot,
    /// `..`
    DotDot,
    /// `.name` or `."quoted name"`
    Field(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Pipe,
    Comma,
    Colon,
    Semicolon,
    Question,
    /// `=`
    Assign,
    /// `|=`
    UpdateAssign,
    /// `+=`, `-=`, `*=`, `/=`, `%=`
    ArithmeticAssign(ArithmeticOp),
    /// `style=`, `tag=`, `anchor=`, `line_comment=`, `head_comment=`
    MetadataAssign(MetadataField),
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `//`
    Alternative,
    And,
    Or,
    True,
    False,
    Null,
    Ident(String),
    Str(String),
    Integer(i64),
    Float(f64),
    Eof,
}

impl TokenKind {
    /// How the token reads in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Dot => ".".to_string(),
            TokenKind::DotDot => "..".to_string(),
            TokenKind::Field(name) => format!(".{}", name),
            TokenKind::LBracket => "[".to_string(),
            TokenKind::RBracket => "]".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::LBrace => "{".to_string(),
            TokenKind::RBrace => "}".to_string(),
            TokenKind::Pipe => "|".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::Semicolon => ";".to_string(),
            TokenKind::Question => "?".to_string(),
            TokenKind::Assign => "=".to_string(),
            TokenKind::UpdateAssign => "|=".to_string(),
            TokenKind::ArithmeticAssign(op) => format!("{}=", op.symbol()),
            TokenKind::MetadataAssign(field) => format!("{}=", field.name()),
            TokenKind::Eq => "==".to_string(),
            TokenKind::Ne => "!=".to_string(),
            TokenKind::Lt => "<".to_string(),
            TokenKind::Le => "<=".to_string(),
            TokenKind::Gt => ">".to_string(),
            TokenKind::Ge => ">=".to_string(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::Percent => "%".to_string(),
            TokenKind::Alternative => "//".to_string(),
            TokenKind::And => "and".to_string(),
            TokenKind::Or => "or".to_string(),
            TokenKind::True => "true".to_string(),
            TokenKind::False => "false".to_string(),
            TokenKind::Null => "null".to_string(),
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Str(s) => format!("{:?}", s),
            TokenKind::Integer(n) => n.to_string(),
            TokenKind::Float(f) => f.to_string(),
            TokenKind::Eof => "end of expression".to_string(),
        }
    }
}

/// A token and the byte range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub len: usize,
}

/// Splits an expression into tokens.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenizes the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.position..].chars().nth(n)
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.next();
            } else {
                break;
            }
        }
    }

    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        let len = self.input[offset..].chars().next().map_or(0, char::len_utf8);
        SyntaxError::at(kind, self.input, offset, len)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            offset: start,
            len: self.position - start,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();
        let start = self.position;

        let Some(ch) = self.next() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        let kind = match ch {
            '.' => return self.read_dot(start),
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '?' => TokenKind::Question,
            '~' => TokenKind::Null,
            '|' => self.with_equals(TokenKind::UpdateAssign, TokenKind::Pipe),
            '=' => self.with_equals(TokenKind::Eq, TokenKind::Assign),
            '<' => self.with_equals(TokenKind::Le, TokenKind::Lt),
            '>' => self.with_equals(TokenKind::Ge, TokenKind::Gt),
            '!' => {
                if self.peek() == Some('=') {
                    self.next();
                    TokenKind::Ne
                } else {
                    return Err(self.error(SyntaxErrorKind::UnexpectedCharacter, start));
                }
            }
            '+' => self.with_equals(
                TokenKind::ArithmeticAssign(ArithmeticOp::Add),
                TokenKind::Plus,
            ),
            '-' => self.with_equals(
                TokenKind::ArithmeticAssign(ArithmeticOp::Subtract),
                TokenKind::Minus,
            ),
            '*' => self.with_equals(
                TokenKind::ArithmeticAssign(ArithmeticOp::Multiply),
                TokenKind::Star,
            ),
            '%' => self.with_equals(
                TokenKind::ArithmeticAssign(ArithmeticOp::Modulo),
                TokenKind::Percent,
            ),
            '/' => {
                if self.peek() == Some('/') {
                    self.next();
                    TokenKind::Alternative
                } else {
                    self.with_equals(
                        TokenKind::ArithmeticAssign(ArithmeticOp::Divide),
                        TokenKind::Slash,
                    )
                }
            }
            '"' | '\'' => TokenKind::Str(self.read_string(ch, start)?),
            c if c.is_ascii_digit() => self.read_number(start)?,
            c if is_ident_start(c) => {
                let word = self.read_identifier(start);
                if let Some(field) = MetadataField::from_name(&word) {
                    if self.eat_assignment_sign() {
                        return Ok(self.token(TokenKind::MetadataAssign(field), start));
                    }
                }
                match word.as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    _ => TokenKind::Ident(word),
                }
            }
            _ => return Err(self.error(SyntaxErrorKind::UnexpectedCharacter, start)),
        };
        Ok(self.token(kind, start))
    }

    /// Consumes a trailing `=` if present, choosing between the two kinds.
    fn with_equals(&mut self, with: TokenKind, without: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.next();
            with
        } else {
            without
        }
    }

    /// Consumes optional spaces and a single `=` (not `==`) after a name.
    fn eat_assignment_sign(&mut self) -> bool {
        let rest = &self.input[self.position..];
        let after_spaces = rest.trim_start_matches([' ', '\t']);
        let mut chars = after_spaces.chars();
        if chars.next() != Some('=') || chars.next() == Some('=') {
            return false;
        }
        self.position += rest.len() - after_spaces.len() + 1;
        true
    }

    /// Reads what follows a `.`: a field name, a quoted field, `..`, or a lone dot.
    fn read_dot(&mut self, start: usize) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some('.') => {
                self.next();
                Ok(self.token(TokenKind::DotDot, start))
            }
            Some(c) if is_ident_start(c) => {
                let name_start = self.position;
                let name = self.read_identifier(name_start);
                Ok(self.token(TokenKind::Field(name), start))
            }
            Some(q @ ('"' | '\'')) => {
                self.next();
                let name = self.read_string(q, start)?;
                Ok(self.token(TokenKind::Field(name), start))
            }
            _ => Ok(self.token(TokenKind::Dot, start)),
        }
    }

    /// Reads an identifier whose first character has already been consumed
    /// (when `start` precedes the current position) or is next.
    fn read_identifier(&mut self, start: usize) -> String {
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.next();
            } else if ch == '-' && self.peek_nth(1).is_some_and(is_ident_start) {
                // `foo-bar` is one name; `a-1` and `a - b` are subtraction
                self.next();
            } else {
                break;
            }
        }
        self.input[start..self.position].to_string()
    }

    /// Reads a quoted string; the opening quote has been consumed.
    fn read_string(&mut self, quote: char, start: usize) -> Result<String, SyntaxError> {
        let mut value = String::new();
        loop {
            match self.next() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => {
                    let escape_at = self.position - 1;
                    match self.next() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some('\'') => value.push('\''),
                        Some('"') => value.push('"'),
                        Some(_) => {
                            return Err(self.error(
                                SyntaxErrorKind::InvalidSyntax {
                                    message: "invalid escape sequence".to_string(),
                                },
                                escape_at,
                            ))
                        }
                        None => {
                            return Err(self.error(SyntaxErrorKind::UnterminatedString, start))
                        }
                    }
                }
                Some(ch) => value.push(ch),
                None => return Err(self.error(SyntaxErrorKind::UnterminatedString, start)),
            }
        }
    }

    /// Reads an integer or float; the first digit has been consumed.
    fn read_number(&mut self, start: usize) -> Result<TokenKind, SyntaxError> {
        let mut is_float = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.next();
            } else if ch == '.' && !is_float && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                self.next();
            } else if (ch == 'e' || ch == 'E')
                && (self.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
                    || (matches!(self.peek_nth(1), Some('+' | '-'))
                        && self.peek_nth(2).is_some_and(|c| c.is_ascii_digit())))
            {
                is_float = true;
                self.next();
                self.next();
            } else {
                break;
            }
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(self.error(SyntaxErrorKind::InvalidNumber, start));
        }

        let text = &self.input[start..self.position];
        let kind = if is_float {
            text.parse::<f64>().map(TokenKind::Float).ok()
        } else {
            text.parse::<i64>().map(TokenKind::Integer).ok()
        };
        kind.ok_or_else(|| self.error(SyntaxErrorKind::InvalidNumber, start))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_path_tokens() {
        assert_eq!(
            kinds(".a.b[0]"),
            vec![
                TokenKind::Field("a".to_string()),
                TokenKind::Field("b".to_string()),
                TokenKind::LBracket,
                TokenKind::Integer(0),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds(". .. .[]"),
            vec![
                TokenKind::Dot,
                TokenKind::DotDot,
                TokenKind::Dot,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_field() {
        assert_eq!(
            kinds(".\"a b\""),
            vec![TokenKind::Field("a b".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("| |= = == != < <= > >= // / /= + += - -= * *= % %="),
            vec![
                TokenKind::Pipe,
                TokenKind::UpdateAssign,
                TokenKind::Assign,
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Alternative,
                TokenKind::Slash,
                TokenKind::ArithmeticAssign(ArithmeticOp::Divide),
                TokenKind::Plus,
                TokenKind::ArithmeticAssign(ArithmeticOp::Add),
                TokenKind::Minus,
                TokenKind::ArithmeticAssign(ArithmeticOp::Subtract),
                TokenKind::Star,
                TokenKind::ArithmeticAssign(ArithmeticOp::Multiply),
                TokenKind::Percent,
                TokenKind::ArithmeticAssign(ArithmeticOp::Modulo),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds("1 2.5 1e3 'x\\n' true false null ~"),
            vec![
                TokenKind::Integer(1),
                TokenKind::Float(2.5),
                TokenKind::Float(1000.0),
                TokenKind::Str("x\n".to_string()),
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hyphenated_names() {
        assert_eq!(
            kinds(".foo-bar"),
            vec![TokenKind::Field("foo-bar".to_string()), TokenKind::Eof]
        );
        assert_eq!(
            kinds(".a-1"),
            vec![
                TokenKind::Field("a".to_string()),
                TokenKind::Minus,
                TokenKind::Integer(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_metadata_assignment_tokens() {
        assert_eq!(
            kinds(".. style= \"\""),
            vec![
                TokenKind::DotDot,
                TokenKind::MetadataAssign(MetadataField::Style),
                TokenKind::Str(String::new()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("line_comment =\"x\""),
            vec![
                TokenKind::MetadataAssign(MetadataField::LineComment),
                TokenKind::Str("x".to_string()),
                TokenKind::Eof,
            ]
        );
        // comparing the getter is still a comparison
        assert_eq!(
            kinds("tag == \"!!str\""),
            vec![
                TokenKind::Ident("tag".to_string()),
                TokenKind::Eq,
                TokenKind::Str("!!str".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_token_offsets() {
        let tokens = Lexer::tokenize(".a | length").unwrap();
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[0].len, 2);
        assert_eq!(tokens[1].offset, 3);
        assert_eq!(tokens[2].offset, 5);
        assert_eq!(tokens[2].len, 6);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::tokenize(".a == \"abc").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedString);
        assert_eq!(err.column, 7);
    }

    #[test]
    fn test_unknown_character() {
        let err = Lexer::tokenize(".a & .b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedCharacter);
        assert_eq!(err.fragment, "&");
    }
}
