//! Recursive-descent parser from tokens to an [`OperatorNode`] tree.
//!
//! Precedence, lowest first:
//!
//! | level | operators | associativity |
//! |-------|-----------|---------------|
//! | pipeline | `\|` | right |
//! | union | `,` | left |
//! | alternative | `//` | left |
//! | assignment | `=` `\|=` `+=` `-=` `*=` `/=` `%=` `style=` ... | none |
//! | or | `or` | left |
//! | and | `and` | left |
//! | comparison | `==` `!=` `<` `<=` `>` `>=` | none |
//! | additive | `+` `-` | left |
//! | multiplicative | `*` `/` `%` | left |
//! | unary | `-` | prefix |
//! | postfix | `.name` `[...]` `?` | left |

use super::ast::{
    block_chain, ArithmeticOp, AssignOp, ComparisonOp, LogicalOp, OperatorKind, OperatorNode,
    SelectorKey, Span,
};
use super::error::{SyntaxError, SyntaxErrorKind};
use super::lexer::{Lexer, Token, TokenKind};
use crate::document::node::{Scalar, YamlNumber};

/// Nesting limit for parentheses, brackets and braces.
const MAX_NESTING: usize = 64;

/// Parser for query expressions.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Parses a complete expression. An empty expression is the identity `.`.
    pub fn parse(input: &'a str) -> Result<OperatorNode, SyntaxError> {
        let tokens = Lexer::tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens,
            position: 0,
            depth: 0,
        };

        if parser.check(&TokenKind::Eof) {
            return Ok(OperatorNode::leaf(OperatorKind::Identity, Span::default()));
        }
        let node = parser.parse_pipeline()?;
        parser.expect_end()?;
        Ok(node)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + ahead).map(|t| &t.kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_at(&self, kind: SyntaxErrorKind, token: &Token) -> SyntaxError {
        SyntaxError::at(kind, self.input, token.offset, token.len)
    }

    /// Error for the current token when `expected` was wanted instead.
    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        let kind = match &token.kind {
            TokenKind::Eof => SyntaxErrorKind::UnexpectedEnd {
                expected: expected.to_string(),
            },
            TokenKind::RParen => SyntaxErrorKind::UnmatchedBracket(')'),
            TokenKind::RBracket => SyntaxErrorKind::UnmatchedBracket(']'),
            TokenKind::RBrace => SyntaxErrorKind::UnmatchedBracket('}'),
            other => SyntaxErrorKind::UnexpectedToken {
                found: other.describe(),
                expected: expected.to_string(),
            },
        };
        self.error_at(kind, token)
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        if self.check(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of expression"))
        }
    }

    /// Consumes the closing bracket matching `open`.
    fn expect_close(&mut self, open: &Token, close: TokenKind) -> Result<Token, SyntaxError> {
        if self.check(&close) {
            return Ok(self.advance());
        }
        if self.check(&TokenKind::Eof) {
            let bracket = match open.kind {
                TokenKind::LParen => '(',
                TokenKind::LBrace => '{',
                _ => '[',
            };
            return Err(self.error_at(SyntaxErrorKind::UnmatchedBracket(bracket), open));
        }
        Err(self.unexpected(&format!("'{}'", close.describe())))
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Dot
                | TokenKind::DotDot
                | TokenKind::Field(_)
                | TokenKind::LBracket
                | TokenKind::LParen
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Ident(_)
                | TokenKind::MetadataAssign(_)
                | TokenKind::Str(_)
                | TokenKind::Integer(_)
                | TokenKind::Float(_)
        )
    }

    /// Fails unless an operand follows the operator token `op`.
    fn require_operand(&self, op: &Token) -> Result<(), SyntaxError> {
        if self.starts_operand() {
            Ok(())
        } else {
            Err(self.error_at(
                SyntaxErrorKind::MissingOperand {
                    operator: op.kind.describe(),
                },
                op,
            ))
        }
    }

    /// Parses a full pipeline between brackets, bounding the nesting depth.
    fn parse_nested(&mut self, open: &Token) -> Result<OperatorNode, SyntaxError> {
        if self.check(&TokenKind::Eof) {
            let bracket = match open.kind {
                TokenKind::LParen => '(',
                TokenKind::LBrace => '{',
                _ => '[',
            };
            return Err(self.error_at(SyntaxErrorKind::UnmatchedBracket(bracket), open));
        }
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error_at(
                SyntaxErrorKind::InvalidSyntax {
                    message: format!("expression nested deeper than {} levels", MAX_NESTING),
                },
                open,
            ));
        }
        let result = self.parse_pipeline();
        self.depth -= 1;
        result
    }

    /// Stages are read in a loop and folded from the right, so chain length
    /// never turns into parser recursion.
    fn parse_pipeline(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut last = self.parse_union()?;
        let mut earlier = Vec::new();
        while self.check(&TokenKind::Pipe) {
            let op = self.advance();
            self.require_operand(&op)?;
            let next = self.parse_union()?;
            earlier.push(std::mem::replace(&mut last, next));
        }
        Ok(earlier.into_iter().rev().fold(last, |rhs, lhs| {
            OperatorNode::binary(OperatorKind::Pipe, lhs, rhs)
        }))
    }

    fn parse_union(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut lhs = self.parse_alternative()?;
        while self.check(&TokenKind::Comma) {
            let op = self.advance();
            self.require_operand(&op)?;
            let rhs = self.parse_alternative()?;
            lhs = OperatorNode::binary(OperatorKind::Union, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_alternative(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut lhs = self.parse_assignment()?;
        while self.check(&TokenKind::Alternative) {
            let op = self.advance();
            self.require_operand(&op)?;
            let rhs = self.parse_assignment()?;
            lhs = OperatorNode::binary(OperatorKind::Alternative, lhs, rhs);
        }
        Ok(lhs)
    }

    fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
        match kind {
            TokenKind::Assign => Some(AssignOp::Set),
            TokenKind::UpdateAssign => Some(AssignOp::Update),
            TokenKind::ArithmeticAssign(op) => Some(AssignOp::Arithmetic(*op)),
            TokenKind::MetadataAssign(field) => Some(AssignOp::Metadata(*field)),
            _ => None,
        }
    }

    /// `style= "x"` with nothing on the left applies to `.`.
    fn parse_assignment(&mut self) -> Result<OperatorNode, SyntaxError> {
        let lhs = if matches!(self.peek().kind, TokenKind::MetadataAssign(_)) {
            OperatorNode::leaf(OperatorKind::Identity, Span::new(self.peek().offset, 0))
        } else {
            self.parse_or()?
        };
        let Some(assign) = Self::assign_op(&self.peek().kind) else {
            return Ok(lhs);
        };
        let op = self.advance();
        self.require_operand(&op)?;
        let rhs = self.parse_or()?;
        if Self::assign_op(&self.peek().kind).is_some() {
            return Err(self.error_at(
                SyntaxErrorKind::InvalidSyntax {
                    message: "assignments cannot be chained without parentheses".to_string(),
                },
                self.peek(),
            ));
        }
        Ok(OperatorNode::binary(OperatorKind::Assign(assign), lhs, rhs))
    }

    fn parse_or(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut lhs = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            let op = self.advance();
            self.require_operand(&op)?;
            let rhs = self.parse_and()?;
            lhs = OperatorNode::binary(OperatorKind::Logical(LogicalOp::Or), lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut lhs = self.parse_comparison()?;
        while self.check(&TokenKind::And) {
            let op = self.advance();
            self.require_operand(&op)?;
            let rhs = self.parse_comparison()?;
            lhs = OperatorNode::binary(OperatorKind::Logical(LogicalOp::And), lhs, rhs);
        }
        Ok(lhs)
    }

    fn comparison_op(kind: &TokenKind) -> Option<ComparisonOp> {
        match kind {
            TokenKind::Eq => Some(ComparisonOp::Equal),
            TokenKind::Ne => Some(ComparisonOp::NotEqual),
            TokenKind::Lt => Some(ComparisonOp::Less),
            TokenKind::Le => Some(ComparisonOp::LessOrEqual),
            TokenKind::Gt => Some(ComparisonOp::Greater),
            TokenKind::Ge => Some(ComparisonOp::GreaterOrEqual),
            _ => None,
        }
    }

    fn parse_comparison(&mut self) -> Result<OperatorNode, SyntaxError> {
        let lhs = self.parse_additive()?;
        let Some(comparison) = Self::comparison_op(&self.peek().kind) else {
            return Ok(lhs);
        };
        let op = self.advance();
        self.require_operand(&op)?;
        let rhs = self.parse_additive()?;
        if Self::comparison_op(&self.peek().kind).is_some() {
            return Err(self.error_at(
                SyntaxErrorKind::InvalidSyntax {
                    message: "comparisons cannot be chained without parentheses".to_string(),
                },
                self.peek(),
            ));
        }
        Ok(OperatorNode::binary(
            OperatorKind::Comparison(comparison),
            lhs,
            rhs,
        ))
    }

    fn parse_additive(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => ArithmeticOp::Add,
                TokenKind::Minus => ArithmeticOp::Subtract,
                _ => return Ok(lhs),
            };
            let token = self.advance();
            self.require_operand(&token)?;
            let rhs = self.parse_multiplicative()?;
            lhs = OperatorNode::binary(OperatorKind::Arithmetic(op), lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => ArithmeticOp::Multiply,
                TokenKind::Slash => ArithmeticOp::Divide,
                TokenKind::Percent => ArithmeticOp::Modulo,
                _ => return Ok(lhs),
            };
            let token = self.advance();
            self.require_operand(&token)?;
            let rhs = self.parse_unary()?;
            lhs = OperatorNode::binary(OperatorKind::Arithmetic(op), lhs, rhs);
        }
    }

    /// `-x` is `0 - x`, except that a minus directly before a number literal
    /// folds into the literal.
    fn parse_unary(&mut self) -> Result<OperatorNode, SyntaxError> {
        let mut minuses = Vec::new();
        let operand = loop {
            if !self.check(&TokenKind::Minus) {
                break self.parse_postfix()?;
            }
            let minus = self.advance();
            self.require_operand(&minus)?;

            let negated = match self.peek().kind {
                TokenKind::Integer(n) => Some(YamlNumber::Integer(-n)),
                TokenKind::Float(f) => Some(YamlNumber::Float(-f)),
                _ => None,
            };
            if let Some(number) = negated {
                let literal = self.advance();
                let span = Span::new(minus.offset, literal.offset + literal.len - minus.offset);
                let node = OperatorNode::leaf(OperatorKind::Literal(Scalar::Number(number)), span);
                break self.parse_suffixes(node)?;
            }
            minuses.push(minus);
        };

        Ok(minuses.into_iter().rev().fold(operand, |operand, minus| {
            let zero = OperatorNode::leaf(
                OperatorKind::Literal(Scalar::Number(YamlNumber::Integer(0))),
                Span::new(minus.offset, minus.len),
            );
            OperatorNode::binary(
                OperatorKind::Arithmetic(ArithmeticOp::Subtract),
                zero,
                operand,
            )
        }))
    }

    fn parse_postfix(&mut self) -> Result<OperatorNode, SyntaxError> {
        let node = self.parse_primary()?;
        self.parse_suffixes(node)
    }

    fn parse_suffixes(&mut self, mut node: OperatorNode) -> Result<OperatorNode, SyntaxError> {
        loop {
            match self.peek().kind.clone() {
                TokenKind::Field(name) => {
                    let token = self.advance();
                    let span = Span::new(token.offset, token.len);
                    node = OperatorNode::pipe(node, selector(SelectorKey::Key(name), span));
                }
                TokenKind::Dot if self.peek_kind_at(1) == Some(&TokenKind::LBracket) => {
                    // `.a.[0]` reads like `.a[0]`
                    self.advance();
                }
                TokenKind::LBracket => {
                    let suffix = self.parse_bracket()?;
                    node = OperatorNode::pipe(node, suffix);
                }
                TokenKind::Question => {
                    self.advance();
                    node = mark_optional(node);
                }
                _ => return Ok(node),
            }
        }
    }

    /// Reads an optionally negative integer literal.
    fn parse_signed_integer(&mut self) -> Option<i64> {
        match (self.peek_kind_at(0), self.peek_kind_at(1)) {
            (Some(TokenKind::Integer(n)), _) => {
                let n = *n;
                self.advance();
                Some(n)
            }
            (Some(TokenKind::Minus), Some(TokenKind::Integer(n))) => {
                let n = *n;
                self.advance();
                self.advance();
                Some(-n)
            }
            _ => None,
        }
    }

    /// Parses `[...]` following a path: splat, index, key, slice or computed lookup.
    fn parse_bracket(&mut self) -> Result<OperatorNode, SyntaxError> {
        let open = self.advance();

        if self.check(&TokenKind::RBracket) {
            let close = self.advance();
            return Ok(OperatorNode::leaf(OperatorKind::Splat, span_between(&open, &close)));
        }

        let simple_end = |kind: Option<&TokenKind>| {
            matches!(kind, Some(TokenKind::RBracket) | Some(TokenKind::Colon))
        };
        let literal_index = match (self.peek_kind_at(0), self.peek_kind_at(1), self.peek_kind_at(2)) {
            (Some(TokenKind::Integer(_)), next, _) => simple_end(next),
            (Some(TokenKind::Minus), Some(TokenKind::Integer(_)), next) => simple_end(next),
            (Some(TokenKind::Colon), _, _) => true,
            _ => false,
        };

        if literal_index {
            let start = self.parse_signed_integer();
            if self.eat(&TokenKind::Colon) {
                let end = if self.check(&TokenKind::RBracket) {
                    None
                } else {
                    match self.parse_signed_integer() {
                        Some(n) => Some(n),
                        None => {
                            return Err(self.error_at(SyntaxErrorKind::InvalidSlice, self.peek()))
                        }
                    }
                };
                let close = self.expect_close(&open, TokenKind::RBracket)?;
                return Ok(OperatorNode::leaf(
                    OperatorKind::Slice(start, end),
                    span_between(&open, &close),
                ));
            }
            let close = self.expect_close(&open, TokenKind::RBracket)?;
            let index = start.unwrap_or_default();
            return Ok(OperatorNode::leaf(
                OperatorKind::Selector {
                    key: SelectorKey::Index(index),
                    optional: false,
                },
                span_between(&open, &close),
            ));
        }

        if let (Some(TokenKind::Str(key)), Some(TokenKind::RBracket)) =
            (self.peek_kind_at(0), self.peek_kind_at(1))
        {
            let key = key.clone();
            self.advance();
            let close = self.advance();
            return Ok(OperatorNode::leaf(
                OperatorKind::Selector {
                    key: SelectorKey::Key(key),
                    optional: false,
                },
                span_between(&open, &close),
            ));
        }

        let key = self.parse_nested(&open)?;
        let close = self.expect_close(&open, TokenKind::RBracket)?;
        Ok(OperatorNode::unary(
            OperatorKind::Lookup,
            key,
            span_between(&open, &close),
        ))
    }

    fn parse_primary(&mut self) -> Result<OperatorNode, SyntaxError> {
        let token = self.peek().clone();
        let span = Span::new(token.offset, token.len);
        let literal = |scalar| Ok(OperatorNode::leaf(OperatorKind::Literal(scalar), span));

        match token.kind {
            TokenKind::Dot => {
                self.advance();
                Ok(OperatorNode::leaf(OperatorKind::Identity, span))
            }
            TokenKind::DotDot => {
                self.advance();
                Ok(OperatorNode::leaf(OperatorKind::RecurseDescend, span))
            }
            TokenKind::Field(name) => {
                self.advance();
                Ok(selector(SelectorKey::Key(name), span))
            }
            TokenKind::Integer(n) => {
                self.advance();
                literal(Scalar::Number(YamlNumber::Integer(n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                literal(Scalar::Number(YamlNumber::Float(f)))
            }
            TokenKind::Str(s) => {
                self.advance();
                literal(Scalar::String(s))
            }
            TokenKind::True => {
                self.advance();
                literal(Scalar::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                literal(Scalar::Boolean(false))
            }
            TokenKind::Null => {
                self.advance();
                literal(Scalar::Null)
            }
            TokenKind::LParen => {
                let open = self.advance();
                let inner = self.parse_nested(&open)?;
                self.expect_close(&open, TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                let open = self.advance();
                if self.check(&TokenKind::RBracket) {
                    let close = self.advance();
                    return Ok(OperatorNode::leaf(
                        OperatorKind::Collect,
                        span_between(&open, &close),
                    ));
                }
                let inner = self.parse_nested(&open)?;
                let close = self.expect_close(&open, TokenKind::RBracket)?;
                Ok(OperatorNode::unary(
                    OperatorKind::Collect,
                    inner,
                    span_between(&open, &close),
                ))
            }
            TokenKind::LBrace => self.parse_object(),
            TokenKind::Ident(name) => self.parse_call(name),
            TokenKind::Pipe
            | TokenKind::Comma
            | TokenKind::Alternative
            | TokenKind::Assign
            | TokenKind::UpdateAssign
            | TokenKind::ArithmeticAssign(_)
            | TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge
            | TokenKind::Plus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::And
            | TokenKind::Or => Err(self.error_at(
                SyntaxErrorKind::MissingOperand {
                    operator: token.kind.describe(),
                },
                &token,
            )),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Parses `name` or `name(arg; ...)`; `select(p)` becomes a filter.
    fn parse_call(&mut self, name: String) -> Result<OperatorNode, SyntaxError> {
        let name_token = self.advance();
        let mut args = Vec::new();
        let mut end = name_token.offset + name_token.len;

        if self.check(&TokenKind::LParen) {
            let open = self.advance();
            if !self.check(&TokenKind::RParen) {
                loop {
                    args.push(self.parse_nested(&open)?);
                    if !self.eat(&TokenKind::Semicolon) {
                        break;
                    }
                }
            }
            let close = self.expect_close(&open, TokenKind::RParen)?;
            end = close.offset + close.len;
        }
        let span = Span::new(name_token.offset, end - name_token.offset);

        if name == "select" {
            if args.len() != 1 {
                return Err(self.error_at(
                    SyntaxErrorKind::InvalidSyntax {
                        message: "select takes exactly one argument".to_string(),
                    },
                    &name_token,
                ));
            }
            let predicate = args.remove(0);
            return Ok(OperatorNode::unary(OperatorKind::Filter, predicate, span));
        }

        let kind = OperatorKind::FunctionCall(name);
        Ok(match block_chain(args) {
            Some(chain) => OperatorNode::unary(kind, chain, span),
            None => OperatorNode::leaf(kind, span),
        })
    }

    /// Parses `{key: value, ...}`; `{a}` is short for `{a: .a}`.
    fn parse_object(&mut self) -> Result<OperatorNode, SyntaxError> {
        let open = self.advance();
        let mut entries = Vec::new();

        if !self.check(&TokenKind::RBrace) {
            loop {
                entries.push(self.parse_object_entry(&open)?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.expect_close(&open, TokenKind::RBrace)?;
        let span = span_between(&open, &close);

        Ok(match block_chain(entries) {
            Some(chain) => OperatorNode::unary(OperatorKind::CollectObject, chain, span),
            None => OperatorNode::leaf(OperatorKind::CollectObject, span),
        })
    }

    fn parse_object_entry(&mut self, open: &Token) -> Result<OperatorNode, SyntaxError> {
        let token = self.peek().clone();
        let key_span = Span::new(token.offset, token.len);
        let (key, shorthand) = match &token.kind {
            TokenKind::Ident(name) | TokenKind::Str(name) => {
                self.advance();
                (
                    OperatorNode::leaf(OperatorKind::Literal(Scalar::String(name.clone())), key_span),
                    Some(name.clone()),
                )
            }
            TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::And
            | TokenKind::Or => {
                self.advance();
                let name = token.kind.describe();
                (
                    OperatorNode::leaf(OperatorKind::Literal(Scalar::String(name.clone())), key_span),
                    Some(name),
                )
            }
            TokenKind::LParen => {
                let paren = self.advance();
                let key = self.parse_nested(&paren)?;
                self.expect_close(&paren, TokenKind::RParen)?;
                (key, None)
            }
            TokenKind::Eof => {
                return Err(self.error_at(SyntaxErrorKind::UnmatchedBracket('{'), open));
            }
            _ => return Err(self.unexpected("an object key")),
        };

        let value = if self.check(&TokenKind::Colon) {
            let colon = self.advance();
            self.require_operand(&colon)?;
            self.parse_alternative()?
        } else {
            match shorthand {
                Some(name) => selector(SelectorKey::Key(name), key_span),
                None => return Err(self.unexpected("':'")),
            }
        };
        Ok(OperatorNode::binary(OperatorKind::ObjectEntry, key, value))
    }
}

fn selector(key: SelectorKey, span: Span) -> OperatorNode {
    OperatorNode::leaf(
        OperatorKind::Selector {
            key,
            optional: false,
        },
        span,
    )
}

fn span_between(open: &Token, close: &Token) -> Span {
    Span::new(open.offset, close.offset + close.len - open.offset)
}

/// Applies a trailing `?` to the last selector of a path.
fn mark_optional(mut node: OperatorNode) -> OperatorNode {
    let mut spine = Vec::new();
    while node.kind == OperatorKind::Pipe {
        let Some(last) = node.rhs.take() else {
            break;
        };
        spine.push(node);
        node = *last;
    }
    if let OperatorKind::Selector { optional, .. } = &mut node.kind {
        *optional = true;
    }
    while let Some(mut pipe) = spine.pop() {
        pipe.rhs = Some(Box::new(node));
        node = pipe;
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ast::MetadataField;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> OperatorNode {
        Parser::parse(input).unwrap()
    }

    fn key(node: &OperatorNode) -> String {
        match &node.kind {
            OperatorKind::Selector {
                key: SelectorKey::Key(k),
                ..
            } => k.clone(),
            other => panic!("expected a key selector, got {:?}", other),
        }
    }

    fn lhs(node: &OperatorNode) -> &OperatorNode {
        node.lhs.as_deref().unwrap()
    }

    fn rhs(node: &OperatorNode) -> &OperatorNode {
        node.rhs.as_deref().unwrap()
    }

    #[test]
    fn test_parse_identity() {
        assert_eq!(parse(".").kind, OperatorKind::Identity);
        assert_eq!(parse("   ").kind, OperatorKind::Identity);
    }

    #[test]
    fn test_parse_path_chain() {
        let node = parse(".a.b");
        assert_eq!(node.kind, OperatorKind::Pipe);
        assert_eq!(key(lhs(&node)), "a");
        assert_eq!(key(rhs(&node)), "b");
    }

    #[test]
    fn test_parse_bracket_forms() {
        assert_eq!(
            parse(".[0]").kind,
            OperatorKind::Selector {
                key: SelectorKey::Index(0),
                optional: false
            }
        );
        assert_eq!(
            parse(".[-1]").kind,
            OperatorKind::Selector {
                key: SelectorKey::Index(-1),
                optional: false
            }
        );
        assert_eq!(key(&parse(".[\"a b\"]")), "a b");
        assert_eq!(parse(".[]").kind, OperatorKind::Splat);
        assert_eq!(parse(".[1:3]").kind, OperatorKind::Slice(Some(1), Some(3)));
        assert_eq!(parse(".[:2]").kind, OperatorKind::Slice(None, Some(2)));
        assert_eq!(parse(".[-2:]").kind, OperatorKind::Slice(Some(-2), None));
        assert_eq!(parse(".[.k]").kind, OperatorKind::Lookup);
    }

    #[test]
    fn test_parse_pipe_is_lowest_and_right_associative() {
        let node = parse(".a | .b | .c");
        assert_eq!(node.kind, OperatorKind::Pipe);
        assert_eq!(key(lhs(&node)), "a");
        assert_eq!(rhs(&node).kind, OperatorKind::Pipe);

        let node = parse(".a, .b | .c");
        assert_eq!(node.kind, OperatorKind::Pipe);
        assert_eq!(lhs(&node).kind, OperatorKind::Union);
    }

    #[test]
    fn test_parse_arithmetic_precedence() {
        let node = parse("1 + 2 * 3");
        assert_eq!(node.kind, OperatorKind::Arithmetic(ArithmeticOp::Add));
        assert_eq!(
            rhs(&node).kind,
            OperatorKind::Arithmetic(ArithmeticOp::Multiply)
        );

        let node = parse(".a + 1 > 2 and .b");
        assert_eq!(node.kind, OperatorKind::Logical(LogicalOp::And));
        assert_eq!(
            lhs(&node).kind,
            OperatorKind::Comparison(ComparisonOp::Greater)
        );
        assert_eq!(
            lhs(lhs(&node)).kind,
            OperatorKind::Arithmetic(ArithmeticOp::Add)
        );
    }

    #[test]
    fn test_parse_assignment_binds_looser_than_arithmetic() {
        let node = parse(".a = .b + 1");
        assert_eq!(node.kind, OperatorKind::Assign(AssignOp::Set));
        assert_eq!(
            rhs(&node).kind,
            OperatorKind::Arithmetic(ArithmeticOp::Add)
        );

        let node = parse(".a |= . * 2");
        assert_eq!(node.kind, OperatorKind::Assign(AssignOp::Update));

        let node = parse(".n += 1");
        assert_eq!(
            node.kind,
            OperatorKind::Assign(AssignOp::Arithmetic(ArithmeticOp::Add))
        );
    }

    #[test]
    fn test_parse_metadata_assignment() {
        let node = parse(".. style= \"\"");
        assert_eq!(
            node.kind,
            OperatorKind::Assign(AssignOp::Metadata(MetadataField::Style))
        );
        assert_eq!(lhs(&node).kind, OperatorKind::RecurseDescend);
        assert_eq!(
            rhs(&node).kind,
            OperatorKind::Literal(Scalar::String(String::new()))
        );

        let node = parse(".a | head_comment=\"x\"");
        assert_eq!(node.kind, OperatorKind::Pipe);
        let assign = rhs(&node);
        assert_eq!(
            assign.kind,
            OperatorKind::Assign(AssignOp::Metadata(MetadataField::HeadComment))
        );
        assert_eq!(lhs(assign).kind, OperatorKind::Identity);

        // the call form is untouched
        assert_eq!(
            parse("style(\"double\")").kind,
            OperatorKind::FunctionCall("style".to_string())
        );
    }

    #[test]
    fn test_parse_negative_literal_and_unary_minus() {
        assert_eq!(
            parse("-3").kind,
            OperatorKind::Literal(Scalar::Number(YamlNumber::Integer(-3)))
        );
        let node = parse("-.a");
        assert_eq!(node.kind, OperatorKind::Arithmetic(ArithmeticOp::Subtract));
        assert_eq!(
            lhs(&node).kind,
            OperatorKind::Literal(Scalar::Number(YamlNumber::Integer(0)))
        );
        let node = parse("5 - 3");
        assert_eq!(node.kind, OperatorKind::Arithmetic(ArithmeticOp::Subtract));
    }

    #[test]
    fn test_parse_function_calls() {
        let node = parse("length");
        assert_eq!(node.kind, OperatorKind::FunctionCall("length".to_string()));
        assert!(node.arguments().is_empty());

        let node = parse("has(\"a\")");
        assert_eq!(node.arguments().len(), 1);

        let node = parse("f(.a; .b, .c)");
        let args = node.arguments();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].kind, OperatorKind::Union);

        let node = parse(".[] | select(. > 1)");
        assert_eq!(rhs(&node).kind, OperatorKind::Filter);
    }

    #[test]
    fn test_parse_collections() {
        let node = parse("[.a, .b]");
        assert_eq!(node.kind, OperatorKind::Collect);
        assert_eq!(lhs(&node).kind, OperatorKind::Union);
        assert!(parse("[]").lhs.is_none());

        let node = parse("{name: .n, \"x y\": 1, (.k): .v, id}");
        assert_eq!(node.kind, OperatorKind::CollectObject);
        let entries = node.arguments();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.kind == OperatorKind::ObjectEntry));
        assert_eq!(key(rhs(entries[3])), "id");
    }

    #[test]
    fn test_parse_optional_marks_last_selector() {
        let node = parse(".a.b?");
        assert_eq!(
            rhs(&node).kind,
            OperatorKind::Selector {
                key: SelectorKey::Key("b".to_string()),
                optional: true
            }
        );
    }

    #[test]
    fn test_unmatched_bracket() {
        let err = Parser::parse(".[").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnmatchedBracket('['));
        assert_eq!(err.offset, 1);
        assert_eq!((err.line, err.column), (1, 2));

        let err = Parser::parse("(.a | .b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnmatchedBracket('('));

        let err = Parser::parse(".a)").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnmatchedBracket(')'));
    }

    #[test]
    fn test_missing_operand() {
        let err = Parser::parse(".a +").unwrap_err();
        assert_eq!(
            err.kind,
            SyntaxErrorKind::MissingOperand {
                operator: "+".to_string()
            }
        );
        assert_eq!(err.column, 4);

        let err = Parser::parse("| .a").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::MissingOperand { .. }));
    }

    #[test]
    fn test_chained_comparison_rejected() {
        let err = Parser::parse("1 < 2 < 3").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::InvalidSyntax { .. }));
    }

    #[test]
    fn test_invalid_slice() {
        let err = Parser::parse(".[1:.a]").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::InvalidSlice);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}.{}", "(".repeat(100), ")".repeat(100));
        let err = Parser::parse(&deep).unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::InvalidSyntax { .. }));
    }

    #[test]
    fn test_long_pipe_chain_parses_without_recursion() {
        let text = ".a | ".repeat(100_000) + ".a";
        let node = parse(&text);
        assert_eq!(node.kind, OperatorKind::Pipe);
        assert_eq!(node.pipe_stages().unwrap().len(), 100_001);
        assert_eq!(node.span, Span::new(0, text.len()));

        let node = parse(&format!("({})?", text.replacen(".a", ".b", 1)));
        let stages = node.pipe_stages().unwrap();
        assert_eq!(key(stages[0]), "b");
        assert!(matches!(
            stages[100_000].kind,
            OperatorKind::Selector { optional: true, .. }
        ));
        assert!(matches!(
            stages[0].kind,
            OperatorKind::Selector { optional: false, .. }
        ));
    }

    #[test]
    fn test_repeated_unary_minus_parses_without_recursion() {
        let node = parse(&("- ".repeat(100_000) + ".a"));
        assert_eq!(node.kind, OperatorKind::Arithmetic(ArithmeticOp::Subtract));

        let node = parse("- -3");
        assert_eq!(node.kind, OperatorKind::Arithmetic(ArithmeticOp::Subtract));
        assert_eq!(
            rhs(&node).kind,
            OperatorKind::Literal(Scalar::Number(YamlNumber::Integer(-3)))
        );
    }

    #[test]
    fn test_error_position_on_second_line() {
        let err = Parser::parse(".a |\n  .b ]").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnmatchedBracket(']'));
        assert_eq!((err.line, err.column), (2, 6));
    }
}
