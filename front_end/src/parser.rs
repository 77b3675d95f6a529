//! Parser for the argument expressions of call-based instructions
//!
//! Grammar:
//!
//! ```text
//! arguments := ε | "(" ")" | element ("," element)*
//! element   := VARIABLE | NAME | "(" NAME ("," element)* ")"
//! ```
//!
//! A whole input wrapped in one pair of parentheses is ambiguous: it is
//! either a single call or a bracketed list. The callee's arity decides.

use crate::ast::ArgExpr;
use crate::error::ParseError;
use crate::source_location::{HasSourceLocation, SourceLocationExt, Span};
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};
use crate::types::Variable;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

/// Parse `source` as the argument list of a callee taking `callee_arity` inputs
pub fn parse_arguments(source: &str, callee_arity: usize) -> Result<Vec<ArgExpr>, ParseError> {
    Parser::from_source(source).parse_arguments(callee_arity)
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(token) if token.is(&TokenType::Eof)) {
            let column = tokens.last().map_or(1, |t| t.column + t.length);
            tokens.push(Token::new(TokenType::Eof, "", column));
        }
        Parser { tokens, current: 0 }
    }

    pub fn from_source(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        Self::new(lexer.scan_tokens())
    }

    pub fn parse_arguments(&mut self, callee_arity: usize) -> Result<Vec<ArgExpr>, ParseError> {
        if self.check(&TokenType::Eof) {
            return Ok(Vec::new());
        }

        if self.is_single_group() {
            let open = self.advance();
            if self.check(&TokenType::RightParen) {
                // `()` is an empty argument list
                self.advance();
                self.expect_end()?;
                return Ok(Vec::new());
            }
            let items = self.parse_list()?;
            let close = self.expect(TokenType::RightParen, "expected `)` to close the argument group")?;
            self.expect_end()?;
            return Ok(Self::disambiguate(items, callee_arity, open.combine_spans(&close)));
        }

        let items = self.parse_list()?;
        self.expect_end()?;
        Ok(items)
    }

    /// `(Name, a, b)` at top level is a single call when the callee takes one
    /// input, otherwise a bracketed list whose first element is a bare call.
    fn disambiguate(items: Vec<ArgExpr>, callee_arity: usize, span: Span) -> Vec<ArgExpr> {
        if callee_arity != 1 || items.len() < 2 {
            return items;
        }
        let name = match items.first() {
            Some(ArgExpr::Call { name, args, .. }) if args.is_empty() => name.clone(),
            _ => return items,
        };
        vec![ArgExpr::Call {
            name,
            args: items.into_iter().skip(1).collect(),
            span,
        }]
    }

    fn parse_list(&mut self) -> Result<Vec<ArgExpr>, ParseError> {
        let mut items = vec![self.parse_element()?];
        while self.check(&TokenType::Comma) {
            self.advance();
            items.push(self.parse_element()?);
        }
        Ok(items)
    }

    fn parse_element(&mut self) -> Result<ArgExpr, ParseError> {
        let token = self.advance();
        match &token.token_type {
            TokenType::Identifier(text) => {
                let span = token.get_span();
                match text.parse::<Variable>() {
                    Ok(variable) => Ok(ArgExpr::Variable { variable, span }),
                    Err(_) => Ok(ArgExpr::Call {
                        name: text.clone(),
                        args: Vec::new(),
                        span,
                    }),
                }
            }
            TokenType::LeftParen => self.parse_call(&token),
            TokenType::Eof => Err(ParseError::unexpected_token(
                token.get_span(),
                "expected an argument but the expression ended",
            )),
            _ => Err(ParseError::unexpected_token(
                token.get_span(),
                format!("expected an argument, found `{}`", token.lexeme),
            )),
        }
    }

    fn parse_call(&mut self, open: &Token) -> Result<ArgExpr, ParseError> {
        let name_token = self.advance();
        let name = match &name_token.token_type {
            TokenType::Identifier(text) if !Variable::looks_like(text) => text.clone(),
            TokenType::Identifier(text) => {
                return Err(ParseError::invalid_expression(
                    name_token.get_span(),
                    format!("`{}` is a variable; a call must start with a function name", text),
                ))
            }
            _ => {
                return Err(ParseError::unexpected_token(
                    name_token.get_span(),
                    format!("expected a function name, found `{}`", name_token.lexeme),
                ))
            }
        };

        let mut args = Vec::new();
        if self.check(&TokenType::Comma) {
            self.advance();
            args = self.parse_list()?;
        }
        let close = self.expect(TokenType::RightParen, "expected `)` after call arguments")?;
        Ok(ArgExpr::Call {
            name,
            args,
            span: open.combine_spans(&close),
        })
    }

    /// True when the first token opens a group that closes right before `Eof`
    fn is_single_group(&self) -> bool {
        if !self.check(&TokenType::LeftParen) {
            return false;
        }
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate() {
            match token.token_type {
                TokenType::LeftParen => depth += 1,
                TokenType::RightParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(index + 1).map(|t| &t.token_type),
                            Some(TokenType::Eof)
                        );
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn expect(&mut self, token_type: TokenType, message: &str) -> Result<Token, ParseError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(ParseError::syntax_error(self.peek().get_span(), message))
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenType::Eof) {
            Ok(())
        } else {
            let token = self.peek();
            Err(ParseError::syntax_error(
                token.get_span(),
                format!("unexpected `{}` after the argument list", token.lexeme),
            ))
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        self.peek().is(token_type)
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }
}
