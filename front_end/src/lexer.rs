//! Lexer for argument expressions such as `(Plus, x1, (Successor, z2)), y`

use crate::token::{Token, TokenType};

pub struct Lexer {
    source: Vec<char>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            start: 0,
            current: 0,
        }
    }

    /// Scan the whole input; the result always ends with an `Eof` token
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            self.start = self.current;
            if self.is_at_end() {
                tokens.push(Token::new(TokenType::Eof, "", self.current + 1));
                return tokens;
            }
            tokens.push(self.scan_token());
        }
    }

    fn scan_token(&mut self) -> Token {
        let c = self.advance();
        match c {
            '(' => self.make_token(TokenType::LeftParen),
            ')' => self.make_token(TokenType::RightParen),
            ',' => self.make_token(TokenType::Comma),
            _ => self.scan_identifier(),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        while !self.is_at_end() && !Self::is_delimiter(self.peek()) {
            self.advance();
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        self.make_token(TokenType::Identifier(text))
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        let text: String = self.source[self.start..self.current].iter().collect();
        Token::new(token_type, &text, self.start + 1)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn is_delimiter(c: char) -> bool {
        c.is_whitespace() || matches!(c, '(' | ')' | ',')
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += 1;
        c
    }
}
