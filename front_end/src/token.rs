#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // Single-character tokens
    LeftParen, RightParen, Comma,

    Identifier(String),  // variable or function name

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub column: usize,
    pub length: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: &str, column: usize) -> Self {
        Self {
            token_type,
            lexeme: lexeme.to_string(),
            column,
            length: lexeme.chars().count(),
        }
    }

    pub fn is(&self, token_type: &TokenType) -> bool {
        &self.token_type == token_type
    }
}
