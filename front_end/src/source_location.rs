use crate::token::Token;

/// Column range inside a single-line argument expression (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_column: usize,
    pub end_column: usize,
}

impl Span {
    pub fn new(start_column: usize, end_column: usize) -> Self {
        Self {
            start_column,
            end_column: end_column.max(start_column),
        }
    }

    pub fn combine(&self, other: &Span) -> Span {
        Span::new(
            self.start_column.min(other.start_column),
            self.end_column.max(other.end_column),
        )
    }

    pub fn width(&self) -> usize {
        self.end_column - self.start_column + 1
    }
}

/// Trait for types that can provide source location information
pub trait HasSourceLocation {
    fn get_span(&self) -> Span;
}

impl HasSourceLocation for Token {
    fn get_span(&self) -> Span {
        Span::new(self.column, self.column + self.length.max(1) - 1)
    }
}

/// Extension trait for types with source locations
pub trait SourceLocationExt {
    fn combine_spans<T: HasSourceLocation>(&self, other: &T) -> Span;
}

impl<T: HasSourceLocation> SourceLocationExt for T {
    fn combine_spans<U: HasSourceLocation>(&self, other: &U) -> Span {
        self.get_span().combine(&other.get_span())
    }
}
