use crate::error::ParseError;
use crate::source_location::Span;
use colored::Colorize;

/// Renders argument-expression errors against the text they came from
pub struct DiagnosticReporter {
    pub source: String,
}

impl DiagnosticReporter {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    pub fn report_error(&self, error: &ParseError) -> String {
        let mut output = format!(
            "{}: {}\n",
            format!("error[{}]", error.error_code).red().bold(),
            error.message.bold()
        );

        output.push_str(&format!("{} column {}\n", "-->".blue(), error.span.start_column));
        output.push_str(&self.get_snippet(&error.span));
        output.push('\n');

        if let Some(help) = Self::help_for(error.error_code) {
            output.push_str(&format!("\n{}: {}", "help".green().bold(), help));
        }
        output
    }

    /// The source line with carets under the span
    pub fn get_snippet(&self, span: &Span) -> String {
        let line = self.source.trim_end();
        let width = line.chars().count().max(1);
        let start = span.start_column.clamp(1, width + 1);
        let carets = "^".repeat(span.width().min(width + 2 - start).max(1));
        format!(
            "    {}\n{}{}",
            line,
            " ".repeat(start + 3),
            carets.red().bold()
        )
    }

    fn help_for(code: &str) -> Option<&'static str> {
        match code {
            "E0001" => Some("arguments are variables (`x1`, `z2`, `y`), bare function names, or `(Name, arg, ...)`"),
            "E0002" => Some("a parenthesised call must start with the function name"),
            "E0003" => Some("check that every `(` has a matching `)` and arguments are separated by commas"),
            _ => None,
        }
    }
}
