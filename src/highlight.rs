//! SQL syntax highlighting for the editor.
//!
//! Uses the sqlparser tokenizer with the generic dialect. The keyword table is
//! built once when the editor loads.

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::ALL_KEYWORDS;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use std::collections::HashSet;

/// Coarse token classes the editor colours differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Keyword,
    String,
    Number,
    Comment,
    Plain,
}

/// Splits SQL lines into classified fragments.
#[derive(Debug)]
pub struct SqlHighlighter {
    dialect: GenericDialect,
    keywords: HashSet<&'static str>,
}

impl Default for SqlHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlHighlighter {
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
            keywords: ALL_KEYWORDS.iter().copied().collect(),
        }
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word.to_uppercase().as_str())
    }

    /// Classifies one line of SQL.
    ///
    /// Fragment text is cut from `line` itself, so the fragments always join
    /// back to exactly what was typed. Lines the tokenizer rejects (an
    /// unterminated string while typing, for instance) come back as a single
    /// plain fragment.
    pub fn highlight_line(&self, line: &str) -> Vec<(TokenClass, String)> {
        let plain = || vec![(TokenClass::Plain, line.to_string())];
        let tokens = match Tokenizer::new(&self.dialect, line).tokenize_with_location() {
            Ok(tokens) => tokens,
            Err(_) => return plain(),
        };

        // Locations are 1-based char columns
        let chars: Vec<char> = line.chars().collect();
        let starts: Vec<usize> = tokens
            .iter()
            .map(|t| (t.location.column as usize).saturating_sub(1))
            .collect();

        let mut fragments: Vec<(TokenClass, String)> = Vec::new();
        for (i, located) in tokens.iter().enumerate() {
            if located.token == Token::EOF {
                continue;
            }
            let start = starts[i];
            let end = starts.get(i + 1).copied().unwrap_or(chars.len());
            if start > end || end > chars.len() {
                return plain();
            }
            let text: String = chars[start..end].iter().collect();
            let class = self.classify(&located.token);
            match fragments.last_mut() {
                Some((last, buf)) if *last == class => buf.push_str(&text),
                _ => fragments.push((class, text)),
            }
        }

        let shown: String = fragments.iter().map(|(_, t)| t.as_str()).collect();
        if shown != line {
            return plain();
        }
        fragments
    }

    fn classify(&self, token: &Token) -> TokenClass {
        match token {
            Token::Word(word) if word.quote_style.is_none() && self.is_keyword(&word.value) => {
                TokenClass::Keyword
            }
            Token::Number(_, _) => TokenClass::Number,
            Token::SingleQuotedString(_)
            | Token::NationalStringLiteral(_)
            | Token::EscapedStringLiteral(_) => TokenClass::String,
            Token::Whitespace(Whitespace::SingleLineComment { .. })
            | Token::Whitespace(Whitespace::MultiLineComment(_)) => TokenClass::Comment,
            _ => TokenClass::Plain,
        }
    }
}
