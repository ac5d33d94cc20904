//! Lexer (tokenizer) for filter expressions.

use std::fmt;

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// The `AND` operator (any case).
    And,
    /// The `OR` operator (any case).
    Or,
    /// Opening parenthesis `(`.
    OpenParen,
    /// Closing parenthesis `)`.
    CloseParen,
    /// Any other maximal run of non-space, non-parenthesis characters.
    Value(String),
}

impl Token {
    /// Returns true for `AND` and `OR`.
    pub fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or)
    }

    /// Binding strength of an operator; `AND` binds tighter than `OR`.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Token::And => Some(2),
            Token::Or => Some(1),
            _ => None,
        }
    }

    /// Returns the text of a value token.
    pub fn value(&self) -> Option<&str> {
        match self {
            Token::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Value(v) => f.write_str(v),
        }
    }
}

/// Trims the input and collapses every whitespace run to a single space.
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokenizes an expression.
///
/// The input should already be [`normalize`]d, but extra whitespace is
/// tolerated.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

fn is_paren(c: char) -> bool {
    c == '(' || c == ')'
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    /// Matches `word` (case-insensitive) at the cursor, but only when it is
    /// followed by the end of input, whitespace or a parenthesis.
    fn try_keyword(&mut self, word: &str) -> bool {
        let rest = self.rest();
        let Some(head) = rest.get(..word.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(word) {
            return false;
        }
        let bounded = rest[word.len()..]
            .chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || is_paren(c));
        if bounded {
            self.position += word.len();
        }
        bounded
    }

    /// Reads a value up to the next whitespace or parenthesis.
    fn read_value(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || is_paren(c))
            .unwrap_or(rest.len());
        self.position += end;
        rest[..end].to_string()
    }

    /// Returns the next token, or None at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let c = self.rest().chars().next()?;

        match c {
            '(' => {
                self.position += 1;
                Some(Token::OpenParen)
            }
            ')' => {
                self.position += 1;
                Some(Token::CloseParen)
            }
            _ if self.try_keyword("AND") => Some(Token::And),
            _ if self.try_keyword("OR") => Some(Token::Or),
            _ => Some(Token::Value(self.read_value())),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
