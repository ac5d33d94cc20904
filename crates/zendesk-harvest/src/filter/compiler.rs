//! Compiler from infix filter expressions to reverse-Polish form.
//!
//! # Grammar
//!
//! ```text
//! expr    = term { OR term }
//! term    = factor { AND factor }
//! factor  = VALUE | "(" expr ")"
//! ```
//!
//! The compiler does not check operator arity: `a AND` compiles, and the
//! evaluator fails such an expression closed.

use super::error::{FilterError, FilterResult};
use super::evaluator::evaluate;
use super::lexer::{normalize, tokenize, Token};

/// A compiled expression, reusable against any number of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpression {
    source: String,
    rpn: Vec<Token>,
}

impl CompiledExpression {
    /// The normalized source text (whitespace collapsed, original case).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The postfix token sequence.
    pub fn rpn(&self) -> &[Token] {
        &self.rpn
    }

    /// The postfix sequence rendered as space-separated tokens.
    pub fn rpn_string(&self) -> String {
        self.rpn
            .iter()
            .map(Token::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Evaluates the expression with `matcher` deciding each value.
    pub fn evaluate<F>(&self, matcher: F) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        evaluate(&self.rpn, matcher)
    }
}

/// Compiles `input` into a [`CompiledExpression`].
///
/// Every value token is case-folded first when `fold_case` is set and then
/// checked with `validator`; the first rejected value aborts compilation.
///
/// # Errors
///
/// - [`FilterError::EmptyExpression`] for blank input or input with no values
/// - [`FilterError::InvalidValue`] for the first value `validator` rejects
/// - [`FilterError::MismatchedParentheses`] for unbalanced grouping
pub fn compile<V>(input: &str, fold_case: bool, validator: V) -> FilterResult<CompiledExpression>
where
    V: Fn(&str) -> bool,
{
    let source = normalize(input);
    if source.is_empty() {
        return Err(FilterError::EmptyExpression);
    }

    let tokens: Vec<Token> = tokenize(&source)
        .into_iter()
        .map(|token| match token {
            Token::Value(v) if fold_case => Token::Value(v.to_lowercase()),
            other => other,
        })
        .collect();

    if let Some(bad) = tokens
        .iter()
        .filter_map(Token::value)
        .find(|value| !validator(value))
    {
        return Err(FilterError::invalid_value(bad));
    }

    let rpn = to_rpn(tokens)?;
    if !rpn.iter().any(|t| t.value().is_some()) {
        return Err(FilterError::EmptyExpression);
    }

    Ok(CompiledExpression { source, rpn })
}

/// Converts an infix token sequence to postfix (shunting-yard).
///
/// Operators of equal or higher precedence already on the stack are popped
/// before a new operator is pushed, so both operators are left-associative.
pub fn to_rpn(tokens: Vec<Token>) -> FilterResult<Vec<Token>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Value(_) => output.push(token),
            Token::And | Token::Or => {
                let precedence = token.precedence().unwrap_or(0);
                while let Some(top) = operators.last() {
                    match top.precedence() {
                        Some(p) if p >= precedence => {
                            if let Some(op) = operators.pop() {
                                output.push(op);
                            }
                        }
                        _ => break,
                    }
                }
                operators.push(token);
            }
            Token::OpenParen => operators.push(token),
            Token::CloseParen => loop {
                match operators.pop() {
                    Some(Token::OpenParen) => break,
                    Some(op) => output.push(op),
                    None => return Err(FilterError::MismatchedParentheses),
                }
            },
        }
    }

    while let Some(op) = operators.pop() {
        if matches!(op, Token::OpenParen | Token::CloseParen) {
            return Err(FilterError::MismatchedParentheses);
        }
        output.push(op);
    }

    Ok(output)
}
