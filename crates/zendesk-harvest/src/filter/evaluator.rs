//! Stack evaluator for compiled expressions.

use super::lexer::Token;

/// Evaluates a postfix token sequence against one record.
///
/// `matcher` decides each value token. Malformed sequences fail closed:
/// an operator with fewer than two operands, a stray parenthesis, or an
/// empty stack all evaluate to `false`.
pub fn evaluate<F>(rpn: &[Token], mut matcher: F) -> bool
where
    F: FnMut(&str) -> bool,
{
    let mut stack: Vec<bool> = Vec::with_capacity(rpn.len());

    for token in rpn {
        match token {
            Token::Value(value) => stack.push(matcher(value)),
            Token::And | Token::Or => {
                let (Some(rhs), Some(lhs)) = (stack.pop(), stack.pop()) else {
                    return false;
                };
                stack.push(if *token == Token::And {
                    lhs && rhs
                } else {
                    lhs || rhs
                });
            }
            Token::OpenParen | Token::CloseParen => return false,
        }
    }

    stack.last().copied().unwrap_or(false)
}
