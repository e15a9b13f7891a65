// Formula parser - converts formula source into an AST
// Supports: numbers, cell refs (A1), basic math (+, -, *, /), parentheses.
// Input arrives with the leading '=' already stripped by the grid.

use thiserror::Error;

/// Expression AST for a parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Cell reference, stored as its uppercase name ("A1").
    /// Resolution to a grid coordinate happens at dependency-resolution
    /// time, not at parse time.
    Variable(String),
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty formula")]
    Empty,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("invalid cell reference: {0}")]
    InvalidReference(String),
    #[error("expected a number, cell reference or '('")]
    ExpectedValue,
    #[error("missing closing parenthesis")]
    UnbalancedParens,
    #[error("unexpected trailing input")]
    TrailingInput,
}

/// Parse a formula (without the leading '=') into an AST.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let (expr, pos) = parse_add_sub(&tokens, 0)?;
    if pos != tokens.len() {
        return Err(ParseError::TrailingInput);
    }
    Ok(expr)
}

#[derive(Debug, Clone)]
enum Token {
    Number(f64),
    Variable(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                tokens.push(Token::Star);
                chars.next();
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            'A'..='Z' | 'a'..='z' => {
                // Cell reference: letters followed by digits
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !is_cell_name(&ident) {
                    return Err(ParseError::InvalidReference(ident));
                }
                tokens.push(Token::Variable(ident.to_ascii_uppercase()));
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(num_str.clone()))?;
                tokens.push(Token::Number(num));
            }
            _ => return Err(ParseError::UnexpectedChar(c)),
        }
    }

    Ok(tokens)
}

/// Letters then digits, nothing else (e.g. "A1", "b12").
fn is_cell_name(s: &str) -> bool {
    let letters = s.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
    letters > 0
        && letters < s.len()
        && s.bytes().skip(letters).all(|b| b.is_ascii_digit())
}

// Lowest precedence: + and -, left associative
fn parse_add_sub(tokens: &[Token], pos: usize) -> Result<(Expr, usize), ParseError> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        let (right, new_pos) = parse_mul_div(tokens, pos + 1)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

// * and / bind tighter than + and -
fn parse_mul_div(tokens: &[Token], pos: usize) -> Result<(Expr, usize), ParseError> {
    let (mut left, mut pos) = parse_factor(tokens, pos)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            _ => break,
        };
        let (right, new_pos) = parse_factor(tokens, pos + 1)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_factor(tokens: &[Token], pos: usize) -> Result<(Expr, usize), ParseError> {
    match tokens.get(pos) {
        Some(Token::Number(n)) => Ok((Expr::Number(*n), pos + 1)),
        Some(Token::Variable(name)) => Ok((Expr::Variable(name.clone()), pos + 1)),
        Some(Token::LParen) => {
            let (expr, new_pos) = parse_add_sub(tokens, pos + 1)?;
            match tokens.get(new_pos) {
                Some(Token::RParen) => Ok((expr, new_pos + 1)),
                _ => Err(ParseError::UnbalancedParens),
            }
        }
        _ => Err(ParseError::ExpectedValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse("42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse("3.5").unwrap(), Expr::Number(3.5));
    }

    #[test]
    fn test_parse_variable_normalizes_case() {
        assert_eq!(parse("a1").unwrap(), Expr::Variable("A1".to_string()));
        assert_eq!(parse("B12").unwrap(), Expr::Variable("B12".to_string()));
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse("1+2*3").unwrap();
        match expr {
            Expr::BinaryOp { op: Op::Add, left, right } => {
                assert_eq!(*left, Expr::Number(1.0));
                assert!(matches!(*right, Expr::BinaryOp { op: Op::Mul, .. }));
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_left_associative() {
        // 8 - 2 - 1 parses as (8 - 2) - 1
        let expr = parse("8-2-1").unwrap();
        match expr {
            Expr::BinaryOp { op: Op::Sub, left, right } => {
                assert!(matches!(*left, Expr::BinaryOp { op: Op::Sub, .. }));
                assert_eq!(*right, Expr::Number(1.0));
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_parens_override_precedence() {
        // (1 + 2) * 3
        let expr = parse("(1+2)*3").unwrap();
        match expr {
            Expr::BinaryOp { op: Op::Mul, left, right } => {
                assert!(matches!(*left, Expr::BinaryOp { op: Op::Add, .. }));
                assert_eq!(*right, Expr::Number(3.0));
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn test_parse_whitespace_skipped() {
        assert_eq!(parse(" A1 + 3 ").unwrap(), parse("A1+3").unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("1+"), Err(ParseError::ExpectedValue));
        assert_eq!(parse("(1+2"), Err(ParseError::UnbalancedParens));
        assert_eq!(parse("1 2"), Err(ParseError::TrailingInput));
        assert_eq!(parse("1+2)"), Err(ParseError::TrailingInput));
        assert_eq!(parse("#"), Err(ParseError::UnexpectedChar('#')));
        assert_eq!(
            parse("ABC"),
            Err(ParseError::InvalidReference("ABC".to_string()))
        );
        assert_eq!(
            parse("A1B"),
            Err(ParseError::InvalidReference("A1B".to_string()))
        );
        assert_eq!(
            parse("1.2.3"),
            Err(ParseError::InvalidNumber("1.2.3".to_string()))
        );
    }
}
