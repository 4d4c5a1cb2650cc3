//! Restricted arithmetic evaluator behind the `calculator` tool.
//!
//! Accepts numeric literals, `+ - * / % **`, unary sign, and parentheses.
//! Everything else (identifiers, calls, comparisons) is rejected rather than
//! evaluated, which keeps the operator set closed.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::ToolTrait;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
}

#[derive(Debug)]
pub enum CalcError {
    Unsupported,
    NonFinite,
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcError::Unsupported => write!(f, "unsupported expression"),
            CalcError::NonFinite => write!(f, "result is not a finite number"),
        }
    }
}

impl std::error::Error for CalcError {}

fn tokenize(expr: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Optional exponent part: `1e3`, `2.5e-2`, `1E+2`.
                if matches!(chars.peek(), Some(&'e') | Some(&'E')) {
                    literal.push('e');
                    chars.next();
                    if let Some(&sign) = chars.peek() {
                        if sign == '+' || sign == '-' {
                            literal.push(sign);
                            chars.next();
                        }
                    }
                    while let Some(&d) = chars.peek() {
                        if d.is_ascii_digit() {
                            literal.push(d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                let value: f64 = literal.parse().map_err(|_| CalcError::Unsupported)?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::DoubleStar);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            // Names, calls, comparisons, attribute access: all unsupported.
            _ => return Err(CalcError::Unsupported),
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser evaluating as it goes.
///
/// Grammar (Python operator precedence):
///   expr   := term (('+' | '-') term)*
///   term   := unary (('*' | '/' | '%') unary)*
///   unary  := ('+' | '-') unary | power
///   power  := atom ('**' unary)?          -- right-assoc, `-2**2 == -4`
///   atom   := number | '(' expr ')'
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek().cloned() {
            match op {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek().cloned() {
            match op {
                Token::Star => {
                    self.advance();
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.advance();
                    value /= self.unary()?;
                }
                Token::Percent => {
                    self.advance();
                    let rhs = self.unary()?;
                    // Floored modulo: the result takes the sign of the
                    // divisor, so `-7 % 3 == 2` and `7 % -3 == -2`.
                    value = ((value % rhs) + rhs) % rhs;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.unary()
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.unary()?)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(CalcError::Unsupported),
                }
            }
            _ => Err(CalcError::Unsupported),
        }
    }
}

/// Evaluate a restricted arithmetic expression.
pub fn eval_expr(expr: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(CalcError::Unsupported);
    }
    let mut parser = Parser::new(tokens);
    let value = parser.expr()?;
    if parser.peek().is_some() {
        // Trailing input, e.g. `1 2` or an unbalanced `)`.
        return Err(CalcError::Unsupported);
    }
    if !value.is_finite() {
        return Err(CalcError::NonFinite);
    }
    Ok(value)
}

/// Integral results render without a fractional part: `14`, not `14.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub struct CalculatorTool;

#[derive(Deserialize)]
struct CalculatorArgs {
    expression: String,
}

#[async_trait]
impl ToolTrait for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }
    fn description(&self) -> &str {
        "Evaluate a basic math expression (numbers and + - * / % ** with parentheses)."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "expression": { "type": "string" } },
            "required": ["expression"]
        })
    }
    async fn execute(
        &self,
        args: serde_json::Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let args: CalculatorArgs = serde_json::from_value(args)?;
        debug!("evaluating: {}", args.expression);
        match eval_expr(&args.expression) {
            Ok(value) => Ok(format_number(value)),
            Err(_) => Ok("error: unsupported expression".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(eval_expr("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval_expr("(2+3)*4").unwrap(), 20.0);
        assert_eq!(eval_expr("2 ** 10").unwrap(), 1024.0);
        assert_eq!(eval_expr("10 % 3").unwrap(), 1.0);
        assert_eq!(eval_expr("7 / 2").unwrap(), 3.5);
    }

    #[test]
    fn test_unary_and_power_interaction() {
        assert_eq!(eval_expr("-2 ** 2").unwrap(), -4.0);
        assert_eq!(eval_expr("(-2) ** 2").unwrap(), 4.0);
        assert_eq!(eval_expr("2 ** -1").unwrap(), 0.5);
        assert_eq!(eval_expr("--3").unwrap(), 3.0);
        assert_eq!(eval_expr("+5").unwrap(), 5.0);
    }

    #[test]
    fn test_right_associative_power() {
        assert_eq!(eval_expr("2 ** 3 ** 2").unwrap(), 512.0);
    }

    #[test]
    fn test_modulo_takes_sign_of_divisor() {
        assert_eq!(eval_expr("-7 % 3").unwrap(), 2.0);
        assert_eq!(eval_expr("7 % -3").unwrap(), -2.0);
        assert_eq!(eval_expr("-7 % -3").unwrap(), -1.0);
        assert!(eval_expr("1 % 0").is_err());
    }

    #[test]
    fn test_scientific_notation_literals() {
        assert_eq!(eval_expr("1e3").unwrap(), 1000.0);
        assert_eq!(eval_expr("2.5e-2").unwrap(), 0.025);
        assert_eq!(eval_expr("1E+2").unwrap(), 100.0);
        assert_eq!(eval_expr("1e3 + 1").unwrap(), 1001.0);
    }

    #[test]
    fn test_incomplete_exponent_rejected() {
        assert!(eval_expr("1e").is_err());
        assert!(eval_expr("1e+").is_err());
    }

    #[test]
    fn test_names_and_calls_rejected() {
        assert!(eval_expr("foo + 1").is_err());
        assert!(eval_expr("abs(-1)").is_err());
        assert!(eval_expr("1 < 2").is_err());
        assert!(eval_expr("x.y").is_err());
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(eval_expr("").is_err());
        assert!(eval_expr("1 +").is_err());
        assert!(eval_expr("(1 + 2").is_err());
        assert!(eval_expr("1 2").is_err());
        assert!(eval_expr("1.2.3").is_err());
    }

    #[test]
    fn test_division_by_zero_rejected() {
        assert!(eval_expr("1 / 0").is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(14.0), "14");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(1024.0), "1024");
    }

    #[tokio::test]
    async fn test_tool_boundary_returns_text() {
        let tool = CalculatorTool;
        let result = tool
            .execute(serde_json::json!({"expression": "2 + 3 * 4"}))
            .await
            .unwrap();
        assert_eq!(result, "14");

        let result = tool
            .execute(serde_json::json!({"expression": "import os"}))
            .await
            .unwrap();
        assert_eq!(result, "error: unsupported expression");
    }
}
