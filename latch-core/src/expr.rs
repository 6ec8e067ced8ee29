//! Boolean expression evaluation for transition guards and validation rules.
//!
//! Expressions operate on a record's `data` payload plus a context map
//! exposing `current_state`, `version`, `is_deleted`, `created_at` and
//! `updated_at`. The language supports:
//!
//! - `data.field` - payload field access (truthy check)
//! - `data.field.nested` - nested field access
//! - `current_state` - context variable access
//! - `lhs == value` - equality (strings, numbers, booleans, null)
//! - `lhs != value` - inequality
//! - `lhs > value` - greater than (numbers)
//! - `lhs >= value` - greater or equal (numbers)
//! - `lhs < value` - less than (numbers)
//! - `lhs <= value` - less or equal (numbers)
//! - `!expr` - logical NOT
//! - `expr && expr` - logical AND (higher precedence than OR)
//! - `expr || expr` - logical OR
//! - `(expr)` - grouping for precedence control
//!
//! String literals accept single or double quotes. Evaluation is strict: a
//! referenced field that is absent, or an operand whose type does not fit
//! the operator, is an error rather than a silent `false`. Callers treat an
//! *absent* guard as always-permit; an empty expression string is rejected.
//!
//! Examples:
//! - `data.cpf != '' && data.rg != ''`
//! - `current_state == "CADASTRO_PENDENTE"`
//! - `data.limite.aprovado > 1000 || data.override`
//! - `!is_deleted && version >= 2`

use crate::error::CoreError;
use serde_json::Value;

/// A parsed boolean expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Field is truthy.
    Truthy(String),
    /// Equality comparison.
    Eq(String, Value),
    /// Inequality comparison.
    Ne(String, Value),
    /// Greater than.
    Gt(String, f64),
    /// Greater or equal.
    Ge(String, f64),
    /// Less than.
    Lt(String, f64),
    /// Less or equal.
    Le(String, f64),
    /// Logical AND.
    And(Box<Expr>, Box<Expr>),
    /// Logical OR.
    Or(Box<Expr>, Box<Expr>),
    /// Logical NOT.
    Not(Box<Expr>),
}

impl Expr {
    /// Parses an expression from a string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::CompileError {
                reason: "empty expression".to_string(),
            });
        }

        let mut parser = Parser::new(s);
        let expr = parser.parse_expr()?;
        parser.skip_whitespace();
        if parser.pos != s.len() {
            return Err(CoreError::CompileError {
                reason: format!("unexpected trailing input at offset {}", parser.pos),
            });
        }
        Ok(expr)
    }

    /// Evaluates the expression against a data payload and a context map.
    pub fn eval(&self, data: &Value, ctx: &Value) -> Result<bool, CoreError> {
        match self {
            Expr::Truthy(field) => Ok(is_truthy(&resolve(field, data, ctx)?)),
            Expr::Eq(field, expected) => Ok(values_equal(&resolve(field, data, ctx)?, expected)),
            Expr::Ne(field, expected) => Ok(!values_equal(&resolve(field, data, ctx)?, expected)),
            Expr::Gt(field, expected) => Ok(as_number(field, &resolve(field, data, ctx)?)? > *expected),
            Expr::Ge(field, expected) => Ok(as_number(field, &resolve(field, data, ctx)?)? >= *expected),
            Expr::Lt(field, expected) => Ok(as_number(field, &resolve(field, data, ctx)?)? < *expected),
            Expr::Le(field, expected) => Ok(as_number(field, &resolve(field, data, ctx)?)? <= *expected),
            Expr::And(left, right) => Ok(left.eval(data, ctx)? && right.eval(data, ctx)?),
            Expr::Or(left, right) => Ok(left.eval(data, ctx)? || right.eval(data, ctx)?),
            Expr::Not(inner) => Ok(!inner.eval(data, ctx)?),
        }
    }
}

/// Entry points used by the state machine and rule executors.
pub struct ExprEvaluator;

impl ExprEvaluator {
    /// Checks that an expression compiles and is boolean-valued, without
    /// evaluating it. Rejects empty input.
    pub fn validate(expression: &str) -> Result<(), CoreError> {
        // The grammar only produces boolean-valued expressions, so a
        // successful parse is also the type check.
        Expr::parse(expression).map(|_| ())
    }

    /// Compiles and evaluates an expression in one step.
    pub fn evaluate(expression: &str, data: &Value, ctx: &Value) -> Result<bool, CoreError> {
        Expr::parse(expression)?.eval(data, ctx)
    }
}

/// Resolves a field path against the data payload or the context map.
///
/// Paths rooted at `data.` traverse the payload; any other path is looked
/// up in the context map. Absent fields are an error.
fn resolve(path: &str, data: &Value, ctx: &Value) -> Result<Value, CoreError> {
    let (root, rest) = match path.strip_prefix("data.") {
        Some(rest) => (data, rest),
        None => (ctx, path),
    };

    let mut current = root;
    for part in rest.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part).ok_or_else(|| CoreError::EvalError {
                    reason: format!("field '{}' not found", path),
                })?;
            }
            _ => {
                return Err(CoreError::EvalError {
                    reason: format!("field '{}' is not traversable", path),
                })
            }
        }
    }

    Ok(current.clone())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .map(|(a, b)| (a - b).abs() < f64::EPSILON)
            .unwrap_or(false),
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

fn as_number(field: &str, value: &Value) -> Result<f64, CoreError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| CoreError::TypeError {
            reason: format!("field '{}' is not a finite number", field),
        }),
        other => Err(CoreError::TypeError {
            reason: format!(
                "field '{}' is not a number (got {})",
                field,
                type_name(other)
            ),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Simple recursive descent parser.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_expr(&mut self) -> Result<Expr, CoreError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, CoreError> {
        let mut left = self.parse_and()?;
        self.skip_whitespace();

        while self.peek_str("||") {
            self.pos += 2;
            self.skip_whitespace();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
            self.skip_whitespace();
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CoreError> {
        let mut left = self.parse_unary()?;
        self.skip_whitespace();

        while self.peek_str("&&") {
            self.pos += 2;
            self.skip_whitespace();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
            self.skip_whitespace();
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CoreError> {
        self.skip_whitespace();

        if self.peek_char() == Some('!') && !self.peek_str("!=") {
            self.pos += 1;
            self.skip_whitespace();
            let inner = self.parse_unary()?; // Recursive to allow !!data.a
            return Ok(Expr::Not(Box::new(inner)));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, CoreError> {
        self.skip_whitespace();

        if self.peek_char() == Some('(') {
            self.pos += 1;
            let expr = self.parse_expr()?;
            self.skip_whitespace();
            if self.peek_char() != Some(')') {
                return Err(CoreError::CompileError {
                    reason: "expected ')'".to_string(),
                });
            }
            self.pos += 1;
            return Ok(expr);
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, CoreError> {
        self.skip_whitespace();
        let field = self.parse_field()?;
        self.skip_whitespace();

        if self.peek_str("==") {
            self.pos += 2;
            self.skip_whitespace();
            let value = self.parse_value()?;
            return Ok(Expr::Eq(field, value));
        }

        if self.peek_str("!=") {
            self.pos += 2;
            self.skip_whitespace();
            let value = self.parse_value()?;
            return Ok(Expr::Ne(field, value));
        }

        if self.peek_str(">=") {
            self.pos += 2;
            self.skip_whitespace();
            let num = self.parse_number()?;
            return Ok(Expr::Ge(field, num));
        }

        if self.peek_str("<=") {
            self.pos += 2;
            self.skip_whitespace();
            let num = self.parse_number()?;
            return Ok(Expr::Le(field, num));
        }

        if self.peek_char() == Some('>') {
            self.pos += 1;
            self.skip_whitespace();
            let num = self.parse_number()?;
            return Ok(Expr::Gt(field, num));
        }

        if self.peek_char() == Some('<') {
            self.pos += 1;
            self.skip_whitespace();
            let num = self.parse_number()?;
            return Ok(Expr::Lt(field, num));
        }

        // No operator, just truthy check
        Ok(Expr::Truthy(field))
    }

    fn parse_field(&mut self) -> Result<String, CoreError> {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        let field = &self.input[start..self.pos];
        if field.is_empty() {
            return Err(CoreError::CompileError {
                reason: format!("expected field at offset {}", start),
            });
        }
        if field.starts_with('.') || field.ends_with('.') || field.contains("..") {
            return Err(CoreError::CompileError {
                reason: format!("malformed field path '{}'", field),
            });
        }

        Ok(field.to_string())
    }

    fn parse_value(&mut self) -> Result<Value, CoreError> {
        self.skip_whitespace();

        let rest = &self.input[self.pos..];

        if rest.starts_with("true") {
            self.pos += 4;
            return Ok(Value::Bool(true));
        }
        if rest.starts_with("false") {
            self.pos += 5;
            return Ok(Value::Bool(false));
        }
        if rest.starts_with("null") {
            self.pos += 4;
            return Ok(Value::Null);
        }

        if let Some(quote) = self.peek_char().filter(|c| *c == '"' || *c == '\'') {
            return self.parse_string_value(quote);
        }

        let num = self.parse_number()?;
        serde_json::Number::from_f64(num)
            .map(Value::Number)
            .ok_or_else(|| CoreError::CompileError {
                reason: "non-finite number literal".to_string(),
            })
    }

    fn parse_string_value(&mut self, quote: char) -> Result<Value, CoreError> {
        self.pos += 1;

        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == quote {
                let s = &self.input[start..self.pos];
                self.pos += 1;
                return Ok(Value::String(s.to_string()));
            }
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.peek_char() {
                    self.pos += escaped.len_utf8();
                }
            } else {
                self.pos += c.len_utf8();
            }
        }

        Err(CoreError::CompileError {
            reason: "unterminated string".to_string(),
        })
    }

    fn parse_number(&mut self) -> Result<f64, CoreError> {
        self.skip_whitespace();
        let start = self.pos;

        if self.peek_char() == Some('-') {
            self.pos += 1;
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }

        if self.peek_char() == Some('.') {
            self.pos += 1;
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| CoreError::CompileError {
            reason: format!("invalid number: '{}'", num_str),
        })
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Value {
        json!({
            "current_state": "CADASTRO_PENDENTE",
            "version": 3,
            "is_deleted": false,
            "created_at": "2026-01-10T12:00:00Z",
            "updated_at": "2026-01-12T09:30:00Z"
        })
    }

    #[test]
    fn test_truthy_check() {
        let expr = Expr::parse("data.enabled").unwrap();
        assert!(expr.eval(&json!({"enabled": true}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"enabled": false}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"enabled": null}), &ctx()).unwrap());
    }

    #[test]
    fn test_missing_field_is_error() {
        let expr = Expr::parse("data.enabled").unwrap();
        let err = expr.eval(&json!({}), &ctx()).unwrap_err();
        assert!(matches!(err, CoreError::EvalError { .. }));
    }

    #[test]
    fn test_context_variable() {
        let expr = Expr::parse("current_state == \"CADASTRO_PENDENTE\"").unwrap();
        assert!(expr.eval(&json!({}), &ctx()).unwrap());

        let expr = Expr::parse("version >= 3").unwrap();
        assert!(expr.eval(&json!({}), &ctx()).unwrap());

        let expr = Expr::parse("!is_deleted").unwrap();
        assert!(expr.eval(&json!({}), &ctx()).unwrap());
    }

    #[test]
    fn test_unknown_context_variable() {
        let expr = Expr::parse("deleted_at").unwrap();
        let err = expr.eval(&json!({}), &ctx()).unwrap_err();
        assert!(matches!(err, CoreError::EvalError { .. }));
    }

    #[test]
    fn test_equality_single_quotes() {
        let expr = Expr::parse("data.cpf != ''").unwrap();
        assert!(expr.eval(&json!({"cpf": "12345678901"}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"cpf": ""}), &ctx()).unwrap());
    }

    #[test]
    fn test_guard_scenario_cpf_rg() {
        let expr = Expr::parse("data.cpf != '' && data.rg != ''").unwrap();
        assert!(!expr.eval(&json!({"cpf": "", "rg": "123"}), &ctx()).unwrap());
        assert!(expr
            .eval(&json!({"cpf": "12345678901", "rg": "123"}), &ctx())
            .unwrap());
    }

    #[test]
    fn test_numeric_comparison() {
        let expr = Expr::parse("data.amount > 100").unwrap();
        assert!(expr.eval(&json!({"amount": 150}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"amount": 50}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"amount": 100}), &ctx()).unwrap());

        let expr = Expr::parse("data.amount >= 100").unwrap();
        assert!(expr.eval(&json!({"amount": 100}), &ctx()).unwrap());
    }

    #[test]
    fn test_comparison_on_non_number_is_type_error() {
        let expr = Expr::parse("data.amount > 100").unwrap();
        let err = expr.eval(&json!({"amount": "oops"}), &ctx()).unwrap_err();
        assert!(matches!(err, CoreError::TypeError { .. }));
    }

    #[test]
    fn test_logical_operators() {
        let expr = Expr::parse("data.a && data.b").unwrap();
        assert!(expr.eval(&json!({"a": true, "b": true}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"a": true, "b": false}), &ctx()).unwrap());

        let expr = Expr::parse("data.a || data.b").unwrap();
        assert!(expr.eval(&json!({"a": false, "b": true}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"a": false, "b": false}), &ctx()).unwrap());
    }

    #[test]
    fn test_precedence_and_grouping() {
        // && binds tighter than ||
        let expr = Expr::parse("data.a && data.b || data.c").unwrap();
        assert!(expr
            .eval(&json!({"a": false, "b": false, "c": true}), &ctx())
            .unwrap());
        assert!(!expr
            .eval(&json!({"a": true, "b": false, "c": false}), &ctx())
            .unwrap());

        let expr = Expr::parse("(data.a || data.b) && data.c").unwrap();
        assert!(!expr
            .eval(&json!({"a": true, "b": true, "c": false}), &ctx())
            .unwrap());
        assert!(expr
            .eval(&json!({"a": false, "b": true, "c": true}), &ctx())
            .unwrap());
    }

    #[test]
    fn test_not_with_parentheses() {
        let expr = Expr::parse("!(data.a && data.b)").unwrap();
        assert!(expr.eval(&json!({"a": true, "b": false}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"a": true, "b": true}), &ctx()).unwrap());
    }

    #[test]
    fn test_not_does_not_eat_inequality() {
        let expr = Expr::parse("data.status != 'closed'").unwrap();
        assert!(expr.eval(&json!({"status": "open"}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"status": "closed"}), &ctx()).unwrap());
    }

    #[test]
    fn test_nested_field() {
        let expr = Expr::parse("data.limite.aprovado > 1000").unwrap();
        assert!(expr
            .eval(&json!({"limite": {"aprovado": 5000}}), &ctx())
            .unwrap());
        assert!(!expr
            .eval(&json!({"limite": {"aprovado": 500}}), &ctx())
            .unwrap());
    }

    #[test]
    fn test_nested_field_through_non_object() {
        let expr = Expr::parse("data.limite.aprovado").unwrap();
        let err = expr.eval(&json!({"limite": 5}), &ctx()).unwrap_err();
        assert!(matches!(err, CoreError::EvalError { .. }));
    }

    #[test]
    fn test_equality_with_number_bool_null() {
        let expr = Expr::parse("data.count == 42").unwrap();
        assert!(expr.eval(&json!({"count": 42}), &ctx()).unwrap());

        let expr = Expr::parse("data.flag == false").unwrap();
        assert!(expr.eval(&json!({"flag": false}), &ctx()).unwrap());

        let expr = Expr::parse("data.value == null").unwrap();
        assert!(expr.eval(&json!({"value": null}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"value": 1}), &ctx()).unwrap());
    }

    #[test]
    fn test_negative_and_decimal_numbers() {
        let expr = Expr::parse("data.temp > -10").unwrap();
        assert!(expr.eval(&json!({"temp": 0}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"temp": -15}), &ctx()).unwrap());

        let expr = Expr::parse("data.rate >= 0.5").unwrap();
        assert!(expr.eval(&json!({"rate": 0.5}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"rate": 0.3}), &ctx()).unwrap());
    }

    #[test]
    fn test_non_ascii_field_names() {
        let expr = Expr::parse("data.endereço != ''").unwrap();
        assert!(expr.eval(&json!({"endereço": "Rua A, 1"}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"endereço": ""}), &ctx()).unwrap());

        let expr = Expr::parse("data.região == 'sudeste' && data.ação").unwrap();
        assert!(expr
            .eval(&json!({"região": "sudeste", "ação": true}), &ctx())
            .unwrap());
    }

    #[test]
    fn test_escaped_multibyte_in_string_literal() {
        // The escape skip must not split a multi-byte character
        let expr = Expr::parse("data.x == 'a\\é'").unwrap();
        assert!(expr.eval(&json!({"x": "a\\é"}), &ctx()).unwrap());
        assert!(!expr.eval(&json!({"x": "other"}), &ctx()).unwrap());
    }

    #[test]
    fn test_non_ascii_whitespace() {
        // U+00A0 between tokens
        let expr = Expr::parse("data.a\u{00A0}&& data.b").unwrap();
        assert!(expr.eval(&json!({"a": true, "b": true}), &ctx()).unwrap());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(ExprEvaluator::validate("").is_err());
        assert!(ExprEvaluator::validate("   ").is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(ExprEvaluator::validate("data.cpf != '' && data.rg != ''").is_ok());
        assert!(ExprEvaluator::validate("(data.a || data.b) && !is_deleted").is_ok());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Expr::parse("(data.a && data.b"),
            Err(CoreError::CompileError { .. })
        ));
        assert!(matches!(
            Expr::parse("data.name == \"unclosed"),
            Err(CoreError::CompileError { .. })
        ));
        assert!(matches!(
            Expr::parse("data.value > abc"),
            Err(CoreError::CompileError { .. })
        ));
        assert!(matches!(
            Expr::parse("data..x"),
            Err(CoreError::CompileError { .. })
        ));
        assert!(matches!(
            Expr::parse("data.a data.b"),
            Err(CoreError::CompileError { .. })
        ));
    }

    #[test]
    fn test_evaluate_one_shot() {
        assert!(
            ExprEvaluator::evaluate("data.ok", &json!({"ok": true}), &ctx()).unwrap()
        );
        assert!(
            !ExprEvaluator::evaluate("version < 3", &json!({}), &ctx()).unwrap()
        );
    }
}
