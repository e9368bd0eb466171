//! Narrow `${…}` expression templates for notification messages.
//!
//! Trigger title/body configuration strings contain expression holes that
//! are rendered against a JSON context, e.g.
//!
//! ```text
//! New ${container.updateKind.kind} found for container ${container.name}
//! ```
//!
//! The grammar is deliberately small — property paths, `&&`, the ternary
//! operator, `+` concatenation and a `length` pseudo-property — so
//! configuration can shape messages without gaining code execution:
//!
//! ```text
//! expression  := ternary
//! ternary     := logical_and ( "?" expression ":" expression )?
//! logical_and := concat ( "&&" concat )*
//! concat      := primary ( "+" primary )*
//! primary     := string | number | path | "(" expression ")"
//! path        := ident ( "." ident )*
//! ```
//!
//! `&&` and `?:` short-circuit with JS-like truthiness (null, false, `0`
//! and the empty string are falsey), which is what lets a template guard
//! an optional field:
//! `${container.result && container.result.link ? "\n" + container.result.link : ""}`.
//! A null expression result renders as the empty string. Errors (unknown
//! root field, selecting through a scalar, malformed syntax) propagate —
//! there is no silent fallback.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated `${{` expression at byte {0}")]
    UnterminatedExpression(usize),

    #[error("unterminated string literal at byte {0}")]
    UnterminatedString(usize),

    #[error("unexpected `{found}` at byte {at}")]
    Unexpected { at: usize, found: String },

    #[error("unexpected end of expression at byte {0}")]
    UnexpectedEnd(usize),

    #[error("unknown field `{0}` in template context")]
    UnknownField(String),

    #[error("cannot read `{segment}` of `{path}`: not an object")]
    NotAnObject { path: String, segment: String },
}

/// Render `template` against `context`, substituting every `${…}` hole.
pub fn render(template: &str, context: &Value) -> Result<String, TemplateError> {
    process(template, Some(context))
}

/// Parse every hole in `template` without evaluating anything.
///
/// Lets configuration validation reject malformed templates up front,
/// before a trigger ever fires.
pub fn validate(template: &str) -> Result<(), TemplateError> {
    process(template, None).map(|_| ())
}

/// Shared scan loop: literal text (with `\n`/`\t`/`\\` unescaped) is
/// copied through, expression holes are parsed and, when a context is
/// given, evaluated.
fn process(template: &str, context: Option<&Value>) -> Result<String, TemplateError> {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                let start = i + 2;
                let end = expression_end(template, start)
                    .ok_or(TemplateError::UnterminatedExpression(i))?;
                let expr = parse(&template[start..end], start)?;
                if let Some(context) = context {
                    out.push_str(&stringify(&expr.evaluate(context)?));
                }
                i = end + 1;
            }
            b'\\' => {
                match bytes.get(i + 1) {
                    Some(b'n') => {
                        out.push('\n');
                        i += 2;
                    }
                    Some(b't') => {
                        out.push('\t');
                        i += 2;
                    }
                    Some(b'\\') => {
                        out.push('\\');
                        i += 2;
                    }
                    _ => {
                        out.push('\\');
                        i += 1;
                    }
                }
            }
            _ => {
                let rest = &template[i..];
                let stop = rest
                    .find(['$', '\\'])
                    .map(|offset| if offset == 0 { 1 } else { offset })
                    .unwrap_or(rest.len());
                out.push_str(&rest[..stop]);
                i += stop;
            }
        }
    }
    Ok(out)
}

/// Byte index of the `}` closing the expression that starts at `start`,
/// skipping braces inside string literals.
fn expression_end(template: &str, start: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in template[start..].char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '}' => return Some(start + i),
                _ => {}
            },
        }
    }
    None
}

#[derive(Debug, Clone)]
enum Expr {
    Str(String),
    Number(f64),
    Path(Vec<String>),
    And(Box<Expr>, Box<Expr>),
    Concat(Box<Expr>, Box<Expr>),
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    fn evaluate(&self, context: &Value) -> Result<Value, TemplateError> {
        match self {
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Number(n) => Ok(serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null)),
            Expr::Path(segments) => resolve_path(context, segments),
            Expr::And(left, right) => {
                let value = left.evaluate(context)?;
                if truthy(&value) {
                    right.evaluate(context)
                } else {
                    Ok(value)
                }
            }
            Expr::Concat(left, right) => {
                let left = left.evaluate(context)?;
                let right = right.evaluate(context)?;
                match (left.as_f64(), right.as_f64()) {
                    (Some(a), Some(b)) if left.is_number() && right.is_number() => {
                        Ok(serde_json::Number::from_f64(a + b)
                            .map(Value::Number)
                            .unwrap_or(Value::Null))
                    }
                    _ => Ok(Value::String(format!(
                        "{}{}",
                        stringify(&left),
                        stringify(&right)
                    ))),
                }
            }
            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if truthy(&cond.evaluate(context)?) {
                    then.evaluate(context)
                } else {
                    otherwise.evaluate(context)
                }
            }
        }
    }
}

/// Walk a dotted path through the context.
///
/// The root identifier must exist; a missing key on an object yields
/// null (so `&&` guards work); selecting through null or a scalar is an
/// error; `length` yields array/string length.
fn resolve_path(context: &Value, segments: &[String]) -> Result<Value, TemplateError> {
    let root = &segments[0];
    let mut current = context
        .get(root)
        .cloned()
        .ok_or_else(|| TemplateError::UnknownField(root.clone()))?;
    let mut path = root.clone();
    for segment in &segments[1..] {
        if segment == "length" {
            if let Value::Array(items) = &current {
                current = Value::from(items.len());
                path.push_str(".length");
                continue;
            }
            if let Value::String(s) = &current {
                current = Value::from(s.chars().count());
                path.push_str(".length");
                continue;
            }
        }
        current = match &current {
            Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
            _ => {
                return Err(TemplateError::NotAnObject {
                    path,
                    segment: segment.clone(),
                })
            }
        };
        path.push('.');
        path.push_str(segment);
    }
    Ok(current)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Final rendering of an evaluated expression.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9e15 => format!("{}", f as i64),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Number(f64),
    Ident(String),
    Question,
    Colon,
    AndAnd,
    Plus,
    Dot,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Str(s) => format!("\"{s}\""),
            Token::Number(n) => n.to_string(),
            Token::Ident(s) => s.clone(),
            Token::Question => "?".into(),
            Token::Colon => ":".into(),
            Token::AndAnd => "&&".into(),
            Token::Plus => "+".into(),
            Token::Dot => ".".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

/// Tokenize an expression hole. `offset` is the hole's byte position in
/// the whole template, used for error reporting only.
fn lex(source: &str, offset: usize) -> Result<Vec<(usize, Token)>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at = offset + i;
        match c {
            c if c.is_whitespace() => {}
            '?' => tokens.push((at, Token::Question)),
            ':' => tokens.push((at, Token::Colon)),
            '+' => tokens.push((at, Token::Plus)),
            '.' => tokens.push((at, Token::Dot)),
            '(' => tokens.push((at, Token::LParen)),
            ')' => tokens.push((at, Token::RParen)),
            '&' => match chars.peek() {
                Some((_, '&')) => {
                    chars.next();
                    tokens.push((at, Token::AndAnd));
                }
                _ => {
                    return Err(TemplateError::Unexpected {
                        at,
                        found: "&".into(),
                    })
                }
            },
            '\'' | '"' => {
                let mut literal = String::new();
                let mut closed = false;
                while let Some((_, sc)) = chars.next() {
                    match sc {
                        '\\' => match chars.next() {
                            Some((_, 'n')) => literal.push('\n'),
                            Some((_, 't')) => literal.push('\t'),
                            Some((_, esc)) => literal.push(esc),
                            None => break,
                        },
                        sc if sc == c => {
                            closed = true;
                            break;
                        }
                        sc => literal.push(sc),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnterminatedString(at));
                }
                tokens.push((at, Token::Str(literal)));
            }
            c if c.is_ascii_digit() => {
                let mut literal = String::from(c);
                while let Some((_, nc)) = chars.peek() {
                    if nc.is_ascii_digit() || *nc == '.' {
                        literal.push(*nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = literal.parse().map_err(|_| TemplateError::Unexpected {
                    at,
                    found: literal.clone(),
                })?;
                tokens.push((at, Token::Number(number)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some((_, nc)) = chars.peek() {
                    if nc.is_alphanumeric() || *nc == '_' {
                        ident.push(*nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((at, Token::Ident(ident)));
            }
            other => {
                return Err(TemplateError::Unexpected {
                    at,
                    found: other.to_string(),
                })
            }
        }
    }
    Ok(tokens)
}

fn parse(source: &str, offset: usize) -> Result<Expr, TemplateError> {
    let tokens = lex(source, offset)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: offset + source.len(),
    };
    let expr = parser.expression()?;
    match parser.advance() {
        None => Ok(expr),
        Some((at, token)) => Err(TemplateError::Unexpected {
            at,
            found: token.describe(),
        }),
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> Result<(), TemplateError> {
        match self.advance() {
            Some((_, token)) if token == *expected => Ok(()),
            Some((at, token)) => Err(TemplateError::Unexpected {
                at,
                found: token.describe(),
            }),
            None => Err(TemplateError::UnexpectedEnd(self.end)),
        }
    }

    fn expression(&mut self) -> Result<Expr, TemplateError> {
        let cond = self.logical_and()?;
        if self.peek() == Some(&Token::Question) {
            self.advance();
            let then = self.expression()?;
            self.eat(&Token::Colon)?;
            let otherwise = self.expression()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(cond)
    }

    fn logical_and(&mut self) -> Result<Expr, TemplateError> {
        let mut left = self.concat()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.advance();
            let right = self.concat()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn concat(&mut self) -> Result<Expr, TemplateError> {
        let mut left = self.primary()?;
        while self.peek() == Some(&Token::Plus) {
            self.advance();
            let right = self.primary()?;
            left = Expr::Concat(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, TemplateError> {
        match self.advance() {
            Some((_, Token::Str(s))) => Ok(Expr::Str(s)),
            Some((_, Token::Number(n))) => Ok(Expr::Number(n)),
            Some((_, Token::Ident(first))) => {
                let mut segments = vec![first];
                while self.peek() == Some(&Token::Dot) {
                    self.advance();
                    match self.advance() {
                        Some((_, Token::Ident(segment))) => segments.push(segment),
                        Some((at, token)) => {
                            return Err(TemplateError::Unexpected {
                                at,
                                found: token.describe(),
                            })
                        }
                        None => return Err(TemplateError::UnexpectedEnd(self.end)),
                    }
                }
                Ok(Expr::Path(segments))
            }
            Some((_, Token::LParen)) => {
                let inner = self.expression()?;
                self.eat(&Token::RParen)?;
                Ok(inner)
            }
            Some((at, token)) => Err(TemplateError::Unexpected {
                at,
                found: token.describe(),
            }),
            None => Err(TemplateError::UnexpectedEnd(self.end)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_passes_through() {
        let out = render("no holes here", &json!({})).unwrap();
        assert_eq!(out, "no holes here");
    }

    #[test]
    fn text_escapes_are_unescaped() {
        let out = render("line\\nbreak\\tand \\\\slash", &json!({})).unwrap();
        assert_eq!(out, "line\nbreak\tand \\slash");
    }

    #[test]
    fn renders_simple_path() {
        let context = json!({ "container": { "name": "nginx" } });
        let out = render("Container ${container.name} updated", &context).unwrap();
        assert_eq!(out, "Container nginx updated");
    }

    #[test]
    fn renders_array_length() {
        let context = json!({ "containers": [1, 2, 3] });
        let out = render("${containers.length} updates available", &context).unwrap();
        assert_eq!(out, "3 updates available");
    }

    #[test]
    fn guard_renders_link_when_present() {
        let context = json!({ "container": { "result": { "link": "https://x/y" } } });
        let template =
            r#"${container.result && container.result.link ? "\n" + container.result.link : ""}"#;
        assert_eq!(render(template, &context).unwrap(), "\nhttps://x/y");
    }

    #[test]
    fn guard_short_circuits_when_result_absent() {
        let context = json!({ "container": { "name": "nginx" } });
        let template =
            r#"${container.result && container.result.link ? "\n" + container.result.link : ""}"#;
        assert_eq!(render(template, &context).unwrap(), "");
    }

    #[test]
    fn missing_object_key_renders_empty() {
        let context = json!({ "container": { "name": "nginx" } });
        assert_eq!(render("${container.missing}", &context).unwrap(), "");
    }

    #[test]
    fn unknown_root_is_an_error() {
        let err = render("${containers.length}", &json!({ "container": {} })).unwrap_err();
        assert_eq!(err, TemplateError::UnknownField("containers".into()));
    }

    #[test]
    fn selecting_through_scalar_is_an_error() {
        let context = json!({ "container": { "name": "nginx" } });
        let err = render("${container.name.link}", &context).unwrap_err();
        assert_eq!(
            err,
            TemplateError::NotAnObject {
                path: "container.name".into(),
                segment: "link".into(),
            }
        );
    }

    #[test]
    fn string_length_is_supported() {
        let context = json!({ "container": { "name": "nginx" } });
        assert_eq!(render("${container.name.length}", &context).unwrap(), "5");
    }

    #[test]
    fn numbers_add_and_strings_concatenate() {
        let context = json!({ "a": 1, "b": 2, "s": "x" });
        assert_eq!(render("${a + b}", &context).unwrap(), "3");
        assert_eq!(render("${s + a}", &context).unwrap(), "x1");
        assert_eq!(render("${'pre-' + s}", &context).unwrap(), "pre-x");
    }

    #[test]
    fn unterminated_expression_is_an_error() {
        let err = render("broken ${container.name", &json!({})).unwrap_err();
        assert_eq!(err, TemplateError::UnterminatedExpression(7));
    }

    #[test]
    fn dangling_quote_swallows_the_closing_brace() {
        let err = validate(r#"${"dangling}"#).unwrap_err();
        assert!(matches!(err, TemplateError::UnterminatedExpression(_)));
    }

    #[test]
    fn validate_accepts_the_default_templates() {
        validate("New ${container.updateKind.kind} found for container ${container.name}")
            .unwrap();
        validate(
            "Container ${container.name} running with ${container.updateKind.kind} \
             ${container.updateKind.localValue} can be updated to \
             ${container.updateKind.kind} ${container.updateKind.remoteValue}\
             ${container.result && container.result.link ? \"\\n\" + container.result.link : \"\"}",
        )
        .unwrap();
        validate("${containers.length} updates available").unwrap();
    }

    #[test]
    fn validate_rejects_malformed_expressions() {
        assert!(validate("${container.}").is_err());
        assert!(validate("${container.name ?}").is_err());
        assert!(validate("${a | b}").is_err());
    }

    #[test]
    fn parenthesized_expressions() {
        let context = json!({ "a": 0, "b": "fallback" });
        assert_eq!(render("${(a && b) ? 'y' : 'n'}", &context).unwrap(), "n");
    }
}
