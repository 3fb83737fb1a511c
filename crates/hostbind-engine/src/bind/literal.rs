//! Default-value literals
//!
//! IDL argument defaults are written in the host's literal syntax:
//! `true`, `-1`, `0.5`, `inf`, `"text"`, `&"name"`, `^"path"`, `[]`, `{}`,
//! `Vector2(0, 0)`, `Array[int]([])`. Only value-type constructors are
//! callable; anything else is rejected.

use hostbind_sdk::{Variant, VariantType};
use logos::Logos;

use crate::error::{BindError, BindResult};
use crate::runtime::{BuiltinValue, Runtime, Value};
use crate::types::TypeInfo;

#[derive(Logos, Debug, Clone, PartialEq)]
enum LiteralToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[token("inf")]
    Inf,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    Float(f64),

    #[regex(r"[0-9]+", parse_int)]
    Int(i64),

    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    Str(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("&")]
    Amp,

    #[token("^")]
    Caret,

    #[token("-")]
    Minus,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,
}

fn parse_int(lex: &mut logos::Lexer<LiteralToken>) -> Option<i64> {
    lex.slice().parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<LiteralToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<LiteralToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Some(out)
}

// ============================================================================
// Syntax
// ============================================================================

/// Parsed literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StringName(String),
    NodePath(String),
    List(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
    /// `Type(args...)`
    Call { ty: String, args: Vec<Literal> },
}

/// Parse literal text.
pub fn parse_literal(text: &str) -> Result<Literal, String> {
    let mut tokens = Vec::new();
    for token in LiteralToken::lexer(text) {
        tokens.push(token.map_err(|_| "unexpected character".to_string())?);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let literal = parser.literal()?;
    if parser.pos != parser.tokens.len() {
        return Err("trailing input".to_string());
    }
    Ok(literal)
}

struct Parser {
    tokens: Vec<LiteralToken>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<LiteralToken> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&LiteralToken> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &LiteralToken) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: LiteralToken) -> Result<(), String> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(format!("expected {:?}", expected))
        }
    }

    fn literal(&mut self) -> Result<Literal, String> {
        match self.next() {
            Some(LiteralToken::True) => Ok(Literal::Bool(true)),
            Some(LiteralToken::False) => Ok(Literal::Bool(false)),
            Some(LiteralToken::Null) => Ok(Literal::Null),
            Some(LiteralToken::Inf) => Ok(Literal::Float(f64::INFINITY)),
            Some(LiteralToken::Int(v)) => Ok(Literal::Int(v)),
            Some(LiteralToken::Float(v)) => Ok(Literal::Float(v)),
            Some(LiteralToken::Str(s)) => Ok(Literal::Str(s)),
            Some(LiteralToken::Minus) => match self.next() {
                Some(LiteralToken::Int(v)) => Ok(Literal::Int(-v)),
                Some(LiteralToken::Float(v)) => Ok(Literal::Float(-v)),
                Some(LiteralToken::Inf) => Ok(Literal::Float(f64::NEG_INFINITY)),
                _ => Err("'-' must precede a number".to_string()),
            },
            Some(LiteralToken::Amp) => match self.next() {
                Some(LiteralToken::Str(s)) => Ok(Literal::StringName(s)),
                _ => Err("'&' must precede a string".to_string()),
            },
            Some(LiteralToken::Caret) => match self.next() {
                Some(LiteralToken::Str(s)) => Ok(Literal::NodePath(s)),
                _ => Err("'^' must precede a string".to_string()),
            },
            Some(LiteralToken::LeftBracket) => {
                let items = self.sequence(LiteralToken::RightBracket)?;
                Ok(Literal::List(items))
            }
            Some(LiteralToken::LeftBrace) => {
                let mut entries = Vec::new();
                while !self.eat(&LiteralToken::RightBrace) {
                    let key = self.literal()?;
                    self.expect(LiteralToken::Colon)?;
                    let value = self.literal()?;
                    entries.push((key, value));
                    if !self.eat(&LiteralToken::Comma) {
                        self.expect(LiteralToken::RightBrace)?;
                        break;
                    }
                }
                Ok(Literal::Dict(entries))
            }
            Some(LiteralToken::Ident(ty)) => {
                // `Array[T](...)` carries its element type in the declaration.
                if self.eat(&LiteralToken::LeftBracket) {
                    match self.next() {
                        Some(LiteralToken::Ident(_)) => {}
                        _ => return Err("expected element type".to_string()),
                    }
                    self.expect(LiteralToken::RightBracket)?;
                }
                self.expect(LiteralToken::LeftParen)?;
                let args = self.sequence(LiteralToken::RightParen)?;
                Ok(Literal::Call { ty, args })
            }
            Some(other) => Err(format!("unexpected {:?}", other)),
            None => Err("empty literal".to_string()),
        }
    }

    fn sequence(&mut self, close: LiteralToken) -> Result<Vec<Literal>, String> {
        let mut items = Vec::new();
        while !self.eat(&close) {
            items.push(self.literal()?);
            if !self.eat(&LiteralToken::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate a default literal for a parameter declared as `declared`.
pub fn evaluate_literal(rt: &mut Runtime, text: &str, declared: &TypeInfo) -> BindResult<Value> {
    let invalid = |reason: String| BindError::InvalidDefault {
        literal: text.to_string(),
        reason,
    };
    let literal = parse_literal(text).map_err(invalid)?;
    evaluate(rt, &literal, declared).map_err(|err| match err {
        BindError::InvalidDefault { .. } => err,
        other => invalid(other.to_string()),
    })
}

fn evaluate(rt: &mut Runtime, literal: &Literal, declared: &TypeInfo) -> BindResult<Value> {
    Ok(match literal {
        Literal::Null => Value::Nil,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(v) => match declared {
            TypeInfo::Builtin(VariantType::Float) => Value::Float(*v as f64),
            TypeInfo::Enum(name) | TypeInfo::Bitfield(name) => {
                rt.enum_member(name, *v).unwrap_or(Value::Int(*v))
            }
            _ => Value::Int(*v),
        },
        Literal::Float(v) => Value::Float(*v),
        Literal::Str(s) => match declared {
            TypeInfo::Builtin(VariantType::StringName) => string_like(rt, Variant::StringName(s.clone())),
            TypeInfo::Builtin(VariantType::NodePath) => string_like(rt, Variant::NodePath(s.clone())),
            _ => Value::Str(s.clone()),
        },
        Literal::StringName(s) => string_like(rt, Variant::StringName(s.clone())),
        Literal::NodePath(s) => string_like(rt, Variant::NodePath(s.clone())),
        Literal::List(items) => {
            let element = declared.element().cloned().unwrap_or(TypeInfo::Dynamic);
            let mut fields = Vec::with_capacity(items.len());
            for item in items {
                let value = evaluate(rt, item, &element)?;
                fields.push(rt.to_variant_as(&value, &element)?);
            }
            match declared {
                TypeInfo::Builtin(ty) if *ty != VariantType::Array => {
                    let id = rt.value_type_id(*ty);
                    Value::Builtin(BuiltinValue::new(id, Variant::compound(*ty, fields)))
                }
                TypeInfo::Array(_) => rt.from_variant(Variant::Array(fields), Some(declared))?,
                _ => rt.from_variant(Variant::Array(fields), None)?,
            }
        }
        Literal::Dict(entries) => {
            let mut pairs = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let key = evaluate(rt, key, &TypeInfo::Dynamic)?;
                let value = evaluate(rt, value, &TypeInfo::Dynamic)?;
                pairs.push((rt.to_variant(&key)?, rt.to_variant(&value)?));
            }
            rt.from_variant(Variant::Dictionary(pairs), None)?
        }
        Literal::Call { ty, args } => construct(rt, ty, args, declared)?,
    })
}

fn string_like(rt: &Runtime, variant: Variant) -> Value {
    let id = rt.value_type_id(variant.variant_type());
    Value::Builtin(BuiltinValue::new(id, variant))
}

fn construct(rt: &mut Runtime, ty: &str, args: &[Literal], declared: &TypeInfo) -> BindResult<Value> {
    let vt = VariantType::from_name(ty).ok_or_else(|| BindError::InvalidDefault {
        literal: ty.to_string(),
        reason: "not a value-type constructor".to_string(),
    })?;
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(rt, arg, &TypeInfo::Dynamic)?);
    }

    match (vt, values.as_slice()) {
        (VariantType::Bool, [v]) => return Ok(Value::Bool(v.as_int().unwrap_or(0) != 0)),
        (VariantType::Int, [v]) => return Ok(Value::Int(v.as_int().unwrap_or(0))),
        (VariantType::Float, [v]) => return Ok(Value::Float(v.as_float().unwrap_or(0.0))),
        (VariantType::String, [Value::Str(s)]) => return Ok(Value::Str(s.clone())),
        (VariantType::Array, []) | (VariantType::Array, [Value::Builtin(_)]) => {
            let items = match values.first().and_then(Value::builtin).map(BuiltinValue::get) {
                Some(Variant::Array(items)) => items,
                _ => Vec::new(),
            };
            let hint = match declared {
                TypeInfo::Array(_) => Some(declared),
                _ => None,
            };
            return rt.from_variant(Variant::Array(items), hint);
        }
        _ => {}
    }

    let id = rt.value_type_id(vt);
    match rt.construct(id, values.clone()) {
        Ok(value) => Ok(value),
        Err(BindError::NoMatchingOverload { .. }) if !values.is_empty() => {
            let grouped = group_components(rt, vt, values)?;
            rt.construct(id, grouped)
        }
        Err(err) => Err(err),
    }
}

/// Regroup flat scalar arguments into the type's row components, so
/// `Transform2D(1, 0, 0, 1, 0, 0)` becomes three `Vector2`s.
fn group_components(rt: &mut Runtime, vt: VariantType, flat: Vec<Value>) -> BindResult<Vec<Value>> {
    let record = rt.api().builtin_class(vt.name())?;
    let component = match record.indexing_return_type.as_deref() {
        Some(name) => name.to_string(),
        None if vt == VariantType::Transform3D => "Vector3".to_string(),
        None => {
            return Err(BindError::InvalidDefault {
                literal: vt.name().to_string(),
                reason: "no constructor accepts these arguments".to_string(),
            })
        }
    };
    let component_vt = VariantType::from_name(&component)
        .ok_or_else(|| BindError::UnknownType(component.clone()))?;
    let width = rt.api().builtin_class(&component)?.members.len();
    if width == 0 || flat.len() % width != 0 {
        return Err(BindError::InvalidDefault {
            literal: vt.name().to_string(),
            reason: format!("{} arguments do not group into {}", flat.len(), component),
        });
    }
    let component_id = rt.value_type_id(component_vt);
    let mut grouped = Vec::with_capacity(flat.len() / width);
    for chunk in flat.chunks(width) {
        grouped.push(rt.construct(component_id, chunk.to_vec())?);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(parse_literal("true").unwrap(), Literal::Bool(true));
        assert_eq!(parse_literal("null").unwrap(), Literal::Null);
        assert_eq!(parse_literal("-3").unwrap(), Literal::Int(-3));
        assert_eq!(parse_literal("0.5").unwrap(), Literal::Float(0.5));
        assert_eq!(parse_literal("1e3").unwrap(), Literal::Float(1000.0));
        assert_eq!(
            parse_literal("-inf").unwrap(),
            Literal::Float(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            parse_literal(r#""a\"b""#).unwrap(),
            Literal::Str("a\"b".into())
        );
        assert_eq!(
            parse_literal(r#"&"name""#).unwrap(),
            Literal::StringName("name".into())
        );
        assert_eq!(
            parse_literal(r#"^"a/b""#).unwrap(),
            Literal::NodePath("a/b".into())
        );
    }

    #[test]
    fn test_containers_and_calls() {
        assert_eq!(parse_literal("[]").unwrap(), Literal::List(vec![]));
        assert_eq!(parse_literal("{}").unwrap(), Literal::Dict(vec![]));
        assert_eq!(
            parse_literal("Vector2(0, -1.5)").unwrap(),
            Literal::Call {
                ty: "Vector2".into(),
                args: vec![Literal::Int(0), Literal::Float(-1.5)]
            }
        );
        assert_eq!(
            parse_literal("Array[RID]([])").unwrap(),
            Literal::Call {
                ty: "Array".into(),
                args: vec![Literal::List(vec![])]
            }
        );
        assert_eq!(
            parse_literal(r#"{"a": 1}"#).unwrap(),
            Literal::Dict(vec![(Literal::Str("a".into()), Literal::Int(1))])
        );
    }

    #[test]
    fn test_rejects_expressions() {
        assert!(parse_literal("1 + 2").is_err());
        assert!(parse_literal("foo").is_err());
        assert!(parse_literal("").is_err());
        assert!(parse_literal("Vector2(0, 0").is_err());
    }
}
