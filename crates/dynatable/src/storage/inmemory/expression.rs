//! A small evaluator for the expression strings the in-memory store accepts.
//!
//! Only top-level attribute paths are understood. Supported forms:
//!
//! - conditions and filters: comparisons (`=`, `<>`, `<`, `<=`, `>`, `>=`),
//!   `BETWEEN`, `attribute_exists`, `attribute_not_exists`, `begins_with`,
//!   `contains`, joined with `AND`, `OR`, `NOT` and parentheses
//! - key conditions: `hash = :v`, optionally `AND` one range predicate
//! - updates: `SET` (with `+`, `-` and `if_not_exists`), `REMOVE`, `ADD`,
//!   `DELETE`
//! - projections: comma-separated attribute paths
//!
//! Number arithmetic is exact for integers that fit `i128`. Anything else
//! (fractions, larger magnitudes) goes through `f64`, so `0.1 + 0.2` stores
//! `0.30000000000000004` where DynamoDB's decimal arithmetic gives `0.3`.
//! Comparisons also go through `f64` and fall back to the text on ties, so
//! integers above 2^53 of equal length still order numerically.

use std::cmp::Ordering;

use thiserror::Error;

use dynatable_core::{
    AttributeError, AttributeMap, AttributeValue, ExpressionAttributes, KeySchema, StoreError,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Invalid expression: {0}")]
    Syntax(String),
    #[error("An expression attribute name used in the document path is not defined; attribute name: {0}")]
    UndefinedName(String),
    #[error("An expression attribute value used in expression is not defined; attribute value: {0}")]
    UndefinedValue(String),
    #[error("{0}")]
    Invalid(String),
}

impl From<ExpressionError> for StoreError {
    fn from(err: ExpressionError) -> Self {
        StoreError::new(StoreError::VALIDATION, err.to_string())
    }
}

impl From<AttributeError> for ExpressionError {
    fn from(err: AttributeError) -> Self {
        ExpressionError::Invalid(err.to_string())
    }
}

type Result<T> = std::result::Result<T, ExpressionError>;

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Name(String),
    Value(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Op("="));
                i += 1;
            }
            '+' => {
                tokens.push(Token::Op("+"));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Op("-"));
                i += 1;
            }
            '<' => match chars.get(i + 1) {
                Some('=') => {
                    tokens.push(Token::Op("<="));
                    i += 2;
                }
                Some('>') => {
                    tokens.push(Token::Op("<>"));
                    i += 2;
                }
                _ => {
                    tokens.push(Token::Op("<"));
                    i += 1;
                }
            },
            '>' => match chars.get(i + 1) {
                Some('=') => {
                    tokens.push(Token::Op(">="));
                    i += 2;
                }
                _ => {
                    tokens.push(Token::Op(">"));
                    i += 1;
                }
            },
            '#' | ':' => {
                let start = i;
                i += 1;
                while i < chars.len() && is_word(chars[i]) {
                    i += 1;
                }
                if i == start + 1 {
                    return Err(ExpressionError::Syntax(format!(
                        "empty placeholder at position {start}"
                    )));
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(if c == '#' {
                    Token::Name(word)
                } else {
                    Token::Value(word)
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (is_word(chars[i]) || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(ExpressionError::Syntax(format!(
                    "unexpected character {other:?} at position {i}"
                )))
            }
        }
    }

    Ok(tokens)
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Path(String),
    Value(AttributeValue),
    IfNotExists(String, Box<Operand>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    fn from_op(op: &str) -> Option<Self> {
        Some(match op {
            "=" => Comparator::Eq,
            "<>" => Comparator::Ne,
            "<" => Comparator::Lt,
            "<=" => Comparator::Le,
            ">" => Comparator::Gt,
            ">=" => Comparator::Ge,
            _ => return None,
        })
    }
}

/// A parsed condition, filter or key condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Operand, Comparator, Operand),
    Between(Operand, Operand, Operand),
    BeginsWith(Operand, Operand),
    Contains(Operand, Operand),
    Exists(String),
    NotExists(String),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

#[derive(Debug, Clone, PartialEq)]
enum SetValue {
    Operand(Operand),
    Sum(Operand, Operand),
    Difference(Operand, Operand),
}

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Set(String, SetValue),
    Remove(String),
    Add(String, AttributeValue),
    Delete(String, AttributeValue),
}

/// A parsed update expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    actions: Vec<Action>,
}

/// A parsed key condition: the partition to read and an optional range
/// predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub hash: AttributeValue,
    pub range: Option<Condition>,
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    attributes: &'a ExpressionAttributes,
}

impl<'a> Parser<'a> {
    fn new(input: &str, attributes: &'a ExpressionAttributes) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(input)?,
            pos: 0,
            attributes,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.at_keyword(keyword);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(unexpected(other.as_ref(), &format!("{expected:?}"))),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(unexpected(self.peek(), keyword))
        }
    }

    fn finish(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            token => Err(unexpected(token, "end of expression")),
        }
    }

    fn path(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            Some(Token::Name(placeholder)) => self
                .attributes
                .names
                .get(&placeholder)
                .cloned()
                .ok_or(ExpressionError::UndefinedName(placeholder)),
            other => Err(unexpected(other.as_ref(), "an attribute path")),
        }
    }

    fn value(&mut self) -> Result<AttributeValue> {
        match self.next() {
            Some(Token::Value(placeholder)) => self
                .attributes
                .values
                .get(&placeholder)
                .cloned()
                .ok_or(ExpressionError::UndefinedValue(placeholder)),
            other => Err(unexpected(other.as_ref(), "a value placeholder")),
        }
    }

    fn operand(&mut self) -> Result<Operand> {
        match self.peek() {
            Some(Token::Value(_)) => self.value().map(Operand::Value),
            _ => self.path().map(Operand::Path),
        }
    }

    fn condition(&mut self) -> Result<Condition> {
        let mut left = self.conjunction()?;
        while self.eat_keyword("OR") {
            let right = self.conjunction()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn conjunction(&mut self) -> Result<Condition> {
        let mut left = self.negation()?;
        while self.eat_keyword("AND") {
            let right = self.negation()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn negation(&mut self) -> Result<Condition> {
        if self.eat_keyword("NOT") {
            return Ok(Condition::Not(Box::new(self.negation()?)));
        }
        self.predicate()
    }

    fn predicate(&mut self) -> Result<Condition> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.condition()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }

        if let (Some(Token::Ident(function)), Some(Token::LParen)) = (self.peek(), self.peek_second())
        {
            let function = function.to_ascii_lowercase();
            self.pos += 2;
            let condition = match function.as_str() {
                "attribute_exists" => Condition::Exists(self.path()?),
                "attribute_not_exists" => Condition::NotExists(self.path()?),
                "begins_with" | "contains" => {
                    let subject = self.operand()?;
                    self.expect(Token::Comma)?;
                    let operand = self.operand()?;
                    if function == "begins_with" {
                        Condition::BeginsWith(subject, operand)
                    } else {
                        Condition::Contains(subject, operand)
                    }
                }
                other => {
                    return Err(ExpressionError::Syntax(format!(
                        "unsupported function {other:?}"
                    )))
                }
            };
            self.expect(Token::RParen)?;
            return Ok(condition);
        }

        let left = self.operand()?;
        if self.eat_keyword("BETWEEN") {
            let low = self.operand()?;
            self.expect_keyword("AND")?;
            let high = self.operand()?;
            return Ok(Condition::Between(left, low, high));
        }

        match self.next() {
            Some(Token::Op(op)) => {
                let comparator = Comparator::from_op(op)
                    .ok_or_else(|| ExpressionError::Syntax(format!("unexpected operator {op}")))?;
                let right = self.operand()?;
                Ok(Condition::Compare(left, comparator, right))
            }
            other => Err(unexpected(other.as_ref(), "a comparator")),
        }
    }

    fn update(&mut self) -> Result<UpdateExpression> {
        let mut actions = Vec::new();

        while self.peek().is_some() {
            let clause = match self.next() {
                Some(Token::Ident(word)) => word.to_ascii_uppercase(),
                other => return Err(unexpected(other.as_ref(), "SET, REMOVE, ADD or DELETE")),
            };

            loop {
                let action = match clause.as_str() {
                    "SET" => {
                        let path = self.path()?;
                        self.expect(Token::Op("="))?;
                        Action::Set(path, self.set_value()?)
                    }
                    "REMOVE" => Action::Remove(self.path()?),
                    "ADD" => {
                        let path = self.path()?;
                        Action::Add(path, self.value()?)
                    }
                    "DELETE" => {
                        let path = self.path()?;
                        Action::Delete(path, self.value()?)
                    }
                    other => {
                        return Err(ExpressionError::Syntax(format!(
                            "unknown update clause {other:?}"
                        )))
                    }
                };
                actions.push(action);

                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }

        if actions.is_empty() {
            return Err(ExpressionError::Syntax("empty update expression".to_string()));
        }
        Ok(UpdateExpression { actions })
    }

    fn set_value(&mut self) -> Result<SetValue> {
        let left = self.set_operand()?;
        match self.peek() {
            Some(Token::Op("+")) => {
                self.pos += 1;
                Ok(SetValue::Sum(left, self.set_operand()?))
            }
            Some(Token::Op("-")) => {
                self.pos += 1;
                Ok(SetValue::Difference(left, self.set_operand()?))
            }
            _ => Ok(SetValue::Operand(left)),
        }
    }

    fn set_operand(&mut self) -> Result<Operand> {
        let is_function = matches!(
            (self.peek(), self.peek_second()),
            (Some(Token::Ident(word)), Some(Token::LParen)) if word.eq_ignore_ascii_case("if_not_exists")
        );
        if !is_function {
            return self.operand();
        }

        self.pos += 2;
        let path = self.path()?;
        self.expect(Token::Comma)?;
        let fallback = self.set_operand()?;
        self.expect(Token::RParen)?;
        Ok(Operand::IfNotExists(path, Box::new(fallback)))
    }

    fn projection(&mut self) -> Result<Vec<String>> {
        let mut paths = vec![self.path()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            paths.push(self.path()?);
        }
        Ok(paths)
    }
}

fn unexpected(found: Option<&Token>, expected: &str) -> ExpressionError {
    match found {
        Some(token) => ExpressionError::Syntax(format!("expected {expected}, found {token:?}")),
        None => ExpressionError::Syntax(format!("expected {expected}, found end of expression")),
    }
}

// ============================================================================
// Entry points
// ============================================================================

pub fn parse_condition(input: &str, attributes: &ExpressionAttributes) -> Result<Condition> {
    let mut parser = Parser::new(input, attributes)?;
    let condition = parser.condition()?;
    parser.finish()?;
    Ok(condition)
}

pub fn parse_update(input: &str, attributes: &ExpressionAttributes) -> Result<UpdateExpression> {
    let mut parser = Parser::new(input, attributes)?;
    let update = parser.update()?;
    parser.finish()?;
    Ok(update)
}

pub fn parse_projection(input: &str, attributes: &ExpressionAttributes) -> Result<Vec<String>> {
    let mut parser = Parser::new(input, attributes)?;
    let paths = parser.projection()?;
    parser.finish()?;
    Ok(paths)
}

/// Parses a key condition and checks it against the table's key schema.
pub fn parse_key_condition(
    input: &str,
    attributes: &ExpressionAttributes,
    schema: &KeySchema,
) -> Result<KeyCondition> {
    let mut parts = Vec::new();
    flatten_and(parse_condition(input, attributes)?, &mut parts)?;

    let hash_name = &schema.hash_key().name;
    let range_name = schema.range_key().map(|r| r.name.as_str());
    let mut hash = None;
    let mut range = None;

    for part in parts {
        if let Some(value) = hash_equality(&part, hash_name) {
            if hash.replace(value).is_some() {
                return Err(invalid_key_condition("hash key given more than once"));
            }
            continue;
        }
        match range_name {
            Some(name) if is_range_predicate(&part, name) && range.is_none() => {
                range = Some(part);
            }
            _ => {
                return Err(ExpressionError::Invalid(
                    "Query key condition not supported".to_string(),
                ))
            }
        }
    }

    let hash = hash.ok_or_else(|| {
        ExpressionError::Invalid(format!(
            "Query condition missed key schema element: {hash_name}"
        ))
    })?;
    if !schema.hash_key().key_type.matches(&hash) {
        return Err(ExpressionError::Invalid(
            "One or more parameter values were invalid: Condition parameter type does not match schema type"
                .to_string(),
        ));
    }

    Ok(KeyCondition { hash, range })
}

fn flatten_and(condition: Condition, parts: &mut Vec<Condition>) -> Result<()> {
    match condition {
        Condition::And(left, right) => {
            flatten_and(*left, parts)?;
            flatten_and(*right, parts)
        }
        Condition::Or(..) | Condition::Not(..) => Err(invalid_key_condition(
            "only AND may join key conditions",
        )),
        other => {
            parts.push(other);
            Ok(())
        }
    }
}

fn invalid_key_condition(reason: &str) -> ExpressionError {
    ExpressionError::Invalid(format!("Invalid KeyConditionExpression: {reason}"))
}

fn hash_equality(condition: &Condition, hash_name: &str) -> Option<AttributeValue> {
    match condition {
        Condition::Compare(Operand::Path(path), Comparator::Eq, Operand::Value(value))
        | Condition::Compare(Operand::Value(value), Comparator::Eq, Operand::Path(path))
            if path == hash_name =>
        {
            Some(value.clone())
        }
        _ => None,
    }
}

fn is_range_predicate(condition: &Condition, range_name: &str) -> bool {
    match condition {
        Condition::Compare(Operand::Path(path), comparator, Operand::Value(_)) => {
            path == range_name && *comparator != Comparator::Ne
        }
        Condition::Between(Operand::Path(path), Operand::Value(_), Operand::Value(_))
        | Condition::BeginsWith(Operand::Path(path), Operand::Value(_)) => path == range_name,
        _ => false,
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Condition {
    /// Evaluates against an item; a missing item is an empty map.
    pub fn evaluate(&self, item: &AttributeMap) -> bool {
        match self {
            Condition::Compare(left, comparator, right) => {
                let (Some(left), Some(right)) = (lookup(left, item), lookup(right, item)) else {
                    return false;
                };
                match comparator {
                    Comparator::Eq => left == right,
                    Comparator::Ne => left != right,
                    Comparator::Lt => compare(&left, &right) == Some(Ordering::Less),
                    Comparator::Le => matches!(
                        compare(&left, &right),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    Comparator::Gt => compare(&left, &right) == Some(Ordering::Greater),
                    Comparator::Ge => matches!(
                        compare(&left, &right),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                }
            }
            Condition::Between(subject, low, high) => {
                match (lookup(subject, item), lookup(low, item), lookup(high, item)) {
                    (Some(subject), Some(low), Some(high)) => {
                        matches!(
                            compare(&low, &subject),
                            Some(Ordering::Less | Ordering::Equal)
                        ) && matches!(
                            compare(&subject, &high),
                            Some(Ordering::Less | Ordering::Equal)
                        )
                    }
                    _ => false,
                }
            }
            Condition::BeginsWith(subject, prefix) => {
                match (lookup(subject, item), lookup(prefix, item)) {
                    (Some(AttributeValue::S(s)), Some(AttributeValue::S(p))) => s.starts_with(&p),
                    (Some(AttributeValue::B(b)), Some(AttributeValue::B(p))) => b.starts_with(&p),
                    _ => false,
                }
            }
            Condition::Contains(subject, operand) => {
                match (lookup(subject, item), lookup(operand, item)) {
                    (Some(AttributeValue::S(s)), Some(AttributeValue::S(needle))) => {
                        s.contains(&needle)
                    }
                    (Some(AttributeValue::Ss(set)), Some(AttributeValue::S(needle))) => {
                        set.contains(&needle)
                    }
                    (Some(AttributeValue::Ns(set)), Some(AttributeValue::N(needle))) => {
                        set.iter().any(|n| numeric_cmp(n, &needle) == Ordering::Equal)
                    }
                    (Some(AttributeValue::Bs(set)), Some(AttributeValue::B(needle))) => {
                        set.contains(&needle)
                    }
                    (Some(AttributeValue::L(values)), Some(needle)) => values.contains(&needle),
                    _ => false,
                }
            }
            Condition::Exists(path) => item.contains_key(path),
            Condition::NotExists(path) => !item.contains_key(path),
            Condition::And(left, right) => left.evaluate(item) && right.evaluate(item),
            Condition::Or(left, right) => left.evaluate(item) || right.evaluate(item),
            Condition::Not(inner) => !inner.evaluate(item),
        }
    }
}

fn lookup(operand: &Operand, item: &AttributeMap) -> Option<AttributeValue> {
    match operand {
        Operand::Path(path) => item.get(path).cloned(),
        Operand::Value(value) => Some(value.clone()),
        Operand::IfNotExists(path, fallback) => {
            item.get(path).cloned().or_else(|| lookup(fallback, item))
        }
    }
}

/// Orders two scalars of the same type; `None` for anything else.
pub fn compare(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        (AttributeValue::N(a), AttributeValue::N(b)) => Some(numeric_cmp(a, b)),
        (AttributeValue::B(a), AttributeValue::B(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Compares decimal strings by value, falling back to the text on ties.
pub fn numeric_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

impl UpdateExpression {
    /// Applies every action to `item`, reading operands from the item as it
    /// was before the update. Returns the names of the attributes touched.
    pub fn apply(&self, item: &mut AttributeMap, schema: &KeySchema) -> Result<Vec<String>> {
        let before = item.clone();
        let mut touched = Vec::with_capacity(self.actions.len());

        for action in &self.actions {
            let path = match action {
                Action::Set(path, _)
                | Action::Remove(path)
                | Action::Add(path, _)
                | Action::Delete(path, _) => path,
            };
            if schema.is_key_attribute(path) {
                return Err(ExpressionError::Invalid(format!(
                    "Cannot update attribute {path}. This attribute is part of the key"
                )));
            }

            match action {
                Action::Set(path, value) => {
                    let value = match value {
                        SetValue::Operand(operand) => resolve(operand, &before)?,
                        SetValue::Sum(a, b) => {
                            arithmetic(&resolve(a, &before)?, &resolve(b, &before)?, false)?
                        }
                        SetValue::Difference(a, b) => {
                            arithmetic(&resolve(a, &before)?, &resolve(b, &before)?, true)?
                        }
                    };
                    item.insert(path.clone(), value);
                }
                Action::Remove(path) => {
                    item.remove(path);
                }
                Action::Add(path, value) => {
                    let updated = match item.get(path) {
                        None => match value {
                            AttributeValue::N(_)
                            | AttributeValue::Ss(_)
                            | AttributeValue::Ns(_)
                            | AttributeValue::Bs(_) => value.clone(),
                            _ => return Err(incorrect_operand("ADD")),
                        },
                        Some(existing) => add(existing, value)?,
                    };
                    item.insert(path.clone(), updated);
                }
                Action::Delete(path, value) => {
                    if let Some(existing) = item.get(path) {
                        match delete(existing, value)? {
                            Some(remaining) => item.insert(path.clone(), remaining),
                            None => item.remove(path),
                        };
                    }
                }
            }
            touched.push(path.clone());
        }

        Ok(touched)
    }
}

fn resolve(operand: &Operand, item: &AttributeMap) -> Result<AttributeValue> {
    lookup(operand, item).ok_or_else(|| {
        ExpressionError::Invalid(
            "The provided expression refers to an attribute that does not exist in the item"
                .to_string(),
        )
    })
}

fn incorrect_operand(clause: &str) -> ExpressionError {
    ExpressionError::Invalid(format!(
        "An operand in the update expression has an incorrect data type ({clause})"
    ))
}

fn arithmetic(left: &AttributeValue, right: &AttributeValue, subtract: bool) -> Result<AttributeValue> {
    let (AttributeValue::N(a), AttributeValue::N(b)) = (left, right) else {
        return Err(incorrect_operand("SET"));
    };

    if let (Ok(x), Ok(y)) = (a.parse::<i128>(), b.parse::<i128>()) {
        let result = if subtract {
            x.checked_sub(y)
        } else {
            x.checked_add(y)
        };
        if let Some(result) = result {
            return Ok(AttributeValue::number(result));
        }
    }

    let (x, y) = match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => (x, y),
        _ => return Err(incorrect_operand("SET")),
    };
    Ok(AttributeValue::float(if subtract { x - y } else { x + y })?)
}

fn add(existing: &AttributeValue, value: &AttributeValue) -> Result<AttributeValue> {
    match (existing, value) {
        (AttributeValue::N(_), AttributeValue::N(_)) => arithmetic(existing, value, false),
        (AttributeValue::Ss(a), AttributeValue::Ss(b)) => {
            Ok(AttributeValue::string_set(a.iter().chain(b).cloned())?)
        }
        (AttributeValue::Ns(a), AttributeValue::Ns(b)) => {
            Ok(AttributeValue::number_set_from_strs(a.iter().chain(b).cloned())?)
        }
        (AttributeValue::Bs(a), AttributeValue::Bs(b)) => {
            Ok(AttributeValue::binary_set(a.iter().chain(b).cloned())?)
        }
        _ => Err(incorrect_operand("ADD")),
    }
}

/// Removes `value`'s elements from a set. `None` when nothing remains.
fn delete(existing: &AttributeValue, value: &AttributeValue) -> Result<Option<AttributeValue>> {
    let remaining = match (existing, value) {
        (AttributeValue::Ss(a), AttributeValue::Ss(b)) => {
            AttributeValue::string_set(a.iter().filter(|v| !b.contains(*v)).cloned())
        }
        (AttributeValue::Ns(a), AttributeValue::Ns(b)) => AttributeValue::number_set_from_strs(
            a.iter()
                .filter(|v| !b.iter().any(|d| numeric_cmp(d, v) == Ordering::Equal))
                .cloned(),
        ),
        (AttributeValue::Bs(a), AttributeValue::Bs(b)) => {
            AttributeValue::binary_set(a.iter().filter(|v| !b.contains(*v)).cloned())
        }
        _ => return Err(incorrect_operand("DELETE")),
    };

    match remaining {
        Ok(set) => Ok(Some(set)),
        Err(AttributeError::EmptySet(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynatable_core::KeyType;

    fn attributes() -> ExpressionAttributes {
        let mut attributes = ExpressionAttributes::default();
        attributes.insert_name("#s", "status");
        attributes.insert_name("#d", "date");
        attributes.insert_value(":ok", AttributeValue::string("active"));
        attributes.insert_value(":n", AttributeValue::number(10));
        attributes.insert_value(":one", AttributeValue::number(1));
        attributes.insert_value(":h", AttributeValue::string("foobar-1"));
        attributes.insert_value(":lo", AttributeValue::number(5));
        attributes.insert_value(":hi", AttributeValue::number(20));
        attributes.insert_value(":roles", AttributeValue::string_set(["admin"]).unwrap());
        attributes
    }

    fn schema() -> KeySchema {
        KeySchema::new("user_id", KeyType::S).with_range_key("date", KeyType::N)
    }

    fn item() -> AttributeMap {
        let mut item = AttributeMap::new();
        item.insert("user_id".to_string(), AttributeValue::string("foobar-1"));
        item.insert("date".to_string(), AttributeValue::number(12));
        item.insert("status".to_string(), AttributeValue::string("active"));
        item.insert("count".to_string(), AttributeValue::number(3));
        item
    }

    #[test]
    fn test_tokenize_operators_and_placeholders() {
        let tokens = tokenize("#s <> :ok AND count>=:n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("#s".to_string()),
                Token::Op("<>"),
                Token::Value(":ok".to_string()),
                Token::Ident("AND".to_string()),
                Token::Ident("count".to_string()),
                Token::Op(">="),
                Token::Value(":n".to_string()),
            ]
        );
        assert!(tokenize("a = 1").is_err());
        assert!(tokenize("a = :").is_err());
    }

    #[test]
    fn test_condition_evaluation() {
        let attributes = attributes();
        let cases = [
            ("#s = :ok", true),
            ("#s <> :ok", false),
            ("count < :n", true),
            ("count BETWEEN :one AND :n", true),
            ("attribute_exists(#s) AND NOT attribute_exists(missing)", true),
            ("attribute_not_exists(#d)", false),
            ("missing = :ok OR #s = :ok", true),
            ("(missing = :ok OR count > :n) AND #s = :ok", false),
            ("begins_with(user_id, :h)", true),
            ("contains(#s, :ok)", true),
            ("not #s = :ok", false),
        ];

        for (expression, expected) in cases {
            let condition = parse_condition(expression, &attributes).unwrap();
            assert_eq!(condition.evaluate(&item()), expected, "{expression}");
        }
    }

    #[test]
    fn test_conditions_against_missing_item() {
        let attributes = attributes();
        let empty = AttributeMap::new();
        assert!(parse_condition("attribute_not_exists(#d)", &attributes)
            .unwrap()
            .evaluate(&empty));
        assert!(!parse_condition("#s = :ok", &attributes)
            .unwrap()
            .evaluate(&empty));
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(numeric_cmp("9", "10"), Ordering::Less);
        assert_eq!(numeric_cmp("-1.5", "-1"), Ordering::Less);
        assert_eq!(
            compare(&AttributeValue::number(9), &AttributeValue::number(10)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&AttributeValue::string("9"), &AttributeValue::number(10)),
            None
        );
    }

    #[test]
    fn test_undefined_placeholders() {
        let attributes = attributes();
        assert_eq!(
            parse_condition("#missing = :ok", &attributes),
            Err(ExpressionError::UndefinedName("#missing".to_string()))
        );
        assert_eq!(
            parse_condition("#s = :missing", &attributes),
            Err(ExpressionError::UndefinedValue(":missing".to_string()))
        );
    }

    #[test]
    fn test_syntax_errors() {
        let attributes = attributes();
        assert!(parse_condition("#s =", &attributes).is_err());
        assert!(parse_condition("#s = :ok :ok", &attributes).is_err());
        assert!(parse_condition("size(#s) = :n", &attributes).is_err());
        assert!(parse_update("", &attributes).is_err());
        assert!(parse_update("UPSERT a = :n", &attributes).is_err());
    }

    #[test]
    fn test_key_condition() {
        let attributes = attributes();
        let schema = schema();

        let key = parse_key_condition("user_id = :h", &attributes, &schema).unwrap();
        assert_eq!(key.hash, AttributeValue::string("foobar-1"));
        assert!(key.range.is_none());

        let key =
            parse_key_condition("user_id = :h AND #d BETWEEN :lo AND :hi", &attributes, &schema)
                .unwrap();
        assert!(key.range.unwrap().evaluate(&item()));

        assert!(parse_key_condition("#d > :lo", &attributes, &schema).is_err());
        assert!(parse_key_condition("user_id = :h OR #d > :lo", &attributes, &schema).is_err());
        assert!(parse_key_condition("user_id = :h AND #s = :ok", &attributes, &schema).is_err());
        assert!(parse_key_condition("user_id = :n", &attributes, &schema).is_err());
    }

    #[test]
    fn test_update_set_add_remove() {
        let attributes = attributes();
        let update = parse_update(
            "SET #s = :ok, total = count + :n, first = if_not_exists(first, :one) ADD count :one REMOVE missing",
            &attributes,
        )
        .unwrap();

        let mut item = item();
        let touched = update.apply(&mut item, &schema()).unwrap();

        assert_eq!(item["total"], AttributeValue::number(13));
        assert_eq!(item["first"], AttributeValue::number(1));
        assert_eq!(item["count"], AttributeValue::number(4));
        assert_eq!(touched, ["status", "total", "first", "count", "missing"]);
    }

    #[test]
    fn test_update_add_counter_from_missing() {
        let attributes = attributes();
        let update = parse_update("ADD login_count :one", &attributes).unwrap();

        let mut item = AttributeMap::new();
        update.apply(&mut item, &schema()).unwrap();
        update.apply(&mut item, &schema()).unwrap();

        assert_eq!(item["login_count"], AttributeValue::number(2));
    }

    #[test]
    fn test_add_is_exact_for_large_integers() {
        let mut attributes = ExpressionAttributes::default();
        attributes.insert_value(":one", AttributeValue::number(1));
        attributes.insert_value(":quarter", AttributeValue::float(0.25).unwrap());
        let mut item = AttributeMap::new();
        item.insert(
            "big".to_string(),
            AttributeValue::number(9_007_199_254_740_993_i64),
        );
        item.insert("ratio".to_string(), AttributeValue::float(1.5).unwrap());

        parse_update("ADD big :one, ratio :quarter", &attributes)
            .unwrap()
            .apply(&mut item, &schema())
            .unwrap();

        assert_eq!(item["big"].as_n(), Some("9007199254740994"));
        assert_eq!(item["ratio"].as_n(), Some("1.75"));
        assert_eq!(
            numeric_cmp("9007199254740993", "9007199254740994"),
            Ordering::Less
        );
    }

    #[test]
    fn test_update_sets() {
        let attributes = attributes();
        let mut item = item();
        item.insert(
            "roles".to_string(),
            AttributeValue::string_set(["user", "admin"]).unwrap(),
        );

        parse_update("DELETE roles :roles", &attributes)
            .unwrap()
            .apply(&mut item, &schema())
            .unwrap();
        assert_eq!(item["roles"], AttributeValue::string_set(["user"]).unwrap());

        parse_update("ADD roles :roles", &attributes)
            .unwrap()
            .apply(&mut item, &schema())
            .unwrap();
        assert_eq!(
            item["roles"],
            AttributeValue::string_set(["admin", "user"]).unwrap()
        );

        item.insert("roles".to_string(), AttributeValue::string_set(["admin"]).unwrap());
        parse_update("DELETE roles :roles", &attributes)
            .unwrap()
            .apply(&mut item, &schema())
            .unwrap();
        assert!(!item.contains_key("roles"));
    }

    #[test]
    fn test_update_rejects_key_attributes_and_bad_types() {
        let attributes = attributes();
        let mut item = item();

        let err = parse_update("SET #d = :n", &attributes)
            .unwrap()
            .apply(&mut item, &schema())
            .unwrap_err();
        assert!(err.to_string().contains("part of the key"));

        assert!(parse_update("ADD #s :one", &attributes)
            .unwrap()
            .apply(&mut item, &schema())
            .is_err());
        assert!(parse_update("SET total = missing + :one", &attributes)
            .unwrap()
            .apply(&mut item, &schema())
            .is_err());
    }

    #[test]
    fn test_projection() {
        let attributes = attributes();
        assert_eq!(
            parse_projection("user_id, #s", &attributes).unwrap(),
            ["user_id", "status"]
        );
        assert!(parse_projection("user_id,", &attributes).is_err());
    }

    #[test]
    fn test_errors_map_to_validation() {
        let err: StoreError = ExpressionError::Syntax("x".to_string()).into();
        assert_eq!(err.code(), StoreError::VALIDATION);
    }
}
