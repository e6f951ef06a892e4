//! TOON: a compact, indentation-based text encoding for memory payloads.
//!
//! The format is small:
//!
//! ```text
//! label: morning_block
//! duration_min: 120
//! tasks[2]{id,kind,title}:
//!   bca-day-assignment-1,assignment,Work on the most urgent assignment
//!   bca-day-exam_prep-2,exam_prep,Deep study
//! ```
//!
//! - objects: `key: value` lines, children indented by two spaces
//! - primitive arrays: `key[N]: a,b,c`
//! - arrays of uniform, flat objects: a `key[N]{f1,f2}:` header plus one row per item
//! - anything else: `key[N]:` followed by `- ` list items
//!
//! Strings are written bare unless they would be ambiguous, in which case they
//! are quoted with JSON escaping. Keys follow the same rule.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::context::estimate_tokens;

const INDENT: &str = "  ";

#[derive(Debug, Error)]
pub enum ToonError {
    #[error("payload root must be an object")]
    RootNotObject,
    #[error("nested arrays are not supported (under {0:?})")]
    NestedArray(String),
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Encode any struct-like value.
pub fn encode<T: Serialize>(value: &T) -> Result<String, ToonError> {
    let Value::Object(map) = serde_json::to_value(value)? else {
        return Err(ToonError::RootNotObject);
    };
    let mut out = Vec::new();
    write_object(&map, 0, &mut out)?;
    Ok(out.join("\n"))
}

/// Decode a payload produced by [`encode`].
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ToonError> {
    let value = decode_value(text)?;
    Ok(serde_json::from_value(value)?)
}

/// Decode into an untyped JSON value.
pub fn decode_value(text: &str) -> Result<Value, ToonError> {
    let mut parser = Parser::new(text)?;
    let map = parser.parse_object(0)?;
    if let Some(line) = parser.peek() {
        return Err(syntax(line.no, "unexpected indentation"));
    }
    Ok(Value::Object(map))
}

/// Token estimates for the same value as JSON and as TOON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSavings {
    pub json_tokens: usize,
    pub toon_tokens: usize,
}

impl TokenSavings {
    pub fn saved(&self) -> usize {
        self.json_tokens.saturating_sub(self.toon_tokens)
    }

    pub fn percent(&self) -> f64 {
        if self.json_tokens == 0 {
            return 0.0;
        }
        (self.saved() as f64 / self.json_tokens as f64) * 100.0
    }
}

pub fn estimate_savings<T: Serialize>(value: &T) -> Result<TokenSavings, ToonError> {
    let json = serde_json::to_string(value)?;
    let toon = encode(value)?;
    Ok(TokenSavings {
        json_tokens: estimate_tokens(&json),
        toon_tokens: estimate_tokens(&toon),
    })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn write_object(map: &Map<String, Value>, depth: usize, out: &mut Vec<String>) -> Result<(), ToonError> {
    for (key, value) in map {
        write_field(&format_key(key), value, depth, out)?;
    }
    Ok(())
}

fn write_field(key: &str, value: &Value, depth: usize, out: &mut Vec<String>) -> Result<(), ToonError> {
    let prefix = INDENT.repeat(depth);
    match value {
        Value::Object(map) => {
            out.push(format!("{prefix}{key}:"));
            write_object(map, depth + 1, out)
        }
        Value::Array(items) => write_array(key, items, depth, out),
        prim => {
            out.push(format!("{prefix}{key}: {}", format_primitive(prim)));
            Ok(())
        }
    }
}

fn write_array(key: &str, items: &[Value], depth: usize, out: &mut Vec<String>) -> Result<(), ToonError> {
    let prefix = INDENT.repeat(depth);
    let n = items.len();

    if items.iter().all(is_primitive) {
        if n == 0 {
            out.push(format!("{prefix}{key}[0]:"));
        } else {
            out.push(format!("{prefix}{key}[{n}]: {}", join_primitives(items)));
        }
        return Ok(());
    }

    if let Some(fields) = tabular_fields(items) {
        out.push(format!("{prefix}{key}[{n}]{{{}}}:", fields.join(",")));
        let row_prefix = INDENT.repeat(depth + 1);
        for item in items {
            if let Value::Object(map) = item {
                let row: Vec<String> = fields
                    .iter()
                    .map(|f| format_primitive(map.get(*f).unwrap_or(&Value::Null)))
                    .collect();
                out.push(format!("{row_prefix}{}", row.join(",")));
            }
        }
        return Ok(());
    }

    out.push(format!("{prefix}{key}[{n}]:"));
    let item_prefix = INDENT.repeat(depth + 1);
    for item in items {
        match item {
            Value::Object(map) if map.is_empty() => out.push(format!("{item_prefix}-")),
            Value::Object(map) => {
                let mut nested = Vec::new();
                write_object(map, depth + 2, &mut nested)?;
                let field_prefix = INDENT.repeat(depth + 2);
                for (i, line) in nested.into_iter().enumerate() {
                    if i == 0 {
                        let body = line.strip_prefix(&field_prefix).unwrap_or(&line);
                        out.push(format!("{item_prefix}- {body}"));
                    } else {
                        out.push(line);
                    }
                }
            }
            Value::Array(inner) => {
                if !inner.iter().all(is_primitive) {
                    return Err(ToonError::NestedArray(key.to_string()));
                }
                out.push(format!("{item_prefix}- [{}]: {}", inner.len(), join_primitives(inner)));
            }
            prim => out.push(format!("{item_prefix}- {}", format_primitive(prim))),
        }
    }
    Ok(())
}

/// Field list when every item is a non-empty object with identical keys and flat values.
fn tabular_fields(items: &[Value]) -> Option<Vec<&str>> {
    let Value::Object(first) = items.first()? else {
        return None;
    };
    if first.is_empty() || !first.keys().all(|k| is_plain_key(k)) {
        return None;
    }
    let fields: Vec<&str> = first.keys().map(String::as_str).collect();
    for item in items {
        let Value::Object(map) = item else { return None };
        if map.len() != fields.len() {
            return None;
        }
        for f in &fields {
            match map.get(*f) {
                Some(v) if is_primitive(v) => {}
                _ => return None,
            }
        }
    }
    Some(fields)
}

fn is_primitive(v: &Value) -> bool {
    !matches!(v, Value::Object(_) | Value::Array(_))
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('-')
}

/// Keys outside `[A-Za-z0-9_.-]` are written as JSON strings.
fn format_key(key: &str) -> String {
    if is_plain_key(key) {
        key.to_string()
    } else {
        serde_json::to_string(key).unwrap_or_else(|_| format!("\"{}\"", key.escape_default()))
    }
}

fn join_primitives(items: &[Value]) -> String {
    items.iter().map(format_primitive).collect::<Vec<_>>().join(",")
}

fn format_primitive(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if needs_quotes(s) => {
            serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.escape_default()))
        }
        Value::String(s) => s.clone(),
        // Only reached through a logic error upstream; keep output parseable.
        Value::Array(_) | Value::Object(_) => "null".to_string(),
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s != s.trim()
        || matches!(s, "true" | "false" | "null")
        || looks_numeric(s)
        || s.starts_with('-')
        || s.chars().any(|c| {
            matches!(c, ',' | ':' | '"' | '\\' | '[' | ']' | '{' | '}' | '#') || c.is_control()
        })
}

fn looks_numeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Line {
    depth: usize,
    text: String,
    no: usize,
}

struct Parser {
    lines: Vec<Line>,
    pos: usize,
}

fn syntax(line: usize, message: impl Into<String>) -> ToonError {
    ToonError::Syntax {
        line,
        message: message.into(),
    }
}

impl Parser {
    fn new(text: &str) -> Result<Self, ToonError> {
        let mut lines = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let spaces = raw.len() - raw.trim_start_matches(' ').len();
            if spaces % INDENT.len() != 0 {
                return Err(syntax(idx + 1, "indentation must be a multiple of two spaces"));
            }
            lines.push(Line {
                depth: spaces / INDENT.len(),
                text: raw.trim().to_string(),
                no: idx + 1,
            });
        }
        Ok(Self { lines, pos: 0 })
    }

    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    fn next_line(&mut self, depth: usize, what: &str) -> Result<Line, ToonError> {
        let last_no = self.lines.last().map(|l| l.no).unwrap_or(0);
        let line = self
            .lines
            .get(self.pos)
            .cloned()
            .ok_or_else(|| syntax(last_no, format!("expected {what}, found end of input")))?;
        if line.depth != depth {
            return Err(syntax(line.no, format!("expected {what} at depth {depth}")));
        }
        self.pos += 1;
        Ok(line)
    }

    fn parse_object(&mut self, depth: usize) -> Result<Map<String, Value>, ToonError> {
        let mut map = Map::new();
        while let Some(line) = self.peek() {
            if line.depth < depth {
                break;
            }
            if line.depth > depth {
                return Err(syntax(line.no, "unexpected indentation"));
            }
            let line = self.next_line(depth, "field")?;
            let (key, value) = self.parse_field(&line)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn parse_field(&mut self, line: &Line) -> Result<(String, Value), ToonError> {
        let colon = find_unquoted(&line.text, ':').ok_or_else(|| syntax(line.no, "missing ':'"))?;
        let head = &line.text[..colon];
        let rest = line.text[colon + 1..].trim();

        let Some(bracket) = find_unquoted(head, '[') else {
            let key = parse_key(head, line.no)?;
            if rest.is_empty() {
                let child_depth = line.depth + 1;
                let nested = match self.peek() {
                    Some(next) if next.depth == child_depth => self.parse_object(child_depth)?,
                    _ => Map::new(),
                };
                return Ok((key, Value::Object(nested)));
            }
            return Ok((key, parse_primitive(rest, line.no)?));
        };

        let key = parse_key(&head[..bracket], line.no)?;
        let (count, fields) = parse_header(&head[bracket..], line.no)?;

        if let Some(fields) = fields {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let row = self.next_line(line.depth + 1, "table row")?;
                let cells = split_cells(&row.text);
                if cells.len() != fields.len() {
                    return Err(syntax(
                        row.no,
                        format!("expected {} cells, found {}", fields.len(), cells.len()),
                    ));
                }
                let mut obj = Map::new();
                for (f, cell) in fields.iter().zip(cells) {
                    obj.insert(f.clone(), parse_primitive(&cell, row.no)?);
                }
                items.push(Value::Object(obj));
            }
            return Ok((key, Value::Array(items)));
        }

        if !rest.is_empty() {
            return Ok((key, Value::Array(parse_inline(rest, count, line.no)?)));
        }

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.parse_list_item(line.depth + 1)?);
        }
        Ok((key, Value::Array(items)))
    }

    fn parse_list_item(&mut self, depth: usize) -> Result<Value, ToonError> {
        let line = self.next_line(depth, "list item")?;
        if line.text == "-" {
            return Ok(Value::Object(Map::new()));
        }
        let Some(rest) = line.text.strip_prefix("- ") else {
            return Err(syntax(line.no, "list items must start with '- '"));
        };
        let rest = rest.trim();

        if rest.starts_with('[') {
            let colon = find_unquoted(rest, ':').ok_or_else(|| syntax(line.no, "missing ':'"))?;
            let (count, _) = parse_header(&rest[..colon], line.no)?;
            return Ok(Value::Array(parse_inline(rest[colon + 1..].trim(), count, line.no)?));
        }
        if find_unquoted(rest, ':').is_some() {
            // The first field rides on the hyphen line; the rest sit one level deeper.
            let field_depth = depth + 1;
            self.pos -= 1;
            self.lines[self.pos] = Line {
                depth: field_depth,
                text: rest.to_string(),
                no: line.no,
            };
            return Ok(Value::Object(self.parse_object(field_depth)?));
        }
        // Bare strings never contain ':', so a quoted token without one is a value.
        parse_primitive(rest, line.no)
    }
}

fn parse_key(head: &str, line: usize) -> Result<String, ToonError> {
    let head = head.trim();
    if head.starts_with('"') {
        return serde_json::from_str(head).map_err(|e| syntax(line, format!("bad quoted key: {e}")));
    }
    if head.is_empty() {
        return Err(syntax(line, "missing key"));
    }
    Ok(head.to_string())
}

/// Parses `[N]` or `[N]{a,b}`.
fn parse_header(header: &str, line: usize) -> Result<(usize, Option<Vec<String>>), ToonError> {
    let close = header.find(']').ok_or_else(|| syntax(line, "unterminated '['"))?;
    let count = header[1..close]
        .trim()
        .parse::<usize>()
        .map_err(|_| syntax(line, "array length must be an integer"))?;
    let tail = header[close + 1..].trim();
    if tail.is_empty() {
        return Ok((count, None));
    }
    let inner = tail
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .ok_or_else(|| syntax(line, "malformed field list"))?;
    let fields = inner.split(',').map(|f| f.trim().to_string()).collect();
    Ok((count, Some(fields)))
}

fn parse_inline(rest: &str, count: usize, line: usize) -> Result<Vec<Value>, ToonError> {
    if rest.is_empty() {
        if count == 0 {
            return Ok(Vec::new());
        }
        return Err(syntax(line, format!("expected {count} values")));
    }
    let cells = split_cells(rest);
    if cells.len() != count {
        return Err(syntax(line, format!("expected {count} values, found {}", cells.len())));
    }
    cells.iter().map(|c| parse_primitive(c, line)).collect()
}

fn parse_primitive(token: &str, line: usize) -> Result<Value, ToonError> {
    let token = token.trim();
    if token.starts_with('"') {
        let s: String =
            serde_json::from_str(token).map_err(|e| syntax(line, format!("bad quoted string: {e}")))?;
        return Ok(Value::String(s));
    }
    match token {
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if looks_numeric(token) {
        if let Ok(i) = token.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        if let Ok(u) = token.parse::<u64>() {
            return Ok(Value::Number(u.into()));
        }
        if let Some(n) = token.parse::<f64>().ok().and_then(Number::from_f64) {
            return Ok(Value::Number(n));
        }
    }
    Ok(Value::String(token.to_string()))
}

/// Byte offset of the first `needle` outside double quotes.
fn find_unquoted(s: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        if c == '"' {
            in_quotes = true;
        } else if c == needle {
            return Some(i);
        }
    }
    None
}

fn split_cells(s: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut rest = s;
    while let Some(idx) = find_unquoted(rest, ',') {
        cells.push(rest[..idx].trim().to_string());
        rest = &rest[idx + 1..];
    }
    cells.push(rest.trim().to_string());
    cells
}
