//! Descriptor reader
//!
//! `.yy` and `.yyp` files are JSON as written by the IDE, but the IDE itself
//! emits trailing commas and hand-edited files pick up comments and
//! single-quoted strings. Reading tries strict JSON first, then normalizes
//! the text and tries again.
//!
//! The tree is handed out as a plain [`Value`]; the accessors at the bottom
//! of this module pull typed fields by key path and substitute defaults for
//! anything missing.

use gms2_core::{Gms2Error, Result};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Read and parse a descriptor file
pub fn read(path: &Path) -> Result<Value> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Gms2Error::NotFound(format!(
                "Descriptor file not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(Gms2Error::parse(path, format!("unreadable: {}", e))),
    };

    let text = String::from_utf8_lossy(&bytes);
    parse_str(&text).map_err(|message| Gms2Error::parse(path, message))
}

/// Parse descriptor text, strict first, then leniently
pub fn parse_str(text: &str) -> std::result::Result<Value, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict) => {
            let normalized = normalize(text);
            serde_json::from_str(&normalized)
                .map_err(|lenient| format!("{} (strict parse: {})", lenient, strict))
        }
    }
}

/// Rewrite the lenient dialect into strict JSON
///
/// Drops `//` and `/* */` comments, drops commas that directly precede `]`
/// or `}`, and turns single-quoted strings into double-quoted ones. Content
/// of double-quoted strings is copied untouched.
pub fn normalize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => i = copy_double_quoted(&chars, i, &mut out),
            '\'' => i = convert_single_quoted(&chars, i, &mut out),
            '/' if is_comment_start(&chars, i) => i = skip_comment(&chars, i),
            ',' => {
                let next = skip_insignificant(&chars, i + 1);
                if !matches!(chars.get(next), Some(']') | Some('}')) {
                    out.push(',');
                }
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn is_comment_start(chars: &[char], i: usize) -> bool {
    chars[i] == '/' && matches!(chars.get(i + 1), Some('/') | Some('*'))
}

/// Index just past the comment starting at `i`; line comments keep their newline
fn skip_comment(chars: &[char], i: usize) -> usize {
    if chars.get(i + 1) == Some(&'/') {
        let mut j = i + 2;
        while j < chars.len() && chars[j] != '\n' {
            j += 1;
        }
        j
    } else {
        let mut j = i + 2;
        while j + 1 < chars.len() {
            if chars[j] == '*' && chars[j + 1] == '/' {
                return j + 2;
            }
            j += 1;
        }
        chars.len()
    }
}

fn skip_insignificant(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
        } else if is_comment_start(chars, i) {
            i = skip_comment(chars, i);
        } else {
            break;
        }
    }
    i
}

fn copy_double_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                out.push('\\');
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
            }
            '"' => {
                out.push('"');
                return i + 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    chars.len()
}

fn convert_single_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' if chars.get(i + 1) == Some(&'\'') => {
                out.push('\'');
                i += 2;
            }
            '\\' => {
                out.push('\\');
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
            }
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            '\'' => {
                out.push('"');
                return i + 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    chars.len()
}

// ---------------------------------------------------------------------------
// Typed accessors
// ---------------------------------------------------------------------------

/// Value at a key path
pub fn get<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

pub fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    get(value, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn bool_at(value: &Value, path: &[&str], default: bool) -> bool {
    get(value, path).and_then(Value::as_bool).unwrap_or(default)
}

pub fn f64_at(value: &Value, path: &[&str], default: f64) -> f64 {
    get(value, path).and_then(Value::as_f64).unwrap_or(default)
}

/// Integer field; the IDE sometimes writes integers as `1.0`
pub fn i64_at(value: &Value, path: &[&str]) -> Option<i64> {
    let v = get(value, path)?;
    v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64))
}

pub fn u32_at(value: &Value, path: &[&str]) -> Option<u32> {
    i64_at(value, path).and_then(|n| u32::try_from(n).ok())
}

/// Name of a resource reference such as `{"name": "spr_player", "path": ...}`
///
/// Older formats wrote bare strings; `null` means no reference.
pub fn link_name(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Object(_) => string_at(value, &[key, "name"]),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Resource type tag, across the format generations
///
/// `resourceType` (2.3+), `__type` and `modelName` (pre-2.3), or the
/// `"$GMRInstanceLayer": ""` marker key of 2023+ files.
pub fn resource_type(value: &Value) -> Option<String> {
    ["resourceType", "__type", "modelName"]
        .iter()
        .find_map(|key| string_at(value, &[*key]))
        .or_else(|| {
            value.as_object().and_then(|map| {
                map.keys()
                    .find(|k| k.starts_with("$GM"))
                    .map(|k| k.trim_start_matches('$').to_string())
            })
        })
}

/// Array at a key, empty when absent
pub fn array_at<'a>(value: &'a Value, path: &[&str]) -> &'a [Value] {
    get(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
