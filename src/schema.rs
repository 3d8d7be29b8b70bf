//! Structural check of outline JSON before it is written.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::{HeadingLevel, Outline};

const ROOT_KEYS: [&str; 2] = ["title", "outline"];
const ENTRY_KEYS: [&str; 3] = ["level", "text", "page"];

/// Check an outline after serializing it.
pub fn validate(outline: &Outline) -> Result<()> {
    validate_outline(&serde_json::to_value(outline)?)
}

/// Check a JSON value against the outline schema.
///
/// The root must be an object with exactly `title` and `outline`; every entry
/// an object with exactly `level`, `text` and `page`.
pub fn validate_outline(value: &Value) -> Result<()> {
    let root = value
        .as_object()
        .ok_or_else(|| Error::schema("$", "expected an object"))?;
    check_keys(root, &ROOT_KEYS, "$")?;

    if !root["title"].is_string() {
        return Err(Error::schema("$.title", "expected a string"));
    }

    let entries = root["outline"]
        .as_array()
        .ok_or_else(|| Error::schema("$.outline", "expected an array"))?;

    for (i, entry) in entries.iter().enumerate() {
        validate_entry(entry, &format!("$.outline[{}]", i))?;
    }
    Ok(())
}

fn validate_entry(entry: &Value, path: &str) -> Result<()> {
    let obj = entry
        .as_object()
        .ok_or_else(|| Error::schema(path, "expected an object"))?;
    check_keys(obj, &ENTRY_KEYS, path)?;

    match obj["level"].as_str() {
        Some(tag) if HeadingLevel::from_tag(tag).is_some() => {}
        Some(tag) => {
            return Err(Error::schema(
                format!("{}.level", path),
                format!("expected one of H1, H2, H3, got {:?}", tag),
            ))
        }
        None => return Err(Error::schema(format!("{}.level", path), "expected a string")),
    }

    if !obj["text"].is_string() {
        return Err(Error::schema(format!("{}.text", path), "expected a string"));
    }

    if obj["page"].as_u64().is_none() {
        return Err(Error::schema(
            format!("{}.page", path),
            "expected a non-negative integer",
        ));
    }
    Ok(())
}

fn check_keys(obj: &Map<String, Value>, expected: &[&str], path: &str) -> Result<()> {
    for key in expected {
        if !obj.contains_key(*key) {
            return Err(Error::schema(path, format!("missing key {:?}", key)));
        }
    }
    if let Some(extra) = obj.keys().find(|k| !expected.contains(&k.as_str())) {
        return Err(Error::schema(
            format!("{}.{}", path, extra),
            "unexpected key",
        ));
    }
    Ok(())
}
