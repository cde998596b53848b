use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

/// Read a collection document: either a bare array, an array nested one
/// level (`[[ ... ]]`), or an object wrapping the array under a
/// conventional field name (`questions` / `data`).
pub fn read_raw_collection(path: &Path) -> anyhow::Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read collection: {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&text)
        .with_context(|| format!("parse collection json: {}", path.display()))?;

    let mut items = match parsed {
        Value::Array(items) => items,
        Value::Object(mut map) => match (map.remove("questions"), map.remove("data")) {
            (Some(Value::Array(items)), _) => items,
            (_, Some(Value::Array(items))) => items,
            _ => anyhow::bail!("not_an_array: {}", path.display()),
        },
        _ => anyhow::bail!("not_an_array: {}", path.display()),
    };
    if items.len() == 1 && items[0].is_array() {
        match items.pop() {
            Some(Value::Array(inner)) => items = inner,
            _ => unreachable!(),
        }
    }
    Ok(items)
}

/// Lenient resume load: the prior checkpoint only has to parse as a JSON
/// array. Every entry is kept as corpus content whether or not it still
/// matches the canonical shape, so a hand-edited or legacy entry never
/// discards the rest of the accumulated corpus. A missing or unparseable
/// file means a fresh start.
pub fn try_load_corpus(path: &Path) -> Option<Vec<Value>> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Value>(&text).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// Write a collection as indented JSON. Merge/normalize outputs carry a
/// trailing newline; the pipeline checkpoint file does not (both shapes are
/// accepted on read).
pub fn write_pretty<T: Serialize>(
    path: &Path,
    items: &[T],
    trailing_newline: bool,
) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create output dir: {}", dir.display()))?;
        }
    }
    let mut text = serde_json::to_string_pretty(items).context("serialize collection")?;
    if trailing_newline {
        text.push('\n');
    }
    std::fs::write(path, text).with_context(|| format!("write collection: {}", path.display()))?;
    Ok(())
}
