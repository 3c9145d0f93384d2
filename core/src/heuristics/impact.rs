//! `cross_system_impact`'s heuristic half (spec.md §6). For each file in the
//! change scope, flags public surface that other services might depend on,
//! and whether anything in the file mentions the caller's named services.

use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::Result;
use crate::secure_reader::SecureReader;

#[allow(clippy::unwrap_used)]
static PUBLIC_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*pub\s+(fn|struct|enum|trait)\s+([A-Za-z0-9_]+)").unwrap());

/// One annotation per file in the change scope, describing its public
/// surface and any service-name hits (spec.md §6's boundary analysis).
pub fn cross_system_impact(
    reader: &SecureReader,
    files: &[String],
    service_names: &[String],
) -> Result<Vec<String>> {
    let mut annotations = Vec::with_capacity(files.len());
    for file in files {
        let content = reader.read(Path::new(file))?;
        let public_items: Vec<&str> = PUBLIC_ITEM
            .captures_iter(&content)
            .filter_map(|c| c.get(2).map(|m| m.as_str()))
            .collect();

        let mentioned: Vec<&str> = service_names
            .iter()
            .map(String::as_str)
            .filter(|name| content.contains(name))
            .collect();

        if public_items.is_empty() && mentioned.is_empty() {
            continue;
        }

        let mut annotation = format!("{file}: exposes {} public item(s)", public_items.len());
        if !public_items.is_empty() {
            annotation.push_str(&format!(" ({})", public_items.join(", ")));
        }
        if !mentioned.is_empty() {
            annotation.push_str(&format!("; mentions service(s) {}", mentioned.join(", ")));
        }
        annotations.push(annotation);
    }
    Ok(annotations)
}
