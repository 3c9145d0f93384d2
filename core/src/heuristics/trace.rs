//! `trace_execution_path`'s heuristic half (spec.md §6). Not a real call
//! graph: it walks the entry file line by line from the entry point and
//! flags lines that look like calls, bindings, or control flow, giving the
//! remote analysis concrete leads rather than a blank file.

use std::path::Path;
use std::sync::LazyLock;

use reasoning_protocol::tools::TraceStep;
use reasoning_protocol::CodeLocation;
use regex_lite::Regex;

use crate::error::Result;
use crate::secure_reader::SecureReader;

#[allow(clippy::unwrap_used)]
static CALL_SITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
#[allow(clippy::unwrap_used)]
static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:let\s+(?:mut\s+)?)?([A-Za-z_][A-Za-z0-9_]*)\s*=[^=]").unwrap());
const CONTROL_FLOW_KEYWORDS: &[&str] = &["if ", "match ", "for ", "while ", "return", ".await"];
const NOT_A_CALLEE: &[&str] = &["if", "match", "for", "while", "fn", "let"];

/// Scan `file` from `start_line` (zero-based) for up to `max_depth` notable
/// lines. `include_data_flow` additionally flags variable bindings.
pub fn trace_execution_path(
    reader: &SecureReader,
    file: &str,
    start_line: u32,
    max_depth: u32,
    include_data_flow: bool,
) -> Result<Vec<TraceStep>> {
    let content = reader.read(Path::new(file))?;
    let mut steps = Vec::new();

    for (offset, raw_line) in content.lines().enumerate().skip(start_line as usize) {
        if steps.len() >= max_depth as usize {
            break;
        }
        let line_no = offset as u32;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        if let Some(step) = call_step(file, line_no, trimmed) {
            steps.push(step);
            continue;
        }

        if include_data_flow {
            if let Some(step) = binding_step(file, line_no, trimmed) {
                steps.push(step);
                continue;
            }
        }

        if CONTROL_FLOW_KEYWORDS.iter().any(|kw| trimmed.contains(kw)) {
            steps.push(TraceStep {
                location: CodeLocation {
                    file: file.to_string(),
                    line: line_no,
                    column: None,
                    function_name: None,
                },
                description: "branches or awaits here".to_string(),
            });
        }
    }

    Ok(steps)
}

fn call_step(file: &str, line_no: u32, trimmed: &str) -> Option<TraceStep> {
    let callee = CALL_SITE.captures(trimmed)?.get(1)?.as_str();
    if NOT_A_CALLEE.contains(&callee) {
        return None;
    }
    Some(TraceStep {
        location: CodeLocation {
            file: file.to_string(),
            line: line_no,
            column: None,
            function_name: Some(callee.to_string()),
        },
        description: format!("calls `{callee}`"),
    })
}

fn binding_step(file: &str, line_no: u32, trimmed: &str) -> Option<TraceStep> {
    let binding = ASSIGNMENT.captures(trimmed)?.get(1)?.as_str();
    Some(TraceStep {
        location: CodeLocation {
            file: file.to_string(),
            line: line_no,
            column: None,
            function_name: None,
        },
        description: format!("binds `{binding}`"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::fs;

    fn reader_with(content: &str) -> (tempfile::TempDir, SecureReader) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), content).unwrap();
        let reader = SecureReader::new(dir.path().canonicalize().unwrap());
        (dir, reader)
    }

    #[test]
    fn flags_call_sites_from_the_entry_line() {
        let (_dir, reader) = reader_with("fn entry() {\n    do_work();\n    log(\"done\");\n}\n");
        let steps = trace_execution_path(&reader, "a.rs", 1, 10, false).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].location.function_name.as_deref(), Some("do_work"));
    }

    #[test]
    fn respects_max_depth() {
        let (_dir, reader) = reader_with("fn entry() {\n    a();\n    b();\n    c();\n}\n");
        let steps = trace_execution_path(&reader, "a.rs", 1, 2, false).unwrap();
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn data_flow_flag_includes_bindings() {
        let (_dir, reader) = reader_with("fn entry() {\n    let total = compute();\n}\n");
        let steps = trace_execution_path(&reader, "a.rs", 1, 10, false).unwrap();
        assert_eq!(steps[0].description, "calls `compute`");

        let (_dir2, reader2) = reader_with("fn entry() {\n    let total = base;\n}\n");
        let steps = trace_execution_path(&reader2, "a.rs", 1, 10, true).unwrap();
        assert!(steps.iter().any(|s| s.description.contains("binds")));
    }
}
