//! `performance_bottleneck`'s heuristic half (spec.md §6). Scans the code
//! path's entry file for patterns that commonly precede real bottlenecks —
//! nested loops, blocking I/O, and query calls — down to `profile_depth`
//! lines past the entry point.

use std::path::Path;

use crate::error::Result;
use crate::secure_reader::SecureReader;

const LOOP_KEYWORDS: &[&str] = &["for ", "while ", ".iter()", ".map(", ".collect()"];
const IO_KEYWORDS: &[&str] = &[".await", "read_to_string", "File::open", "TcpStream"];
const QUERY_KEYWORDS: &[&str] = &["SELECT ", "query(", "execute(", "find(", "fetch("];

/// One annotation per flagged line within `profile_depth * 20` lines of the
/// entry point — a rough proxy for "how deep to look", since there is no
/// real profiler here.
pub fn performance_bottleneck(
    reader: &SecureReader,
    file: &str,
    start_line: u32,
    profile_depth: u8,
) -> Result<Vec<String>> {
    let content = reader.read(Path::new(file))?;
    let window = profile_depth as usize * 20;
    let mut annotations = Vec::new();
    let mut loop_depth = 0i32;

    for (offset, raw_line) in content
        .lines()
        .enumerate()
        .skip(start_line as usize)
        .take(window)
    {
        let line_no = offset as u32;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if LOOP_KEYWORDS.iter().any(|kw| trimmed.contains(kw)) {
            loop_depth += 1;
            if loop_depth >= 2 {
                annotations.push(format!(
                    "{file}:{line_no} nested iteration (depth {loop_depth}), check for O(n^2) work"
                ));
            }
        }
        if trimmed.contains('}') {
            loop_depth = (loop_depth - 1).max(0);
        }

        if IO_KEYWORDS.iter().any(|kw| trimmed.contains(kw)) {
            annotations.push(format!("{file}:{line_no} blocking or async I/O in this path"));
        }
        if QUERY_KEYWORDS.iter().any(|kw| trimmed.contains(kw)) {
            annotations.push(format!(
                "{file}:{line_no} looks like a database call inside the traced path"
            ));
        }
    }

    Ok(annotations)
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
    fn flags_nested_loops() {
        let (_dir, reader) = reader_with(
            "fn handler() {\n    for row in rows {\n        for col in row.iter() {\n            touch(col);\n        }\n    }\n}\n",
        );
        let annotations = performance_bottleneck(&reader, "a.rs", 1, 3).unwrap();
        assert!(annotations.iter().any(|a| a.contains("nested iteration")));
    }

    #[test]
    fn flags_query_calls() {
        let (_dir, reader) = reader_with("fn handler() {\n    let rows = db.query(\"select 1\");\n}\n");
        let annotations = performance_bottleneck(&reader, "a.rs", 1, 1).unwrap();
        assert!(annotations.iter().any(|a| a.contains("database call")));
    }
}
