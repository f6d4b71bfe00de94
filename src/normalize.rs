//! Expression cleanup before typesetting.
//!
//! Two passes live here: flattening `aligned` blocks into plain stacked rows,
//! and cutting batch-file text into one expression per section.

pub const ALIGNED_BEGIN: &str = r"\begin{aligned}";
pub const ALIGNED_END: &str = r"\end{aligned}";
pub const ROW_SEPARATOR: &str = r"\\";
pub const SECTION_SEPARATOR: &str = "---";

const COMMENT_MARKER: char = '#';

/// Flatten an `aligned` block into rows joined by ` \\ `.
///
/// Markers are removed, rows are trimmed, `&` alignment points are dropped and
/// empty rows disappear. Expressions without the begin marker are returned
/// unchanged.
pub fn normalize_aligned(expr: &str) -> String {
    if !expr.contains(ALIGNED_BEGIN) {
        return expr.to_owned();
    }

    let content = expr.replace(ALIGNED_BEGIN, "").replace(ALIGNED_END, "");
    let rows: Vec<String> = content
        .split(ROW_SEPARATOR)
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .map(|row| row.replace('&', ""))
        .collect();

    rows.join(&format!(" {ROW_SEPARATOR} "))
}

pub fn is_multiline(expr: &str) -> bool {
    expr.contains(ROW_SEPARATOR)
}

/// Split batch-file content into expressions, one per non-empty section.
///
/// Sections are separated by lines that read exactly `---` (surrounding
/// whitespace ignored). Within a section, blank lines and `#` comments are
/// dropped, except inside an `aligned` block where every non-blank line is
/// kept as written. The surviving lines are joined with single spaces.
pub fn split_sections(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if line.trim() == SECTION_SEPARATOR {
            out.extend(section_expression(&current));
            current.clear();
        } else {
            current.push(line);
        }
    }
    out.extend(section_expression(&current));
    out
}

fn section_expression(lines: &[&str]) -> Option<String> {
    let mut kept: Vec<&str> = Vec::new();
    let mut in_aligned = false;

    for line in lines.iter().map(|l| l.trim()) {
        if line.is_empty() {
            continue;
        }

        if in_aligned {
            kept.push(line);
            if line.contains(ALIGNED_END) {
                in_aligned = false;
            }
            continue;
        }

        if line.starts_with(COMMENT_MARKER) {
            continue;
        }

        if line.contains(ALIGNED_BEGIN) && !line.contains(ALIGNED_END) {
            in_aligned = true;
        }
        kept.push(line);
    }

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}
