//! `#include "…"` resolution shared by the shaderc and D3DCompile paths

use std::path::{Path, PathBuf};

use sprout_graphics::{Error, Result};

/// Nesting limit for [`expand_includes`]
const MAX_INCLUDE_DEPTH: usize = 32;

/// Locate and read an included file
///
/// Looks next to the including file first, then in `include_dir`. Returns
/// the resolved path and the file contents.
pub fn resolve_include(
    requested: &str,
    requesting: &str,
    include_dir: Option<&Path>,
) -> std::result::Result<(String, String), String> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(parent) = Path::new(requesting).parent() {
        if !parent.as_os_str().is_empty() {
            candidates.push(parent.join(requested));
        }
    }
    if let Some(dir) = include_dir {
        candidates.push(dir.join(requested));
    }

    for candidate in candidates {
        if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate)
                .map_err(|e| format!("Cannot read {}: {}", candidate.display(), e))?;
            return Ok((candidate.to_string_lossy().into_owned(), content));
        }
    }

    Err(format!("Cannot find include file \"{}\"", requested))
}

/// Parse `#include "name"` (or `<name>`), returning the name
fn include_target(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start().strip_prefix("include")?;
    let rest = rest.trim();
    let (open, close) = match rest.chars().next()? {
        '"' => ('"', '"'),
        '<' => ('<', '>'),
        _ => return None,
    };
    let inner = rest.strip_prefix(open)?;
    let end = inner.find(close)?;
    Some(&inner[..end])
}

/// Inline every include directive of `source`
///
/// Used where the native compiler gets no include handler.
pub fn expand_includes(source: &str, include_dir: Option<&Path>) -> Result<String> {
    expand_recursive(source, "shader.hlsl", include_dir, 0)
}

fn expand_recursive(source: &str, name: &str, include_dir: Option<&Path>, depth: usize) -> Result<String> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(Error::InvalidResource(format!(
            "Include depth exceeds {} in {}",
            MAX_INCLUDE_DEPTH, name
        )));
    }

    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        match include_target(line) {
            Some(requested) => {
                let (resolved, content) = resolve_include(requested, name, include_dir)
                    .map_err(Error::InvalidResource)?;
                let expanded = expand_recursive(&content, &resolved, include_dir, depth + 1)?;
                out.push_str(&expanded);
                if !expanded.ends_with('\n') {
                    out.push('\n');
                }
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "include_tests.rs"]
mod tests;
