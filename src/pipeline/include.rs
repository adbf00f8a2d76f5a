// src/pipeline/include.rs

//! `@@include` directives for markup.
//!
//! ```html
//! @@include('partials/header.html', {"title": "Home"})
//! ```
//!
//! The referenced file is resolved relative to the including file. Inside the
//! included content, `@@title` (or `@@nav.active` for nested objects) is
//! replaced by the context value. Includes nest; parent context is inherited
//! and overridden by the directive's own object.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::fs::FileSystem;
use crate::pipeline::source::normalize;

/// Deepest include chain accepted before giving up.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Compiled directive patterns, shared by one expansion.
struct Syntax {
    include: Regex,
    var: Regex,
}

impl Syntax {
    fn new() -> Result<Self> {
        Ok(Self {
            include: Regex::new(
                r#"(?s)@@include\(\s*(?:'([^']*)'|"([^"]*)")\s*(?:,\s*(\{.*?\}))?\s*\)"#,
            )?,
            var: Regex::new(r"@@([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)")?,
        })
    }
}

/// Expand every include in `content`, which was read from `path`.
pub fn expand(fs: &dyn FileSystem, path: &Path, content: &str) -> Result<String> {
    let syntax = Syntax::new()?;
    let mut stack = vec![normalize(path)];
    expand_inner(&syntax, fs, path, content, &Map::new(), &mut stack)
}

fn expand_inner(
    syntax: &Syntax,
    fs: &dyn FileSystem,
    path: &Path,
    content: &str,
    context: &Map<String, Value>,
    stack: &mut Vec<PathBuf>,
) -> Result<String> {
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for caps in syntax.include.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&content[last..whole.start()]);
        last = whole.end();

        let target = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let child_path = normalize(&base.join(target));

        if stack.contains(&child_path) {
            bail!(
                "include cycle: {} -> {}",
                display_chain(stack),
                child_path.display()
            );
        }
        if stack.len() > MAX_INCLUDE_DEPTH {
            bail!(
                "include nesting deeper than {MAX_INCLUDE_DEPTH} at {}",
                child_path.display()
            );
        }

        let mut child_context = context.clone();
        if let Some(raw) = caps.get(3) {
            let parsed: Value = serde_json::from_str(raw.as_str())
                .with_context(|| format!("invalid include context for '{target}'"))?;
            match parsed {
                Value::Object(map) => child_context.extend(map),
                _ => return Err(anyhow!("include context for '{target}' must be an object")),
            }
        }

        let child = fs
            .read_to_string(&child_path)
            .with_context(|| format!("included from {}", path.display()))?;
        let child = substitute(&syntax.var, &child, &child_context);

        stack.push(child_path.clone());
        let expanded = expand_inner(syntax, fs, &child_path, &child, &child_context, stack)?;
        stack.pop();

        out.push_str(&expanded);
    }

    out.push_str(&content[last..]);
    Ok(out)
}

/// Replace `@@key` references that resolve in `context`; leave others alone.
fn substitute(var: &Regex, content: &str, context: &Map<String, Value>) -> String {
    if context.is_empty() {
        return content.to_string();
    }

    var.replace_all(content, |caps: &Captures<'_>| match lookup(context, &caps[1]) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => caps[0].to_string(),
        Some(other) => other.to_string(),
    })
    .into_owned()
}

fn lookup<'a>(context: &'a Map<String, Value>, dotted: &str) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let mut current = context.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn display_chain(stack: &[PathBuf]) -> String {
    stack
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn page(fs: &MockFileSystem, body: &str) -> Result<String> {
        let path = Path::new("/s/views/index.html");
        fs.add_file(path, body);
        expand(fs, path, body)
    }

    #[test]
    fn inlines_partial_relative_to_including_file() {
        let fs = MockFileSystem::new();
        fs.add_file("/s/views/partial.html", "<header>hi</header>");

        let out = page(&fs, "<body>@@include('partial.html')</body>").unwrap();
        assert_eq!(out, "<body><header>hi</header></body>");
    }

    #[test]
    fn nested_includes_resolve_against_their_own_directory() {
        let fs = MockFileSystem::new();
        fs.add_file("/s/views/parts/nav.html", "<nav>@@include(\"item.html\")</nav>");
        fs.add_file("/s/views/parts/item.html", "<a>x</a>");

        let out = page(&fs, "@@include('parts/nav.html')").unwrap();
        assert_eq!(out, "<nav><a>x</a></nav>");
    }

    #[test]
    fn context_values_are_substituted() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/s/views/head.html",
            "<title>@@title</title><i>@@meta.n</i>@@unknown",
        );

        let out = page(
            &fs,
            r#"@@include('head.html', {"title": "Home", "meta": {"n": 3}})"#,
        )
        .unwrap();
        assert_eq!(out, "<title>Home</title><i>3</i>@@unknown");
    }

    #[test]
    fn cycles_are_errors() {
        let fs = MockFileSystem::new();
        fs.add_file("/s/views/a.html", "@@include('b.html')");
        fs.add_file("/s/views/b.html", "@@include('./a.html')");

        let err = page(&fs, "@@include('a.html')").unwrap_err();
        assert!(format!("{err:#}").contains("include cycle"));
    }

    #[test]
    fn missing_partial_is_an_error() {
        let fs = MockFileSystem::new();
        assert!(page(&fs, "@@include('nope.html')").is_err());
    }
}
