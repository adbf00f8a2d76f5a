// src/pipeline/styles.rs

//! `styles/*.scss` -> `assets/css/*.css`.
//!
//! Development keeps the expanded output and appends an inline source map.
//! Production runs the compiled CSS through lightningcss for vendor prefixes
//! and minification.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use crate::config::BuildContext;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::pipeline::source::{file_matcher, file_name, matching_files};
use crate::pipeline::sourcemap::InlineSourceMap;
use crate::pipeline::{AssetKind, OutputFile};

pub fn transform(ctx: &BuildContext, fs: &dyn FileSystem) -> Result<Vec<OutputFile>> {
    let kind = AssetKind::Styles;
    let source_dir = ctx.paths.source_dir(kind.name());
    let matcher = file_matcher(&kind.file_glob())?;

    let inputs: Vec<_> = matching_files(fs, &source_dir, &matcher)?
        .into_iter()
        .filter(|p| !file_name(p).starts_with('_'))
        .collect();

    if inputs.is_empty() {
        return Ok(Vec::new());
    }

    let browsers = browser_targets(&ctx.settings.styles.targets)
        .map_err(|e| SitepipeError::ConfigError(format!("[styles].targets: {e}")))?;

    let mut outputs = Vec::with_capacity(inputs.len());
    for path in inputs {
        let fail = |message: String| SitepipeError::transform(kind.name(), &path, message);

        let scss = fs.read_to_string(&path)?;
        let css = compile_scss(&scss, &source_dir).map_err(fail)?;

        let out_name = format!("{}.css", stem(&path));
        let css = if ctx.mode.is_prod() {
            prefix_and_minify(&css, &out_name, browsers).map_err(fail)?
        } else {
            let source_name = format!("{}/{}", kind.name(), file_name(&path));
            with_source_map(&css, &out_name, &source_name, &scss).map_err(fail)?
        };

        debug!(path = ?path, bytes = css.len(), "compiled stylesheet");
        outputs.push(OutputFile::new(
            Path::new(kind.output_dir()).join(out_name),
            css.into_bytes(),
        ));
    }
    Ok(outputs)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn compile_scss(scss: &str, load_path: &Path) -> std::result::Result<String, String> {
    let options = grass::Options::default()
        .style(grass::OutputStyle::Expanded)
        .load_path(load_path);
    grass::from_string(scss.to_string(), &options).map_err(|e| e.to_string())
}

/// Prefix for `browsers` and compress.
pub fn prefix_and_minify(
    css: &str,
    filename: &str,
    browsers: Browsers,
) -> std::result::Result<String, String> {
    let targets = Targets::from(browsers);

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;

    Ok(printed.code)
}

/// Append an inline source map pointing back at the SCSS file.
///
/// The compiler does not report positions, so generated lines are mapped to
/// the first following source line that mentions the same selector or
/// property. Lines with no such source line stay unmapped.
fn with_source_map(
    css: &str,
    out_name: &str,
    source_name: &str,
    scss: &str,
) -> std::result::Result<String, String> {
    let mut map = InlineSourceMap::new(out_name);
    let source = map.add_source(source_name, scss);

    for (generated, source_line) in line_mapping(css, scss) {
        map.map_line(generated, source, source_line);
    }

    let url = map.into_data_url().map_err(|e| e.to_string())?;
    let mut out = css.trim_end().to_string();
    out.push_str(&format!("\n\n/*# sourceMappingURL={url} */\n"));
    Ok(out)
}

/// `(generated_line, source_line)` pairs, in generated order.
fn line_mapping(css: &str, scss: &str) -> Vec<(usize, usize)> {
    let source_lines: Vec<&str> = scss.lines().collect();
    let mut cursor = 0usize;
    let mut pairs = Vec::new();

    for (generated, line) in css.lines().enumerate() {
        let Some(key) = line_key(line) else { continue };

        let found = (cursor..source_lines.len())
            .chain(0..cursor)
            .find(|&i| source_lines[i].contains(key));

        if let Some(i) = found {
            cursor = i;
            pairs.push((generated, i));
        }
    }
    pairs
}

/// The selector or property name a generated CSS line starts with.
fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == "}" {
        return None;
    }
    let key = match trimmed.strip_suffix('{') {
        Some(selector) => selector.split(',').next().unwrap_or(selector),
        None => trimmed.split(':').next().unwrap_or(trimmed),
    };
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

/// Parse `"<browser> <major>[.<minor>]"` entries into lightningcss targets.
///
/// Several entries for the same browser keep the oldest version.
pub fn browser_targets(entries: &[String]) -> std::result::Result<Browsers, String> {
    let mut browsers = Browsers::default();

    for entry in entries {
        let mut parts = entry.split_whitespace();
        let (Some(name), Some(version), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("expected '<browser> <version>', got '{entry}'"));
        };

        let version = parse_version(version)
            .ok_or_else(|| format!("invalid version in '{entry}'"))?;

        let slot = match name.to_ascii_lowercase().as_str() {
            "android" => &mut browsers.android,
            "chrome" => &mut browsers.chrome,
            "edge" => &mut browsers.edge,
            "firefox" | "ff" => &mut browsers.firefox,
            "ie" => &mut browsers.ie,
            "ios" | "ios_saf" => &mut browsers.ios_saf,
            "opera" => &mut browsers.opera,
            "safari" => &mut browsers.safari,
            "samsung" => &mut browsers.samsung,
            other => return Err(format!("unknown browser '{other}' in '{entry}'")),
        };

        *slot = Some(slot.map_or(version, |existing| existing.min(version)));
    }

    Ok(browsers)
}

/// `"9.1"` -> `9 << 16 | 1 << 8`, the encoding lightningcss expects.
fn parse_version(s: &str) -> Option<u32> {
    let mut parts = s.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || major > 0xff || minor > 0xff {
        return None;
    }
    Some((major << 16) | (minor << 8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::fs::RealFileSystem;
    use crate::types::BuildMode;
    use tempfile::tempdir;

    const SCSS: &str = "$accent: #336699;\n\n.button {\n  color: $accent;\n  user-select: none;\n\n  &:hover {\n    color: red;\n  }\n}\n";

    fn site(mode: BuildMode) -> (tempfile::TempDir, BuildContext) {
        let dir = tempdir().unwrap();
        let styles = dir.path().join("src/styles");
        std::fs::create_dir_all(&styles).unwrap();
        std::fs::write(styles.join("main.scss"), SCSS).unwrap();
        std::fs::write(styles.join("_vars.scss"), "$x: 1px;").unwrap();
        let ctx = BuildContext::new(mode, ConfigFile::default(), dir.path());
        (dir, ctx)
    }

    #[test]
    fn development_output_is_expanded_with_source_map() {
        let (_dir, ctx) = site(BuildMode::Development);
        let outputs = transform(&ctx, &RealFileSystem).unwrap();

        assert_eq!(outputs.len(), 1, "partials are not emitted");
        assert_eq!(outputs[0].rel_path, Path::new("assets/css/main.css"));

        let css = String::from_utf8(outputs[0].bytes.clone()).unwrap();
        assert!(css.contains(".button {\n  color: #336699;"));
        assert!(css.contains("/*# sourceMappingURL=data:application/json"));
        assert!(!css.contains("-webkit-user-select"));
    }

    #[test]
    fn production_output_is_prefixed_and_minified() {
        let (_dir, ctx) = site(BuildMode::Production);
        let outputs = transform(&ctx, &RealFileSystem).unwrap();

        let css = String::from_utf8(outputs[0].bytes.clone()).unwrap();
        assert!(css.contains("-webkit-user-select:none"), "got: {css}");
        assert!(!css.contains("sourceMappingURL"));
        assert!(!css.contains("\n  "));
    }

    #[test]
    fn invalid_scss_is_a_transform_error() {
        let dir = tempdir().unwrap();
        let styles = dir.path().join("src/styles");
        std::fs::create_dir_all(&styles).unwrap();
        std::fs::write(styles.join("broken.scss"), ".a { color: ").unwrap();
        let ctx = BuildContext::new(BuildMode::Development, ConfigFile::default(), dir.path());

        assert!(matches!(
            transform(&ctx, &RealFileSystem),
            Err(SitepipeError::Transform { .. })
        ));
    }

    #[test]
    fn parses_browser_targets() {
        let browsers = browser_targets(&[
            "safari 9.1".to_string(),
            "ie 11".to_string(),
            "safari 10".to_string(),
        ])
        .unwrap();
        assert_eq!(browsers.safari, Some((9 << 16) | (1 << 8)));
        assert_eq!(browsers.ie, Some(11 << 16));
        assert_eq!(browsers.chrome, None);

        assert!(browser_targets(&["netscape 4".to_string()]).is_err());
        assert!(browser_targets(&["chrome".to_string()]).is_err());
        assert!(browser_targets(&["chrome x".to_string()]).is_err());
    }

    #[test]
    fn line_keys() {
        assert_eq!(line_key(".a, .b {"), Some(".a"));
        assert_eq!(line_key("  color: red;"), Some("color"));
        assert_eq!(line_key("}"), None);
    }

    #[test]
    fn unmatched_lines_stay_unmapped() {
        let scss = "$w: 2px;\n.box {\n  border: $w solid;\n}\n";
        let css = ".box {\n  border: 2px solid;\n  -generated-only: 1;\n}\n";

        assert_eq!(line_mapping(css, scss), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn mapping_wraps_around_for_reordered_output() {
        let scss = ".a {\n  color: red;\n}\n.b {\n  margin: 0;\n}\n";
        let css = ".b {\n  margin: 0;\n}\n.a {\n  color: red;\n}\n";

        assert_eq!(line_mapping(css, scss), vec![(0, 3), (1, 4), (3, 0), (4, 1)]);
    }
}
