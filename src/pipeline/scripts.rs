// src/pipeline/scripts.rs

//! `scripts/<entry>` and its relative imports -> `assets/js/<bundle>`.

use std::path::Path;

use minify_js::{minify, Session, TopLevelMode};
use tracing::debug;

use crate::config::BuildContext;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::pipeline::bundle::bundle;
use crate::pipeline::{AssetKind, OutputFile};

pub fn transform(ctx: &BuildContext, fs: &dyn FileSystem) -> Result<Vec<OutputFile>> {
    let kind = AssetKind::Scripts;
    let settings = &ctx.settings.scripts;
    let entry = ctx.paths.source_dir(kind.name()).join(&settings.entry);

    if !fs.is_file(&entry) {
        debug!(path = ?entry, "no script entry; nothing to bundle");
        return Ok(Vec::new());
    }

    let bundled = bundle(
        fs,
        &entry,
        &ctx.paths.source_root,
        &settings.global_name,
        ctx.mode.is_dev(),
        &settings.bundle,
    )
    .map_err(|e| SitepipeError::transform(kind.name(), &e.path, &e.message))?;

    let code = match bundled.source_map {
        Some(map) => {
            let url = map
                .into_data_url()
                .map_err(|e| SitepipeError::transform(kind.name(), &entry, e))?;
            format!("{}//# sourceMappingURL={url}\n", bundled.code)
        }
        None => minify_source(&bundled.code)
            .map_err(|e| SitepipeError::transform(kind.name(), &entry, e))?,
    };

    Ok(vec![OutputFile::new(
        Path::new(kind.output_dir()).join(&settings.bundle),
        code.into_bytes(),
    )])
}

/// Minify a classic (non-module) script.
pub fn minify_source(code: &str) -> std::result::Result<String, String> {
    let session = Session::new();
    let mut out = Vec::new();
    minify(&session, TopLevelMode::Global, code.as_bytes(), &mut out)
        .map_err(|e| format!("{e:?}"))?;
    String::from_utf8(out).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::fs::mock::MockFileSystem;
    use crate::types::BuildMode;

    const ENTRY: &str = "// Entry point.\nimport { add } from './math.js';\n\n/* Exposed for the page. */\nexport function total(values) {\n  var sum = 0;\n  for (var i = 0; i < values.length; i++) {\n    sum = add(sum, values[i]);\n  }\n  return sum;\n}\n";
    const MATH: &str = "// Helpers.\nexport function add(left, right) {\n  return left + right;\n}\n";

    fn site() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/scripts/index.js", ENTRY);
        fs.add_file("/site/src/scripts/math.js", MATH);
        fs
    }

    fn ctx(mode: BuildMode) -> BuildContext {
        BuildContext::new(mode, ConfigFile::default(), Path::new("/site"))
    }

    #[test]
    fn development_bundle_has_source_map_and_is_not_minified() {
        let outputs = transform(&ctx(BuildMode::Development), &site()).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].rel_path, Path::new("assets/js/app.js"));

        let js = String::from_utf8(outputs[0].bytes.clone()).unwrap();
        assert!(js.contains("//# sourceMappingURL=data:application/json"));
        assert!(js.contains("    sum = add(sum, values[i]);"));
    }

    #[test]
    fn production_bundle_is_minified() {
        let outputs = transform(&ctx(BuildMode::Production), &site()).unwrap();
        let js = String::from_utf8(outputs[0].bytes.clone()).unwrap();

        assert!(!js.contains("sourceMappingURL"));
        assert!(!js.contains("// Helpers."));
        assert!(js.len() < ENTRY.len() + MATH.len());
    }

    #[test]
    fn missing_entry_writes_nothing() {
        let fs = MockFileSystem::new();
        assert!(transform(&ctx(BuildMode::Production), &fs).unwrap().is_empty());
    }

    #[test]
    fn bare_import_fails_the_task() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/scripts/index.js", "import $ from 'jquery';\n");

        match transform(&ctx(BuildMode::Development), &fs) {
            Err(SitepipeError::Transform { task, message, .. }) => {
                assert_eq!(task, "scripts");
                assert!(message.contains("jquery"));
            }
            other => panic!("expected transform error, got {other:?}"),
        }
    }

    #[test]
    fn commented_out_bare_import_does_not_fail_the_task() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/site/src/scripts/index.js",
            "/*\nimport x from 'docs-example';\n*/\nexport const ready = true;\n",
        );

        let outputs = transform(&ctx(BuildMode::Production), &fs).unwrap();
        assert_eq!(outputs.len(), 1);
    }
}
