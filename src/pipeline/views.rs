// src/pipeline/views.rs

use crate::config::BuildContext;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::pipeline::include;
use crate::pipeline::source::{file_matcher, file_name, matching_files};
use crate::pipeline::{AssetKind, OutputFile};

/// `views/*.html` -> `<output>/<name>.html` with includes resolved.
///
/// Partials live in sub-directories (or are only ever included), so the
/// one-level glob keeps them out of the output.
pub fn transform(ctx: &BuildContext, fs: &dyn FileSystem) -> Result<Vec<OutputFile>> {
    let kind = AssetKind::Views;
    let matcher = file_matcher(&kind.file_glob())?;
    let inputs = matching_files(fs, &ctx.paths.source_dir(kind.name()), &matcher)?;

    let mut outputs = Vec::with_capacity(inputs.len());
    for path in inputs {
        let content = fs.read_to_string(&path)?;
        let html = include::expand(fs, &path, &content)
            .map_err(|err| SitepipeError::transform(kind.name(), &path, format!("{err:#}")))?;
        outputs.push(OutputFile::new(file_name(&path), html.into_bytes()));
    }
    Ok(outputs)
}
