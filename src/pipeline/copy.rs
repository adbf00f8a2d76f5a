// src/pipeline/copy.rs

//! Pure copy categories (fonts, metadata).

use std::path::Path;

use crate::config::BuildContext;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pipeline::source::{file_matcher, file_name, matching_files};
use crate::pipeline::{AssetKind, OutputFile};

pub fn transform(asset: AssetKind, ctx: &BuildContext, fs: &dyn FileSystem) -> Result<Vec<OutputFile>> {
    let matcher = file_matcher(&asset.file_glob())?;
    let inputs = matching_files(fs, &ctx.paths.source_dir(asset.name()), &matcher)?;

    let mut outputs = Vec::with_capacity(inputs.len());
    for path in inputs {
        let bytes = fs.read(&path)?;
        outputs.push(OutputFile::new(
            Path::new(asset.output_dir()).join(file_name(&path)),
            bytes,
        ));
    }
    Ok(outputs)
}
