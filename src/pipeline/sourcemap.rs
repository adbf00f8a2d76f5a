// src/pipeline/sourcemap.rs

//! Line-level source maps, inlined as a base64 data URL.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sourcemap::{SourceMap, SourceMapBuilder};

/// Maps whole generated lines to lines of one of several sources.
///
/// Lines must be mapped in increasing generated order.
pub struct InlineSourceMap {
    builder: SourceMapBuilder,
}

impl fmt::Debug for InlineSourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineSourceMap").finish_non_exhaustive()
    }
}

impl InlineSourceMap {
    pub fn new(file: &str) -> Self {
        Self {
            builder: SourceMapBuilder::new(Some(file)),
        }
    }

    /// Register a source with its contents and return its id.
    pub fn add_source(&mut self, name: &str, content: &str) -> u32 {
        let id = self.builder.add_source(name);
        self.builder.set_source_contents(id, Some(content));
        id
    }

    /// Map generated line `generated` (0-based) to `source_line` of `source`.
    pub fn map_line(&mut self, generated: usize, source: u32, source_line: usize) {
        let (Ok(dst_line), Ok(src_line)) = (u32::try_from(generated), u32::try_from(source_line))
        else {
            return;
        };
        self.builder
            .add_raw(dst_line, 0, src_line, 0, Some(source), None, false);
    }

    pub fn into_source_map(self) -> SourceMap {
        self.builder.into_sourcemap()
    }

    pub fn into_data_url(self) -> Result<String, sourcemap::Error> {
        let mut json = Vec::new();
        self.into_source_map().to_writer(&mut json)?;
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(json)
        ))
    }
}
