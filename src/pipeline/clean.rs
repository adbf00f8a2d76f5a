// src/pipeline/clean.rs

use tracing::info;

use crate::config::BuildContext;
use crate::errors::{Result, SitepipeError};
use crate::fs::FileSystem;
use crate::pipeline::catalog::CLEAN_TASK;

/// Remove the output root. An absent directory is a successful no-op.
pub fn run(ctx: &BuildContext, fs: &dyn FileSystem) -> Result<()> {
    let root = &ctx.paths.output_root;

    let removed = fs
        .remove_dir_all(root)
        .map_err(|err| SitepipeError::transform(CLEAN_TASK, root, format!("{err:#}")))?;

    if removed {
        info!(path = ?root, "removed output directory");
    } else {
        info!(path = ?root, "output directory absent; nothing to clean");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::fs::mock::MockFileSystem;
    use crate::types::BuildMode;
    use std::path::Path;

    fn ctx() -> BuildContext {
        BuildContext::new(BuildMode::Development, ConfigFile::default(), Path::new("/site"))
    }

    #[test]
    fn removes_previous_output() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/dist/old.html", "stale");
        fs.add_file("/site/src/views/index.html", "keep");

        run(&ctx(), &fs).unwrap();

        assert!(fs.files_under("/site/dist").is_empty());
        assert!(fs.exists(Path::new("/site/src/views/index.html")));
    }

    #[test]
    fn absent_output_is_ok() {
        let fs = MockFileSystem::new();
        assert!(run(&ctx(), &fs).is_ok());
    }

    #[test]
    fn locked_output_is_reported() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/dist/index.html", "x");
        fs.lock_dir("/site/dist");

        match run(&ctx(), &fs) {
            Err(SitepipeError::Transform { task, .. }) => assert_eq!(task, "clean"),
            other => panic!("expected clean failure, got {other:?}"),
        }
    }
}
