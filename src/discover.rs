use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    compile::build_unit,
    config::ToolConfig,
    tool::{Artifact, ToolRunner},
};

/// A directory is in scope if any component of its path is the marker, so subdirectories of a
/// marker directory are in scope too.
pub fn in_scope(dir: &Path, marker: &str) -> bool {
    dir.components()
        .any(|component| component.as_os_str() == marker)
}

/// Walks the whole tree below `root` and returns every recognized shader that lives in an
/// in-scope directory, in file name order.
///
/// Entries that cannot be read are skipped with a warning, but `root` itself has to be readable.
pub fn find_shaders(root: &Path, config: &ToolConfig) -> anyhow::Result<Vec<PathBuf>> {
    let mut shaders = Vec::new();

    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) if error.depth() == 0 => {
                return Err(error).with_context(|| format!("could not search {:?}", root));
            }
            Err(error) => {
                warn!("skipping unreadable entry: {error}");
                continue;
            }
        };

        if !entry.path().is_file() || !config.is_shader(entry.path()) {
            continue;
        }

        let in_marked_dir = entry
            .path()
            .parent()
            .map_or(false, |dir| in_scope(dir, &config.marker));

        if in_marked_dir {
            shaders.push(entry.into_path());
        }
    }

    Ok(shaders)
}

#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Generated fragments
    pub built: Vec<PathBuf>,

    /// Shaders that failed to compile or convert
    pub failed: Vec<PathBuf>,
}

/// Builds every shader below `root`. A shader that fails is logged and skipped; the rest of the
/// tree is still built.
pub fn build_tree(
    config: &ToolConfig,
    runner: &mut dyn ToolRunner,
    root: &Path,
) -> anyhow::Result<BuildSummary> {
    let shaders = find_shaders(root, config)?;
    if shaders.is_empty() {
        warn!(
            "no shaders found in '{}' directories under {:?}",
            config.marker, root
        );
    }

    let mut summary = BuildSummary::default();
    let mut current_dir = None;

    for shader in shaders {
        let dir = shader.parent().map(Path::to_path_buf);
        if dir != current_dir {
            if let Some(dir) = &dir {
                info!("===== [{}] =====", dir.display());
            }
            current_dir = dir;
        }

        let artifact = Artifact::acquire()?;
        match build_unit(config, runner, &shader, artifact.path()) {
            Ok(fragment) => summary.built.push(fragment),
            Err(error) => {
                error!(code = ?error.status().code(), "{error}");
                summary.failed.push(error.path().to_owned());
            }
        }
    }

    info!(
        "{} shader(s) built, {} failed",
        summary.built.len(),
        summary.failed.len()
    );

    Ok(summary)
}
