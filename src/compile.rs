use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use crate::{
    config::ToolConfig,
    tool::{Artifact, ToolRunner, ToolStatus},
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{tool}: shader compilation failed for {path:?} [{status}]")]
    Compile {
        tool: String,
        path: PathBuf,
        status: ToolStatus,
    },

    #[error("{tool}: failed to generate {fragment:?} [{status}]")]
    Convert {
        tool: String,
        path: PathBuf,
        fragment: PathBuf,
        status: ToolStatus,
    },
}

impl BuildError {
    /// The shader that could not be built.
    pub fn path(&self) -> &Path {
        match self {
            BuildError::Compile { path, .. } | BuildError::Convert { path, .. } => path,
        }
    }

    pub fn status(&self) -> ToolStatus {
        match self {
            BuildError::Compile { status, .. } | BuildError::Convert { status, .. } => *status,
        }
    }
}

/// Compiles one shader into `artifact` and converts it into an includable fragment next to
/// the shader. Returns the path of the fragment.
pub fn build_unit(
    config: &ToolConfig,
    runner: &mut dyn ToolRunner,
    shader: &Path,
    artifact: &Path,
) -> Result<PathBuf, BuildError> {
    let mut args: Vec<&OsStr> = config.flags.iter().map(OsStr::new).collect();
    args.extend([shader.as_os_str(), OsStr::new("-o"), artifact.as_os_str()]);

    let status = runner.run(&config.compiler, &args);
    if !status.success() {
        return Err(BuildError::Compile {
            tool: config.compiler_name(),
            path: shader.to_owned(),
            status,
        });
    }
    info!("compiled shader: {:?}", shader);

    let fragment = config.fragment_path(shader);
    let status = runner.run(
        &config.converter,
        &[artifact.as_os_str(), fragment.as_os_str()],
    );
    if !status.success() {
        return Err(BuildError::Convert {
            tool: config.converter_name(),
            path: shader.to_owned(),
            fragment,
            status,
        });
    }
    info!("generated shader include: {:?}", fragment);

    Ok(fragment)
}

/// Builds every shader in order, stopping at the first one that fails.
///
/// Each shader gets its own artifact, which is gone by the time this returns.
pub fn compile_all(
    config: &ToolConfig,
    runner: &mut dyn ToolRunner,
    shaders: &[PathBuf],
) -> anyhow::Result<Vec<PathBuf>> {
    let mut fragments = Vec::with_capacity(shaders.len());
    for shader in shaders {
        let artifact = Artifact::acquire()?;
        fragments.push(build_unit(config, runner, shader, artifact.path())?);
    }
    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::testing::{config, ScriptedRunner};

    fn write_shaders(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, format!("// {name}")).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn success_produces_one_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = write_shaders(dir.path(), &["sky.frag"]);
        let mut runner = ScriptedRunner::default();

        let fragments = compile_all(&config(), &mut runner, &shaders).unwrap();

        let expected = dir.path().join("sky.frag.inl");
        assert_eq!(fragments, [expected.clone()]);
        assert_eq!(
            std::fs::read_to_string(expected).unwrap(),
            "{ spirv(// sky.frag) }"
        );
    }

    #[test]
    fn compiler_gets_flags_before_input() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = write_shaders(dir.path(), &["a.vert"]);
        let mut runner = ScriptedRunner::default();
        let config = config().with_flags(["-O", "-g"]);

        compile_all(&config, &mut runner, &shaders).unwrap();

        let (program, args) = &runner.calls[0];
        assert_eq!(program, Path::new("glslc"));
        assert_eq!(args[0], "-O");
        assert_eq!(args[1], "-g");
        assert_eq!(args[2], shaders[0].as_os_str());
        assert_eq!(args[3], "-o");
    }

    #[test]
    fn stops_at_first_compile_failure() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = write_shaders(dir.path(), &["s1.vert", "s2.vert", "s3.vert"]);
        let mut runner = ScriptedRunner::default().failing_compile(&shaders[1]);

        let error = compile_all(&config(), &mut runner, &shaders).unwrap_err();

        let error = error.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(error, BuildError::Compile { .. }));
        assert_eq!(error.path(), shaders[1]);
        assert_eq!(error.status().code(), Some(2));

        assert_eq!(runner.compiled(), &shaders[..2]);
        assert!(dir.path().join("s1.vert.inl").exists());
        assert!(!dir.path().join("s2.vert.inl").exists());
        assert!(!dir.path().join("s3.vert.inl").exists());
    }

    #[test]
    fn stops_at_first_convert_failure() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = write_shaders(dir.path(), &["a.vert", "b.frag"]);
        let mut runner =
            ScriptedRunner::default().failing_convert(dir.path().join("a.vert.inl"));

        let error = compile_all(&config(), &mut runner, &shaders).unwrap_err();

        let error = error.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(error, BuildError::Convert { .. }));
        assert_eq!(error.status().code(), Some(3));
        assert!(error.to_string().contains("file_to_cpp"));
        assert_eq!(runner.compiled(), &shaders[..1]);
    }

    #[test]
    fn converter_reads_the_artifact_the_compiler_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = write_shaders(dir.path(), &["a.vert", "b.frag"]);
        let mut runner = ScriptedRunner::default();

        compile_all(&config(), &mut runner, &shaders).unwrap();

        for (compile, convert) in runner.calls.chunks(2).map(|pair| (&pair[0], &pair[1])) {
            assert_eq!(compile.1.last(), convert.1.first());
        }
        assert_eq!(runner.converted().len(), 2);
    }

    #[test]
    fn no_artifact_survives_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = write_shaders(dir.path(), &["a.vert", "b.frag", "c.frag"]);
        let mut runner = ScriptedRunner::default().failing_compile(&shaders[2]);

        let _ = compile_all(&config(), &mut runner, &shaders);

        assert_eq!(runner.artifacts.len(), 3);
        assert!(runner.artifacts.iter().all(|path| !path.exists()));
    }
}
