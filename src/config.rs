use std::{
    collections::BTreeSet,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use anyhow::Context;

pub const COMPILER_NAME: &str = "glslc";
pub const CONVERTER_NAME: &str = "file_to_cpp";

/// Name of the directories that are searched for shaders in recursive mode.
pub const DEFAULT_MARKER: &str = "shaders";
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["frag", "vert"];
pub const FRAGMENT_SUFFIX: &str = "inl";

/// Everything the build policies need to know about the external tools and which files they
/// should be run on.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub compiler: PathBuf,
    pub converter: PathBuf,

    /// Extra flags passed to the compiler before the input path
    pub flags: Vec<String>,

    /// Recognized shader extensions, without the leading dot
    pub extensions: BTreeSet<String>,

    /// Directory name that marks a subtree as containing shaders
    pub marker: String,

    /// Appended (after a dot) to a shader path to get its fragment path
    pub fragment_suffix: String,
}

impl ToolConfig {
    pub fn new(compiler: impl Into<PathBuf>, converter: impl Into<PathBuf>) -> ToolConfig {
        ToolConfig {
            compiler: compiler.into(),
            converter: converter.into(),
            flags: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            marker: DEFAULT_MARKER.to_owned(),
            fragment_suffix: FRAGMENT_SUFFIX.to_owned(),
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> ToolConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the recognized extensions. A leading dot is accepted and ignored.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> ToolConfig
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_owned())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> ToolConfig {
        self.marker = marker.into();
        self
    }

    pub fn is_shader(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .map_or(false, |ext| self.extensions.contains(ext))
    }

    /// `shaders/a.vert` becomes `shaders/a.vert.inl`.
    pub fn fragment_path(&self, shader: &Path) -> PathBuf {
        let mut path = shader.as_os_str().to_owned();
        path.push(".");
        path.push(&self.fragment_suffix);
        path.into()
    }

    /// Short name of the compiler for log messages.
    pub fn compiler_name(&self) -> String {
        tool_name(&self.compiler)
    }

    pub fn converter_name(&self) -> String {
        tool_name(&self.converter)
    }
}

fn tool_name(path: &Path) -> String {
    path.file_stem()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Appends the platform's executable suffix (`.exe` on Windows).
pub fn executable(path: PathBuf) -> PathBuf {
    let mut path = path.into_os_string();
    path.push(std::env::consts::EXE_SUFFIX);
    path.into()
}

/// The compiler inside an SDK installation: `<sdk>/Bin/glslc`.
pub fn compiler_in_sdk(sdk: &Path) -> PathBuf {
    executable(sdk.join("Bin").join(COMPILER_NAME))
}

/// The converter is expected next to the working directory: `./file_to_cpp`.
pub fn default_converter() -> PathBuf {
    executable(Path::new(".").join(CONVERTER_NAME))
}

/// An explicit compiler path wins over the one derived from the SDK root.
pub fn locate_compiler(sdk: Option<&Path>, explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    explicit
        .or_else(|| sdk.map(compiler_in_sdk))
        .context("could not locate the shader compiler: set VULKAN_SDK or pass --compiler")
}
