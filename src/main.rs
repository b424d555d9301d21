mod compile;
mod config;
mod discover;
mod tool;

use std::path::PathBuf;

use clap::Parser;
use config::ToolConfig;
use tool::ProcessRunner;

#[macro_use]
extern crate tracing;

/// Compiles GLSL shaders with `glslc` and turns the output into `.inl` files that can be
/// included from C++.
#[derive(Debug, Parser)]
#[clap(version)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Build the given shaders, stopping at the first failure
    Compile {
        #[clap(flatten)]
        tools: ToolArgs,

        #[clap(value_name = "SHADER", required = true)]
        shaders: Vec<PathBuf>,
    },

    /// Build every shader found in `shaders` directories below SEARCH_PATH
    Build {
        #[clap(flatten)]
        tools: ToolArgs,

        /// Recognized shader extension (repeatable, replaces the defaults)
        #[clap(long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Name of the directories that contain shaders
        #[clap(long, default_value = config::DEFAULT_MARKER)]
        marker: String,

        search_path: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct ToolArgs {
    /// Root of the Vulkan SDK, the compiler is expected in its `Bin` directory
    #[clap(long, env = "VULKAN_SDK", value_name = "DIR")]
    sdk: Option<PathBuf>,

    /// Use this compiler instead of the one in the SDK
    #[clap(long, value_name = "PATH")]
    compiler: Option<PathBuf>,

    /// Path to `file_to_cpp` [default: ./file_to_cpp]
    #[clap(long, value_name = "PATH")]
    converter: Option<PathBuf>,

    /// Flag passed to the compiler (repeatable, replaces the defaults)
    #[clap(long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
    flags: Vec<String>,
}

impl ToolArgs {
    fn resolve(self, default_flags: &[&str]) -> anyhow::Result<ToolConfig> {
        let compiler = config::locate_compiler(self.sdk.as_deref(), self.compiler)?;
        let converter = self.converter.unwrap_or_else(config::default_converter);

        let config = if self.flags.is_empty() {
            ToolConfig::new(compiler, converter).with_flags(default_flags.iter().copied())
        } else {
            ToolConfig::new(compiler, converter).with_flags(self.flags)
        };

        debug!(?config, "resolved tools");
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shader_inl=info")),
        )
        .with_target(false)
        .without_time()
        .init();

    match Args::parse().command {
        Command::Compile { tools, shaders } => {
            let config = tools.resolve(&["-O"])?;
            if let Err(error) = compile::compile_all(&config, &mut ProcessRunner, &shaders) {
                error!("{error:#}");
                std::process::exit(1);
            }
        }
        Command::Build {
            tools,
            extensions,
            marker,
            search_path,
        } => {
            let mut config = tools.resolve(&[])?.with_marker(marker);
            if !extensions.is_empty() {
                config = config.with_extensions(extensions);
            }
            discover::build_tree(&config, &mut ProcessRunner, &search_path)?;
        }
    }

    Ok(())
}
