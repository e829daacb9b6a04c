use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use sprout_graphics::backend::Backend;
use sprout_shader_compiler::{compile_precompiled, host_backends};

#[derive(Parser, Debug)]
#[command(name = "compile_shaders", about = "Precompile an HLSL shader for every Sprout backend")]
struct Cli {
    /// HLSL source file
    input: PathBuf,
    /// Output container (.pcsh)
    #[arg(short, long)]
    output: PathBuf,
    /// Vertex shader entry point
    #[arg(long = "vs", default_value = "VSMain")]
    vertex_entry: String,
    /// Pixel shader entry point
    #[arg(long = "ps", default_value = "PSMain")]
    pixel_entry: String,
    /// Directory searched by #include
    #[arg(short = 'I', long = "include")]
    include_dir: Option<PathBuf>,
    /// Backends to compile for (default: every backend this host supports)
    #[arg(long = "backend")]
    backends: Vec<Backend>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let backends = if cli.backends.is_empty() {
        host_backends()
    } else {
        cli.backends.clone()
    };
    if backends.contains(&Backend::Unknown) {
        bail!("'auto' is not a compile target, name a concrete backend");
    }

    for backend in &backends {
        println!("Compiling shader for {}", backend);
    }

    let container = compile_precompiled(
        &source,
        &cli.vertex_entry,
        &cli.pixel_entry,
        cli.include_dir.as_deref(),
        &backends,
    )
    .with_context(|| format!("compiling {}", cli.input.display()))?;

    container
        .save(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    println!("Wrote {} shaders to {}", container.len(), cli.output.display());
    Ok(())
}
