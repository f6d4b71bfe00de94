use std::{io, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tex2png::{CollisionPolicy, Color, Config, Converter, InputKind, source};

#[derive(Parser, Debug)]
#[command(
    name = "tex2png",
    version,
    about = "Convert LaTeX equations to PNG images"
)]
struct Cli {
    /// Batch file with `---`-separated expressions, a single expression
    /// (optionally wrapped in `$...$`), or nothing to read from stdin.
    input: Option<String>,

    /// Directory to save output images [default: output].
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Output resolution in DPI [default: 300].
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    dpi: Option<u32>,

    /// Font size for equations, in points [default: 14].
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    font_size: Option<u32>,

    /// Make the background transparent.
    #[arg(long)]
    transparent: bool,

    /// Padding around equations in pixels [default: 10].
    #[arg(long)]
    padding: Option<u32>,

    /// Filename prefix for generated images [default: equation_].
    #[arg(long)]
    prefix: Option<String>,

    /// Equation color: a name or #RRGGBB[AA] [default: black].
    #[arg(long)]
    font_color: Option<Color>,

    /// Background color, ignored with --transparent [default: white].
    #[arg(long)]
    background_color: Option<Color>,

    /// JSON config file; flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// What to do when an auto-generated name already exists [default: overwrite].
    #[arg(long, value_enum)]
    on_collision: Option<CollisionPolicy>,

    /// Log per-expression diagnostics to stderr.
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn build_config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(v) = self.dpi {
            cfg.dpi = v;
        }
        if let Some(v) = self.font_size {
            cfg.font_size = v;
        }
        if self.transparent {
            cfg.transparent = true;
        }
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = &self.prefix {
            cfg.filename_prefix = v.clone();
        }
        if let Some(v) = self.font_color {
            cfg.font_color = v;
        }
        if let Some(v) = self.background_color {
            cfg.background_color = v;
        }
        if let Some(v) = &self.output_dir {
            cfg.output_dir = v.clone();
        }
        if let Some(v) = self.on_collision {
            cfg.collision = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.build_config()?;
    let converter = Converter::new(config)?;

    match InputKind::classify(cli.input.as_deref()) {
        InputKind::Interactive => {
            eprintln!("Enter LaTeX expressions (one per line, empty line to finish):");
            let exprs = source::read_interactive(io::stdin().lock())?;
            if !exprs.is_empty() {
                let paths = converter.convert_batch(&exprs, &[])?;
                print_paths(&paths);
            }
        }
        InputKind::Single(expr) | InputKind::Raw(expr) => {
            let path = converter
                .convert_single(&expr, None)
                .with_context(|| format!("convert expression {expr:?}"))?;
            println!("Generated image: {}", path.display());
        }
        InputKind::File(path) => {
            let paths = converter
                .convert_from_file(&path, cli.output_dir.as_deref())
                .with_context(|| format!("convert batch file '{}'", path.display()))?;
            print_paths(&paths);
        }
    }

    Ok(())
}

fn print_paths(paths: &[PathBuf]) {
    println!("Generated {} images:", paths.len());
    for p in paths {
        println!(" - {}", p.display());
    }
}
