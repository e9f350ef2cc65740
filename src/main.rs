mod config;
mod convert;
mod files;
mod gcode;
mod machine;
mod render;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{is_override, ConvertConfig, OVERRIDE_HELP};
use convert::{convert, Summary};
use gcode::ConvertError;
use render::{Render, Script};
use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process,
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::info;

/// Plot every toolpath segment of a sliced G-code file in 3D
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, after_help = OVERRIDE_HELP)]
struct Args {
    /// Annotate the script with every source line
    #[clap(short, long)]
    debug: bool,

    /// Number annotated source lines
    #[clap(short = 'n', long)]
    line_numbers: bool,

    /// Record extrusion per millimeter instead of cumulative extrusion
    #[clap(short, long)]
    rate: bool,

    /// Directory searched for the newest .gcode file when no input is given
    #[clap(long, value_parser, default_value = ".")]
    dir: PathBuf,

    /// Write scripts here instead of next to their inputs
    #[clap(short, long, value_parser)]
    output_dir: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    verbose: bool,

    /// Input files and key=value overrides
    #[clap(value_name = "INPUT|KEY=VALUE", value_parser)]
    args: Vec<String>,
}

impl Args {
    fn config(&self) -> Result<ConvertConfig> {
        let mut cfg = ConvertConfig {
            debug: self.debug,
            line_numbers: self.line_numbers,
            extrusion_rate: self.rate,
        };
        for arg in self.args.iter().filter(|a| is_override(a)) {
            cfg.apply_override(arg)?;
        }
        Ok(cfg)
    }

    fn inputs(&self) -> Result<Vec<PathBuf>> {
        let inputs: Vec<_> = self
            .args
            .iter()
            .filter(|a| !is_override(a))
            .map(PathBuf::from)
            .collect();
        if !inputs.is_empty() {
            return Ok(inputs);
        }
        let latest = files::latest_input(&self.dir)?;
        info!(input = %latest.display(), "no input given, using newest file");
        Ok(vec![latest])
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("can't initialize logging: {e}"))
}

fn convert_file(input: &Path, output: &Path, cfg: ConvertConfig) -> Result<Summary, ConvertError> {
    let fd = File::open(input).map_err(|source| ConvertError::Open {
        path: input.to_owned(),
        source,
    })?;
    let out = File::create(output).map_err(|source| ConvertError::Create {
        path: output.to_owned(),
        source,
    })?;

    let source = input
        .file_name()
        .map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().into_owned());

    let mut script = Script::new(BufWriter::new(out));
    script.header(&source, &cfg.to_string())?;
    // close the script even when conversion stops early
    let result = convert(BufReader::new(fd), &mut script, cfg);
    script.finalize()?;

    result
}

fn run(args: &Args) -> Result<bool> {
    let cfg = args.config().context("Invalid override")?;
    let inputs = args.inputs()?;

    let mut ok = true;
    for input in &inputs {
        let output = files::output_path(input, args.output_dir.as_deref());
        match convert_file(input, &output, cfg) {
            Ok(s) => info!(
                input = %input.display(),
                output = %output.display(),
                lines = s.lines,
                moves = s.moves,
                segments = s.segments,
                dropped = s.dropped,
                diagnostics = s.diagnostics,
                "converted"
            ),
            Err(e) => {
                report(&input.display().to_string(), &e);
                ok = false;
            }
        }
    }

    Ok(ok)
}

fn report(what: &str, e: &dyn fmt::Display) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    stderr
        .set_color(
            ColorSpec::new()
                .set_fg(Some(Color::Red))
                .set_bold(true)
                .set_intense(true),
        )
        .ok();
    writeln!(stderr, "While converting '{what}':").ok();
    writeln!(stderr, "{e}").ok();
    stderr.reset().ok();
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("{e}");
    }

    let code = match run(&args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            report("arguments", &format!("{e:#}"));
            1
        }
    };
    process::exit(code);
}
