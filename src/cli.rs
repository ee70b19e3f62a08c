use crate::config::{load_config, Config};
use crate::layout::compute_layout;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::parse_family;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "famtree", version, about = "Family tree layout and renderer")]
pub struct Args {
    /// Input file (.json, .json5, .ftree or Markdown) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png/json). Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width used to center the tree; also the PNG width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// PNG height (scales the image, keeping its aspect ratio)
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Log layout diagnostics to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    apply_size_flags(&mut config, args.width, args.height);

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let documents = if is_markdown {
        extract_family_blocks(&input)
    } else {
        vec![input]
    };

    if documents.is_empty() {
        return Err(anyhow::anyhow!("No family tree blocks found in input"));
    }

    if documents.len() == 1 {
        let output = match args.output_format {
            OutputFormat::Png => Some(ensure_output(&args.output, "png")?),
            _ => args.output.clone(),
        };
        return render_document(&documents[0], &config, args.output_format, output.as_deref());
    }

    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, documents.len())?;
    for (document, output) in documents.iter().zip(&outputs) {
        render_document(document, &config, args.output_format, Some(output))?;
    }
    Ok(())
}

fn apply_size_flags(config: &mut Config, width: Option<f32>, height: Option<f32>) {
    if let Some(width) = width {
        config.layout.viewport_width = width;
        config.render.width = Some(width);
    }
    if let Some(height) = height {
        config.render.height = Some(height);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn render_document(
    document: &str,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let graph = parse_family(document)?;
    let layout = compute_layout(&graph, &config.layout);
    tracing::debug!(
        members = layout.positions.len(),
        segments = layout.connectors.segments().count(),
        fallback = layout.fallback,
        "layout complete"
    );

    match format {
        OutputFormat::Json => match output {
            Some(path) => write_layout_dump(path, &layout, &graph)?,
            None => println!("{}", LayoutDump::from_layout(&layout, &graph).to_json()?),
        },
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &graph, &config.theme, &config.layout);
            write_output_svg(&svg, output)?;
        }
        OutputFormat::Png => {
            let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            let svg = render_svg(&layout, &graph, &config.theme, &config.layout);
            write_output_png(&svg, output, &config.render)?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("cannot read {}: {err}", path.display()))?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

/// Collects the bodies of ```familytree (or ~~~familytree) fenced blocks.
fn extract_family_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut fence: Option<&str> = None;
    let mut current = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim();
        match fence {
            None => fence = detect_family_fence(trimmed),
            Some(open) if is_fence_end(trimmed, open) => {
                fence = None;
                blocks.push(current.join("\n"));
                current.clear();
            }
            Some(_) => current.push(line),
        }
    }

    blocks
}

fn detect_family_fence(line: &str) -> Option<&'static str> {
    for fence in ["```", "~~~"] {
        if let Some(rest) = line.strip_prefix(fence) {
            let info = rest.trim_start_matches(fence.chars().next()?).trim();
            if info.starts_with("familytree") {
                return Some(fence);
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    line.strip_prefix(fence)
        .map(|rest| rest.trim().is_empty())
        .unwrap_or(false)
}

fn resolve_multi_outputs(output: Option<&Path>, format: OutputFormat, count: usize) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((1..=count)
            .map(|idx| base.join(format!("family-{idx}.{ext}")))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("family");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((1..=count)
        .map(|idx| parent.join(format!("{stem}-{idx}.{ext}")))
        .collect())
}
