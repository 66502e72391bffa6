//! Camo Walker - CLI
//!
//! CLI commands:
//! - generate: Generate a pattern and save it as PNG
//! - expand: Print the expanded L-system string
//! - palette: Show the palette and a seed's color picks
//! - init: Write a default config file

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use camo_walker::config::{PatternConfig, Settings};
use camo_walker::lsystem::RulesSpec;
use camo_walker::palette::{seeded_rng, select_colors};
use camo_walker::pattern::{generate_pattern, prepare_symbols};
use camo_walker::render::{export_events_json, export_png};
use camo_walker::turtle::WrapMode;
use camo_walker::logging;

#[derive(Parser)]
#[command(name = "camo_walker")]
#[command(about = "L-system camouflage pattern generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to camo.yaml config
    #[arg(short, long, default_value = "camo.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a pattern and save it as PNG
    Generate {
        /// Output PNG path (default: <CAMO_OUTPUT_DIR>/camo_<seed>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the draw-event stream as JSON
        #[arg(long)]
        events: Option<PathBuf>,

        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// Print the expanded L-system string
    Expand {
        /// Print only the symbol count
        #[arg(long)]
        len: bool,

        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// Show the palette and the colors a seed picks
    Palette {
        #[command(flatten)]
        pattern: PatternArgs,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Command-line overrides for config file values
#[derive(Args, Debug, Default)]
struct PatternArgs {
    #[arg(long)]
    seed: Option<u64>,
    /// Number of foreground colors
    #[arg(long)]
    colors: Option<usize>,
    /// Number of trees
    #[arg(long)]
    loops: Option<usize>,
    /// Recursion depth
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long)]
    axiom: Option<String>,
    /// Rules, e.g. "F -> FF+[+F-F-F]-[-F+F+F]"
    #[arg(long)]
    rules: Option<String>,
    /// Base angle in degrees
    #[arg(long, allow_hyphen_values = true)]
    angle: Option<f64>,
    /// Base step length
    #[arg(long, allow_hyphen_values = true)]
    length: Option<f64>,
    /// Random deviation for angle and length
    #[arg(long)]
    deviation: Option<f64>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Use exact modulo wrapping instead of single-fold
    #[arg(long)]
    modulo_wrap: bool,
}

impl PatternArgs {
    fn apply(&self, config: &mut PatternConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(colors) = self.colors {
            config.num_colors = colors;
        }
        if let Some(loops) = self.loops {
            config.num_loops = loops;
        }
        if let Some(depth) = self.depth {
            config.recursion_depth = depth;
        }
        if let Some(axiom) = &self.axiom {
            config.axiom = axiom.clone();
        }
        if let Some(rules) = &self.rules {
            config.rules = RulesSpec::Text(rules.clone());
        }
        if let Some(angle) = self.angle {
            config.angle = angle;
        }
        if let Some(length) = self.length {
            config.length = length;
        }
        if let Some(deviation) = self.deviation {
            config.random_deviation = deviation;
        }
        if let Some(width) = self.width {
            config.canvas.width = width;
        }
        if let Some(height) = self.height {
            config.canvas.height = height;
        }
        if self.modulo_wrap {
            config.wrap = WrapMode::Modulo;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::load();
    let _guard = logging::init_logging(&settings.log_dir)?;
    tracing::info!("Camo Walker starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    match cli.command {
        Commands::Generate {
            output,
            events,
            pattern,
        } => {
            let config = load_config(&cli.config, &pattern)?;
            let output = output.unwrap_or_else(|| {
                Path::new(&settings.output_dir).join(format!("camo_{}.png", config.seed))
            });
            generate(&config, &output, events.as_deref())?;
        }

        Commands::Expand { len, pattern } => {
            let config = load_config(&cli.config, &pattern)?;
            let symbols = prepare_symbols(&config)?;
            if len {
                println!("{}", symbols.chars().count());
            } else {
                println!("{}", symbols);
            }
        }

        Commands::Palette { pattern } => {
            let config = load_config(&cli.config, &pattern)?;
            show_palette(&config)?;
        }

        Commands::Init { force } => {
            if cli.config.exists() && !force {
                anyhow::bail!("{} already exists (use --force)", cli.config.display());
            }
            std::fs::write(&cli.config, PatternConfig::default().to_yaml()?)
                .with_context(|| format!("writing {}", cli.config.display()))?;
            println!("Wrote {}", cli.config.display());
        }
    }

    Ok(())
}

/// Config file (if present) with command-line overrides applied
fn load_config(path: &Path, overrides: &PatternArgs) -> anyhow::Result<PatternConfig> {
    let mut config = if path.exists() {
        tracing::info!("Loading config from {:?}", path);
        PatternConfig::load(path)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", path);
        PatternConfig::default()
    };

    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Generate one pattern and export it
fn generate(config: &PatternConfig, output: &Path, events: Option<&Path>) -> anyhow::Result<()> {
    let pattern = generate_pattern(config)?;
    let stats = pattern.stats();

    export_png(&pattern, config.canvas.width, config.canvas.height, output)?;
    if let Some(events_path) = events {
        export_events_json(&pattern, events_path)?;
    }

    println!(
        "Seed {}: {} trees, {} segments, {} wraps, background {} -> {}",
        config.seed,
        stats.trees,
        stats.segments,
        stats.wraps,
        pattern.background,
        output.display()
    );
    Ok(())
}

/// Print the palette with the seed's background and foreground marked
fn show_palette(config: &PatternConfig) -> anyhow::Result<()> {
    let mut rng = seeded_rng(config.seed);
    let selection = select_colors(&mut rng, &config.palette, config.num_colors)?;

    println!("Palette ({} colors), seed {}:", config.palette.len(), config.seed);
    for color in config.palette.colors() {
        let role = if *color == selection.background {
            "background"
        } else if selection.foreground.contains(color) {
            "foreground"
        } else {
            ""
        };
        println!("  {} {}", color, role);
    }
    Ok(())
}
