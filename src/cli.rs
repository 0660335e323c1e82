//! Command-line surface
//!
//! Every subcommand is one generate → (render | estimate) pipeline. Output
//! images are written to `--outfile`; numeric reports go to the writer handed
//! to [`run`] (stdout in the binary).

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::curve::{
    GenerationParameters, Method, DEFAULT_ANGLE, DEFAULT_DISCARD, DEFAULT_SEED,
};
use crate::errors::{FractalError, Result};
use crate::geometry::Point;
use crate::metrics::{
    correlation_dimension, dyadic_box_sizes, estimate_with_dyadic_sizes, geometric_radii,
    lacunarity,
    least_squares, DimensionEstimate, DEFAULT_MAX_PAIRS,
};
use crate::render::{
    grid_shape, render_comparison, render_grid, render_points, render_regression, Color, Panel,
    PlotMode, RenderOptions,
};

/// Lévy C-curve: L-system + IFS + analysis
#[derive(Parser, Debug)]
#[command(name = "levy", version, about)]
pub struct Cli {
    /// Log pipeline stages (INFO)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log parameters and intermediate sizes (DEBUG)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draw the curve with one construction method
    #[command(subcommand)]
    Draw(DrawMethod),
    /// L-system polyline and IFS cloud side by side
    Compare(CompareArgs),
    /// Estimate the fractal dimension of a generated curve
    Dimension(DimensionArgs),
    /// Grid of L-system curves over a range of iterations
    Grid(GridArgs),
    /// Grid of IFS clouds for increasing point counts
    Progression(ProgressionArgs),
    /// Lacunarity profile of a generated curve
    Lacunarity(LacunarityArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Draw(_) => "draw",
            Self::Compare(_) => "compare",
            Self::Dimension(_) => "dimension",
            Self::Grid(_) => "grid",
            Self::Progression(_) => "progression",
            Self::Lacunarity(_) => "lacunarity",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum DrawMethod {
    /// Deterministic rewriting `F -> +F--F+`
    Lsystem(LsystemArgs),
    /// Chaos game over the two Lévy maps
    Ifs(IfsArgs),
    /// Rewriting with a random rule per symbol
    Stochastic(StochasticArgs),
}

/// Image styling shared by every rendering command
#[derive(Args, Debug, Clone)]
pub struct StyleArgs {
    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Curve color (#rrggbb or a name)
    #[arg(long, default_value = "#1f77b4")]
    pub color: Color,

    /// Background color (#rrggbb or a name)
    #[arg(long, default_value = "white")]
    pub background: Color,

    /// Polyline width in pixels
    #[arg(long, default_value_t = 1.0)]
    pub line_width: f64,

    /// Scatter marker radius in pixels
    #[arg(long, default_value_t = 1.0)]
    pub marker_size: f64,

    /// Force line or scatter drawing
    #[arg(long, value_enum)]
    pub mode: Option<PlotMode>,
}

impl StyleArgs {
    fn options(&self, outfile: PathBuf, default_size: (u32, u32), mode: PlotMode) -> RenderOptions {
        RenderOptions {
            color: self.color,
            background: self.background,
            line_width: self.line_width,
            marker_size: self.marker_size,
            ..RenderOptions::new(outfile)
        }
        .with_size(
            self.width.unwrap_or(default_size.0),
            self.height.unwrap_or(default_size.1),
        )
        .with_mode(self.mode.unwrap_or(mode))
    }
}

#[derive(Args, Debug)]
pub struct LsystemArgs {
    /// L-system iterations
    #[arg(long = "iter", default_value_t = 12, allow_negative_numbers = true)]
    pub iterations: i64,

    /// Turn angle in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE, allow_negative_numbers = true)]
    pub angle: f64,

    /// Path to save the figure
    #[arg(long)]
    pub outfile: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug)]
pub struct IfsArgs {
    /// Number of points to collect
    #[arg(long, default_value_t = 80_000, allow_negative_numbers = true)]
    pub n_points: i64,

    /// Rotation angle of the two maps in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE, allow_negative_numbers = true)]
    pub angle: f64,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Iterations dropped before collecting points
    #[arg(long, default_value_t = DEFAULT_DISCARD)]
    pub discard: usize,

    /// Path to save the figure
    #[arg(long)]
    pub outfile: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug)]
pub struct StochasticArgs {
    /// L-system iterations
    #[arg(long = "iter", default_value_t = 12, allow_negative_numbers = true)]
    pub iterations: i64,

    /// Turn angle in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE, allow_negative_numbers = true)]
    pub angle: f64,

    /// Probability of the classic rule for each symbol
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub p: f64,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Path to save the figure
    #[arg(long)]
    pub outfile: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// L-system iterations
    #[arg(long = "iter", default_value_t = 12, allow_negative_numbers = true)]
    pub iterations: i64,

    /// L-system turn angle and IFS rotation in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE, allow_negative_numbers = true)]
    pub angle: f64,

    /// IFS point count
    #[arg(long, default_value_t = 80_000, allow_negative_numbers = true)]
    pub n_points: i64,

    /// IFS random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Path to save the figure
    #[arg(long)]
    pub outfile: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

/// Where the analysed points come from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Construction method
    #[arg(long, value_enum, default_value_t = Method::Lsystem)]
    pub method: Method,

    /// L-system iterations
    #[arg(long = "iter", default_value_t = 13, allow_negative_numbers = true)]
    pub iterations: i64,

    /// Turn angle in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE, allow_negative_numbers = true)]
    pub angle: f64,

    /// IFS point count
    #[arg(long, default_value_t = 80_000, allow_negative_numbers = true)]
    pub n_points: i64,

    /// Random seed for the IFS and stochastic methods
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

impl SourceArgs {
    fn parameters(&self) -> GenerationParameters {
        GenerationParameters {
            method: self.method,
            iterations: self.iterations,
            n_points: self.n_points,
            angle_deg: self.angle,
            seed: self.seed,
            ..GenerationParameters::default()
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    /// Box counting over dyadic box sizes
    Box,
    /// Grassberger–Procaccia over sampled pairs
    Correlation,
}

#[derive(Args, Debug)]
pub struct DimensionArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, value_enum, default_value_t = Estimator::Box)]
    pub estimator: Estimator,

    /// Coarsest box size is extent·2^-min_level
    #[arg(long, default_value_t = 3)]
    pub min_level: u32,

    /// Finest box size is extent·2^-max_level
    #[arg(long, default_value_t = 8)]
    pub max_level: u32,

    /// Smallest radius for the correlation estimator (unit square)
    #[arg(long, default_value_t = 0.01)]
    pub min_radius: f64,

    /// Number of radii, growing by sqrt(2)
    #[arg(long, default_value_t = 8)]
    pub radii: usize,

    /// Cap on sampled pairs for the correlation estimator
    #[arg(long, default_value_t = DEFAULT_MAX_PAIRS)]
    pub max_pairs: usize,

    /// Print the estimate as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to save the log-log regression plot
    #[arg(long)]
    pub outfile: Option<PathBuf>,

    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug)]
pub struct GridArgs {
    /// First iteration (inclusive)
    #[arg(long, default_value_t = 8, allow_negative_numbers = true)]
    pub start: i64,

    /// Last iteration (inclusive)
    #[arg(long, default_value_t = 12, allow_negative_numbers = true)]
    pub stop: i64,

    /// Turn angle in degrees
    #[arg(long, default_value_t = DEFAULT_ANGLE, allow_negative_numbers = true)]
    pub angle: f64,

    /// Maximum panels per row
    #[arg(long, default_value_t = 6)]
    pub max_per_row: usize,

    /// Side of each panel in pixels
    #[arg(long, default_value_t = 350)]
    pub cell_size: u32,

    /// Path to save the figure
    #[arg(long)]
    pub outfile: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug)]
pub struct ProgressionArgs {
    /// Point counts, one panel each
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [1_000_i64, 5_000, 20_000, 100_000],
        allow_negative_numbers = true
    )]
    pub counts: Vec<i64>,

    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Maximum panels per row
    #[arg(long, default_value_t = 6)]
    pub max_per_row: usize,

    /// Side of each panel in pixels
    #[arg(long, default_value_t = 350)]
    pub cell_size: u32,

    /// Path to save the figure
    #[arg(long)]
    pub outfile: PathBuf,

    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug)]
pub struct LacunarityArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Coarsest box size is 2^-min_level on the unit square
    #[arg(long, default_value_t = 1)]
    pub min_level: u32,

    /// Finest box size is 2^-max_level on the unit square
    #[arg(long, default_value_t = 7)]
    pub max_level: u32,

    /// Print the profile as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to save the log-log plot
    #[arg(long)]
    pub outfile: Option<PathBuf>,

    #[command(flatten)]
    pub style: StyleArgs,
}

/// Default figure size for single curves
const FIGURE_SIZE: (u32, u32) = (800, 800);
/// Default size for two panels side by side
const COMPARE_SIZE: (u32, u32) = (1600, 800);
/// Default size for log-log plots
const REGRESSION_SIZE: (u32, u32) = (600, 450);

/// Execute one parsed command line, writing reports to `out`
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    info!(command = cli.command.name(), "running command");
    match &cli.command {
        Command::Draw(method) => draw(method),
        Command::Compare(args) => compare(args),
        Command::Dimension(args) => dimension(args, out),
        Command::Grid(args) => grid(args),
        Command::Progression(args) => progression(args),
        Command::Lacunarity(args) => lacunarity_profile(args, out),
    }
}

fn draw(method: &DrawMethod) -> Result<()> {
    let (params, outfile, style) = match method {
        DrawMethod::Lsystem(args) => (
            GenerationParameters::lsystem(args.iterations, args.angle),
            &args.outfile,
            &args.style,
        ),
        DrawMethod::Ifs(args) => (
            GenerationParameters {
                method: Method::Ifs,
                n_points: args.n_points,
                angle_deg: args.angle,
                seed: args.seed,
                discard: args.discard,
                ..GenerationParameters::default()
            },
            &args.outfile,
            &args.style,
        ),
        DrawMethod::Stochastic(args) => (
            GenerationParameters {
                method: Method::Stochastic,
                iterations: args.iterations,
                angle_deg: args.angle,
                rule_probability: args.p,
                seed: args.seed,
                ..GenerationParameters::default()
            },
            &args.outfile,
            &args.style,
        ),
    };

    let generator = params.build()?;
    let points = generator.generate()?;
    let mode = if generator.is_ordered() {
        PlotMode::Line
    } else {
        PlotMode::Scatter
    };
    let options = style.options(outfile.clone(), FIGURE_SIZE, mode);
    info!(method = generator.name(), mode = ?options.mode, "rendering curve");
    render_points(&points, &options)
}

fn compare(args: &CompareArgs) -> Result<()> {
    let polyline = GenerationParameters::lsystem(args.iterations, args.angle).generate()?;
    let cloud = GenerationParameters {
        method: Method::Ifs,
        n_points: args.n_points,
        angle_deg: args.angle,
        seed: args.seed,
        ..GenerationParameters::default()
    }
    .generate()?;

    let options = args
        .style
        .options(args.outfile.clone(), COMPARE_SIZE, PlotMode::Line);
    info!(
        iterations = args.iterations,
        angle = args.angle,
        n_points = cloud.len(),
        "rendering comparison: L-system left, IFS right"
    );
    render_comparison(Panel::line(&polyline), Panel::scatter(&cloud), &options)
}

fn dimension(args: &DimensionArgs, out: &mut dyn Write) -> Result<()> {
    let points = args.source.parameters().generate()?;

    let (xs, ys, slope, intercept) = match args.estimator {
        Estimator::Box => {
            let estimate = estimate_with_dyadic_sizes(&points, args.min_level, args.max_level)?;
            if args.json {
                write_json(out, &estimate)?;
            } else {
                write_box_report(out, &estimate)?;
            }
            (
                estimate.log_inverse_sizes(),
                estimate.log_counts(),
                estimate.estimated_slope,
                estimate.intercept,
            )
        }
        Estimator::Correlation => {
            let radii = geometric_radii(args.min_radius, args.radii);
            let estimate =
                correlation_dimension(&points, &radii, args.max_pairs, args.source.seed)?;
            if args.json {
                write_json(out, &estimate)?;
            } else {
                writeln!(
                    out,
                    "correlation dimension ≈ {:.4} ({} radii)",
                    estimate.estimated_slope,
                    estimate.radii.len()
                )?;
            }
            (
                estimate.log_radii(),
                estimate.log_sums(),
                estimate.estimated_slope,
                estimate.intercept,
            )
        }
    };

    if let Some(outfile) = &args.outfile {
        let options = args
            .style
            .options(outfile.clone(), REGRESSION_SIZE, PlotMode::Scatter);
        render_regression(&xs, &ys, slope, intercept, &options)?;
    }
    Ok(())
}

fn write_box_report(out: &mut dyn Write, estimate: &DimensionEstimate) -> Result<()> {
    writeln!(out, "{:>14}  {:>10}", "box size", "boxes")?;
    for (size, count) in estimate.box_sizes.iter().zip(&estimate.counts) {
        writeln!(out, "{size:>14.6e}  {count:>10}")?;
    }
    writeln!(
        out,
        "box-counting dimension ≈ {:.4} (r = {:.3})",
        estimate.estimated_slope, estimate.r_value
    )?;
    Ok(())
}

fn write_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

fn grid(args: &GridArgs) -> Result<()> {
    if args.stop < args.start {
        return Err(FractalError::invalid(
            "stop",
            format!("must be >= start ({}), got {}", args.start, args.stop),
        ));
    }
    let curves = (args.start..=args.stop)
        .map(|it| GenerationParameters::lsystem(it, args.angle).generate())
        .collect::<Result<Vec<Vec<Point>>>>()?;
    let panels: Vec<Panel<'_>> = curves.iter().map(|c| Panel::line(c)).collect();

    let options = grid_options(
        &args.style,
        &args.outfile,
        panels.len(),
        args.max_per_row,
        args.cell_size,
    )?;
    info!(
        first = args.start,
        last = args.stop,
        angle = args.angle,
        "rendering iteration grid"
    );
    render_grid(&panels, args.max_per_row, &options)
}

fn progression(args: &ProgressionArgs) -> Result<()> {
    if args.counts.is_empty() {
        return Err(FractalError::invalid("counts", "at least one point count is required"));
    }
    let clouds = args
        .counts
        .iter()
        .map(|&n| GenerationParameters::ifs(n, args.seed).generate())
        .collect::<Result<Vec<Vec<Point>>>>()?;
    let panels: Vec<Panel<'_>> = clouds.iter().map(|c| Panel::scatter(c)).collect();

    let options = grid_options(
        &args.style,
        &args.outfile,
        panels.len(),
        args.max_per_row,
        args.cell_size,
    )?;
    info!(counts = ?args.counts, "rendering IFS progression");
    render_grid(&panels, args.max_per_row, &options)
}

fn grid_options(
    style: &StyleArgs,
    outfile: &std::path::Path,
    panels: usize,
    max_per_row: usize,
    cell_size: u32,
) -> Result<RenderOptions> {
    let (cols, rows) = grid_shape(panels, max_per_row);
    let side = |n: usize| {
        u32::try_from(n)
            .ok()
            .and_then(|n| cell_size.checked_mul(n))
            .ok_or_else(|| {
                FractalError::invalid(
                    "cell_size",
                    format!("{cell_size} px x {n} panels does not fit in an image side"),
                )
            })
    };
    let size = (side(cols)?, side(rows)?);
    Ok(style.options(outfile.to_path_buf(), size, PlotMode::Line))
}

fn lacunarity_profile(args: &LacunarityArgs, out: &mut dyn Write) -> Result<()> {
    if args.min_level > args.max_level {
        return Err(FractalError::invalid(
            "levels",
            format!(
                "min level {} exceeds max level {}",
                args.min_level, args.max_level
            ),
        ));
    }
    let points = args.source.parameters().generate()?;
    let sizes = dyadic_box_sizes(1.0, args.min_level, args.max_level)?;
    let profile = lacunarity(&points, &sizes)?;

    if args.json {
        write_json(out, &profile)?;
    } else {
        writeln!(out, "{:>14}  {:>10}", "box size", "lacunarity")?;
        for (size, value) in profile.box_sizes.iter().zip(&profile.lacunarity) {
            writeln!(out, "{size:>14.6e}  {value:>10.4}")?;
        }
    }

    if let Some(outfile) = &args.outfile {
        let xs = profile.log_inverse_sizes();
        let ys = profile.log_lacunarity();
        let fit = least_squares(&xs, &ys)?;
        let options = args
            .style
            .options(outfile.clone(), REGRESSION_SIZE, PlotMode::Scatter);
        render_regression(&xs, &ys, fit.slope, fit.intercept, &options)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_iterations_reach_validation() {
        let cli = Cli::try_parse_from([
            "levy", "draw", "lsystem", "--iter", "-1", "--outfile", "x.png",
        ])
        .unwrap();
        let mut sink = Vec::new();
        let err = run(&cli, &mut sink).unwrap_err();
        assert!(matches!(err, FractalError::InvalidParameter { .. }));
    }

    #[test]
    fn test_draw_defaults() {
        let cli =
            Cli::try_parse_from(["levy", "draw", "ifs", "--outfile", "cloud.png"]).unwrap();
        let Command::Draw(DrawMethod::Ifs(args)) = cli.command else {
            panic!("expected draw ifs");
        };
        assert_eq!(args.n_points, 80_000);
        assert_eq!(args.seed, DEFAULT_SEED);
        assert_eq!(args.style.color, Color::from_hex(0x1f77b4));
        assert!(args.style.width.is_none());
    }

    #[test]
    fn test_progression_counts_parse() {
        let cli = Cli::try_parse_from([
            "levy",
            "progression",
            "--counts",
            "10,20,30",
            "--outfile",
            "p.png",
        ])
        .unwrap();
        let Command::Progression(args) = cli.command else {
            panic!("expected progression");
        };
        assert_eq!(args.counts, vec![10, 20, 30]);
    }

    #[test]
    fn test_grid_rejects_inverted_range() {
        let cli = Cli::try_parse_from([
            "levy", "grid", "--start", "5", "--stop", "3", "--outfile", "g.png",
        ])
        .unwrap();
        let mut sink = Vec::new();
        assert!(matches!(
            run(&cli, &mut sink),
            Err(FractalError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_dimension_report_without_image() {
        let cli = Cli::try_parse_from([
            "levy", "dimension", "--iter", "10", "--min-level", "2", "--max-level", "5",
        ])
        .unwrap();
        let mut sink = Vec::new();
        run(&cli, &mut sink).unwrap();
        let report = String::from_utf8(sink).unwrap();
        assert!(report.contains("box-counting dimension"));
        assert_eq!(report.lines().count(), 1 + 4 + 1);
    }

    #[test]
    fn test_dimension_json_report() {
        let cli = Cli::try_parse_from([
            "levy",
            "dimension",
            "--iter",
            "9",
            "--min-level",
            "1",
            "--max-level",
            "4",
            "--json",
        ])
        .unwrap();
        let mut sink = Vec::new();
        run(&cli, &mut sink).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&sink).unwrap();
        assert_eq!(value["counts"].as_array().unwrap().len(), 4);
        assert!(value["estimated_slope"].as_f64().is_some());
    }
}
