//! cvmark CLI: render markers and recognize them in images.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use cvmark::codec::{lookup, parse_value, PROFILES};
use cvmark::detect::rgba_view;
use cvmark::print::{render_marker, write_png, Handle, Length, OutputFormat, RenderParams, Rendered};
use cvmark::recognize::{
    RecognizeConfig, RecognizeOutput, RecognizeReport, Recognizer, RecognizerParams, ScanWindow,
};
use cvmark::core::level_for_verbosity;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "cvmark")]
#[command(about = "Render square computer vision markers and recognize them in images")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines through `tracing` (feature `tracing`).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a marker as SVG or PNG.
    Render(RenderArgs),

    /// Recognize markers in an image.
    Recognize(RecognizeArgs),

    /// List the built-in marker profiles.
    Profiles {
        /// Print the catalog as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the version.
    Version,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// Value to encode.
    #[arg(long, allow_hyphen_values = true)]
    value: String,

    /// JSON file with render parameters; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Marker profile (default 44O).
    #[arg(long)]
    profile: Option<String>,

    /// Output format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Cell size, e.g. `0.1cm`, `4px`, `3pt`.
    #[arg(long)]
    cell_size: Option<Length>,

    /// Canvas width; 0 means the marker size.
    #[arg(long)]
    canvas_width: Option<Length>,

    /// Canvas height; 0 means the marker size.
    #[arg(long)]
    canvas_height: Option<Length>,

    /// Horizontal handle position; negative values count from the right edge.
    #[arg(long, allow_hyphen_values = true)]
    x: Option<Length>,

    /// Vertical handle position; negative values count from the bottom edge.
    #[arg(long, allow_hyphen_values = true)]
    y: Option<Length>,

    /// Marker corner placed at the position.
    #[arg(long, value_enum)]
    handle: Option<HandleArg>,

    /// Background color (`transparent`, name or hex).
    #[arg(long)]
    bg: Option<String>,

    /// Foreground color (name or hex).
    #[arg(long)]
    fg: Option<String>,

    /// Output file; SVG goes to stdout when omitted.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Svg,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Svg => OutputFormat::Svg,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HandleArg {
    Tl,
    Tr,
    Bl,
    Br,
}

impl From<HandleArg> for Handle {
    fn from(value: HandleArg) -> Self {
        match value {
            HandleArg::Tl => Handle::Tl,
            HandleArg::Tr => Handle::Tr,
            HandleArg::Bl => Handle::Bl,
            HandleArg::Br => Handle::Br,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ReportFormat {
    #[default]
    Json,
    Html,
}

#[derive(Debug, Clone, Args)]
struct RecognizeArgs {
    /// Input image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// JSON config with `image_path`, `output_path` and `params`.
    /// A JSON report is written to `output_path`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Marker profile (default 44O).
    #[arg(long)]
    profile: Option<String>,

    /// Scan window `x,y,width,height`; negative x/y count from the far edge.
    #[arg(long, allow_hyphen_values = true)]
    window: Option<String>,

    /// Measure the image luminosity range instead of assuming 0..1.
    #[arg(long)]
    detect_dark_light: bool,

    /// Include marker areas.
    #[arg(long)]
    area: bool,

    /// Include sampled cell matrices.
    #[arg(long)]
    matrix: bool,

    /// Include error flags and rejected regions.
    #[arg(long)]
    errors: bool,

    /// Include per-cell grid images.
    #[arg(long)]
    grid: bool,

    /// Include per-step timing.
    #[arg(long)]
    timing: bool,

    /// Enable every diagnostic output.
    #[arg(long)]
    all: bool,

    /// Drop markers whose orientation cells disagree.
    #[arg(long)]
    check_orientation: bool,

    /// Collapse overlapping regions with the same value.
    #[arg(long)]
    merge_overlapping: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,

    /// Output file; stdout when omitted.
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Write each marker's grid image as PNG into this directory.
    #[arg(long)]
    grid_dir: Option<PathBuf>,
}

impl RecognizeArgs {
    fn apply(&self, params: &mut RecognizerParams) -> CliResult<()> {
        if let Some(profile) = &self.profile {
            params.profile = profile.clone();
        }
        if let Some(window) = &self.window {
            params.scan_window = parse_window(window)?;
        }
        params.detect_dark_light |= self.detect_dark_light;
        params.provide_area |= self.area || self.all;
        params.provide_matrix |= self.matrix || self.all;
        params.provide_errors |= self.errors || self.all;
        params.provide_grid |= self.grid || self.all || self.grid_dir.is_some();
        params.provide_timing |= self.timing || self.all;
        params.check_orientation |= self.check_orientation;
        params.merge_overlapping |= self.merge_overlapping;
        Ok(())
    }
}

fn parse_window(text: &str) -> CliResult<ScanWindow> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("invalid scan window {text:?} (expected x,y,width,height)").into());
    };
    Ok(ScanWindow {
        x: x.parse()?,
        y: y.parse()?,
        width: w.parse()?,
        height: h.parse()?,
    })
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    match cli.command {
        Commands::Render(args) => run_render(&args),
        Commands::Recognize(args) => run_recognize(&args),
        Commands::Profiles { json } => run_profiles(json),
        Commands::Version => {
            println!("cvmark {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(verbose: u8, json: bool) -> CliResult<()> {
    if json {
        tracing_log::LogTracer::init()?;
        cvmark::core::init_tracing(true, level_for_verbosity(verbose));
        return Ok(());
    }
    cvmark::core::init_with_level(level_for_verbosity(verbose))?;
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8, json: bool) -> CliResult<()> {
    cvmark::core::init_with_level(level_for_verbosity(verbose))?;
    if json {
        log::warn!("--log-json needs the `tracing` feature; using plain logs");
    }
    Ok(())
}

// ── render ────────────────────────────────────────────────────────────

fn run_render(args: &RenderArgs) -> CliResult<()> {
    let mut params: RenderParams = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => RenderParams::default(),
    };
    if let Some(profile) = &args.profile {
        params.profile = profile.clone();
    }
    if let Some(format) = args.format {
        params.format = format.into();
    }
    if let Some(cell) = args.cell_size {
        params.cell_size = cell;
    }
    if let Some(w) = args.canvas_width {
        params.canvas_width = w;
    }
    if let Some(h) = args.canvas_height {
        params.canvas_height = h;
    }
    if let Some(x) = args.x {
        params.position_x = x;
    }
    if let Some(y) = args.y {
        params.position_y = y;
    }
    if let Some(handle) = args.handle {
        params.handle = handle.into();
    }
    if let Some(bg) = &args.bg {
        params.color_bg = bg.parse()?;
    }
    if let Some(fg) = &args.fg {
        params.color_fg = fg.parse()?;
    }
    if args.out.is_none() && params.format == OutputFormat::Png {
        return Err("PNG output needs --out".into());
    }

    let profile = lookup(&params.profile)?;
    let value = parse_value(&args.value, &profile)?;
    let rendered = render_marker(&params, value)?;

    match &args.out {
        Some(path) => {
            rendered.write_to(path)?;
            log::info!(
                "wrote {} {} marker for {value} to {}",
                rendered.format(),
                profile.name,
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
        }
    }
    if let Rendered::Png { image, .. } = &rendered {
        log::debug!("png size {}x{}", image.width, image.height);
    }
    Ok(())
}

// ── recognize ─────────────────────────────────────────────────────────

fn run_recognize(args: &RecognizeArgs) -> CliResult<()> {
    let config = args
        .config
        .as_ref()
        .map(RecognizeConfig::load_json)
        .transpose()?;

    let (image_path, mut params) = match (&args.image, &config) {
        (Some(image), cfg) => (
            image.clone(),
            cfg.as_ref().map(|c| c.params.clone()).unwrap_or_default(),
        ),
        (None, Some(cfg)) => (PathBuf::from(&cfg.image_path), cfg.params.clone()),
        (None, None) => return Err("either --image or --config is required".into()),
    };
    args.apply(&mut params)?;

    log::info!("loading image {}", image_path.display());
    let img = image::open(&image_path)?.to_rgba8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    let recognizer = Recognizer::new(params)?;
    let result = recognizer.recognize(&rgba_view(&img));

    if let Some(cfg) = &config {
        let mut report = RecognizeReport::new(
            image_path.display().to_string(),
            &recognizer.params().profile,
            width,
            height,
        );
        match &result {
            Ok(out) => report.set_output(out.clone()),
            Err(err) => report.set_error(err),
        }
        let path = args.out.clone().unwrap_or_else(|| cfg.output_path());
        report.write_json(&path)?;
        log::info!("wrote report to {}", path.display());
    }

    let output = result?;
    log::info!("{} markers found", output.markers.len());
    if let Some(dir) = &args.grid_dir {
        write_grids(dir, &output)?;
    }
    if config.is_some() {
        return Ok(());
    }

    let text = match args.format {
        ReportFormat::Json => serde_json::to_string_pretty(&output)?,
        ReportFormat::Html => render_html(&image_path, &recognizer.params().profile, &output),
    };
    match &args.out {
        Some(path) => fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

fn write_grids(dir: &Path, output: &RecognizeOutput) -> CliResult<()> {
    fs::create_dir_all(dir)?;
    for (i, marker) in output.markers.iter().enumerate() {
        let Some(grid) = &marker.grid else {
            continue;
        };
        let path = dir.join(format!("marker_{i:03}_{}.png", marker.value));
        write_png(&grid.compose(), &path)?;
        log::debug!("wrote grid {}", path.display());
    }
    Ok(())
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_html(image_path: &Path, profile: &str, output: &RecognizeOutput) -> String {
    let mut html = String::new();
    let title = html_escape(&image_path.display().to_string());
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html><head><meta charset=\"utf-8\"><title>cvmark: {title}</title></head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(
        html,
        "<h1>{title}</h1>\n<p>profile {}, {} markers</p>",
        html_escape(profile),
        output.markers.len()
    );
    let _ = writeln!(html, "<table border=\"1\">");
    let _ = writeln!(html, "<tr><th>#</th><th>value</th><th>area</th><th>errors</th><th>matrix</th></tr>");
    for (i, m) in output.markers.iter().enumerate() {
        let area = m
            .area
            .map(|a| format!("{},{} {}x{}", a.x, a.y, a.w, a.h))
            .unwrap_or_default();
        let errors = m.errors.map(|e| e.to_string()).unwrap_or_default();
        let matrix = m
            .matrix
            .as_ref()
            .map(|mx| format!("<pre>{}</pre>", mx))
            .unwrap_or_default();
        let _ = writeln!(
            html,
            "<tr><td>{i}</td><td>{}</td><td>{area}</td><td>{errors}</td><td>{matrix}</td></tr>",
            m.value
        );
    }
    let _ = writeln!(html, "</table>");
    if !output.rejected.is_empty() {
        let _ = writeln!(html, "<h2>rejected regions</h2>\n<ul>");
        for r in &output.rejected {
            let _ = writeln!(
                html,
                "<li>{},{} {}x{}: {:?}</li>",
                r.area.x, r.area.y, r.area.w, r.area.h, r.reason
            );
        }
        let _ = writeln!(html, "</ul>");
    }
    if let Some(timing) = &output.timing {
        let steps: Vec<String> = timing.steps.iter().map(|s| format!("{s:.3}")).collect();
        let _ = writeln!(
            html,
            "<p>timing: {:.3} ms ({})</p>",
            timing.total,
            steps.join(", ")
        );
    }
    let _ = writeln!(html, "</body></html>");
    html
}

// ── profiles ──────────────────────────────────────────────────────────

fn run_profiles(json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&PROFILES)?);
        return Ok(());
    }
    println!("{:<6}{:>8}{:>9}{:>8}{:>7}{:>14}", "name", "payload", "extent", "orient", "bits", "max value");
    for p in PROFILES {
        let (w, h) = p.extent();
        println!(
            "{:<6}{:>8}{:>9}{:>8}{:>7}{:>14}",
            p.name,
            format!("{}x{}", p.width, p.height),
            format!("{w}x{h}"),
            if p.orientation > 0 { "yes" } else { "no" },
            p.payload_bits,
            p.value_limit() - 1
        );
    }
    Ok(())
}
