use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

use archdiag::render::DEFAULT_ENGINE;
use archdiag::{DiagramError, Direction, Format, Renderer, Topology};

#[derive(Parser)]
#[command(
    name = "archdiag",
    about = "Render architecture topology diagrams through Graphviz"
)]
struct Cli {
    /// Topology description (.topo); the festival POS diagram is rendered if not provided
    file: Option<PathBuf>,

    /// Output format, repeatable (png, jpg, svg, pdf, dot)
    #[arg(long, short = 'f', value_name = "FORMAT")]
    format: Vec<Format>,

    /// Directory the diagram is written to
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// File name without extension; derived from the title by default
    #[arg(long)]
    filename: Option<String>,

    /// Layout direction (TB, BT, LR, RL)
    #[arg(long, short = 'd')]
    direction: Option<Direction>,

    /// Graphviz program to lay the diagram out with
    #[arg(long, default_value = DEFAULT_ENGINE)]
    engine: String,

    /// Print the DOT source instead of rendering
    #[arg(long, conflicts_with = "outline")]
    emit_dot: bool,

    /// Print a text outline instead of rendering
    #[arg(long)]
    outline: bool,

    /// Log more (-v info, -vv debug)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut topology = match &cli.file {
        Some(path) => {
            let input = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("ERROR: failed to read {}: {e}", path.display());
                std::process::exit(1);
            });
            archdiag::topology_parser::parse_topology(&input)
        }
        None => archdiag::festival::topology().map_err(DiagramError::from),
    }
    .unwrap_or_else(|e| {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    });

    if let Some(direction) = cli.direction {
        topology.set_direction(direction);
    }

    if let Err(e) = run(cli, &topology) {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, topology: &Topology) -> Result<(), DiagramError> {
    if cli.emit_dot {
        print!("{}", archdiag::dot::to_dot(topology));
        return Ok(());
    }
    if cli.outline {
        println!("{}", archdiag::outline::render(topology));
        return Ok(());
    }

    let mut renderer = Renderer::new()
        .engine(cli.engine)
        .formats(cli.format)
        .output_dir(cli.output_dir);
    if let Some(stem) = cli.filename {
        renderer = renderer.filename(stem);
    }
    for path in renderer.render(topology)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
