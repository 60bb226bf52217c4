use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::dot::to_dot;
use crate::error::DiagramError;
use crate::topology::Topology;

/// Graphviz program used when none is configured.
pub const DEFAULT_ENGINE: &str = "dot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    Jpg,
    Svg,
    Pdf,
    /// The DOT source itself. Written without invoking the engine.
    Dot,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpg => "jpg",
            Format::Svg => "svg",
            Format::Pdf => "pdf",
            Format::Dot => "dot",
        }
    }

    /// Format named by the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, DiagramError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| DiagramError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
            .map_err(|_| DiagramError::UnsupportedFormat(ext.to_string()))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Format::Png),
            "jpg" | "jpeg" => Ok(Format::Jpg),
            "svg" => Ok(Format::Svg),
            "pdf" => Ok(Format::Pdf),
            "dot" | "gv" => Ok(Format::Dot),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}

/// Lays out a topology with the external engine and writes one file per format.
///
/// Every image is produced in memory and staged in a temporary file beside its
/// destination; files are only moved into place once all formats succeeded.
#[derive(Debug, Clone)]
pub struct Renderer {
    engine: String,
    formats: Vec<Format>,
    output_dir: PathBuf,
    filename: Option<String>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            formats: vec![Format::Png],
            output_dir: PathBuf::from("."),
            filename: None,
        }
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, program: impl Into<String>) -> Self {
        self.engine = program.into();
        self
    }

    /// Replaces the output formats. An empty list keeps the current ones.
    pub fn formats(mut self, formats: impl IntoIterator<Item = Format>) -> Self {
        let formats: Vec<Format> = formats.into_iter().collect();
        if !formats.is_empty() {
            self.formats = formats;
        }
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// File stem to use instead of the one derived from the title.
    pub fn filename(mut self, stem: impl Into<String>) -> Self {
        self.filename = Some(stem.into());
        self
    }

    pub fn output_paths(&self, topology: &Topology) -> Vec<PathBuf> {
        let stem = self
            .filename
            .clone()
            .unwrap_or_else(|| topology.file_stem());
        self.formats
            .iter()
            .map(|format| {
                self.output_dir
                    .join(format!("{stem}.{}", format.extension()))
            })
            .collect()
    }

    pub fn render(&self, topology: &Topology) -> Result<Vec<PathBuf>, DiagramError> {
        let dot = to_dot(topology);
        let targets: Vec<(Format, PathBuf)> = self
            .formats
            .iter()
            .copied()
            .zip(self.output_paths(topology))
            .collect();
        self.write_all(&dot, targets)
    }

    /// Renders to exactly `path`, in the format named by its extension.
    pub fn render_to(&self, topology: &Topology, path: &Path) -> Result<PathBuf, DiagramError> {
        let format = Format::from_path(path)?;
        let dot = to_dot(topology);
        let mut written = self.write_all(&dot, vec![(format, path.to_path_buf())])?;
        Ok(written.remove(0))
    }

    fn write_all(
        &self,
        dot: &str,
        targets: Vec<(Format, PathBuf)>,
    ) -> Result<Vec<PathBuf>, DiagramError> {
        let mut staged = Vec::with_capacity(targets.len());
        for (format, path) in targets {
            let file = stage(&path)?;
            staged.push((format, path, file));
        }

        for (format, path, file) in &mut staged {
            let bytes = match format {
                Format::Dot => dot.as_bytes().to_vec(),
                _ => run_engine(&self.engine, *format, dot)?,
            };
            file.write_all(&bytes)
                .and_then(|()| file.flush())
                .map_err(|source| io_error(path, source))?;
        }

        persist_all(
            staged
                .into_iter()
                .map(|(_, path, file)| (path, file))
                .collect(),
        )
    }
}

/// Moves every staged file into place. If one cannot be moved, the ones already in
/// place are removed again.
fn persist_all(staged: Vec<(PathBuf, NamedTempFile)>) -> Result<Vec<PathBuf>, DiagramError> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (path, file) in staged {
        if let Err(e) = file.persist(&path) {
            for done in &written {
                if let Err(cleanup) = fs::remove_file(done) {
                    warn!(path = %done.display(), error = %cleanup, "cannot remove partial output");
                }
            }
            return Err(io_error(&path, e.error));
        }
        info!(path = %path.display(), "wrote diagram");
        written.push(path);
    }
    Ok(written)
}

/// Feeds `dot` to `program -T<format>` and returns what it printed.
pub fn run_engine(program: &str, format: Format, dot: &str) -> Result<Vec<u8>, DiagramError> {
    debug!(program, format = format.extension(), "invoking layout engine");
    let unavailable = |source: io::Error| DiagramError::RenderingEngineUnavailable {
        program: program.to_string(),
        source,
    };

    let mut child = Command::new(program)
        .arg(format!("-T{}", format.extension()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(unavailable)?;

    // Engines may start writing before they have read all of stdin.
    let stdin = child.stdin.take();
    let (output, fed) = thread::scope(|scope| {
        let feeder = scope.spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(dot.as_bytes()),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "engine stdin closed")),
        });
        let output = child.wait_with_output();
        let fed = feeder
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("engine stdin writer panicked")));
        (output, fed)
    });
    let output = output.map_err(unavailable)?;

    if !output.status.success() || output.stdout.is_empty() {
        let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            stderr = "no output".to_string();
        }
        return Err(DiagramError::RenderingFailed {
            program: program.to_string(),
            status: output.status,
            stderr,
        });
    }
    fed.map_err(unavailable)?;

    debug!(bytes = output.stdout.len(), "layout engine finished");
    Ok(output.stdout)
}

/// Whether `program -V` runs successfully.
pub fn engine_available(program: &str) -> bool {
    Command::new(program)
        .arg("-V")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

fn stage(path: &Path) -> Result<NamedTempFile, DiagramError> {
    if path.is_dir() {
        return Err(io_error(
            path,
            io::Error::new(io::ErrorKind::IsADirectory, "destination is a directory"),
        ));
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    tempfile::Builder::new()
        .prefix(".archdiag-")
        .tempfile_in(dir)
        .map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: io::Error) -> DiagramError {
    DiagramError::Io {
        path: path.to_path_buf(),
        source,
    }
}
