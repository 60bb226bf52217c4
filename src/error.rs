use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::topology::NodeId;

/// Malformed topology construction. Raised while building, before anything is rendered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("exit_cluster called with no open cluster")]
    UnmatchedClusterExit,
    #[error("cluster `{0}` was never closed")]
    UnclosedCluster(String),
    #[error("node handle {0} was not declared in this topology")]
    UnknownNode(NodeId),
    #[error("`{0}` is not declared")]
    UndeclaredName(String),
    #[error("`{0}` is already declared")]
    DuplicateName(String),
}

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: UsageError,
    },

    #[error("syntax error on line {line}: unexpected `{context}`")]
    Syntax { line: usize, context: String },

    #[error("rendering engine `{program}` is unavailable: {source}")]
    RenderingEngineUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("rendering engine `{program}` failed ({status}): {stderr}")]
    RenderingFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unsupported output format `{0}`")]
    UnsupportedFormat(String),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DiagramError {
    /// The builder error behind this failure, if it was a construction problem.
    pub fn usage(&self) -> Option<&UsageError> {
        match self {
            DiagramError::Usage(source) | DiagramError::Script { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_error_mentions_line_and_cause() {
        let err = DiagramError::Script {
            line: 7,
            source: UsageError::UndeclaredName("dns".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("line 7"), "got: {message}");
        assert!(message.contains("`dns` is not declared"), "got: {message}");
        assert_eq!(err.usage(), Some(&UsageError::UndeclaredName("dns".to_string())));
    }

    #[test]
    fn usage_error_converts_transparently() {
        let err: DiagramError = UsageError::UnmatchedClusterExit.into();
        assert_eq!(err.to_string(), "exit_cluster called with no open cluster");
    }

    #[test]
    fn io_error_names_the_path() {
        let err = DiagramError::Io {
            path: PathBuf::from("/nowhere/out.png"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nowhere/out.png"));
        assert!(err.usage().is_none());
    }
}
