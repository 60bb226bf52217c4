use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use archdiag::dot::to_dot;
use archdiag::render::{engine_available, DEFAULT_ENGINE};
use archdiag::{Category, DiagramError, EdgeAttrs, Format, Renderer, Topology, TopologyBuilder};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn attendee_to_pos() -> Topology {
    let mut b = TopologyBuilder::new("Festival POS System Architecture");
    let attendee = b.declare_node(Category::GenericActor, "Attendee");
    let pos = b.declare_node(Category::GenericClient, "POS Device");
    b.connect(attendee, pos, EdgeAttrs::new()).unwrap();
    b.build().unwrap()
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn end_to_end_png() {
    let dir = tempfile::tempdir().unwrap();
    let topology = attendee_to_pos();
    let target = dir.path().join("festival.png");

    let dot = to_dot(&topology);
    let nodes = dot
        .lines()
        .filter(|l| l.trim_start().starts_with('n') && l.contains(" [label=\""))
        .count();
    assert_eq!(nodes, 2);
    assert_eq!(dot.lines().filter(|l| l.contains(" -> ")).collect::<Vec<_>>(), vec!["  n0 -> n1;"]);

    let result = archdiag::render(&topology, &target);
    if engine_available(DEFAULT_ENGINE) {
        assert_eq!(result.unwrap(), target);
        let bytes = fs::read(&target).unwrap();
        assert!(bytes.starts_with(PNG_MAGIC));
        assert_eq!(entries(dir.path()), vec!["festival.png"]);
    } else {
        assert!(
            matches!(result, Err(DiagramError::RenderingEngineUnavailable { .. })),
            "got: {result:?}"
        );
        assert!(entries(dir.path()).is_empty());
    }
}

#[test]
fn missing_engine_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let err = Renderer::new()
        .engine("archdiag-no-such-engine")
        .formats([Format::Dot, Format::Png])
        .output_dir(dir.path())
        .render(&attendee_to_pos())
        .unwrap_err();

    assert!(
        matches!(err, DiagramError::RenderingEngineUnavailable { .. }),
        "got: {err:?}"
    );
    assert!(entries(dir.path()).is_empty());
    assert!(err.usage().is_none());
}

#[test]
fn unwritable_destination_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no").join("such").join("dir");
    let err = Renderer::new()
        .engine("archdiag-no-such-engine")
        .output_dir(&missing)
        .render(&attendee_to_pos())
        .unwrap_err();

    match err {
        DiagramError::Io { path, .. } => {
            assert_eq!(path, missing.join("festival_pos_system_architecture.png"))
        }
        other => panic!("expected Io, got {other:?}"),
    }
}

#[test]
fn blocked_second_destination_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("pos.svg");
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("keep"), "x").unwrap();

    let err = Renderer::new()
        .engine("archdiag-no-such-engine")
        .formats([Format::Dot, Format::Svg])
        .output_dir(dir.path())
        .filename("pos")
        .render(&attendee_to_pos())
        .unwrap_err();

    match err {
        DiagramError::Io { path, .. } => assert_eq!(path, blocked),
        other => panic!("expected Io, got {other:?}"),
    }
    assert_eq!(entries(dir.path()), vec!["pos.svg"]);
    assert_eq!(entries(&blocked), vec!["keep"]);
}

#[cfg(unix)]
#[test]
fn failing_engine_is_rendering_failure() {
    let dir = tempfile::tempdir().unwrap();
    let err = Renderer::new()
        .engine("false")
        .output_dir(dir.path())
        .render(&attendee_to_pos())
        .unwrap_err();

    assert!(
        matches!(err, DiagramError::RenderingFailed { ref program, .. } if program == "false"),
        "got: {err:?}"
    );
    assert!(entries(dir.path()).is_empty());
}

#[test]
fn dot_output_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Renderer::new()
        .formats([Format::Dot])
        .output_dir(dir.path())
        .filename("pos");

    let first = renderer.render(&attendee_to_pos()).unwrap();
    let a = fs::read_to_string(&first[0]).unwrap();
    let second = renderer.render(&attendee_to_pos()).unwrap();
    let b = fs::read_to_string(&second[0]).unwrap();

    assert_eq!(first, vec![dir.path().join("pos.dot")]);
    assert_eq!(a, b);
    assert_eq!(entries(dir.path()), vec!["pos.dot"]);
}

#[test]
fn title_with_slash_stays_in_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut b = TopologyBuilder::new("CI/CD Overview");
    b.declare_node(Category::CiCd, "Pipeline");

    let written = Renderer::new()
        .formats([Format::Dot])
        .output_dir(dir.path())
        .render(&b.build().unwrap())
        .unwrap();
    assert_eq!(written, vec![dir.path().join("ci_cd_overview.dot")]);
    assert_eq!(entries(dir.path()), vec!["ci_cd_overview.dot"]);
}
