use std::collections::HashMap;

use winnow::ascii::{space0, space1};
use winnow::combinator::{alt, delimited, opt, preceded, separated};
use winnow::error::{ContextError, ParserError};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::builder::TopologyBuilder;
use crate::error::{DiagramError, UsageError};
use crate::topology::*;

/// Parses a `.topo` description and replays it through a [`TopologyBuilder`].
///
/// The first statement must be the `diagram "<title>" [TB|BT|LR|RL]` header. Syntax
/// errors and builder errors both carry the 1-based line they occurred on.
pub fn parse_topology(input: &str) -> Result<Topology, DiagramError> {
    let mut lines = significant_lines(input);
    let Some((header_line, text)) = lines.next() else {
        return Err(DiagramError::Syntax {
            line: 1,
            context: "end of input".to_string(),
        });
    };
    let (title, direction) = parse_line(header, header_line, text)?;

    let mut builder = TopologyBuilder::new(title).with_direction(direction.unwrap_or_default());
    let mut names: HashMap<String, NodeId> = HashMap::new();
    let mut open_lines: Vec<usize> = Vec::new();

    for (line, text) in lines {
        let parsed = parse_line(statement, line, text)?;
        match parsed {
            Statement::OpenCluster(_) => open_lines.push(line),
            Statement::CloseCluster => {
                open_lines.pop();
            }
            _ => {}
        }
        apply(&mut builder, &mut names, parsed)
            .map_err(|source| DiagramError::Script { line, source })?;
    }

    builder.build().map_err(|source| DiagramError::Script {
        line: open_lines.last().copied().unwrap_or(header_line),
        source,
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Node {
        name: String,
        category: Category,
        label: String,
    },
    OpenCluster(String),
    CloseCluster,
    Connect {
        first: Vec<String>,
        hops: Vec<Hop>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Hop {
    direction: EdgeDirection,
    attrs: EdgeAttrs,
    target: Vec<String>,
}

fn apply(
    builder: &mut TopologyBuilder,
    names: &mut HashMap<String, NodeId>,
    statement: Statement,
) -> Result<(), UsageError> {
    match statement {
        Statement::Node {
            name,
            category,
            label,
        } => {
            if names.contains_key(&name) {
                return Err(UsageError::DuplicateName(name));
            }
            let id = builder.declare_node(category, label);
            names.insert(name, id);
        }
        Statement::OpenCluster(name) => {
            builder.enter_cluster(name);
        }
        Statement::CloseCluster => {
            builder.exit_cluster()?;
        }
        Statement::Connect { first, hops } => {
            let mut sources = resolve(names, &first)?;
            let mut resolved = Vec::with_capacity(hops.len());
            for hop in hops {
                resolved.push((resolve(names, &hop.target)?, hop));
            }
            for (targets, hop) in resolved {
                for &source in &sources {
                    for &target in &targets {
                        builder.link(source, target, hop.direction, hop.attrs.clone())?;
                    }
                }
                sources = targets;
            }
        }
    }
    Ok(())
}

fn resolve(names: &HashMap<String, NodeId>, operand: &[String]) -> Result<Vec<NodeId>, UsageError> {
    operand
        .iter()
        .map(|name| {
            names
                .get(name)
                .copied()
                .ok_or_else(|| UsageError::UndeclaredName(name.clone()))
        })
        .collect()
}

fn significant_lines(input: &str) -> impl Iterator<Item = (usize, &str)> {
    input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_line<'a, O>(
    mut parser: impl Parser<&'a str, O, ContextError>,
    line: usize,
    text: &'a str,
) -> Result<O, DiagramError> {
    parser.parse(text).map_err(|e| DiagramError::Syntax {
        line,
        context: context_at(text, e.offset()),
    })
}

fn context_at(text: &str, offset: usize) -> String {
    let rest = text.get(offset..).unwrap_or(text).trim();
    if rest.is_empty() {
        "end of line".to_string()
    } else if rest.chars().count() > 40 {
        format!("{}...", rest.chars().take(40).collect::<String>())
    } else {
        rest.to_string()
    }
}

fn header(input: &mut &str) -> winnow::Result<(String, Option<Direction>)> {
    "diagram".parse_next(input)?;
    space1.parse_next(input)?;
    let title = quoted.parse_next(input)?;
    let direction = opt(preceded(space1, direction)).parse_next(input)?;
    Ok((title, direction))
}

fn direction(input: &mut &str) -> winnow::Result<Direction> {
    alt((
        "TB".value(Direction::TopBottom),
        "TD".value(Direction::TopBottom),
        "BT".value(Direction::BottomTop),
        "LR".value(Direction::LeftRight),
        "RL".value(Direction::RightLeft),
    ))
    .parse_next(input)
}

fn statement(input: &mut &str) -> winnow::Result<Statement> {
    alt((
        node_decl,
        open_cluster,
        "}".value(Statement::CloseCluster),
        connect,
    ))
    .parse_next(input)
}

fn node_decl(input: &mut &str) -> winnow::Result<Statement> {
    "node".parse_next(input)?;
    space1.parse_next(input)?;
    let name = identifier.parse_next(input)?;
    space1.parse_next(input)?;
    let category = category.parse_next(input)?;
    space1.parse_next(input)?;
    let label = quoted.parse_next(input)?;
    Ok(Statement::Node {
        name: name.to_string(),
        category,
        label,
    })
}

fn category(input: &mut &str) -> winnow::Result<Category> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-')
        .verify_map(|s: &str| s.parse::<Category>().ok())
        .parse_next(input)
}

fn open_cluster(input: &mut &str) -> winnow::Result<Statement> {
    "cluster".parse_next(input)?;
    space1.parse_next(input)?;
    let name = quoted.parse_next(input)?;
    space0.parse_next(input)?;
    "{".parse_next(input)?;
    Ok(Statement::OpenCluster(name))
}

fn connect(input: &mut &str) -> winnow::Result<Statement> {
    let first = operand.parse_next(input)?;
    let mut hops = Vec::new();
    loop {
        space0.parse_next(input)?;
        if input.is_empty() {
            break;
        }
        let (direction, attrs) = connector.parse_next(input)?;
        space0.parse_next(input)?;
        let target = operand.parse_next(input)?;
        hops.push(Hop {
            direction,
            attrs,
            target,
        });
    }
    if hops.is_empty() {
        return Err(ParserError::from_input(input));
    }
    Ok(Statement::Connect { first, hops })
}

fn identifier<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_').parse_next(input)
}

/// A single name or a parenthesized group: `(auth, tx, users)`.
fn operand(input: &mut &str) -> winnow::Result<Vec<String>> {
    alt((group, identifier.map(|name| vec![name.to_string()]))).parse_next(input)
}

fn group(input: &mut &str) -> winnow::Result<Vec<String>> {
    delimited(
        ('(', space0),
        separated(1.., identifier.map(String::from), (space0, ',', space0)),
        (space0, ')'),
    )
    .parse_next(input)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Arrow {
    Right,
    Left,
    Line,
}

fn arrow(input: &mut &str) -> winnow::Result<Arrow> {
    alt((
        ">>".value(Arrow::Right),
        "<<".value(Arrow::Left),
        "-".value(Arrow::Line),
    ))
    .parse_next(input)
}

/// `>>`, `<<`, `-`, or one of them wrapped around an attribute list.
/// `<< [..] >>` is the only mixed pair and points both ways.
fn connector(input: &mut &str) -> winnow::Result<(EdgeDirection, EdgeAttrs)> {
    let open = arrow.parse_next(input)?;
    let Some(attrs) = opt(preceded(space0, attr_list)).parse_next(input)? else {
        let direction = match open {
            Arrow::Right => EdgeDirection::Forward,
            Arrow::Left => EdgeDirection::Back,
            Arrow::Line => EdgeDirection::None,
        };
        return Ok((direction, EdgeAttrs::default()));
    };
    space0.parse_next(input)?;
    let close = arrow.parse_next(input)?;
    let direction = match (open, close) {
        (Arrow::Right, Arrow::Right) => EdgeDirection::Forward,
        (Arrow::Left, Arrow::Left) => EdgeDirection::Back,
        (Arrow::Left, Arrow::Right) => EdgeDirection::Both,
        (Arrow::Line, Arrow::Line) => EdgeDirection::None,
        _ => return Err(ParserError::from_input(input)),
    };
    Ok((direction, attrs))
}

enum Attr {
    Style(EdgeStyle),
    Color(String),
    Label(String),
}

fn attr_list(input: &mut &str) -> winnow::Result<EdgeAttrs> {
    let items: Vec<Attr> = delimited(
        ('[', space0),
        separated(0.., attr, (space0, ',', space0)),
        (space0, ']'),
    )
    .parse_next(input)?;

    let mut attrs = EdgeAttrs::default();
    for item in items {
        match item {
            Attr::Style(style) => attrs.style = Some(style),
            Attr::Color(color) => attrs.color = Some(color),
            Attr::Label(label) => attrs.label = Some(label),
        }
    }
    Ok(attrs)
}

fn attr(input: &mut &str) -> winnow::Result<Attr> {
    alt((
        preceded(
            ("style", space0, '=', space0),
            word.verify_map(|w: &str| w.parse::<EdgeStyle>().ok()),
        )
        .map(Attr::Style),
        preceded(("color", space0, '=', space0), value).map(Attr::Color),
        preceded(("label", space0, '=', space0), value).map(Attr::Label),
    ))
    .parse_next(input)
}

fn value(input: &mut &str) -> winnow::Result<String> {
    alt((quoted, word.map(String::from))).parse_next(input)
}

fn word<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '#' | '_' | '-' | '.')
    })
    .parse_next(input)
}

/// Double-quoted string; `\n`, `\t`, `\"` and `\\` are unescaped.
fn quoted(input: &mut &str) -> winnow::Result<String> {
    '"'.parse_next(input)?;
    let mut text = String::new();
    loop {
        match next_char(input)? {
            '"' => return Ok(text),
            '\\' => match next_char(input)? {
                'n' => text.push('\n'),
                't' => text.push('\t'),
                other => text.push(other),
            },
            c => text.push(c),
        }
    }
}

fn next_char(input: &mut &str) -> winnow::Result<char> {
    any.parse_next(input)
}
