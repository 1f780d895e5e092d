//! Plain-text tree format
//!
//! ```text
//! ---------
//! <N>                      # total node count
//! <D>                      # destination count, first D nodes below
//! <x1> <y1>
//! ...
//!
//! ----------------
//! 0 | <neighbor-index> ...
//! ...
//! ```
//!
//! `#` starts a trailing comment and is stripped before parsing. Node
//! order in the coordinate block fixes indices `0..N-1`, destinations
//! first. The integer before `|` is informational only; the list after
//! it holds 0-based indices into the coordinate block.
//!
//! Parsing either yields a complete tree or an error with no partial
//! tree exposed; in-memory state of the caller is never touched on
//! failure.

use std::io::Write;

use anyhow::Result;
use thiserror::Error;

use crate::{NodeId, SmtError, Tree};

const START_DELIMITER: &str = "---------";
const NEIGHBORS_DELIMITER: &str = "----------------";

/// Failures while reading the plain-text tree format
#[derive(Error, Debug)]
pub enum ParseError {
    /// The `---------` start delimiter never appeared
    #[error("missing start delimiter '---------'")]
    MissingStartDelimiter,

    /// The input ended before the declared node data was complete
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A count line did not hold a plain non-negative integer
    #[error("invalid count '{0}'")]
    InvalidCount(String),

    /// A coordinate line did not hold two floating-point numbers
    #[error("invalid coordinate line '{0}'")]
    InvalidCoordinate(String),

    /// The `----------------` delimiter was expected but missing
    #[error("expected neighbors delimiter '----------------', got '{0}'")]
    ExpectedNeighborsDelimiter(String),

    /// A neighbor line carried no `|` separator
    #[error("neighbor line '{0}' is missing the '|' separator")]
    MissingSeparator(String),

    /// A neighbor entry did not parse as an index
    #[error("invalid neighbor index '{0}'")]
    InvalidNeighborIndex(String),

    /// The parsed lists did not assemble into a tree
    #[error(transparent)]
    Layout(#[from] SmtError),
}

/// Parse a tree from the plain-text format
pub fn parse_tree(input: &str) -> Result<Tree, ParseError> {
    let mut lines = input.lines().map(strip_comment);

    loop {
        match lines.next() {
            Some(line) if line.trim() == START_DELIMITER => break,
            Some(_) => continue,
            None => return Err(ParseError::MissingStartDelimiter),
        }
    }

    let node_count = parse_count(lines.next())?;
    let destination_count = parse_count(lines.next())?;

    let mut coords = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let line = lines.next().ok_or(ParseError::UnexpectedEof)?;
        coords.push(parse_coordinate(line)?);
    }

    // Skip blank padding, then require the neighbors delimiter
    let delimiter = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line.trim().to_string(),
            None => return Err(ParseError::UnexpectedEof),
        }
    };
    if delimiter != NEIGHBORS_DELIMITER {
        return Err(ParseError::ExpectedNeighborsDelimiter(delimiter));
    }

    let mut neighbor_lists = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let line = lines.next().ok_or(ParseError::UnexpectedEof)?;
        neighbor_lists.push(parse_neighbor_list(line)?);
    }

    Ok(Tree::from_layout(&coords, &neighbor_lists, destination_count)?)
}

/// Write a tree in the plain-text format, destinations first
pub fn write_tree<W: Write>(writer: &mut W, tree: &Tree) -> Result<()> {
    let ordered = ordered_ids(tree);
    let index_of = |id: NodeId| ordered.iter().position(|&o| o == id);

    writeln!(writer, "{START_DELIMITER}")?;
    writeln!(writer, "{}", tree.node_count())?;
    writeln!(writer, "{}", tree.destination_count())?;

    for &id in &ordered {
        if let Some(node) = tree.node(id) {
            writeln!(writer, "{} {}", node.x(), node.y())?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "{NEIGHBORS_DELIMITER}")?;

    for (i, &id) in ordered.iter().enumerate() {
        let mut indices: Vec<usize> = match tree.node(id) {
            Some(node) => node
                .neighbors()
                .iter()
                .filter_map(|&neighbor| index_of(neighbor))
                .collect(),
            None => Vec::new(),
        };
        // Canonical output: ascending indices regardless of insertion order
        indices.sort_unstable();

        let mut line = format!("{i} |");
        for index in indices {
            line.push_str(&format!(" {index}"));
        }
        writeln!(writer, "{line}")?;
    }

    writer.flush()?;
    Ok(())
}

/// Render a tree into a string of the plain-text format (useful for
/// tests and snapshots)
pub fn render_tree(tree: &Tree) -> Result<String> {
    let mut buffer = Vec::new();
    write_tree(&mut buffer, tree)?;
    String::from_utf8(buffer).map_err(|_| anyhow::anyhow!("rendered tree is not valid UTF-8"))
}

/// Destination ids first, each group in ascending id order
fn ordered_ids(tree: &Tree) -> Vec<NodeId> {
    let mut destinations: Vec<NodeId> = tree.destinations().iter().map(|n| n.id).collect();
    let mut relays: Vec<NodeId> = tree.non_destinations().iter().map(|n| n.id).collect();
    destinations.sort_unstable();
    relays.sort_unstable();
    destinations.extend(relays);
    destinations
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_count(line: Option<&str>) -> Result<usize, ParseError> {
    let line = line.ok_or(ParseError::UnexpectedEof)?.trim();
    line.parse()
        .map_err(|_| ParseError::InvalidCount(line.to_string()))
}

fn parse_coordinate(line: &str) -> Result<(f64, f64), ParseError> {
    let mut fields = line.split_whitespace();
    let parse = |field: Option<&str>| {
        field
            .and_then(|f| f.parse::<f64>().ok())
            .ok_or_else(|| ParseError::InvalidCoordinate(line.to_string()))
    };
    let x = parse(fields.next())?;
    let y = parse(fields.next())?;
    Ok((x, y))
}

fn parse_neighbor_list(line: &str) -> Result<Vec<usize>, ParseError> {
    let separator = line
        .find('|')
        .ok_or_else(|| ParseError::MissingSeparator(line.to_string()))?;

    line[separator + 1..]
        .split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| ParseError::InvalidNeighborIndex(token.to_string()))
        })
        .collect()
}
