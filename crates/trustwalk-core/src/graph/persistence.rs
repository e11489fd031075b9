//! Versioned binary snapshots of trust graphs and vertex values.
//!
//! # On-Disk Format
//!
//! Both files are a single bincode-encoded tuple. Field order is part of
//! the format and must not change without bumping [`FORMAT_VERSION`].
//!
//! - graph file: `(magic: [u8; 4] = b"TWGR", version: u32, vertices: Vec<u64>,
//!   edges: Vec<(from: u64, to: u64, weight: f64)>)`
//! - value snapshot: `(magic: [u8; 4] = b"TWVS", version: u32,
//!   values: Vec<(id: u64, value: f64, is_voter: bool, sigma: f64, hits: u64)>)`
//!
//! Vertices are written in ascending id order and edges sorted by
//! `(from, to)`, so equal graphs produce byte-identical files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

use super::trust_graph::TrustGraph;

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

const GRAPH_MAGIC: [u8; 4] = *b"TWGR";
const VALUES_MAGIC: [u8; 4] = *b"TWVS";

type EdgeRecord = (u64, u64, f64);
type ValueRecord = (u64, f64, bool, f64, u64);

/// Writes `graph` to `writer`.
///
/// # Errors
///
/// Returns `Error::Serialization` or `Error::Io` if encoding fails.
pub fn write_graph<W: Write>(writer: W, graph: &TrustGraph) -> Result<()> {
    let vertices = graph.vertex_ids();
    let mut edges: Vec<EdgeRecord> = graph
        .edges()
        .map(|e| (e.source(), e.target(), e.weight()))
        .collect();
    edges.sort_by_key(|&(from, to, _)| (from, to));

    bincode::serialize_into(writer, &(GRAPH_MAGIC, FORMAT_VERSION, vertices, edges))?;
    Ok(())
}

/// Reads a graph written by [`write_graph`].
///
/// Edges are re-inserted through [`TrustGraph::add_edge`], so a file that
/// violates a graph invariant is rejected rather than loaded.
///
/// # Errors
///
/// Returns `Error::InvalidSnapshotHeader` or
/// `Error::UnsupportedFormatVersion` for foreign files, and any
/// `add_edge` error for invariant violations.
pub fn read_graph<R: Read>(reader: R) -> Result<TrustGraph> {
    let (magic, version, vertices, edges): ([u8; 4], u32, Vec<u64>, Vec<EdgeRecord>) =
        bincode::deserialize_from(reader)?;
    check_header(magic, GRAPH_MAGIC, version)?;

    let mut graph = TrustGraph::with_capacity(edges.len(), vertices.len());
    for id in vertices {
        graph.add_vertex(id);
    }
    for (from, to, weight) in edges {
        graph.add_edge(from, to, weight)?;
    }
    Ok(graph)
}

/// Saves `graph` to a file at `path`.
pub fn save_graph(path: &Path, graph: &TrustGraph) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_graph(&mut writer, graph)?;
    writer.flush()?;
    Ok(())
}

/// Loads a graph from a file at `path`.
pub fn load_graph(path: &Path) -> Result<TrustGraph> {
    read_graph(BufReader::new(File::open(path)?))
}

/// Writes the propagation state of every vertex.
pub fn write_values<W: Write>(writer: W, graph: &TrustGraph) -> Result<()> {
    let values: Vec<ValueRecord> = graph
        .vertices()
        .map(|u| (u.id(), u.value(), u.is_voter(), u.sigma(), u.hits()))
        .collect();
    bincode::serialize_into(writer, &(VALUES_MAGIC, FORMAT_VERSION, values))?;
    Ok(())
}

/// Restores vertex state written by [`write_values`] into `graph`.
///
/// Returns the number of restored vertices; records for vertices that are
/// not in `graph` are skipped.
pub fn read_values_into<R: Read>(reader: R, graph: &mut TrustGraph) -> Result<usize> {
    let (magic, version, values): ([u8; 4], u32, Vec<ValueRecord>) =
        bincode::deserialize_from(reader)?;
    check_header(magic, VALUES_MAGIC, version)?;

    let mut restored = 0;
    for (id, value, is_voter, sigma, hits) in values {
        match graph.vertex_mut(id) {
            Some(user) => {
                user.restore(value, is_voter, sigma, hits);
                restored += 1;
            }
            None => tracing::debug!(user_id = id, "Skipping value for unknown vertex"),
        }
    }
    Ok(restored)
}

/// Saves vertex values to a file at `path`.
pub fn save_values(path: &Path, graph: &TrustGraph) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_values(&mut writer, graph)?;
    writer.flush()?;
    Ok(())
}

/// Loads vertex values from a file at `path` into `graph`.
pub fn load_values(path: &Path, graph: &mut TrustGraph) -> Result<usize> {
    read_values_into(BufReader::new(File::open(path)?), graph)
}

fn check_header(magic: [u8; 4], expected: [u8; 4], version: u32) -> Result<()> {
    if magic != expected {
        return Err(Error::InvalidSnapshotHeader);
    }
    if version != FORMAT_VERSION {
        return Err(Error::UnsupportedFormatVersion {
            found: version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(())
}
