//! KONECT edge-list reader.
//!
//! Parses KONECT-style network files into a [`DynamicWeightedDiGraph`].
//!
//! ## Format
//!
//! - Lines starting with `%` are comments (ignored)
//! - Each remaining line is a record `U V [WEIGHT [TIMESTAMP]]`
//! - Vertex labels are arbitrary nonnegative integers and are mapped to
//!   dense ids in order of first appearance
//! - A missing weight reads as 1; a negative weight is a deletion (weight 0)
//! - Records sharing a timestamp form one delta, in file order; files
//!   without timestamps yield a single delta
//!
//! Repeated records for the same unordered vertex pair address the same arc,
//! so a later record updates the weight set by an earlier one. Self-loops
//! are skipped with a warning.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::dynamic::{Delta, DynamicWeightedDiGraph};
use crate::errors::{DjMatchError, Result};
use crate::graph::DiGraph;
use crate::types::{ArcId, VertexId};

/// Reads a KONECT file from `path`.
pub fn read_konect_file<P: AsRef<Path>>(path: P) -> Result<DynamicWeightedDiGraph> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).map_err(|e| {
        DjMatchError::internal(format!(
            "Failed to open graph file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;
    read_konect(BufReader::new(file))
}

/// Reads a KONECT edge list from any buffered reader.
pub fn read_konect<R: Read>(reader: R) -> Result<DynamicWeightedDiGraph> {
    let reader = BufReader::new(reader);

    let mut graph = DiGraph::new();
    let mut vertex_ids: HashMap<u64, VertexId> = HashMap::new();
    let mut arc_ids: HashMap<(VertexId, VertexId), ArcId> = HashMap::new();

    let mut deltas: Vec<Delta> = Vec::new();
    let mut current_timestamp: Option<i64> = None;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| {
            DjMatchError::internal(format!(
                "Failed to read line {} from graph file: {}",
                line_num + 1,
                e
            ))
        })?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            return Err(DjMatchError::parse(format!(
                "Invalid record at line {}: expected 'U V [WEIGHT [TIMESTAMP]]', got '{}'",
                line_num + 1,
                line
            )));
        }

        let u_label = parse_label(parts[0], line_num)?;
        let v_label = parse_label(parts[1], line_num)?;
        if u_label == v_label {
            log::warn!("Skipping self-loop at line {}", line_num + 1);
            continue;
        }

        let raw_weight = if parts.len() >= 3 {
            parts[2].parse::<i64>().map_err(|_| {
                DjMatchError::parse(format!(
                    "Invalid weight '{}' at line {}: must be an integer",
                    parts[2],
                    line_num + 1
                ))
            })?
        } else {
            1
        };
        // Negative weights encode deletions.
        let weight = raw_weight.max(0) as u64;

        let timestamp = if parts.len() >= 4 {
            Some(parts[3].parse::<i64>().map_err(|_| {
                DjMatchError::parse(format!(
                    "Invalid timestamp '{}' at line {}: must be an integer",
                    parts[3],
                    line_num + 1
                ))
            })?)
        } else {
            None
        };

        let u = intern_vertex(&mut graph, &mut vertex_ids, u_label);
        let v = intern_vertex(&mut graph, &mut vertex_ids, v_label);
        let key = if u <= v { (u, v) } else { (v, u) };
        let arc = *arc_ids.entry(key).or_insert_with(|| graph.add_arc(u, v));

        let start_new_delta = deltas.is_empty()
            || (timestamp.is_some() && timestamp != current_timestamp);
        if start_new_delta {
            deltas.push(Vec::new());
            current_timestamp = timestamp;
        }
        deltas.last_mut().unwrap().push((arc, weight));
    }

    if graph.num_arcs() == 0 {
        return Err(DjMatchError::parse("Graph file contains no edges"));
    }

    log::info!(
        "Read graph with {} vertices, {} edges, {} deltas",
        graph.size(),
        graph.num_arcs(),
        deltas.len()
    );

    Ok(DynamicWeightedDiGraph::new(graph, deltas))
}

fn parse_label(token: &str, line_num: usize) -> Result<u64> {
    token.parse::<u64>().map_err(|_| {
        DjMatchError::parse(format!(
            "Invalid vertex label '{}' at line {}: must be a nonnegative integer",
            token,
            line_num + 1
        ))
    })
}

fn intern_vertex(
    graph: &mut DiGraph,
    vertex_ids: &mut HashMap<u64, VertexId>,
    label: u64,
) -> VertexId {
    *vertex_ids
        .entry(label)
        .or_insert_with(|| graph.add_vertex())
}
