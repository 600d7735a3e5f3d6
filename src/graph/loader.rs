//! CSV deck loaders and writers.
//!
//! The legacy deck is three files in one directory:
//!
//! - `NodeData.csv` — `node_id, processing_delay, reliability`
//! - `EdgeData.csv` — `u, v, bandwidth, delay, reliability`
//! - `DemandData.csv` — `id, source, destination, demand_mbps`
//!
//! Both `,` and `;` field delimiters are accepted (old exports used `;`),
//! and decimal commas are tolerated inside numeric fields.

use super::{EdgeAttrs, NetworkGraph, NodeAttrs, NodeId};
use crate::error::RouteError;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A traffic demand between a source/destination pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPair {
    pub id: u32,
    pub source: NodeId,
    pub destination: NodeId,
    pub demand_mbps: f64,
}

/// Loads a graph plus demand list from a deck directory.
pub fn load_deck(dir: &Path) -> Result<(NetworkGraph, Vec<DemandPair>), RouteError> {
    let nodes = parse_nodes(&read_file(&dir.join("NodeData.csv"))?)?;
    let edges = parse_edges(&read_file(&dir.join("EdgeData.csv"))?)?;
    let demands_path = dir.join("DemandData.csv");
    let demands = if demands_path.exists() {
        parse_demands(&read_file(&demands_path)?)?
    } else {
        Vec::new()
    };

    let graph = build_graph(nodes, edges)?;
    for d in &demands {
        if !graph.contains_node(d.source) || !graph.contains_node(d.destination) {
            return Err(RouteError::Graph(format!(
                "demand {} references unknown node ({} -> {})",
                d.id, d.source, d.destination
            )));
        }
    }
    Ok((graph, demands))
}

/// Writes a graph (and optional demands) back out as a deck directory.
pub fn write_deck(
    dir: &Path,
    graph: &NetworkGraph,
    demands: &[DemandPair],
) -> Result<(), RouteError> {
    fs::create_dir_all(dir)?;

    let mut writer = WriterBuilder::new().from_path(dir.join("NodeData.csv"))?;
    writer.write_record(["node_id", "processing_delay", "reliability"])?;
    for v in 0..graph.node_count() {
        let attrs = graph.node(v);
        writer.serialize((v, attrs.processing_delay, attrs.reliability))?;
    }
    writer.flush()?;

    let mut edges: Vec<_> = graph.edges().collect();
    edges.sort_by_key(|&(u, v, _)| (u, v));
    let mut writer = WriterBuilder::new().from_path(dir.join("EdgeData.csv"))?;
    writer.write_record(["u", "v", "bandwidth", "delay", "reliability"])?;
    for (u, v, e) in edges {
        writer.serialize((u, v, e.bandwidth, e.delay, e.reliability))?;
    }
    writer.flush()?;

    let mut writer = WriterBuilder::new().from_path(dir.join("DemandData.csv"))?;
    writer.write_record(["id", "source", "destination", "demand_mbps"])?;
    for d in demands {
        writer.serialize((d.id, d.source, d.destination, d.demand_mbps))?;
    }
    writer.flush()?;
    Ok(())
}

fn read_file(path: &Path) -> Result<String, RouteError> {
    fs::read_to_string(path)
        .map_err(|e| RouteError::InvalidInput(format!("cannot read {}: {e}", path.display())))
}

/// Reads data records, sniffing the delimiter from the header line.
fn read_records(content: &str, min_fields: usize) -> Result<Vec<StringRecord>, RouteError> {
    let delimiter = if content.lines().next().is_some_and(|h| h.contains(';')) {
        b';'
    } else {
        b','
    };
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        if record.len() < min_fields {
            return Err(RouteError::InvalidInput(format!(
                "row {:?}: expected at least {min_fields} fields",
                record.position().map_or(0, |p| p.line())
            )));
        }
        records.push(record);
    }
    Ok(records)
}

/// Parses a float, accepting a decimal comma.
fn parse_float(record: &StringRecord, idx: usize) -> Result<f64, RouteError> {
    let field = &record[idx];
    field
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| field_error(record, field))
}

fn parse_usize(record: &StringRecord, idx: usize) -> Result<usize, RouteError> {
    let field = &record[idx];
    field.parse::<usize>().map_err(|_| field_error(record, field))
}

fn field_error(record: &StringRecord, field: &str) -> RouteError {
    RouteError::InvalidInput(format!(
        "row {}: bad value {field:?}",
        record.position().map_or(0, |p| p.line())
    ))
}

pub(super) fn parse_nodes(content: &str) -> Result<Vec<(NodeId, NodeAttrs)>, RouteError> {
    read_records(content, 3)?
        .iter()
        .map(|r| {
            Ok((
                parse_usize(r, 0)?,
                NodeAttrs {
                    processing_delay: parse_float(r, 1)?,
                    reliability: parse_float(r, 2)?,
                },
            ))
        })
        .collect()
}

pub(super) fn parse_edges(
    content: &str,
) -> Result<Vec<(NodeId, NodeId, EdgeAttrs)>, RouteError> {
    read_records(content, 5)?
        .iter()
        .map(|r| {
            Ok((
                parse_usize(r, 0)?,
                parse_usize(r, 1)?,
                EdgeAttrs {
                    bandwidth: parse_float(r, 2)?,
                    delay: parse_float(r, 3)?,
                    reliability: parse_float(r, 4)?,
                },
            ))
        })
        .collect()
}

pub(super) fn parse_demands(content: &str) -> Result<Vec<DemandPair>, RouteError> {
    read_records(content, 4)?
        .iter()
        .map(|r| {
            Ok(DemandPair {
                id: parse_usize(r, 0)? as u32,
                source: parse_usize(r, 1)?,
                destination: parse_usize(r, 2)?,
                demand_mbps: parse_float(r, 3)?,
            })
        })
        .collect()
}

/// Assembles nodes keyed by dense ids into a graph.
fn build_graph(
    nodes: Vec<(NodeId, NodeAttrs)>,
    edges: Vec<(NodeId, NodeId, EdgeAttrs)>,
) -> Result<NetworkGraph, RouteError> {
    if nodes.is_empty() {
        return Err(RouteError::Graph("node file contains no nodes".into()));
    }
    let n = nodes.len();
    let mut attrs = vec![None; n];
    for (id, a) in nodes {
        if id >= n {
            return Err(RouteError::Graph(format!(
                "node ids must be contiguous 0..{n}, found {id}"
            )));
        }
        if attrs[id].replace(a).is_some() {
            return Err(RouteError::Graph(format!("duplicate node id {id}")));
        }
    }
    let attrs: Vec<NodeAttrs> = attrs
        .into_iter()
        .map(|a| a.expect("density checked above: every slot filled exactly once"))
        .collect();
    NetworkGraph::from_parts(attrs, edges)
}
