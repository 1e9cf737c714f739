use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::SocketType;

/// Read-only snapshot of the editor's node graph.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShaderGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,

    // Instance socket maps. Empty means "use the registry declaration".
    #[serde(default)]
    pub inputs: Vec<InputSlot>,
    #[serde(default)]
    pub outputs: Vec<OutputSlot>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InputSlot {
    pub key: String,
    #[serde(rename = "type")]
    pub ty: SocketType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub connection: Option<ConnectionRef>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputSlot {
    pub key: String,
    #[serde(rename = "type")]
    pub ty: SocketType,
    #[serde(default)]
    pub label: String,
}

/// The single incoming edge of an input socket.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionRef {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "outputKey")]
    pub output_key: String,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position: Position::default(),
            params: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn input(&self, key: &str) -> Option<&InputSlot> {
        self.inputs.iter().find(|s| s.key == key)
    }

    pub fn input_mut(&mut self, key: &str) -> Option<&mut InputSlot> {
        self.inputs.iter_mut().find(|s| s.key == key)
    }

    /// Wire `from_node.from_output` into this node's `input`.
    ///
    /// Returns false when the instance has no such input socket.
    pub fn connect(&mut self, input: &str, from_node: &str, from_output: &str) -> bool {
        match self.input_mut(input) {
            Some(slot) => {
                slot.connection = Some(ConnectionRef {
                    node_id: from_node.to_string(),
                    output_key: from_output.to_string(),
                });
                true
            }
            None => false,
        }
    }
}

impl ShaderGraph {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Index nodes by id. On duplicate ids the first node wins.
    pub fn nodes_by_id(&self) -> HashMap<&str, &Node> {
        let mut out = HashMap::with_capacity(self.nodes.len());
        for n in &self.nodes {
            out.entry(n.id.as_str()).or_insert(n);
        }
        out
    }
}

pub fn load_graph_from_str(text: &str) -> Result<ShaderGraph> {
    serde_json::from_str(text).context("failed to parse graph json")
}

pub fn load_graph_from_path(path: impl AsRef<std::path::Path>) -> Result<ShaderGraph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph json at {}", path.display()))?;
    load_graph_from_str(&text).with_context(|| format!("in {}", path.display()))
}

pub fn parse_f32(v: &serde_json::Value) -> Option<f32> {
    v.as_f64()
        .map(|x| x as f32)
        .or_else(|| v.as_i64().map(|x| x as f32))
        .or_else(|| v.as_u64().map(|x| x as f32))
        .or_else(|| v.as_bool().map(|b| if b { 1.0 } else { 0.0 }))
}

pub fn parse_u32(v: &serde_json::Value) -> Option<u32> {
    if let Some(x) = v.as_u64() {
        return u32::try_from(x).ok();
    }
    // Sliders send floats; negative counts clamp to zero.
    v.as_f64()
        .filter(|x| x.is_finite())
        .map(|x| x.max(0.0).floor().min(u32::MAX as f64) as u32)
}

/// Parse a vector param given either as `[x, y, ..]` or `{ "x": .., "y": .. }`.
///
/// Missing components are zero. A bare number is broadcast.
pub fn parse_vec_param(v: &serde_json::Value, n: usize) -> Option<Vec<f32>> {
    if let Some(arr) = v.as_array() {
        return Some(
            (0..n)
                .map(|i| arr.get(i).and_then(parse_f32).unwrap_or(0.0))
                .collect(),
        );
    }
    if let Some(obj) = v.as_object() {
        const KEYS: [[&str; 2]; 4] = [["x", "r"], ["y", "g"], ["z", "b"], ["w", "a"]];
        return Some(
            KEYS.iter()
                .take(n)
                .map(|names| {
                    names
                        .iter()
                        .find_map(|k| obj.get(*k).and_then(parse_f32))
                        .unwrap_or(0.0)
                })
                .collect(),
        );
    }
    parse_f32(v).map(|x| vec![x; n])
}

/// Parse a list of node ids, accepting both `["a", "b"]` and `[{ "id": "a" }, ..]`.
pub fn parse_id_list(v: &serde_json::Value) -> Vec<String> {
    let Some(arr) = v.as_array() else {
        return Vec::new();
    };
    arr.iter()
        .filter_map(|item| {
            item.as_str()
                .or_else(|| item.get("id").and_then(|x| x.as_str()))
                .or_else(|| item.get("nodeId").and_then(|x| x.as_str()))
                .map(str::to_string)
        })
        .collect()
}
