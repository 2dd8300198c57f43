use serde::Serialize;
use serde_json::{Map, Number, Value as Json};

use super::Format;
use crate::error::{Result, StatError};
use crate::metrics::{Snapshot, Stat, TimerStats, Value};

/// Catalog key.
pub const KIND: &str = "json";

/// Nested JSON: every name segment opens an object, the last one holds the
/// value. Keys are sorted and the output is tab-indented, so identical
/// snapshots encode to identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn encode(&self, snap: &Snapshot) -> Result<Vec<u8>> {
        let tree = build_tree(snap)?;

        let mut out = Vec::with_capacity(64 * snap.len().max(1));
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
        tree.serialize(&mut ser)?;
        Ok(out)
    }
}

fn build_tree(snap: &Snapshot) -> Result<Json> {
    let mut root = Map::new();

    for stat in snap {
        let segments: Vec<&str> = stat.name.segments().collect();
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };

        let mut node = &mut root;
        for seg in parents {
            let child = node
                .entry(seg.to_string())
                .or_insert_with(|| Json::Object(Map::new()));
            node = match child {
                Json::Object(m) => m,
                _ => return Err(clash(stat)),
            };
        }

        if node.contains_key(*leaf) {
            return Err(clash(stat));
        }
        node.insert(leaf.to_string(), to_json(stat)?);
    }

    Ok(Json::Object(root))
}

fn to_json(stat: &Stat) -> Result<Json> {
    Ok(match &stat.value {
        Value::Int(v) => Json::from(*v),
        Value::Bool(v) => Json::Bool(*v),
        Value::Float(v) => Number::from_f64(*v).map(Json::Number).ok_or_else(|| {
            StatError::Encode(format!("{}: non-finite float {}", stat.name, v))
        })?,
        Value::Str(v) => Json::String(v.clone()),
        Value::Timer(t) => timer_json(t),
    })
}

fn timer_json(t: &TimerStats) -> Json {
    let fields = [
        ("count", t.count),
        ("max", t.max),
        ("mean", t.mean),
        ("min", t.min),
        ("p50", t.p50),
        ("p75", t.p75),
        ("p90", t.p90),
        ("p95", t.p95),
        ("stddev", t.stddev),
    ];
    Json::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), Json::from(v)))
            .collect(),
    )
}

fn clash(stat: &Stat) -> StatError {
    StatError::Encode(format!(
        "{} is used both as a value and as a parent of other stats",
        stat.name
    ))
}
