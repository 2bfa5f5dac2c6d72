//! Conversion between report trees and a generic JSON document form, and the
//! persisted on-disk encoding built on top of it.
//!
//! Every section becomes an object carrying its own name under
//! [`SECTION_NAME_KEY`] and the names of its section-valued keys under
//! [`SECTIONS_KEY`]; all other keys map to plain values.

use crate::{
    report::Report,
    section::{Node, Scalar, Section, is_reserved_key},
    util::write_atomic,
};
use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::{debug, warn};

pub use crate::section::{SECTION_NAME_KEY, SECTIONS_KEY};

pub fn to_document(section: &Section) -> Result<Value> {
    let mut doc = Map::new();
    doc.insert(SECTION_NAME_KEY.into(), Value::String(section.name().into()));
    // placeholder keeps the child list ahead of the attributes
    doc.insert(SECTIONS_KEY.into(), Value::Array(Vec::new()));

    let mut children = Vec::new();
    for (key, node) in section.entries() {
        if is_reserved_key(key) {
            bail!("section {} uses reserved key {key}", section.name());
        }
        let value = match node {
            Node::Scalar(s) => scalar_to_value(s),
            Node::List(items) => Value::Array(items.iter().map(scalar_to_value).collect()),
            Node::Section(child) => {
                children.push(Value::String(key.to_string()));
                to_document(child)?
            }
        };
        doc.insert(key.to_string(), value);
    }
    doc.insert(SECTIONS_KEY.into(), Value::Array(children));
    Ok(Value::Object(doc))
}

pub fn from_document(doc: &Value) -> Result<Section> {
    let obj = doc
        .as_object()
        .ok_or_else(|| anyhow!("document node is not an object"))?;
    let name = obj
        .get(SECTION_NAME_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("document node has no {SECTION_NAME_KEY}"))?;
    let children = obj
        .get(SECTIONS_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("section {name} has no {SECTIONS_KEY} list"))?
        .iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| anyhow!("section {name}: non-string entry in {SECTIONS_KEY}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut section = Section::new(name);
    for (key, value) in obj {
        if is_reserved_key(key) {
            continue;
        }
        let node = if children.contains(&key.as_str()) {
            Node::Section(from_document(value).with_context(|| format!("in section {name}"))?)
        } else {
            value_to_attribute(value).with_context(|| format!("attribute {name}.{key}"))?
        };
        section.set(key.as_str(), node);
    }

    for child in &children {
        if !section.contains(child) {
            warn!("section {name} lists child {child} that is not present");
        }
    }
    Ok(section)
}

fn scalar_to_value(s: &Scalar) -> Value {
    match s {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Int(i) => Value::Number((*i).into()),
        // NaN and infinities have no JSON form
        Scalar::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Scalar::Str(s) => Value::String(s.clone()),
    }
}

fn value_to_scalar(v: &Value) -> Result<Scalar> {
    Ok(match v {
        Value::Null => Scalar::Null,
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Scalar::Int(i),
            (None, Some(u), _) => bail!("integer {u} exceeds the stored range"),
            (None, None, Some(f)) => Scalar::Float(f),
            _ => bail!("unrepresentable number {n}"),
        },
        Value::String(s) => Scalar::Str(s.clone()),
        Value::Array(_) | Value::Object(_) => bail!("expected a scalar, found {v}"),
    })
}

fn value_to_attribute(v: &Value) -> Result<Node> {
    match v {
        Value::Array(items) => Ok(Node::List(
            items.iter().map(value_to_scalar).collect::<Result<_>>()?,
        )),
        Value::Object(_) => bail!("nested object is not listed in {SECTIONS_KEY}"),
        other => Ok(Node::Scalar(value_to_scalar(other)?)),
    }
}

impl Report {
    /// The whole report in generic document form.
    pub fn json(&self) -> Result<Value> {
        to_document(self.data())
    }

    /// Replaces this report with the tree described by `doc`.
    pub fn dejson(&mut self, doc: &Value) -> Result<()> {
        *self = Report::from_data(from_document(doc)?);
        Ok(())
    }

    /// Writes the whole report to `path`, replacing any previous contents.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.json()?)?;
        write_atomic(path, &bytes)?;
        debug!("persisted report to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Replaces this report with the one stored at `path`.
    pub fn unpersist(&mut self, path: &Path) -> Result<()> {
        let raw = std::fs::read(path)
            .with_context(|| format!("reading report: {}", path.display()))?;
        let doc: Value = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing report JSON: {}", path.display()))?;
        self.dejson(&doc)
            .with_context(|| format!("decoding report: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.persist(path)
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.unpersist(path)
    }

    pub fn load_from(path: &Path) -> Result<Report> {
        let mut report = Report::new();
        report.unpersist(path)?;
        Ok(report)
    }
}
