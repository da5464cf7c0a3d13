// Declarative pipeline description
use crate::config::constants::{CHILD_FIELD, KIND_FIELD};
use crate::error::{Result, StreamError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::io::Read;

/// A kind-discriminated node: `{ "kind": "...", ...kind-specific fields }`.
///
/// The `kind` field is only checked when the node is resolved, so a node
/// missing it fails construction rather than parsing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Spec {
    fields: Map<String, Value>,
}

impl Spec {
    /// Create a node of the given kind with no other fields
    pub fn new(kind: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(KIND_FIELD.to_string(), Value::String(kind.into()));
        Self { fields }
    }

    /// Set a field
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set the child list of a composite node
    pub fn with_children(mut self, children: Vec<Spec>) -> Self {
        let children = children
            .into_iter()
            .map(|child| Value::Object(child.fields))
            .collect();
        self.fields
            .insert(CHILD_FIELD.to_string(), Value::Array(children));
        self
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(StreamError::config(format!(
                "spec node must be a mapping, got {other}"
            ))),
        }
    }

    /// The kind discriminator
    pub fn kind(&self) -> Result<&str> {
        match self.fields.get(KIND_FIELD) {
            Some(Value::String(kind)) => Ok(kind.as_str()),
            Some(other) => Err(StreamError::config(format!(
                "`{KIND_FIELD}` must be a string, got {other}"
            ))),
            None => Err(StreamError::config(format!(
                "`{KIND_FIELD}` is missing"
            ))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Decode an optional field; `null` counts as absent
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some).map_err(|err| {
                StreamError::config(format!("{}: invalid field '{name}': {err}", self.label()))
            }),
        }
    }

    /// Decode a mandatory field
    pub fn require<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.field(name)?.ok_or_else(|| {
            StreamError::config(format!("{}: '{name}' is required", self.label()))
        })
    }

    /// Decode the whole node into a typed config
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&Value::Object(self.fields.clone())).map_err(|err| {
            StreamError::config(format!("{}: {err}", self.label()))
        })
    }

    /// Child specs of a composite node; absent means none
    pub fn children(&self) -> Result<Vec<Spec>> {
        Ok(self.field(CHILD_FIELD)?.unwrap_or_default())
    }

    fn label(&self) -> String {
        match self.kind() {
            Ok(kind) => format!("'{kind}' spec"),
            Err(_) => "spec".to_string(),
        }
    }
}

/// Full description of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub input: Spec,
    pub output: Spec,
    /// Applied input-side, first entry wraps the raw source
    #[serde(default, deserialize_with = "null_as_empty")]
    pub decoder: Vec<Spec>,
    /// Applied output-side, first entry wraps the raw sink
    #[serde(default, deserialize_with = "null_as_empty")]
    pub encoder: Vec<Spec>,
    /// Copy buffer size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
}

impl PipelineSpec {
    pub fn new(input: Spec, output: Spec) -> Self {
        Self {
            input,
            output,
            decoder: Vec::new(),
            encoder: Vec::new(),
            buffer_size: None,
        }
    }

    pub fn with_decoder(mut self, spec: Spec) -> Self {
        self.decoder.push(spec);
        self
    }

    pub fn with_encoder(mut self, spec: Spec) -> Self {
        self.encoder.push(spec);
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Spec>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Spec>>::deserialize(deserializer)?.unwrap_or_default())
}
