use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// The synthesized Terraform-JSON module document.
///
/// `resource` and `data` are two-level maps keyed by resource type then
/// resource name. Appending to an existing (type, name) merges fields rather
/// than overwriting wholesale, since multiple contributors (e.g. team-access
/// entries and their companion data lookup) populate the same named resource
/// incrementally. All maps preserve insertion order so repeated synthesis
/// with identical inputs serializes byte-identically.
#[derive(Debug, Default, Serialize)]
pub struct Module {
    #[serde(skip_serializing_if = "TerraformBlock::is_empty")]
    pub terraform: TerraformBlock,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub variable: IndexMap<String, Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resource: IndexMap<String, IndexMap<String, Value>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub data: IndexMap<String, IndexMap<String, Value>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub provider: IndexMap<String, Value>,
}

/// The `terraform` block: backend plus required-provider declarations
#[derive(Debug, Default, Serialize)]
pub struct TerraformBlock {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub backend: IndexMap<String, Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub required_providers: IndexMap<String, Value>,
}

impl TerraformBlock {
    fn is_empty(&self) -> bool {
        self.backend.is_empty() && self.required_providers.is_empty()
    }
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource body, merging by key with any existing body under
    /// the same (type, name)
    pub fn append_resource(&mut self, resource_type: &str, name: &str, body: Value) {
        append_into(&mut self.resource, resource_type, name, body);
    }

    /// Append a data-source body, merging by key like `append_resource`
    pub fn append_data(&mut self, data_type: &str, name: &str, body: Value) {
        append_into(&mut self.data, data_type, name, body);
    }

    /// Serialize the document as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn append_into(
    map: &mut IndexMap<String, IndexMap<String, Value>>,
    resource_type: &str,
    name: &str,
    body: Value,
) {
    let by_name = map.entry(resource_type.to_string()).or_default();

    match by_name.get_mut(name) {
        Some(existing) => merge_value(existing, body),
        None => {
            by_name.insert(name.to_string(), body);
        }
    }
}

/// Merge `incoming` into `existing`: objects merge key-by-key recursively,
/// anything else replaces
fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(existing_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match existing_map.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        existing_map.insert(key, value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}
