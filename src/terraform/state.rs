use std::collections::HashSet;

use serde_json::Value;

use crate::error::RunResult;

/// The external state store's current resource inventory, reduced to the set
/// of managed resource addresses
#[derive(Debug, Default, Clone)]
pub struct StateSnapshot {
    addresses: HashSet<String>,
}

impl StateSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the output of `terraform show -json`
    pub fn from_show_json(raw: &str) -> RunResult<Self> {
        let state: Value = serde_json::from_str(raw)?;
        let mut addresses = HashSet::new();

        if let Some(root) = state.pointer("/values/root_module") {
            collect_addresses(root, &mut addresses);
        }

        Ok(Self { addresses })
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    /// Record an address just imported, so later checks within the same run
    /// treat it as managed
    pub fn record(&mut self, address: String) {
        self.addresses.insert(address);
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

fn collect_addresses(module: &Value, addresses: &mut HashSet<String>) {
    if let Some(resources) = module.get("resources").and_then(|r| r.as_array()) {
        for resource in resources {
            if let Some(address) = resource.get("address").and_then(|a| a.as_str()) {
                addresses.insert(address.to_string());
            }
        }
    }

    if let Some(children) = module.get("child_modules").and_then(|c| c.as_array()) {
        for child in children {
            collect_addresses(child, addresses);
        }
    }
}
