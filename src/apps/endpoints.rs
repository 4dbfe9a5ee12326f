use crate::utils::error::{Result, TopologyError};
use crate::utils::validation::validate_address;
use indexmap::IndexMap;

pub const FIRST_NETWORK_PORT: u16 = 12345;

/// Named network endpoints (`tcp://host:port`) shared between applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoints {
    endpoints: IndexMap<String, String>,
    next_port: u16,
}

impl Default for NetworkEndpoints {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkEndpoints {
    pub fn new() -> Self {
        Self {
            endpoints: IndexMap::new(),
            next_port: FIRST_NETWORK_PORT,
        }
    }

    pub fn insert(&mut self, name: &str, address: &str) -> Result<()> {
        validate_address(&format!("network.{}", name), address)?;
        if self.endpoints.contains_key(name) {
            return Err(TopologyError::DuplicateEndpoint(name.to_string()));
        }
        self.endpoints.insert(name.to_string(), address.to_string());
        Ok(())
    }

    /// Assigns the next free port on `host` to `name`.
    pub fn allocate(&mut self, name: &str, host: &str) -> Result<String> {
        let address = format!("tcp://{}:{}", host, self.next_port);
        self.insert(name, &address)?;
        self.next_port += 1;
        Ok(address)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.endpoints.get(name).map(String::as_str)
    }

    /// Address of an endpoint a generator cannot work without.
    pub fn address(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| TopologyError::MissingRequiredEndpoint {
                missing: vec![name.to_string()],
            })
    }

    /// Fails listing every name in `required` that is not declared.
    pub fn require(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.endpoints.contains_key(**name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TopologyError::MissingRequiredEndpoint { missing })
        }
    }

    /// Endpoints whose name contains `pattern`, in declaration order.
    pub fn matching(&self, pattern: &str) -> Vec<(&str, &str)> {
        self.endpoints
            .iter()
            .filter(|(name, _)| name.contains(pattern))
            .map(|(name, address)| (name.as_str(), address.as_str()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> + '_ {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
