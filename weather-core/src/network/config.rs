use std::collections::BTreeMap;

/// Base URL plus the headers and query parameters every request to one
/// backend carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub base_url: String,
    pub headers: BTreeMap<String, String>,
    pub query_parameters: BTreeMap<String, String>,
}

impl NetworkConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: BTreeMap::new(),
            query_parameters: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.query_parameters.insert(name.into(), value.into());
        self
    }
}
