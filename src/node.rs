use {
    serde::{Serialize, ser::SerializeStruct},
    std::fmt,
};

/// One flattened leaf: the resolved field name and the rendered value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node {
    name: String,
    value: String,
}

impl Node {
    /// Nodes without a name are never produced: an empty `name` yields `None`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Option<Self> {
        let name = name.into();
        (!name.is_empty()).then(|| Self {
            name,
            value: value.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_parts(self) -> (String, String) {
        (self.name, self.value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut node = serializer.serialize_struct("Node", 2)?;
        node.serialize_field("name", &self.name)?;
        node.serialize_field("value", &self.value)?;
        node.end()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn test_empty_name_is_suppressed() {
        assert_eq!(Node::new("", "value"), None);
        assert!(Node::new("name", "").is_some());
    }

    #[test]
    fn test_node_output() {
        let node = Node::new("valueA", "Hello").unwrap();
        assert_eq!(node.to_string(), "valueA=Hello");
        assert_eq!(serde_json::to_value(&node).unwrap(), json!({"name": "valueA", "value": "Hello"}));
    }
}
