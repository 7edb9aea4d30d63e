//! The Block entity: construction, validation and mutation

use indexmap::IndexMap;

use crate::error::InvalidBlockError;

use super::render::{RenderConfig, RenderWarning, Rendered, Renderer};
use super::value::Value;

/// Field names accepted by [`Block::from_fields`] besides `kind`
pub const ALLOWED_FIELDS: [&str; 5] = ["subtype", "name", "attributes", "children", "heredoc_map"];

/// A configuration-language block such as `provider "aws" { ... }`
///
/// Blocks own their children exclusively, so a tree of blocks can never
/// contain cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    kind: String,
    subtype: Option<String>,
    name: Option<String>,
    attributes: IndexMap<String, Value>,
    children: Vec<Block>,
    heredoc_map: IndexMap<String, String>,
}

impl Block {
    /// Create an empty block of the given kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            subtype: None,
            name: None,
            attributes: IndexMap::new(),
            children: Vec::new(),
            heredoc_map: IndexMap::new(),
        }
    }

    /// Build a block from loosely typed `(field, value)` pairs
    ///
    /// `kind` is required. The remaining fields must be one of
    /// [`ALLOWED_FIELDS`]; anything else is rejected with the offending name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_mgr::hcl::{Block, Value};
    ///
    /// let block = Block::from_fields([
    ///     ("kind", Value::from("provider")),
    ///     ("name", Value::from("aws")),
    /// ])
    /// .unwrap();
    /// assert_eq!(block.render(), "provider \"aws\" {\n    \n}");
    ///
    /// let err = Block::from_fields([("kind", Value::from("x")), ("bogus", Value::from(1))]);
    /// assert!(err.unwrap_err().to_string().contains("bogus"));
    /// ```
    pub fn from_fields<I, K>(fields: I) -> Result<Self, InvalidBlockError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut kind = None;
        let mut subtype = None;
        let mut name = None;
        let mut attributes = None;
        let mut children = None;
        let mut heredoc_map = None;
        let mut unexpected = None;

        for (field, value) in fields {
            let field = field.into();
            match field.as_str() {
                "kind" => kind = Some(value),
                "subtype" => subtype = Some(value),
                "name" => name = Some(value),
                "attributes" => attributes = Some(value),
                "children" => children = Some(value),
                "heredoc_map" => heredoc_map = Some(value),
                _ => {
                    if unexpected.is_none() {
                        unexpected = Some(field);
                    }
                }
            }
        }

        // A missing kind is reported before unknown fields
        let kind = kind.ok_or(InvalidBlockError::MissingKind)?;
        if let Some(field) = unexpected {
            return Err(InvalidBlockError::UnexpectedField { field });
        }

        let mut block = Block::new(expect_label("kind", &kind)?);
        if let Some(value) = subtype {
            block.subtype = Some(expect_label("subtype", &value)?);
        }
        if let Some(value) = name {
            block.name = Some(expect_label("name", &value)?);
        }
        match attributes {
            Some(Value::Map(map)) => block.add_attributes(map),
            Some(_) => {
                return Err(InvalidBlockError::InvalidField {
                    field: "attributes".to_string(),
                    expected: "a mapping",
                })
            }
            None => {}
        }
        match children {
            Some(Value::List(items)) => block.try_add_children(items)?,
            Some(_) => {
                return Err(InvalidBlockError::InvalidField {
                    field: "children".to_string(),
                    expected: "a sequence of blocks",
                })
            }
            None => {}
        }
        match heredoc_map {
            Some(Value::Map(map)) => {
                for (token, body) in map {
                    let body = expect_label("heredoc_map", &body)?;
                    block.heredoc_map.insert(token, body);
                }
            }
            Some(_) => {
                return Err(InvalidBlockError::InvalidField {
                    field: "heredoc_map".to_string(),
                    expected: "a mapping of strings",
                })
            }
            None => {}
        }

        Ok(block)
    }

    /// Set the first quoted label
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Set the second quoted label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add or overwrite a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Merge several attributes
    pub fn with_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.add_attributes(attributes);
        self
    }

    /// Append a nested block
    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    /// Append several nested blocks
    pub fn with_children(mut self, children: impl IntoIterator<Item = Block>) -> Self {
        self.add_children(children);
        self
    }

    /// Register a heredoc substitution for `"token"`
    pub fn with_heredoc(mut self, token: impl Into<String>, body: impl Into<String>) -> Self {
        self.heredoc_map.insert(token.into(), body.into());
        self
    }

    /// Merge attributes into this block
    ///
    /// Existing keys keep their position and take the new value; new keys are
    /// appended in the order given.
    pub fn add_attributes<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in attributes {
            self.attributes.insert(key.into(), value.into());
        }
    }

    /// Append nested blocks
    pub fn add_children(&mut self, children: impl IntoIterator<Item = Block>) {
        self.children.extend(children);
    }

    /// Append nested blocks given as values
    ///
    /// Every value must be a [`Value::Block`]. Nothing is appended when any
    /// of them is not.
    pub fn try_add_children(
        &mut self,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<(), InvalidBlockError> {
        let blocks = values
            .into_iter()
            .map(|value| match value {
                Value::Block(block) => Ok(*block),
                other => Err(InvalidBlockError::NotABlock {
                    found: other.type_name(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.children.extend(blocks);
        Ok(())
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    pub fn heredoc_map(&self) -> &IndexMap<String, String> {
        &self.heredoc_map
    }

    /// Render with the default indent, logging any heredoc warnings
    pub fn render(&self) -> String {
        self.render_with(&RenderConfig::default())
    }

    /// Render with a custom configuration, logging any heredoc warnings
    pub fn render_with(&self, config: &RenderConfig) -> String {
        let rendered = self.render_with_diagnostics(config);
        for warning in &rendered.warnings {
            log_warning(warning);
        }
        rendered.text
    }

    /// Render and return the warnings instead of logging them
    pub fn render_with_diagnostics(&self, config: &RenderConfig) -> Rendered {
        let mut renderer = Renderer::new(config.clone());
        let text = renderer.render_block(self);
        Rendered {
            text,
            warnings: renderer.finish(),
        }
    }
}

fn expect_label(field: &str, value: &Value) -> Result<String, InvalidBlockError> {
    value.as_label().ok_or_else(|| InvalidBlockError::InvalidField {
        field: field.to_string(),
        expected: "a string",
    })
}

pub(crate) fn log_warning(warning: &RenderWarning) {
    tracing::warn!(
        token = %warning.token,
        block = %warning.block_kind,
        "heredoc reference not found in content"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fields_minimal() {
        let block = Block::from_fields([("kind", Value::from("locals"))]).unwrap();
        assert_eq!(block.kind(), "locals");
        assert!(block.attributes().is_empty());
        assert!(block.children().is_empty());
    }

    #[test]
    fn test_from_fields_missing_kind() {
        let fields: Vec<(&str, Value)> = vec![];
        let err = Block::from_fields(fields).unwrap_err();
        assert_eq!(err, InvalidBlockError::MissingKind);
    }

    #[test]
    fn test_missing_kind_reported_before_unexpected_field() {
        let err = Block::from_fields([("bogus", Value::from(1))]).unwrap_err();
        assert_eq!(err, InvalidBlockError::MissingKind);
    }

    #[test]
    fn test_from_fields_unexpected_field() {
        let err = Block::from_fields([("kind", Value::from("x")), ("bogus", Value::from(1))])
            .unwrap_err();
        assert_eq!(
            err,
            InvalidBlockError::UnexpectedField {
                field: "bogus".to_string()
            }
        );
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_from_fields_all_fields() {
        let mut attributes = IndexMap::new();
        attributes.insert("bucket".to_string(), Value::from("b"));
        let mut heredocs = IndexMap::new();
        heredocs.insert("POLICY".to_string(), Value::from("{}"));

        let block = Block::from_fields([
            ("kind", Value::from("resource")),
            ("subtype", Value::from("aws_s3_bucket")),
            ("name", Value::from("state")),
            ("attributes", Value::Map(attributes)),
            ("children", Value::List(vec![Value::from(Block::new("lifecycle"))])),
            ("heredoc_map", Value::Map(heredocs)),
        ])
        .unwrap();

        assert_eq!(block.subtype(), Some("aws_s3_bucket"));
        assert_eq!(block.name(), Some("state"));
        assert_eq!(block.attributes()["bucket"], Value::from("b"));
        assert_eq!(block.children()[0].kind(), "lifecycle");
        assert_eq!(block.heredoc_map()["POLICY"], "{}");
    }

    #[test]
    fn test_from_fields_rejects_non_block_child() {
        let err = Block::from_fields([
            ("kind", Value::from("terraform")),
            ("children", Value::List(vec![Value::from("backend")])),
        ])
        .unwrap_err();
        assert_eq!(err, InvalidBlockError::NotABlock { found: "string" });
    }

    #[test]
    fn test_from_fields_rejects_wrong_attribute_shape() {
        let err = Block::from_fields([
            ("kind", Value::from("locals")),
            ("attributes", Value::from("nope")),
        ])
        .unwrap_err();
        assert!(matches!(err, InvalidBlockError::InvalidField { ref field, .. } if field == "attributes"));
    }

    #[test]
    fn test_add_attributes_overwrites_in_place() {
        let mut block = Block::new("locals")
            .with_attribute("a", 1)
            .with_attribute("b", 2)
            .with_attribute("c", 3);
        block.add_attributes([("b", Value::from(20)), ("d", Value::from(4))]);

        let keys: Vec<&str> = block.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        assert_eq!(block.attributes()["b"], Value::Int(20));
    }

    #[test]
    fn test_try_add_children_is_all_or_nothing() {
        let mut block = Block::new("terraform");
        let result = block.try_add_children(vec![
            Value::from(Block::new("backend")),
            Value::Bool(true),
        ]);
        assert_eq!(result, Err(InvalidBlockError::NotABlock { found: "boolean" }));
        assert!(block.children().is_empty());

        block
            .try_add_children(vec![Value::from(Block::new("backend"))])
            .unwrap();
        assert_eq!(block.children().len(), 1);
    }

    #[test]
    fn test_add_children_appends_in_order() {
        let mut block = Block::new("terraform").with_child(Block::new("a"));
        block.add_children([Block::new("b"), Block::new("c")]);
        let kinds: Vec<&str> = block.children().iter().map(Block::kind).collect();
        assert_eq!(kinds, vec!["a", "b", "c"]);
    }
}
