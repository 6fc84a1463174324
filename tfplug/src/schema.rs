//! Schema types and builders for tfplug
//!
//! Resources describe their attributes and nested blocks with the builders in
//! this module. The resulting `Schema` also drives the default config
//! validation in `Resource::validate`.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    /// Whether a concrete value fits this type; null and unknown always do
    pub fn accepts(&self, value: &Dynamic) -> bool {
        match (self, value) {
            (_, Dynamic::Null) | (_, Dynamic::Unknown) => true,
            (AttributeType::String, Dynamic::String(_)) => true,
            (AttributeType::Number, Dynamic::Number(_)) => true,
            (AttributeType::Bool, Dynamic::Bool(_)) => true,
            (AttributeType::List(elem), Dynamic::List(items))
            | (AttributeType::Set(elem), Dynamic::List(items)) => {
                items.iter().all(|item| elem.accepts(item))
            }
            (AttributeType::Map(elem), Dynamic::Map(entries)) => {
                entries.values().all(|v| elem.accepts(v))
            }
            (AttributeType::Object(fields), Dynamic::Map(entries)) => entries
                .iter()
                .all(|(k, v)| fields.get(k).is_some_and(|t| t.accepts(v))),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    /// Increment when a schema change requires state migration
    pub version: i64,
    pub block: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
}

#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    /// Zero means unbounded
    pub max_items: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Single,
    List,
    Set,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block.block_types.iter().find(|b| b.type_name == name)
    }

    /// Check a configuration against the schema
    ///
    /// Reports missing required attributes, values of the wrong type and
    /// nested blocks outside their item bounds. Unknown values are accepted
    /// since they only resolve at apply time.
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        validate_block(
            &self.block,
            &config.value,
            &AttributePath::root(),
            &mut diagnostics,
        );
        diagnostics
    }
}

fn validate_block(
    block: &Block,
    value: &Dynamic,
    path: &AttributePath,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let empty = HashMap::new();
    let entries = match value {
        Dynamic::Map(m) => m,
        Dynamic::Unknown => return,
        _ => &empty,
    };

    for attr in &block.attributes {
        let attr_path = path.clone().attribute(&attr.name);
        match entries.get(&attr.name) {
            None | Some(Dynamic::Null) if attr.required => diagnostics.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("The argument \"{}\" is required", attr.name),
                )
                .with_attribute(attr_path),
            ),
            Some(v) if !attr.r#type.accepts(v) => diagnostics.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!(
                        "Attribute \"{}\" expects {:?}, got {}",
                        attr.name,
                        attr.r#type,
                        v.type_name()
                    ),
                )
                .with_attribute(attr_path),
            ),
            _ => {}
        }
    }

    for nested in &block.block_types {
        let block_path = path.clone().attribute(&nested.type_name);
        let items: Vec<&Dynamic> = match entries.get(&nested.type_name) {
            None | Some(Dynamic::Null) => Vec::new(),
            Some(Dynamic::Unknown) => continue,
            Some(Dynamic::List(items)) if nested.nesting != NestingMode::Single => {
                items.iter().collect()
            }
            Some(v @ Dynamic::Map(_)) if nested.nesting == NestingMode::Single => vec![v],
            Some(v) => {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid block",
                        format!(
                            "Block \"{}\" has unexpected shape {}",
                            nested.type_name,
                            v.type_name()
                        ),
                    )
                    .with_attribute(block_path),
                );
                continue;
            }
        };

        let count = items.len() as i64;
        if count < nested.min_items {
            diagnostics.push(
                Diagnostic::error(
                    if count == 0 {
                        "Missing required block"
                    } else {
                        "Insufficient blocks"
                    },
                    format!(
                        "At least {} \"{}\" block(s) are required",
                        nested.min_items, nested.type_name
                    ),
                )
                .with_attribute(block_path.clone()),
            );
        }
        if nested.max_items > 0 && count > nested.max_items {
            diagnostics.push(
                Diagnostic::error(
                    "Too many blocks",
                    format!(
                        "No more than {} \"{}\" block(s) are allowed",
                        nested.max_items, nested.type_name
                    ),
                )
                .with_attribute(block_path.clone()),
            );
        }

        for (idx, item) in items.into_iter().enumerate() {
            let item_path = match nested.nesting {
                NestingMode::Single => block_path.clone(),
                _ => block_path.clone().index(idx as i64),
            };
            validate_block(&nested.block, item, &item_path, diagnostics);
        }
    }
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// Builder for nested configuration blocks
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str, nesting: NestingMode) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: Block::default(),
                nesting,
                min_items: 0,
                max_items: 0,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn min_items(mut self, min: i64) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.nested.block.block_types.push(block);
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::default(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
