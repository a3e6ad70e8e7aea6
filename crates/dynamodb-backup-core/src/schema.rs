//! Table schema structures and the local schema cache.
//!
//! A [`TableSchema`] keeps only what is needed to re-create a table: key
//! schema, attribute definitions, billing mode and secondary indexes. Field
//! names follow the DynamoDB wire names so that schema files round-trip with
//! other tooling.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{Error, Result};

/// Reduced table description, persisted as `table_schema.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableSchema {
    /// Table name
    pub table_name: String,

    /// Attributes referenced by the table and index keys
    pub attribute_definitions: Vec<AttributeDefinition>,

    /// Primary key
    pub key_schema: Vec<KeySchemaElement>,

    /// Billing mode
    #[serde(default)]
    pub billing_mode: BillingMode,

    /// Capacity of a provisioned table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,

    /// Global secondary indexes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_secondary_indexes: Option<Vec<SecondaryIndex>>,

    /// Local secondary indexes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_secondary_indexes: Option<Vec<SecondaryIndex>>,
}

/// Attribute name and scalar type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: AttributeType,
}

/// Scalar attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
        }
    }
}

/// One element of a key schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyRole,
}

/// Role of a key attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    /// Partition key
    #[serde(rename = "HASH")]
    Partition,
    /// Sort key
    #[serde(rename = "RANGE")]
    Sort,
}

impl KeyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Partition => "HASH",
            KeyRole::Sort => "RANGE",
        }
    }
}

/// Billing mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    /// On-demand capacity
    #[default]
    #[serde(rename = "PAY_PER_REQUEST")]
    OnDemand,
    Provisioned,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingMode::OnDemand => "PAY_PER_REQUEST",
            BillingMode::Provisioned => "PROVISIONED",
        }
    }
}

/// Read/write capacity units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// Global or local secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

/// Attributes copied into an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Projection {
    #[serde(default)]
    pub projection_type: ProjectionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_key_attributes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    #[default]
    All,
    KeysOnly,
    Include,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::All => "ALL",
            ProjectionType::KeysOnly => "KEYS_ONLY",
            ProjectionType::Include => "INCLUDE",
        }
    }
}

impl TableSchema {
    /// Check the key schema invariants.
    ///
    /// The primary key must be non-empty, and every key attribute (table and
    /// index keys) must have an attribute definition.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(Error::InvalidSchema("table name is empty".to_string()));
        }
        if self.key_schema.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "{}: key schema is empty",
                self.table_name
            )));
        }

        let defined: HashSet<&str> = self
            .attribute_definitions
            .iter()
            .map(|a| a.attribute_name.as_str())
            .collect();

        let indexes = self
            .global_secondary_indexes
            .iter()
            .chain(self.local_secondary_indexes.iter())
            .flatten();
        let key_names = self
            .key_schema
            .iter()
            .chain(indexes.flat_map(|i| i.key_schema.iter()))
            .map(|k| k.attribute_name.as_str());

        for name in key_names {
            if !defined.contains(name) {
                return Err(Error::InvalidSchema(format!(
                    "{}: key attribute '{}' has no attribute definition",
                    self.table_name, name
                )));
            }
        }

        Ok(())
    }

    /// Copy of the schema under a different table name.
    pub fn renamed(&self, new_name: &str) -> Self {
        Self {
            table_name: new_name.to_string(),
            ..self.clone()
        }
    }

    /// Number of global secondary indexes
    pub fn gsi_count(&self) -> usize {
        self.global_secondary_indexes
            .as_ref()
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Render the key schema as `id(HASH), created(RANGE)`.
    pub fn key_summary(&self) -> String {
        self.key_schema
            .iter()
            .map(|k| format!("{}({})", k.attribute_name, k.key_type.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate schema JSON
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let schema: TableSchema = serde_json::from_slice(data)?;
        schema.validate()?;
        Ok(schema)
    }
}

/// Default location of the local schema cache
pub const DEFAULT_SCHEMA_CACHE: &str = "table_schema.json";

/// Single-file cache holding the last extracted schema
#[derive(Debug, Clone)]
pub struct SchemaCache {
    path: PathBuf,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_CACHE)
    }
}

impl SchemaCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the cache with `schema`.
    pub async fn save(&self, schema: &TableSchema) -> Result<()> {
        let json = schema.to_json()?;
        tokio::fs::write(&self.path, json).await?;
        info!("Table schema written to {}", self.path.display());
        Ok(())
    }

    /// Load the cached schema.
    ///
    /// A missing file or malformed content is reported as `Error::Config`.
    pub async fn load(&self) -> Result<TableSchema> {
        debug!("Reading cached schema: {}", self.path.display());
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "schema file {} does not exist",
                    self.path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        TableSchema::from_json(&data).map_err(|e| {
            Error::Config(format!(
                "schema file {} is malformed: {}",
                self.path.display(),
                e
            ))
        })
    }
}
