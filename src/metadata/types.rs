//! Discovered object model: kinds, columns, parameters, table and routine metadata.

use serde::Serialize;

/// Classification of a discovered object. Drives which operations are exposed
/// and how SQL is synthesized; components match on this tag rather than
/// re-deriving the kind from a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    View,
    Procedure,
    Function,
}

impl ObjectKind {
    /// Single-letter route segment: `/{endpoint}/{kind}/{name}`.
    pub fn route_letter(self) -> &'static str {
        match self {
            ObjectKind::Table => "t",
            ObjectKind::View => "v",
            ObjectKind::Procedure => "p",
            ObjectKind::Function => "f",
        }
    }

    pub fn from_route_letter(s: &str) -> Option<Self> {
        match s {
            "t" => Some(ObjectKind::Table),
            "v" => Some(ObjectKind::View),
            "p" => Some(ObjectKind::Procedure),
            "f" => Some(ObjectKind::Function),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Procedure => "procedure",
            ObjectKind::Function => "function",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Column {
    pub name: String,
    /// Catalog type name, e.g. "nvarchar", "int".
    pub data_type: String,
    pub nullable: bool,
    /// Declared character length; <= 0 means none declared or `max`.
    pub max_length: i32,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

/// Routine parameter in declaration order, name stripped of its `@` marker.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub data_type: String,
    pub max_length: i32,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub is_output: bool,
}

/// A table or view with everything the synthesizer needs: ordered columns,
/// primary key, trigger presence, and the identity column if one exists.
#[derive(Clone, Debug)]
pub struct TableMetadata {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    pub columns: Vec<Column>,
    /// May be empty; such a table is read-only.
    pub primary_key: Vec<String>,
    /// Whether any enabled trigger exists on the table. Blocks direct OUTPUT
    /// capture, forcing a reselect strategy on writes.
    pub has_triggers: bool,
    pub identity_column: Option<String>,
}

impl TableMetadata {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The single-column primary key, if exactly one key column exists.
    /// Single-row routes require this; multi-column keys get list only.
    pub fn single_key(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Default sort column: primary key when present, else the first column.
    pub fn default_order_column(&self) -> Option<&str> {
        self.primary_key
            .first()
            .map(String::as_str)
            .or_else(|| self.columns.first().map(|c| c.name.as_str()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Scalar,
    Table,
}

impl FunctionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionKind::Scalar => "scalar",
            FunctionKind::Table => "table",
        }
    }
}

/// A stored procedure or function with its ordered parameters.
#[derive(Clone, Debug)]
pub struct RoutineMetadata {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    pub params: Vec<Parameter>,
    /// Set for functions only.
    pub function_kind: Option<FunctionKind>,
    /// Return type descriptor for scalar functions.
    pub function_return: Option<String>,
}

impl RoutineMetadata {
    /// Parameters bindable from a request body, in declaration order.
    pub fn input_params(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|p| !p.is_output)
    }
}
