//! Schema model consumed by the layout engine.
//!
//! An [`Entity`] is one table of the schema. Its [`Column`]s are ordered and a
//! column carrying a [`ForeignRef`] designates a reference to another entity.
//! The serialized form uses camelCase field names so entity lists produced by
//! the editing front end can be read as-is.

use log::debug;
use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};

use crate::geometry::{Point, Size};

/// Height reserved for the entity header (name row and borders).
pub const HEADER_HEIGHT: f32 = 47.0;

/// Vertical pitch of one column row.
pub const ROW_HEIGHT: f32 = 28.0;

/// Width used when an entity carries no usable width hint.
pub const DEFAULT_WIDTH: f32 = 320.0;

/// Height of an entity with `column_count` columns.
///
/// This formula is shared with every consumer that computes bounding boxes
/// or handle anchors and must not drift.
pub fn entity_height(column_count: usize) -> f32 {
    HEADER_HEIGHT + column_count as f32 * ROW_HEIGHT
}

/// Vertical offset of the handle for the column at `row_index`.
pub fn row_offset(row_index: usize) -> f32 {
    HEADER_HEIGHT + row_index as f32 * ROW_HEIGHT
}

/// Target of a foreign-key column: the referenced entity and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignRef {
    pub name: String,
    pub column: String,
}

impl ForeignRef {
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
        }
    }
}

/// A column of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_to: Option<ForeignRef>,
}

impl Column {
    /// Creates a plain column with no constraints
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            not_null: false,
            unique: false,
            foreign_to: None,
        }
    }

    /// Marks the column as the primary key
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.not_null = true;
        self
    }

    /// Makes the column reference `entity.column`
    pub fn references(mut self, entity: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_to = Some(ForeignRef::new(entity, column));
        self
    }
}

/// A schema table.
///
/// `position` is the durable placement persisted by the caller (for example
/// after a user drag); the layout engine reads it but never owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(
        default,
        deserialize_with = "lenient_dimension",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<f32>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            position: None,
            width: None,
        }
    }

    /// Appends a column
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the stored position
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the width hint
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    /// Rendered size of the entity.
    ///
    /// Width honours the hint only when it is a finite positive number.
    pub fn size(&self) -> Size {
        let width = match self.width {
            Some(width) if width.is_finite() && width > 0.0 => width,
            Some(width) => {
                debug!(entity = self.name, width; "Ignoring unusable width hint");
                DEFAULT_WIDTH
            }
            None => DEFAULT_WIDTH,
        };
        Size::new(width, entity_height(self.columns.len()))
    }
}

/// Accepts any JSON value for a dimension hint, keeping only numbers.
fn lenient_dimension<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hint {
        Number(f32),
        Other(IgnoredAny),
    }

    Ok(match Option::<Hint>::deserialize(deserializer)? {
        Some(Hint::Number(value)) => Some(value),
        Some(Hint::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_height_formula() {
        assert_eq!(entity_height(0), 47.0);
        assert_eq!(entity_height(1), 75.0);
        assert_eq!(entity_height(2), 103.0);
        assert_eq!(entity_height(3), 131.0);
    }

    #[test]
    fn test_row_offset() {
        assert_eq!(row_offset(0), 47.0);
        assert_eq!(row_offset(4), 159.0);
    }

    #[test]
    fn test_size_defaults() {
        let entity = Entity::new("users")
            .with_column(Column::new("id", "uuid").primary_key())
            .with_column(Column::new("email", "text"));
        assert_eq!(entity.size(), Size::new(320.0, 103.0));
    }

    #[test]
    fn test_size_uses_valid_width_hint() {
        let entity = Entity::new("users").with_width(180.0);
        assert_eq!(entity.size().width(), 180.0);
    }

    #[test]
    fn test_size_rejects_bad_width_hints() {
        for width in [0.0, -10.0, f32::NAN, f32::INFINITY] {
            let entity = Entity::new("users").with_width(width);
            assert_eq!(entity.size().width(), DEFAULT_WIDTH, "hint {width}");
        }
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "name": "posts",
            "columns": [
                {"name": "id", "dataType": "int", "isPrimaryKey": true, "notNull": true},
                {"name": "author_id", "dataType": "int", "foreignTo": {"name": "users", "column": "id"}}
            ],
            "position": {"x": 10, "y": 20}
        }"#;
        let entity: Entity = serde_json::from_str(json).expect("valid entity");

        assert_eq!(entity.name, "posts");
        assert_eq!(entity.columns.len(), 2);
        assert!(entity.columns[0].is_primary_key);
        assert!(!entity.columns[0].unique);
        assert_eq!(
            entity.columns[1].foreign_to,
            Some(ForeignRef::new("users", "id"))
        );
        assert_eq!(entity.position, Some(Point::new(10.0, 20.0)));
        assert_eq!(entity.width, None);
    }

    #[test]
    fn test_deserialize_non_numeric_width_falls_back() {
        let entity: Entity =
            serde_json::from_str(r#"{"name": "t", "width": "wide"}"#).expect("lenient width");
        assert_eq!(entity.width, None);
        assert_eq!(entity.size().width(), DEFAULT_WIDTH);

        let entity: Entity =
            serde_json::from_str(r#"{"name": "t", "width": 240}"#).expect("numeric width");
        assert_eq!(entity.width, Some(240.0));
    }
}
