//! Part records as delivered by the catalogue service, and selection keys.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, ViewerError};

/// `{x, y, z}` as it appears in part metadata. Missing axes read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec3Record {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3Record> for Vec3 {
    fn from(v: Vec3Record) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for Vec3Record {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Part metadata. Either an object or the same object JSON-encoded in a
/// string, depending on which endpoint produced the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartContent {
    Encoded(String),
    Structured(Map<String, Value>),
}

/// Decoded part metadata. Only `position` and `explodeVector` drive the
/// viewer; the rest is carried for callers displaying part details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartMetadata {
    pub position: Option<Vec3Record>,
    pub explode_vector: Option<Vec3Record>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub function: Option<String>,
    pub material: Option<String>,
    pub structure: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub file_url: Option<String>,
    pub integrated_file: Option<Value>,
    pub vector: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the part list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRecord {
    /// Numeric ids are kept in their string form.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    pub mesh_name: String,
    #[serde(default)]
    pub content: Option<PartContent>,
}

impl PartRecord {
    #[must_use]
    pub fn new(mesh_name: impl Into<String>) -> Self {
        Self {
            id: None,
            mesh_name: mesh_name.into(),
            content: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Structured content with the given home and explosion vector.
    #[must_use]
    pub fn with_layout(mut self, position: Vec3, explode_vector: Vec3) -> Self {
        let mut map = Map::new();
        map.insert("position".into(), vec3_value(position));
        map.insert("explodeVector".into(), vec3_value(explode_vector));
        self.content = Some(PartContent::Structured(map));
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: PartContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Decodes `content`, parsing the string form when needed.
    pub fn metadata(&self) -> Result<PartMetadata> {
        match &self.content {
            Some(PartContent::Structured(map)) => {
                Ok(serde_json::from_value(Value::Object(map.clone()))?)
            }
            Some(PartContent::Encoded(text)) => Ok(serde_json::from_str(text)?),
            None => Err(ViewerError::JsonError(serde::de::Error::custom(format!(
                "part '{}' has no content",
                self.mesh_name
            )))),
        }
    }

    #[must_use]
    pub fn matches(&self, key: &SelectionKey) -> bool {
        match key {
            SelectionKey::Id(id) => self.id.as_deref() == Some(id.as_str()),
            SelectionKey::Mesh(name) => self.mesh_name == *name,
        }
    }
}

fn vec3_value(v: Vec3) -> Value {
    serde_json::json!({ "x": v.x, "y": v.y, "z": v.z })
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(|id| match id {
        IdRepr::Number(n) => n.to_string(),
        IdRepr::Text(s) => s,
    }))
}

/// Parses a part list from its JSON array form.
pub fn parse_part_list(json: &str) -> Result<Vec<PartRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Which part is selected: `id:<id>` or `mesh:<meshName>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionKey {
    Id(String),
    Mesh(String),
}

impl SelectionKey {
    /// Anything other than the two prefixed forms means "no selection".
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        if let Some(id) = key.strip_prefix("id:") {
            Some(Self::Id(id.to_string()))
        } else {
            key.strip_prefix("mesh:")
                .map(|name| Self::Mesh(name.to_string()))
        }
    }

    /// First record in list order that this key names.
    #[must_use]
    pub fn find<'a>(&self, parts: &'a [PartRecord]) -> Option<&'a PartRecord> {
        parts.iter().find(|p| p.matches(self))
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Mesh(name) => write!(f, "mesh:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let parts = parse_part_list(
            r#"[{"id": 42, "meshName": "nut"}, {"id": "b-7", "meshName": "bolt"}, {"meshName": "washer"}]"#,
        )
        .unwrap();
        assert_eq!(parts[0].id.as_deref(), Some("42"));
        assert_eq!(parts[1].id.as_deref(), Some("b-7"));
        assert_eq!(parts[2].id, None);
    }

    #[test]
    fn content_in_both_forms() {
        let parts = parse_part_list(
            r#"[
                {"meshName": "a", "content": {"position": {"x": 1, "y": 2, "z": 3}, "explodeVector": {"x": 0, "y": 1, "z": 0}, "material": "steel"}},
                {"meshName": "b", "content": "{\"position\":{\"x\":4,\"y\":5,\"z\":6}}"}
            ]"#,
        )
        .unwrap();

        let a = parts[0].metadata().unwrap();
        assert_eq!(a.position.map(Vec3::from), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(a.explode_vector.map(Vec3::from), Some(Vec3::Y));
        assert_eq!(a.material.as_deref(), Some("steel"));

        let b = parts[1].metadata().unwrap();
        assert_eq!(b.position.map(Vec3::from), Some(Vec3::new(4.0, 5.0, 6.0)));
        assert_eq!(b.explode_vector, None);
    }

    #[test]
    fn broken_encoded_content_is_an_error() {
        let record = PartRecord::new("x").with_content(PartContent::Encoded("{not json".into()));
        assert!(record.metadata().is_err());
        assert!(PartRecord::new("y").metadata().is_err());
    }

    #[test]
    fn selection_keys() {
        assert_eq!(SelectionKey::parse("id:42"), Some(SelectionKey::Id("42".into())));
        assert_eq!(
            SelectionKey::parse("mesh:gear_1"),
            Some(SelectionKey::Mesh("gear_1".into()))
        );
        assert_eq!(SelectionKey::parse("gear_1"), None);
        assert_eq!(SelectionKey::parse(""), None);
        assert_eq!(SelectionKey::Id("7".into()).to_string(), "id:7");
    }
}
