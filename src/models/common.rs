// Shared pieces embedded in Taiga resources

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ==================================================================================================
// Embedded "extra info" objects
// ==================================================================================================

/// Status summary embedded in epics, stories and tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusExtraInfo {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_closed: bool,
}

/// User summary embedded in other resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExtraInfo {
    #[serde(default)]
    pub username: String,
    #[serde(rename = "full_name_display", default)]
    pub full_name: String,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Project summary embedded in other resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectExtraInfo {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Epic / user story summary embedded in other resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefExtraInfo {
    pub id: i64,
    #[serde(rename = "ref")]
    pub reference: i64,
    pub subject: String,
}

// ==================================================================================================
// Field normalisers
// ==================================================================================================

/// Taiga returns tags either as `[["name", "#color"], ...]` or `["name", ...]`
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(normalize_tags(raw.unwrap_or_default()))
}

pub fn normalize_tags(raw: Vec<Value>) -> Vec<String> {
    raw.into_iter()
        .filter_map(|tag| match tag {
            Value::String(name) => Some(name),
            Value::Array(parts) => parts.into_iter().next().map(|first| match first {
                Value::String(name) => name,
                other => other.to_string(),
            }),
            _ => None,
        })
        .collect()
}

/// Accept an owner given either as an id or as an object carrying `id`
pub fn deserialize_owner_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Number(n) => n.as_i64().unwrap_or_default(),
        Value::Object(map) => map.get("id").and_then(Value::as_i64).unwrap_or_default(),
        _ => 0,
    })
}

/// Treat a JSON `null` list as empty
pub fn deserialize_null_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_nested_tags() {
        let tags = normalize_tags(vec![json!(["backend", null]), json!(["ui", "#ff0000"])]);
        assert_eq!(tags, vec!["backend", "ui"]);
    }

    #[test]
    fn test_normalize_flat_and_mixed_tags() {
        let tags = normalize_tags(vec![json!("api"), json!([]), json!(42), json!(["x"])]);
        assert_eq!(tags, vec!["api", "x"]);
    }

    #[test]
    fn test_user_extra_info_full_name_display() {
        let info: UserExtraInfo = serde_json::from_value(json!({
            "username": "alice",
            "full_name_display": "Alice Liddell",
            "photo": null
        }))
        .unwrap();
        assert_eq!(info.full_name, "Alice Liddell");
        assert_eq!(info.username, "alice");
    }
}
