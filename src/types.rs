use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BasketInfo {
    #[serde(default)]
    pub name: String,
    /// The service reports ttl as a number; older responses used a string.
    #[serde(default, deserialize_with = "ttl_from_json")]
    pub ttl: String,
}

impl BasketInfo {
    fn from_value_lenient(v: &Value) -> Self {
        match v {
            Value::Object(obj) => Self {
                name: field(obj, "name"),
                ttl: obj.get("ttl").and_then(ttl_text).unwrap_or_default(),
            },
            _ => Self::default(),
        }
    }
}

fn ttl_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn ttl_from_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let v = Value::deserialize(deserializer)?;
    ttl_text(&v).ok_or_else(|| serde::de::Error::custom(format!("invalid ttl: {}", v)))
}

/// Decodes `obj[key]`, leaving the zero value when the key is missing or has
/// the wrong type.
fn field<T: DeserializeOwned + Default>(obj: &Map<String, Value>, key: &str) -> T {
    obj.get(key)
        .and_then(|v| T::deserialize(v).ok())
        .unwrap_or_default()
}

/// Pantry metadata as returned by the service. Missing fields decode to
/// their zero values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PantryInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub notifications: bool,
    #[serde(default)]
    pub percent_full: u8,
    #[serde(default)]
    pub baskets: Vec<BasketInfo>,
}

impl PantryInfo {
    /// Best-effort decode: every field that decodes is kept, every field that
    /// does not stays at its zero value. A body that is not a JSON object
    /// yields `PantryInfo::default()`.
    pub fn from_json_lenient(body: &[u8]) -> Self {
        let obj = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(obj)) => obj,
            _ => return Self::default(),
        };
        Self {
            name: field(&obj, "name"),
            description: field(&obj, "description"),
            errors: field(&obj, "errors"),
            notifications: field(&obj, "notifications"),
            percent_full: field(&obj, "percentFull"),
            baskets: obj
                .get("baskets")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(BasketInfo::from_value_lenient).collect())
                .unwrap_or_default(),
        }
    }

    pub fn basket_names(&self) -> impl Iterator<Item = &str> {
        self.baskets.iter().map(|b| b.name.as_str())
    }

    pub fn has_basket(&self, name: &str) -> bool {
        self.basket_names().any(|n| n == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatedInfo {
    pub name: String,
    pub description: String,
}
