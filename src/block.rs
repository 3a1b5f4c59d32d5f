use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A note block as the host hands it over.
///
/// Every field is decoded leniently: a missing or wrongly typed value falls
/// back to its default instead of failing the whole mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Block {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(deserialize_with = "lenient_ids")]
    pub children: Vec<String>,
    #[serde(deserialize_with = "lenient_optional_id")]
    pub parent: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
}

impl Block {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.text().trim().is_empty()
    }
}

/// Snapshot of the host's block mapping, keyed by identifier.
///
/// Iteration follows the order the entries were supplied in. Entries whose
/// value is `null` or not an object are dropped while decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockMap {
    blocks: IndexMap<String, Block>,
}

impl BlockMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn insert(&mut self, block: Block) {
        self.blocks.insert(block.id.clone(), block);
    }

    pub fn insert_with_key(&mut self, key: impl Into<String>, block: Block) {
        self.blocks.insert(key.into(), block);
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn entry(&self, id: &str) -> Option<(&str, &Block)> {
        self.blocks
            .get_key_value(id)
            .map(|(key, block)| (key.as_str(), block))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Block)> {
        self.blocks.iter().map(|(key, block)| (key.as_str(), block))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl FromIterator<Block> for BlockMap {
    fn from_iter<T: IntoIterator<Item = Block>>(iter: T) -> Self {
        let mut map = Self::new();
        for block in iter {
            map.insert(block);
        }
        map
    }
}

impl<'de> Deserialize<'de> for BlockMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut blocks = IndexMap::with_capacity(raw.len());
        for (key, value) in raw {
            if !value.is_object() {
                continue;
            }
            match serde_json::from_value::<Block>(value) {
                Ok(block) => {
                    blocks.insert(key, block);
                }
                Err(err) => log::debug!("skipping undecodable block {key}: {err}"),
            }
        }
        Ok(Self { blocks })
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                return Some(int.to_string());
            }
            if let Some(int) = n.as_u64() {
                return Some(int.to_string());
            }
            // JS hands every number over as a double.
            n.as_f64().map(|f| {
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    (f as i64).to_string()
                } else {
                    f.to_string()
                }
            })
        }
        _ => None,
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value).unwrap_or_default())
}

fn lenient_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value).filter(|id| !id.is_empty()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.iter().filter_map(id_from_value).collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_numeric_ids_and_children() {
        let map: BlockMap = serde_json::from_value(json!({
            "1": { "id": 1, "text": "root", "children": [2, "3"] },
            "2": { "id": 2, "text": "child", "children": [], "parent": 1 },
        }))
        .unwrap();

        let root = map.get("1").unwrap();
        assert_eq!(root.id, "1");
        assert_eq!(root.children, vec!["2".to_string(), "3".to_string()]);
        assert_eq!(map.get("2").unwrap().parent.as_deref(), Some("1"));
    }

    #[test]
    fn tolerates_wrongly_typed_fields() {
        let map: BlockMap = serde_json::from_value(json!({
            "a": { "id": "a", "text": 123, "children": "nope", "type": null },
        }))
        .unwrap();

        let block = map.get("a").unwrap();
        assert_eq!(block.text, None);
        assert_eq!(block.text(), "");
        assert!(block.children.is_empty());
        assert!(!block.is_valid());
    }

    #[test]
    fn drops_null_and_scalar_entries() {
        let map = BlockMap::from_json(r#"{"a": null, "b": 5, "c": {"id": "c", "text": "ok"}}"#)
            .unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains("c"));
    }

    #[test]
    fn preserves_insertion_order() {
        let map = BlockMap::from_json(
            r#"{"z": {"id": "z", "text": "z"}, "a": {"id": "a", "text": "a"}, "m": {"id": "m", "text": "m"}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn reads_type_tag() {
        let map = BlockMap::from_json(r#"{"t": {"id": "t", "text": "cell", "type": "table2"}}"#)
            .unwrap();
        assert_eq!(map.get("t").unwrap().kind.as_deref(), Some("table2"));
    }
}
