use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of an export block. Field presence and naming are best-effort.
pub type Row = Map<String, Value>;

/// A named batch of rows sharing a metric category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricBlock {
    #[serde(rename = "metricName", alias = "name")]
    pub name: String,
    #[serde(rename = "information", alias = "rows", default)]
    pub rows: Vec<Row>,
}

impl MetricBlock {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Field names observed in the first row of a block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSchema {
    pub block_name: String,
    pub sample_field_names: Vec<String>,
}

impl BlockSchema {
    pub fn from_block(block: &MetricBlock) -> Self {
        Self {
            block_name: block.name.clone(),
            sample_field_names: block
                .rows
                .first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_upstream_shape() {
        let payload = json!([
            {
                "metricName": "Traffic",
                "information": [
                    {"URL": "https://x.com/p", "totalSessionCount": "10"}
                ]
            },
            {"metricName": "ScrollDepth"}
        ]);

        let blocks: Vec<MetricBlock> = serde_json::from_value(payload).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "Traffic");
        assert_eq!(blocks[0].rows.len(), 1);
        assert!(blocks[1].rows.is_empty());
    }

    #[test]
    fn test_schema_uses_first_row_only() {
        let block: MetricBlock = serde_json::from_value(json!({
            "name": "Traffic",
            "rows": [
                {"URL": "a", "distinctUserCount": 1},
                {"URL": "b", "extra": true}
            ]
        }))
        .unwrap();

        let schema = BlockSchema::from_block(&block);
        assert_eq!(schema.block_name, "Traffic");
        assert_eq!(schema.sample_field_names, vec!["URL", "distinctUserCount"]);

        let empty = BlockSchema::from_block(&MetricBlock::new("Empty", vec![]));
        assert!(empty.sample_field_names.is_empty());
    }
}
