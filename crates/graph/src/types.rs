use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Subscriber count as scraped; placeholders like "N/A" become `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriberCount {
    Count(u64),
    #[default]
    Unknown,
}

impl SubscriberCount {
    /// Parse "12345", "1,234,567" or a placeholder
    pub fn parse(raw: &str) -> Self {
        let digits: String = raw
            .trim()
            .chars()
            .filter(|c| *c != ',' && *c != '_')
            .collect();
        digits
            .parse::<u64>()
            .map(Self::Count)
            .unwrap_or(Self::Unknown)
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Unknown => None,
        }
    }
}

impl Serialize for SubscriberCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(n) => serializer.serialize_u64(*n),
            Self::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubscribers {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for SubscriberCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawSubscribers>::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawSubscribers::Integer(n)) => Self::Count(n),
            Some(RawSubscribers::Float(f)) if f.is_finite() && f >= 0.0 => Self::Count(f as u64),
            Some(RawSubscribers::Text(s)) => Self::parse(&s),
            _ => Self::Unknown,
        })
    }
}

/// One creator, as loaded. Immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique within one run
    pub id: String,

    /// Display name
    pub title: String,

    /// Biography / channel description
    #[serde(default, alias = "text")]
    pub description: String,

    /// Pre-enriched embedding text (title, description, recent video titles)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<String>,

    /// Avatar URL
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Channel URL
    #[serde(default, alias = "youtube_url")]
    pub external_link: Option<String>,

    /// Subscriber count
    #[serde(default, alias = "subscriber_count")]
    pub subscribers: SubscriberCount,
}

impl Record {
    /// Hover text: "Name (123 subs)" or just the name
    pub fn tooltip(&self) -> String {
        match self.subscribers {
            SubscriberCount::Count(n) => format!("{} ({} subs)", self.title, n),
            SubscriberCount::Unknown => self.title.clone(),
        }
    }
}

/// Undirected similarity edge between two record ids, stored with
/// `source_id < target_id`
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityEdge {
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
}

impl SimilarityEdge {
    /// Create an edge, ordering the endpoints canonically
    pub fn new(a: impl Into<String>, b: impl Into<String>, weight: f64) -> Self {
        let (a, b) = (a.into(), b.into());
        let (source_id, target_id) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source_id,
            target_id,
            weight,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// Node of the exported graph JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub image: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    pub subscribers: SubscriberCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
    /// Tooltip
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub shape: String,
}

/// Edge of the exported graph JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
    /// Weight with two decimals, shown on the link
    #[serde(default)]
    pub label: String,
}

/// `{"nodes": [...], "edges": [...]}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_parse() {
        assert_eq!(SubscriberCount::parse("12345"), SubscriberCount::Count(12345));
        assert_eq!(
            SubscriberCount::parse(" 1,234,567 "),
            SubscriberCount::Count(1_234_567)
        );
        assert_eq!(SubscriberCount::parse("N/A"), SubscriberCount::Unknown);
        assert_eq!(SubscriberCount::parse(""), SubscriberCount::Unknown);
    }

    #[test]
    fn test_subscriber_json() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default)]
            subscribers: SubscriberCount,
        }

        let parse = |s: &str| serde_json::from_str::<Wrapper>(s).unwrap().subscribers;
        assert_eq!(parse(r#"{"subscribers": 42}"#), SubscriberCount::Count(42));
        assert_eq!(parse(r#"{"subscribers": "111000000"}"#), SubscriberCount::Count(111_000_000));
        assert_eq!(parse(r#"{"subscribers": "N/A"}"#), SubscriberCount::Unknown);
        assert_eq!(parse(r#"{"subscribers": null}"#), SubscriberCount::Unknown);
        assert_eq!(parse(r#"{}"#), SubscriberCount::Unknown);

        assert_eq!(serde_json::to_string(&SubscriberCount::Count(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&SubscriberCount::Unknown).unwrap(),
            "\"unknown\""
        );
    }

    #[test]
    fn test_similarity_edge_canonical_order() {
        let edge = SimilarityEdge::new("b", "a", 0.5);
        assert_eq!(edge.source_id, "a");
        assert_eq!(edge.target_id, "b");
        assert!(!edge.is_self_loop());
        assert!(SimilarityEdge::new("a", "a", 1.0).is_self_loop());
    }

    #[test]
    fn test_tooltip() {
        let mut record = Record {
            id: "UC1".to_string(),
            title: "Ludwig".to_string(),
            description: String::new(),
            rich_text: None,
            thumbnail: None,
            external_link: None,
            subscribers: SubscriberCount::Count(100),
        };
        assert_eq!(record.tooltip(), "Ludwig (100 subs)");
        record.subscribers = SubscriberCount::Unknown;
        assert_eq!(record.tooltip(), "Ludwig");
    }
}
