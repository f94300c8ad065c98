use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Search filter / item kind on the metadata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    All,
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown media kind: {0}")]
pub struct UnknownMediaKind(pub String);

impl std::str::FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "movie" | "movies" => Ok(Self::Movie),
            "tv" | "show" | "series" => Ok(Self::Tv),
            _ => Err(UnknownMediaKind(s.to_string())),
        }
    }
}

/// Provider-specific item tag. Required to resolve a share key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BoxType(pub u32);

impl BoxType {
    pub const MOVIE: Self = Self(1);
    pub const TV: Self = Self(2);

    pub fn kind(self) -> Option<MediaKind> {
        match self {
            Self::MOVIE => Some(MediaKind::Movie),
            Self::TV => Some(MediaKind::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for BoxType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Self)
                .ok_or_else(|| D::Error::custom(format!("box_type out of range: {n}"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| D::Error::custom(format!("box_type is not numeric: {s}"))),
            other => Err(D::Error::custom(format!("unexpected box_type: {other}"))),
        }
    }
}

/// One hit from the metadata service's search.
///
/// Only the fields the pipeline needs are typed; everything else the upstream
/// sends is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub box_type: BoxType,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn kind(&self) -> Option<MediaKind> {
        self.box_type.kind()
    }

    pub fn year(&self) -> Option<i32> {
        match self.extra.get("year")? {
            Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn poster(&self) -> Option<&str> {
        self.extra.get("poster").and_then(Value::as_str)
    }
}

/// Full upstream detail record for a movie or show, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaDetail(pub Value);

/// Opaque folder identifier on the file service.
///
/// Only meaningful together with the metadata item it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareKey(String);

impl ShareKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShareKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShareKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ShareKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One entry of a shared folder listing.
///
/// Directories do not carry their children; list again with the node's
/// `fid` as parent to see them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    #[serde(deserialize_with = "lenient::id")]
    pub fid: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_dir: bool,
    #[serde(
        default,
        deserialize_with = "lenient::opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileNode {
    /// Parent id that lists the top level of a share.
    pub const ROOT: &'static str = "0";
}

/// One playable rendition of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityVariant {
    pub url: String,
    pub quality: String,
    pub name: Option<String>,
    pub speed: Option<String>,
    pub size: Option<String>,
}

/// The upstreams are loose about scalar types: ids arrive as numbers or
/// strings, flags as `0/1` or booleans.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        opt_id(d)?.ok_or_else(|| D::Error::custom("id is null"))
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            other => Err(D::Error::custom(format!("expected string or number id, got {other}"))),
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => matches!(s.trim(), "1" | "true"),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_result_keeps_unknown_fields() {
        let r: SearchResult = serde_json::from_value(json!({
            "id": 9345,
            "title": "Ratatouille",
            "box_type": 1,
            "year": 2007,
            "poster": "https://img.example/rat.jpg",
            "imdb_rating": "8.1"
        }))
        .unwrap();

        assert_eq!(r.id, "9345");
        assert_eq!(r.kind(), Some(MediaKind::Movie));
        assert_eq!(r.year(), Some(2007));
        assert_eq!(r.poster(), Some("https://img.example/rat.jpg"));
        assert_eq!(r.extra["imdb_rating"], "8.1");

        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["imdb_rating"], "8.1");
        assert_eq!(back["box_type"], 1);
    }

    #[test]
    fn box_type_accepts_numeric_strings() {
        let r: SearchResult =
            serde_json::from_value(json!({"id": "77", "title": "Breaking Bad", "box_type": "2"}))
                .unwrap();
        assert_eq!(r.box_type, BoxType::TV);
        assert_eq!(r.kind(), Some(MediaKind::Tv));
    }

    #[test]
    fn file_node_flags_and_ids() {
        let dir: FileNode = serde_json::from_value(json!({
            "fid": 1001,
            "file_name": "Season 1",
            "is_dir": 1,
            "parent_id": 0,
            "file_size": "0 B"
        }))
        .unwrap();
        assert_eq!(dir.fid, "1001");
        assert!(dir.is_dir);
        assert_eq!(dir.parent_id.as_deref(), Some("0"));
        assert_eq!(dir.extra["file_size"], "0 B");

        let file: FileNode =
            serde_json::from_value(json!({"fid": "2002", "file_name": "a.mkv", "is_dir": false}))
                .unwrap();
        assert!(!file.is_dir);
        assert_eq!(file.parent_id, None);
    }

    #[test]
    fn media_kind_parses_aliases() {
        assert_eq!("movie".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert_eq!("TV".parse::<MediaKind>().unwrap(), MediaKind::Tv);
        assert_eq!("all".parse::<MediaKind>().unwrap(), MediaKind::All);
        assert!("cartoon".parse::<MediaKind>().is_err());
    }

    #[test]
    fn quality_variant_serializes_absent_fields_as_null() {
        let v = QualityVariant {
            url: "https://cdn.example/v.mp4".into(),
            quality: "1080P".into(),
            name: Some("movie.mp4".into()),
            speed: None,
            size: Some("2.1 GB".into()),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert!(json["speed"].is_null());
        assert_eq!(json["size"], "2.1 GB");
    }
}
