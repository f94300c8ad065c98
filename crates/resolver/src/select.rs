use std::sync::LazyLock;

use boxbridge_core::FileNode;
use regex::Regex;
use serde::{Deserialize, Serialize};

// SxxExx pattern: S01E02, s1e3, etc.
static RE_SXXEXX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bS(\d{1,2})[ ._-]?E(\d{1,3})").unwrap());

// 1x02 pattern
static RE_XEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").unwrap());

// "Season X Episode Y" pattern
static RE_SEASON_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Season\s*(\d+)\s*Episode\s*(\d+)").unwrap());

// Season folders: "Season 1", "season_02", "S03"
static RE_SEASON_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:season[\s._-]*(\d{1,3})|s(\d{1,3}))\b").unwrap());

/// How to pick one node out of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum NodeSelector {
    /// Position in upstream order.
    Index { index: usize },
    First,
    FirstFile,
    FirstDir,
    /// Case-insensitive match on the file name; exact beats substring.
    Name { name: String },
    /// The folder for one season.
    Season { season: u32 },
    /// A file for this episode, or failing that, the folder of its season.
    Episode { season: u32, episode: u32 },
}

impl NodeSelector {
    pub fn select<'a>(&self, nodes: &'a [FileNode]) -> Option<&'a FileNode> {
        match self {
            Self::Index { index } => nodes.get(*index),
            Self::First => nodes.first(),
            Self::FirstFile => nodes.iter().find(|n| !n.is_dir),
            Self::FirstDir => nodes.iter().find(|n| n.is_dir),
            Self::Name { name } => {
                let needle = name.to_lowercase();
                nodes
                    .iter()
                    .find(|n| n.file_name.to_lowercase() == needle)
                    .or_else(|| {
                        nodes
                            .iter()
                            .find(|n| n.file_name.to_lowercase().contains(&needle))
                    })
            }
            Self::Season { season } => find_season_dir(nodes, *season),
            Self::Episode { season, episode } => nodes
                .iter()
                .find(|n| !n.is_dir && parse_episode(&n.file_name) == Some((*season, *episode)))
                .or_else(|| find_season_dir(nodes, *season)),
        }
    }
}

fn find_season_dir(nodes: &[FileNode], season: u32) -> Option<&FileNode> {
    nodes
        .iter()
        .find(|n| n.is_dir && parse_season_dir(&n.file_name) == Some(season))
}

/// Season and episode numbers from a file name, if it follows a known pattern.
pub fn parse_episode(name: &str) -> Option<(u32, u32)> {
    [&*RE_SXXEXX, &*RE_XEP, &*RE_SEASON_EPISODE]
        .into_iter()
        .find_map(|re| {
            let caps = re.captures(name)?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
}

/// Season number from a folder name like `Season 2` or `S02`.
pub fn parse_season_dir(name: &str) -> Option<u32> {
    let caps = RE_SEASON_DIR.captures(name.trim())?;
    caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()
}
