use std::collections::HashSet;

use boxbridge_core::{FileNode, ShareKey, UpstreamError};
use boxbridge_files::ShareSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::select::NodeSelector;

/// Depth-bounded descent through a share, one listing per level.
///
/// Level `d` uses `selectors[d]`; the last selector repeats for deeper levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeWalk {
    /// How many directories may be entered below the root.
    pub max_depth: usize,
    pub selectors: Vec<NodeSelector>,
}

impl Default for TreeWalk {
    fn default() -> Self {
        Self {
            max_depth: 1,
            selectors: vec![NodeSelector::First],
        }
    }
}

impl TreeWalk {
    pub fn new(selector: NodeSelector) -> Self {
        Self {
            selectors: vec![selector],
            ..Default::default()
        }
    }

    /// Selector for the next level down.
    pub fn then(mut self, selector: NodeSelector) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn selector_at(&self, depth: usize) -> &NodeSelector {
        self.selectors
            .get(depth)
            .or(self.selectors.last())
            .unwrap_or(&NodeSelector::First)
    }

    pub async fn run(
        &self,
        source: &dyn ShareSource,
        share_key: &ShareKey,
    ) -> Result<WalkOutcome, UpstreamError> {
        let mut parent = FileNode::ROOT.to_string();
        let mut visited = HashSet::from([parent.clone()]);
        let mut trail = Vec::new();
        let mut depth = 0;

        loop {
            let nodes = source.list_files(share_key, &parent).await?;
            let selector = self.selector_at(depth);
            debug!(share_key = %share_key, parent = %parent, depth, count = nodes.len(), ?selector, "walk level");

            let Some(node) = selector.select(&nodes) else {
                warn!(share_key = %share_key, parent = %parent, depth, "no node matched selector");
                return Ok(WalkOutcome::Stopped(WalkStop::NoMatch { depth }));
            };

            if !node.is_dir {
                return Ok(WalkOutcome::Found {
                    file: node.clone(),
                    trail,
                });
            }

            if depth >= self.max_depth {
                warn!(share_key = %share_key, fid = %node.fid, depth, "directory below depth limit");
                return Ok(WalkOutcome::Stopped(WalkStop::DepthLimit { dir: node.clone() }));
            }

            // Ids come from the server; never list the same folder twice.
            if !visited.insert(node.fid.clone()) {
                warn!(share_key = %share_key, fid = %node.fid, "folder already visited");
                return Ok(WalkOutcome::Stopped(WalkStop::Revisit {
                    fid: node.fid.clone(),
                }));
            }

            parent = node.fid.clone();
            trail.push(node.clone());
            depth += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalkOutcome {
    /// A file was reached; `trail` holds the folders entered on the way.
    Found { file: FileNode, trail: Vec<FileNode> },
    Stopped(WalkStop),
}

/// Why a walk ended without a file. None of these are errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum WalkStop {
    NoMatch { depth: usize },
    DepthLimit { dir: FileNode },
    Revisit { fid: String },
}
