use std::sync::Arc;

use boxbridge_files::ShareSource;
use boxbridge_metadata::MetadataProvider;
use boxbridge_resolver::ResolutionPipeline;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<dyn MetadataProvider>,
    pub files: Arc<dyn ShareSource>,
    pub pipeline: ResolutionPipeline,
}

impl AppState {
    pub fn new(metadata: Arc<dyn MetadataProvider>, files: Arc<dyn ShareSource>) -> Self {
        let pipeline = ResolutionPipeline::new(metadata.clone(), files.clone());
        Self {
            metadata,
            files,
            pipeline,
        }
    }
}
