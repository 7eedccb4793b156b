use std::path::PathBuf;
use std::sync::Arc;

use genmix_core::source::DataSource;

pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(source: Arc<dyn DataSource>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            static_dir: static_dir.into(),
        }
    }
}
