use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::model::Classroom;
use crate::store::DataStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything a request can touch. Owned by whichever loop drives requests
/// (stdin or HTTP) and handed to handlers by reference.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<DataStore>,
    pub classroom: Classroom,
    pub rng: StdRng,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic shuffles and picks, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            workspace: None,
            store: None,
            classroom: Classroom::default(),
            rng,
        }
    }

    /// Opens `<workspace>/database.json` and loads the classroom from it.
    pub fn open_workspace(&mut self, workspace: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(workspace)?;
        let store = DataStore::in_workspace(workspace)?;
        self.attach(store)?;
        self.workspace = Some(workspace.to_path_buf());
        Ok(())
    }

    /// Uses an explicit data file instead of a workspace directory.
    pub fn open_data_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let store = DataStore::open(path)?;
        self.attach(store)?;
        self.workspace = path.parent().map(Path::to_path_buf);
        Ok(())
    }

    fn attach(&mut self, store: DataStore) -> anyhow::Result<()> {
        self.classroom = store.load_classroom()?;
        self.store = Some(store);
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
