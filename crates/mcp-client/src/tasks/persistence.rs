//! Durable, crash-safe task storage: one JSON file per task, atomically
//! replaced on every write.

use std::path::{Path, PathBuf};

use mcp_protocol::Task;
use tokio::fs;
use uuid::Uuid;

/// Writes task snapshots to `<directory>/<task-id>.json` using a
/// temp-file-then-rename so a reader never observes a torn write.
pub struct TaskPersistence {
    directory: PathBuf,
}

impl TaskPersistence {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.directory.join(format!("{id}.json"))
    }

    /// # Errors
    /// Propagates filesystem failures creating the directory, writing the
    /// temp file, or renaming it into place.
    pub async fn save(&self, task: &Task) -> std::io::Result<()> {
        fs::create_dir_all(&self.directory).await?;
        let final_path = self.path_for(task.id);
        let temp_path = self.directory.join(format!(".{}.json.tmp", task.id));

        let body = serde_json::to_vec_pretty(task)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&temp_path, body).await?;
        fs::rename(&temp_path, &final_path).await?;
        Ok(())
    }

    /// # Errors
    /// Propagates filesystem failures listing or reading the directory.
    /// Individual files that fail to parse are skipped with a warning
    /// rather than aborting the whole restore.
    pub async fn load_all(&self) -> std::io::Result<Vec<Task>> {
        if !Path::new(&self.directory).exists() {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(&self.directory).await?;
        let mut tasks = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = fs::read(&path).await?;
            match serde_json::from_slice::<Task>(&bytes) {
                Ok(task) => tasks.push(task),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable task file");
                }
            }
        }
        Ok(tasks)
    }

    pub async fn remove(&self, id: Uuid) -> std::io::Result<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
