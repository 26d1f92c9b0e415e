//! Concurrency-capped manager for durable, cancellable long-running operations.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use mcp_protocol::{Task, TaskError, TaskState, TaskType};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::errors::TasksError;
use super::persistence::TaskPersistence;

/// Work a task wraps. Consumed once, on the executor's background task.
pub type TaskExecutor = Box<dyn FnOnce() -> BoxFuture<'static, Result<Value, TaskError>> + Send>;

#[derive(Debug, Clone, Copy)]
pub struct TaskManagerConfig {
    pub max_concurrent: usize,
    pub default_timeout: Duration,
    pub completed_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 50,
            default_timeout: Duration::from_secs(300),
            completed_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Owns the in-memory task table and the background executors driving each
/// active task, with an optional durable backing store.
pub struct TaskManager {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
    handles: Mutex<HashMap<Uuid, JoinHandle<()>>>,
    config: TaskManagerConfig,
    persistence: Option<Arc<TaskPersistence>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl TaskManager {
    #[must_use]
    pub fn new(config: TaskManagerConfig, persistence: Option<Arc<TaskPersistence>>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            handles: Mutex::new(HashMap::new()),
            config,
            persistence,
            sweeper: Mutex::new(None),
        }
    }

    /// Re-register non-terminal tasks from durable storage without
    /// re-spawning their executors (see the restart-recovery decision).
    ///
    /// # Errors
    /// Propagates a persistence read failure.
    pub async fn restore(&self) -> Result<usize, std::io::Error> {
        let Some(persistence) = &self.persistence else {
            return Ok(0);
        };
        let restored = persistence.load_all().await?;
        let mut tasks = self.tasks.write();
        let count = restored
            .into_iter()
            .filter(|t| t.state.is_active())
            .map(|t| {
                tasks.insert(t.id, t);
            })
            .count();
        Ok(count)
    }

    /// Create a task and spawn its executor.
    ///
    /// # Errors
    /// [`TasksError::TooManyTasks`] if `max_concurrent` active tasks are
    /// already running.
    pub async fn create_task(
        &self,
        task_type: TaskType,
        metadata: Map<String, Value>,
        timeout: Option<Duration>,
        executor: TaskExecutor,
    ) -> Result<Task, TasksError> {
        let task = Task::new(task_type, metadata);
        let id = task.id;
        {
            // Check-then-insert under one write-lock acquisition: two
            // concurrent callers racing past a separate read-then-write
            // pair could otherwise both slip in under the cap.
            let mut tasks = self.tasks.write();
            let active = tasks.values().filter(|t| t.state.is_active()).count();
            if active >= self.config.max_concurrent {
                return Err(TasksError::TooManyTasks {
                    limit: self.config.max_concurrent,
                });
            }
            tasks.insert(id, task.clone());
        }
        self.persist(id).await;

        let tasks = self.tasks.clone();
        let persistence = self.persistence.clone();
        let deadline = timeout.unwrap_or(self.config.default_timeout);

        let handle = tokio::spawn(async move {
            {
                let mut guard = tasks.write();
                if let Some(t) = guard.get_mut(&id) {
                    let _ = t.transition(TaskState::Running);
                }
            }
            Self::persist_static(&tasks, &persistence, id).await;

            let outcome = tokio::time::timeout(deadline, executor()).await;

            let mut guard = tasks.write();
            if let Some(t) = guard.get_mut(&id) {
                match outcome {
                    Ok(Ok(result)) => {
                        t.result = Some(result);
                        let _ = t.transition(TaskState::Completed);
                    }
                    Ok(Err(error)) => {
                        t.error = Some(error);
                        let _ = t.transition(TaskState::Failed);
                    }
                    Err(_elapsed) => {
                        t.error = Some(TaskError {
                            code: mcp_protocol::ErrorCode::RequestTimeout.code(),
                            message: "task execution timed out".into(),
                            data: None,
                        });
                        let _ = t.transition(TaskState::Failed);
                    }
                }
            }
            drop(guard);
            Self::persist_static(&tasks, &persistence, id).await;
        });

        self.handles.lock().await.insert(id, handle);
        Ok(task)
    }

    async fn persist(&self, id: Uuid) {
        Self::persist_static(&self.tasks, &self.persistence, id).await;
    }

    async fn persist_static(
        tasks: &RwLock<HashMap<Uuid, Task>>,
        persistence: &Option<Arc<TaskPersistence>>,
        id: Uuid,
    ) {
        let Some(persistence) = persistence else {
            return;
        };
        let snapshot = tasks.read().get(&id).cloned();
        if let Some(task) = snapshot {
            if let Err(err) = persistence.save(&task).await {
                tracing::warn!(task_id = %id, error = %err, "failed to persist task state");
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().get(&id).cloned()
    }

    #[must_use]
    pub fn list(&self, state: Option<TaskState>, task_type: Option<TaskType>) -> Vec<Task> {
        self.tasks
            .read()
            .values()
            .filter(|t| state.map_or(true, |s| t.state == s))
            .filter(|t| task_type.map_or(true, |ty| t.task_type == ty))
            .cloned()
            .collect()
    }

    /// Cancel an active task: abort its executor handle and transition it
    /// to `CANCELLED`, recording `reason` in metadata.
    ///
    /// # Errors
    /// [`TasksError::TaskNotFound`] / [`TasksError::TaskNotCancellable`].
    pub async fn cancel_task(&self, id: Uuid, reason: Option<String>) -> Result<Task, TasksError> {
        let state = {
            let tasks = self.tasks.read();
            tasks.get(&id).map(|t| t.state)
        };
        let Some(state) = state else {
            return Err(TasksError::TaskNotFound(id));
        };
        if !state.is_active() {
            return Err(TasksError::TaskNotCancellable { id, state });
        }

        if let Some(handle) = self.handles.lock().await.remove(&id) {
            handle.abort();
        }

        let updated = {
            let mut tasks = self.tasks.write();
            let task = tasks.get_mut(&id).expect("checked above");
            if let Some(reason) = reason {
                task.metadata.insert("cancelReason".into(), Value::String(reason));
            }
            let _ = task.transition(TaskState::Cancelled);
            task.clone()
        };
        self.persist(id).await;
        Ok(updated)
    }

    pub async fn update_progress(&self, id: Uuid, current: f64, total: Option<f64>, message: Option<String>) {
        {
            let mut tasks = self.tasks.write();
            if let Some(task) = tasks.get_mut(&id) {
                task.update_progress(current, total, message);
            }
        }
        self.persist(id).await;
    }

    /// Remove terminal tasks older than `completed_ttl`, both from the
    /// in-memory table and (if configured) from durable storage. Intended to
    /// be driven by a periodic sweeper (see [`TaskManager::spawn_sweeper`]).
    pub async fn sweep(&self) -> usize {
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(self.config.completed_ttl).unwrap_or_default();
        let evicted: Vec<Uuid> = {
            let mut tasks = self.tasks.write();
            let evicted: Vec<Uuid> = tasks
                .iter()
                .filter(|(_, t)| match t.completed_at {
                    Some(completed_at) => completed_at <= cutoff,
                    None => false,
                })
                .map(|(id, _)| *id)
                .collect();
            for id in &evicted {
                tasks.remove(id);
            }
            evicted
        };

        if let Some(persistence) = &self.persistence {
            for id in &evicted {
                if let Err(err) = persistence.remove(*id).await {
                    tracing::warn!(task_id = %id, error = %err, "failed to remove persisted task file");
                }
            }
        }

        evicted.len()
    }

    /// Spawn a background sweeper running every `sweep_interval`.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let manager = self.clone();
        let interval = self.config.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = manager.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept terminal tasks past completed_ttl");
                }
            }
        });
        if let Ok(mut guard) = self.sweeper.try_lock() {
            *guard = Some(handle);
        }
    }
}
