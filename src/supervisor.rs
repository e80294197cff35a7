use anyhow::Result;
use std::future::Future;
use tokio::task::JoinSet;

use crate::logging::{log, obj, v_str, Domain, Level};

/// How a supervised task ended.
#[derive(Debug)]
pub struct TaskExit {
    pub name: &'static str,
    pub outcome: Result<()>,
}

/// Named long-running tasks whose exits are observed, never dropped.
#[derive(Default)]
pub struct Supervisor {
    tasks: JoinSet<(&'static str, Result<()>)>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        log(
            Level::Debug,
            Domain::System,
            "task_started",
            obj(&[("task", v_str(name))]),
        );
        self.tasks.spawn(async move { (name, task.await) });
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next task to end and log how it ended.
    ///
    /// Returns `None` once no tasks are left.
    pub async fn next_exit(&mut self) -> Option<TaskExit> {
        let joined = self.tasks.join_next().await?;
        let exit = match joined {
            Ok((name, outcome)) => TaskExit { name, outcome },
            Err(err) => TaskExit {
                name: "unknown",
                outcome: Err(anyhow::anyhow!("task panicked or was cancelled: {}", err)),
            },
        };
        match &exit.outcome {
            Ok(()) => log(
                Level::Info,
                Domain::System,
                "task_finished",
                obj(&[("task", v_str(exit.name))]),
            ),
            Err(err) => log(
                Level::Error,
                Domain::System,
                "task_failed",
                obj(&[("task", v_str(exit.name)), ("error", v_str(&format!("{:#}", err)))]),
            ),
        }
        Some(exit)
    }

    /// Abort everything still running and wait for it to unwind.
    pub async fn shutdown(&mut self) {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
    }
}
