use crate::context::SessionId;
use crate::operation::{Operation, Stage};
use crate::pipeline::CreatedResources;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { session_id: SessionId },
    StageStarted { stage: Stage },
    /// `id` is the identifier the stage produced.
    StageCompleted { stage: Stage, id: String },
    StageFailed {
        stage: Stage,
        operation: Option<Operation>,
        /// HTTP status of the failed call, when the platform answered.
        status: Option<u16>,
        error: String,
        /// Resources created before the failure; they are not rolled back.
        created: CreatedResources,
    },
    Finished { deployment_id: String },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}

#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { session_id } => println!("[deploy:{session_id}] started"),
            ProgressEvent::StageStarted { stage } => println!("[deploy] {stage} ..."),
            ProgressEvent::StageCompleted { stage, id } => println!("[deploy] {stage} -> {id}"),
            ProgressEvent::StageFailed { stage, operation, status, error, created } => {
                match (operation, status) {
                    (Some(op), Some(status)) => {
                        println!("[deploy] {stage} failed in {op} (HTTP {status}): {error}");
                    }
                    (Some(op), None) => println!("[deploy] {stage} failed in {op}: {error}"),
                    (None, _) => println!("[deploy] {stage} failed: {error}"),
                }
                for (kind, id) in created.entries() {
                    println!("[deploy]   left in place: {kind} {id}");
                }
            }
            ProgressEvent::Finished { deployment_id } => {
                println!("[deploy] finished, deployment {deployment_id}");
            }
        }
    }
}
