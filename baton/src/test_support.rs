//! Test helpers: workspace scaffolding and recording capability fakes.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;

use crate::errors::CapabilityError;
use crate::io::checkpoint::Checkpoint;
use crate::io::init::{BatonPaths, InitOptions, init_baton};
use crate::io::spawner::{SpawnRequest, WorkerSpawner};

/// Scaffold a `.baton/` workspace under `root` and return its paths.
pub fn init_workspace(root: &Path) -> BatonPaths {
    init_baton(root, &InitOptions::default()).expect("init baton workspace")
}

/// Write a task document with the given test command and criteria.
pub fn write_task_doc(paths: &BatonPaths, test_command: Option<&str>, criteria: &[(&str, bool)]) {
    let mut doc = String::from("---\n");
    if let Some(command) = test_command {
        doc.push_str(&format!("test-command: {command}\n"));
    }
    doc.push_str("---\n\n# Task\n\n");
    for (text, checked) in criteria {
        let mark = if *checked { 'x' } else { ' ' };
        doc.push_str(&format!("- [{mark}] {text}\n"));
    }
    fs::write(&paths.task_path, doc).expect("write task doc");
}

/// Checkpoint fake that counts invocations and can be told to fail.
#[derive(Default)]
pub struct RecordingCheckpoint {
    pub persisted: Cell<u32>,
    pub fail: bool,
}

impl RecordingCheckpoint {
    pub fn failing() -> Self {
        Self {
            persisted: Cell::new(0),
            fail: true,
        }
    }
}

impl Checkpoint for RecordingCheckpoint {
    fn persist(&self, _message: &str) -> Result<bool, CapabilityError> {
        if self.fail {
            return Err(CapabilityError::new("persist", "scripted failure"));
        }
        self.persisted.set(self.persisted.get() + 1);
        Ok(true)
    }
}

/// Spawner fake that records the last request and can be told to fail.
#[derive(Default)]
pub struct RecordingSpawner {
    pub spawned: Cell<u32>,
    pub last_token: RefCell<Option<String>>,
    pub last_iteration: Cell<u32>,
    pub fail: bool,
}

impl RecordingSpawner {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl WorkerSpawner for RecordingSpawner {
    fn spawn(&self, request: &SpawnRequest) -> Result<(), CapabilityError> {
        if self.fail {
            return Err(CapabilityError::new("spawn", "scripted failure"));
        }
        self.spawned.set(self.spawned.get() + 1);
        *self.last_token.borrow_mut() = Some(request.token.clone());
        self.last_iteration.set(request.next_iteration);
        Ok(())
    }
}
