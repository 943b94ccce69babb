//! Content-hash task keys.

use crate::domain::{hash_index, TaskKey, TaskSkeleton};
use crate::ports::ResultIndexer;
use serde_json::json;

/// Keys a task by the hash index of its program, molecule, driver, method
/// and basis. The option-set name is shared by the whole batch and is not
/// part of the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalResultIndexer;

impl ResultIndexer for CanonicalResultIndexer {
    fn task_key(&self, skeleton: &TaskSkeleton) -> TaskKey {
        let content = json!({
            "program": skeleton.program,
            "molecule_id": skeleton.molecule_id.as_str(),
            "driver": skeleton.driver.as_str(),
            "method": skeleton.method,
            "basis": skeleton.basis,
        });
        TaskKey::new(hash_index(&content))
    }
}
