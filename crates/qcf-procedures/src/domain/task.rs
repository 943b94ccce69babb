//! # Task Records
//!
//! Transient in-batch entities that exist between packing and unpacking.
//!
//! ```text
//! SingleRunMeta + ObjectId ──→ TaskSkeleton ──(store)──→ QcSchemaInput
//!                                                             │
//!                                                     [execution layer]
//!                                                             ↓
//!                          CompactResult ←──(store)── QcSchemaResult
//! ```

use qcf_types::{Driver, Molecule, ObjectId, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Schema name stamped on every packed task.
pub const SCHEMA_NAME: &str = "qc_schema_input";

/// Schema version stamped on every packed task.
pub const SCHEMA_VERSION: u32 = 1;

/// Reason recorded when a molecule reference cannot be resolved.
pub const MOLECULE_NOT_FOUND: &str = "Molecule not found";

// =============================================================================
// BATCH DESCRIPTION
// =============================================================================

/// Compact description shared by every task of a single-run batch.
///
/// Fields outside this set (for example `procedure`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleRunMeta {
    pub program: String,
    pub driver: Driver,
    pub method: String,
    #[serde(default)]
    pub basis: Option<String>,
    /// Name of the option set, resolved against `program`.
    pub options: String,
}

impl SingleRunMeta {
    const ENTITY: &'static str = "SingleRunMeta";
    const REQUIRED: &'static [&'static str] = &["program", "driver", "method", "options"];

    /// Parse a batch description, failing on any missing required field.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let Value::Object(map) = value else {
            return Err(ValidationError::WrongType {
                field: Self::ENTITY.to_string(),
                expected: "a mapping",
            });
        };

        if let Some(missing) = Self::REQUIRED.iter().find(|f| !map.contains_key(**f)) {
            return Err(ValidationError::MissingField {
                entity: Self::ENTITY,
                field: missing.to_string(),
            });
        }

        let driver = match map.get("driver") {
            Some(Value::String(s)) => s.parse::<Driver>()?,
            _ => {
                return Err(ValidationError::WrongType {
                    field: "driver".to_string(),
                    expected: "a string",
                })
            }
        };

        Ok(Self {
            program: required_string(map, "program")?,
            driver,
            method: required_string(map, "method")?,
            basis: match map.get("basis") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => {
                    return Err(ValidationError::WrongType {
                        field: "basis".to_string(),
                        expected: "a string or null",
                    })
                }
            },
            options: required_string(map, "options")?,
        })
    }
}

fn required_string(map: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    map.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ValidationError::WrongType {
            field: field.to_string(),
            expected: "a string",
        })
}

// =============================================================================
// TASK IDENTITY
// =============================================================================

/// Deterministic name of a task within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provisional task: shared spec fields plus one unresolved molecule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSkeleton {
    pub program: String,
    pub driver: Driver,
    pub method: String,
    pub basis: Option<String>,
    pub options: String,
    pub molecule_id: ObjectId,
}

impl TaskSkeleton {
    pub fn new(meta: &SingleRunMeta, molecule_id: ObjectId) -> Self {
        Self {
            program: meta.program.clone(),
            driver: meta.driver,
            method: meta.method.clone(),
            basis: meta.basis.clone(),
            options: meta.options.clone(),
            molecule_id,
        }
    }
}

/// A task whose molecule could not be packed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    pub task_key: TaskKey,
    pub reason: String,
}

// =============================================================================
// EXCHANGE SCHEMA
// =============================================================================

/// Method and basis of a computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub method: String,
    #[serde(default)]
    pub basis: Option<String>,
}

/// Back-references the execution layer carries through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QcfTags {
    pub program: String,
    pub options: String,
}

/// A fully resolved task as handed to the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcSchemaInput {
    pub schema_name: String,
    pub schema_version: u32,
    pub driver: Driver,
    pub model: Model,
    pub keywords: Map<String, Value>,
    pub molecule: Molecule,
    pub qcfractal_tags: QcfTags,
}

impl QcSchemaInput {
    /// Fold a resolved skeleton into the exchange envelope.
    pub fn assemble(skeleton: TaskSkeleton, molecule: Molecule, keywords: Map<String, Value>) -> Self {
        Self {
            schema_name: SCHEMA_NAME.to_string(),
            schema_version: SCHEMA_VERSION,
            driver: skeleton.driver,
            model: Model {
                method: skeleton.method,
                basis: skeleton.basis,
            },
            keywords,
            molecule,
            qcfractal_tags: QcfTags {
                program: skeleton.program,
                options: skeleton.options,
            },
        }
    }
}

/// A completed task as returned by the execution layer.
///
/// Result payload fields (`return_result`, `properties`, `provenance`, ...)
/// are not interpreted and travel in `extras`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcSchemaResult {
    #[serde(default = "default_schema_name")]
    pub schema_name: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub driver: Driver,
    pub model: Model,
    #[serde(default)]
    pub keywords: Map<String, Value>,
    pub molecule: Molecule,
    pub qcfractal_tags: QcfTags,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

fn default_schema_name() -> String {
    SCHEMA_NAME.to_string()
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl QcSchemaResult {
    /// Restore the compact shape: flatten the model, swap the options
    /// payload for its name and the molecule for its id, drop the envelope.
    pub fn into_compact(self, molecule_id: ObjectId) -> CompactResult {
        CompactResult {
            driver: self.driver,
            method: self.model.method,
            basis: self.model.basis,
            program: self.qcfractal_tags.program,
            options: self.qcfractal_tags.options,
            molecule_id,
            extras: self.extras,
        }
    }
}

/// A completed task in the caller's compact shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactResult {
    pub driver: Driver,
    pub method: String,
    pub basis: Option<String>,
    pub program: String,
    pub options: String,
    pub molecule_id: ObjectId,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// Output of packing a batch.
///
/// Callers must consult both maps: a batch only fails as a whole when
/// packing returns an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackedBatch {
    pub tasks: std::collections::BTreeMap<TaskKey, QcSchemaInput>,
    pub errors: Vec<TaskError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta_json() -> Value {
        json!({
            "procedure": "single",
            "driver": "energy",
            "method": "HF",
            "basis": "sto-3g",
            "options": "default",
            "program": "psi4"
        })
    }

    #[test]
    fn test_meta_ignores_extra_fields() {
        let meta = SingleRunMeta::from_json(&meta_json()).unwrap();
        assert_eq!(meta.method, "HF");
        assert_eq!(meta.basis.as_deref(), Some("sto-3g"));
        assert_eq!(meta.driver, Driver::Energy);
    }

    #[test]
    fn test_meta_missing_field_fails() {
        let mut value = meta_json();
        value.as_object_mut().unwrap().remove("options");
        let err = SingleRunMeta::from_json(&value).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { ref field, .. } if field == "options"));
    }

    #[test]
    fn test_meta_basis_may_be_null_or_absent() {
        let mut value = meta_json();
        value["basis"] = Value::Null;
        assert_eq!(SingleRunMeta::from_json(&value).unwrap().basis, None);

        value.as_object_mut().unwrap().remove("basis");
        assert_eq!(SingleRunMeta::from_json(&value).unwrap().basis, None);
    }

    #[test]
    fn test_meta_rejects_bad_driver() {
        let mut value = meta_json();
        value["driver"] = json!("frequency");
        assert!(matches!(
            SingleRunMeta::from_json(&value),
            Err(ValidationError::InvalidEnum { .. })
        ));
    }

    #[test]
    fn test_assemble_envelope() {
        let meta = SingleRunMeta::from_json(&meta_json()).unwrap();
        let mol_id = ObjectId::from_sequence(1);
        let skeleton = TaskSkeleton::new(&meta, mol_id.clone());
        let molecule = Molecule::new(vec!["He".into()], vec![0.0, 0.0, 0.0]).with_id(mol_id);

        let task = QcSchemaInput::assemble(skeleton, molecule, Map::new());
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["schema_name"], json!("qc_schema_input"));
        assert_eq!(value["schema_version"], json!(1));
        assert_eq!(value["model"], json!({"method": "HF", "basis": "sto-3g"}));
        assert_eq!(value["qcfractal_tags"], json!({"program": "psi4", "options": "default"}));
        assert!(value.get("method").is_none());
        assert!(value.get("basis").is_none());
        assert!(value.get("molecule_id").is_none());
    }

    #[test]
    fn test_into_compact_drops_envelope() {
        let result: QcSchemaResult = serde_json::from_value(json!({
            "schema_name": "qc_schema_input",
            "schema_version": 1,
            "driver": "energy",
            "model": {"method": "HF", "basis": "sto-3g"},
            "keywords": {"scf_type": "df"},
            "molecule": {"symbols": ["He"], "geometry": [0.0, 0.0, 0.0]},
            "qcfractal_tags": {"program": "psi4", "options": "default"},
            "return_result": -2.8077,
            "success": true
        }))
        .unwrap();

        let compact = result.into_compact(ObjectId::from_sequence(9));
        let value = serde_json::to_value(&compact).unwrap();

        assert_eq!(value["method"], json!("HF"));
        assert_eq!(value["options"], json!("default"));
        assert_eq!(value["molecule_id"], json!("000000000000000000000009"));
        assert_eq!(value["return_result"], json!(-2.8077));
        for leaked in ["schema_name", "schema_version", "qcfractal_tags", "keywords", "model", "molecule"] {
            assert!(value.get(leaked).is_none(), "{} leaked", leaked);
        }
    }
}
