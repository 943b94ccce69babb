//! # Specification Descriptors
//!
//! Closed, validated value objects describing a computation.
//!
//! - `QcSpecification`: driver, method, basis, program and keyword reference
//!   of a single-point computation.
//! - `OptimizationSpecification`: program and inline keywords of a
//!   multi-step procedure.
//!
//! Both reject unknown fields. `method` and `program` are case-folded; the
//! basis passes through the injected [`BasisNormalizer`] exactly once.

use crate::domain::keyword_set::KeywordSet;
use crate::domain::normalizer::{normalize_map, NormalizeOptions};
use crate::ports::BasisNormalizer;
use qcf_types::{Driver, KeywordSetId, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Single-point computation descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QcSpecification {
    driver: Driver,
    method: String,
    basis: Option<String>,
    keywords: Option<KeywordSetId>,
    program: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQcSpecification {
    driver: String,
    method: String,
    #[serde(default)]
    basis: Option<String>,
    #[serde(default)]
    keywords: Option<KeywordSetId>,
    program: String,
}

impl QcSpecification {
    const ENTITY: &'static str = "QCSpecification";
    const FIELDS: &'static [&'static str] = &["driver", "method", "basis", "keywords", "program"];
    const REQUIRED: &'static [&'static str] = &["driver", "method", "program"];

    pub fn new(
        driver: Driver,
        method: &str,
        basis: Option<&str>,
        program: &str,
        keywords: Option<KeywordSetId>,
        basis_normalizer: &dyn BasisNormalizer,
    ) -> Self {
        Self {
            driver,
            method: method.to_lowercase(),
            basis: basis_normalizer.prepare_basis(basis),
            keywords,
            program: program.to_lowercase(),
        }
    }

    /// Validate a JSON descriptor.
    pub fn from_json(
        value: Value,
        basis_normalizer: &dyn BasisNormalizer,
    ) -> Result<Self, ValidationError> {
        check_closed_fields(Self::ENTITY, &value, Self::FIELDS, Self::REQUIRED)?;

        let raw: RawQcSpecification = serde_json::from_value(value)
            .map_err(|e| ValidationError::malformed(Self::ENTITY, e))?;
        let driver = raw.driver.parse::<Driver>()?;

        Ok(Self::new(
            driver,
            &raw.method,
            raw.basis.as_deref(),
            &raw.program,
            raw.keywords,
            basis_normalizer,
        ))
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn basis(&self) -> Option<&str> {
        self.basis.as_deref()
    }

    pub fn keywords(&self) -> Option<&KeywordSetId> {
        self.keywords.as_ref()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Format the execution-schema fragment for this specification.
    ///
    /// With `checks` set, a specification that references a keyword set
    /// only accepts that exact keyword set.
    pub fn form_schema_object(
        &self,
        keywords: Option<&KeywordSet>,
        checks: bool,
    ) -> Result<Value, ValidationError> {
        if checks {
            if let Some(expected) = &self.keywords {
                let actual = keywords.and_then(|k| k.id());
                if actual != Some(expected) {
                    return Err(ValidationError::KeywordsMismatch {
                        expected: expected.to_string(),
                        actual: actual
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| "none".to_string()),
                    });
                }
            }
        }

        let mut model = Map::new();
        model.insert("method".to_string(), Value::String(self.method.clone()));
        if let Some(basis) = &self.basis {
            model.insert("basis".to_string(), Value::String(basis.clone()));
        }

        let keyword_values = keywords
            .map(|k| k.values().clone())
            .unwrap_or_default();

        Ok(json!({
            "driver": self.driver.as_str(),
            "program": self.program,
            "model": model,
            "keywords": keyword_values,
        }))
    }
}

/// Multi-step procedure descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSpecification {
    program: String,
    keywords: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptimizationSpecification {
    program: String,
    #[serde(default)]
    keywords: Option<Map<String, Value>>,
}

impl OptimizationSpecification {
    const ENTITY: &'static str = "OptimizationSpecification";
    const FIELDS: &'static [&'static str] = &["program", "keywords"];
    const REQUIRED: &'static [&'static str] = &["program"];

    pub fn new(program: &str, keywords: Option<Map<String, Value>>) -> Self {
        Self {
            program: program.to_lowercase(),
            keywords: keywords.map(|k| normalize_map(&k, &NormalizeOptions::default())),
        }
    }

    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        check_closed_fields(Self::ENTITY, &value, Self::FIELDS, Self::REQUIRED)?;

        let raw: RawOptimizationSpecification = serde_json::from_value(value)
            .map_err(|e| ValidationError::malformed(Self::ENTITY, e))?;
        Ok(Self::new(&raw.program, raw.keywords))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn keywords(&self) -> Option<&Map<String, Value>> {
        self.keywords.as_ref()
    }
}

/// Reject non-objects, unknown fields and missing required fields.
pub(crate) fn check_closed_fields(
    entity: &'static str,
    value: &Value,
    allowed: &[&str],
    required: &[&str],
) -> Result<(), ValidationError> {
    let Value::Object(map) = value else {
        return Err(ValidationError::WrongType {
            field: entity.to_string(),
            expected: "a mapping",
        });
    };

    if let Some(unknown) = map.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ValidationError::UnknownField {
            entity,
            field: unknown.clone(),
        });
    }

    if let Some(missing) = required.iter().find(|f| !map.contains_key(**f)) {
        return Err(ValidationError::MissingField {
            entity,
            field: missing.to_string(),
        });
    }

    Ok(())
}
