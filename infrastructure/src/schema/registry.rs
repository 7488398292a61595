//! Versioned JSON Schema registry, compiled once at startup (spec.md §4.1).

use std::collections::HashMap;

use quorum_application::ports::schema_validator::{FieldError, SchemaValidationError, SchemaValidator};
use serde_json::Value;
use thiserror::Error;

use super::definitions;

#[derive(Error, Debug)]
pub enum SchemaRegistryError {
    #[error("failed to compile schema {name}@{version}: {source}")]
    Compile {
        name: String,
        version: String,
        #[source]
        source: jsonschema::ValidationError<'static>,
    },
}

struct RegisteredSchema {
    raw: Value,
    validator: jsonschema::Validator,
}

/// All schemas a running worker/CLI knows about, keyed by `(name, version)`.
/// Compiled once and shared behind an `Arc` thereafter.
pub struct SchemaRegistry {
    schemas: HashMap<(String, String), RegisteredSchema>,
}

impl SchemaRegistry {
    /// Builds the registry with every schema this system defines. Fails
    /// fast at startup if any literal schema document is malformed.
    pub fn bootstrap() -> Result<Self, SchemaRegistryError> {
        let mut registry = Self {
            schemas: HashMap::new(),
        };
        registry.register("ExpandedProposal", "1.0.0", definitions::expanded_proposal_v1())?;
        registry.register("PersonaReview", "1.0.0", definitions::persona_review_v1())?;
        registry.register("DecisionAggregation", "1.0.0", definitions::decision_aggregation_v1())?;
        Ok(registry)
    }

    fn register(&mut self, name: &str, version: &str, schema: Value) -> Result<(), SchemaRegistryError> {
        let validator = jsonschema::validator_for(&schema).map_err(|e| SchemaRegistryError::Compile {
            name: name.to_string(),
            version: version.to_string(),
            source: e.to_owned(),
        })?;
        self.schemas.insert(
            (name.to_string(), version.to_string()),
            RegisteredSchema { raw: schema, validator },
        );
        Ok(())
    }

    /// The raw JSON Schema document for a registered `(name, version)`, used
    /// by the LLM client adapter to build a provider tool spec that forces
    /// the model's output into this shape.
    pub fn raw_schema(&self, name: &str, version: &str) -> Option<&Value> {
        self.schemas.get(&(name.to_string(), version.to_string())).map(|s| &s.raw)
    }
}

impl SchemaValidator for SchemaRegistry {
    fn validate(
        &self,
        schema_name: &str,
        schema_version: &str,
        value: &Value,
        request_id: Option<&str>,
    ) -> Result<(), SchemaValidationError> {
        let Some(entry) = self.schemas.get(&(schema_name.to_string(), schema_version.to_string())) else {
            return Err(SchemaValidationError {
                schema_name: schema_name.to_string(),
                schema_version: schema_version.to_string(),
                field_errors: vec![FieldError {
                    field: "$".into(),
                    message: "no schema registered for this name/version".into(),
                    kind: "unregistered_schema".into(),
                }],
                request_id: request_id.map(str::to_string),
            });
        };

        let field_errors: Vec<FieldError> = entry
            .validator
            .iter_errors(value)
            .map(|e| FieldError {
                field: e.instance_path.to_string(),
                message: e.to_string(),
                kind: format!("{:?}", e.kind),
            })
            .collect();

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError {
                schema_name: schema_name.to_string(),
                schema_version: schema_version.to_string(),
                field_errors,
                request_id: request_id.map(str::to_string),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bootstraps_without_error() {
        assert!(SchemaRegistry::bootstrap().is_ok());
    }

    #[test]
    fn accepts_a_well_formed_expanded_proposal() {
        let registry = SchemaRegistry::bootstrap().unwrap();
        let value = json!({
            "problem_statement": "users can't find settings",
            "proposed_solution": "add a search bar",
            "assumptions": ["users know what they want"],
            "scope_non_goals": ["no redesign of settings themselves"],
            "title": "Settings search",
            "summary": "a quick win"
        });
        assert!(registry
            .validate("ExpandedProposal", "1.0.0", &value, None)
            .is_ok());
    }

    #[test]
    fn rejects_a_missing_required_field() {
        let registry = SchemaRegistry::bootstrap().unwrap();
        let value = json!({ "proposed_solution": "add a search bar" });
        let err = registry
            .validate("ExpandedProposal", "1.0.0", &value, Some("req-1"))
            .unwrap_err();
        assert_eq!(err.schema_name, "ExpandedProposal");
        assert!(!err.field_errors.is_empty());
    }

    #[test]
    fn accepts_a_well_formed_decision_aggregation() {
        let registry = SchemaRegistry::bootstrap().unwrap();
        let value = json!({
            "decision": "approve",
            "weighted_confidence": 0.87,
            "security_veto": false,
            "any_blocking": false,
            "score_breakdown": {
                "weights": { "architect": 0.25 },
                "individual_scores": { "architect": 0.9 },
                "weighted_contributions": { "architect": 0.225 },
                "formula": "weighted_confidence = sum(weight_i * score_i) = 0.8700"
            },
            "minority_reports": []
        });
        assert!(registry
            .validate("DecisionAggregation", "1.0.0", &value, None)
            .is_ok());
    }

    #[test]
    fn unregistered_schema_is_reported_as_a_field_error() {
        let registry = SchemaRegistry::bootstrap().unwrap();
        let err = registry
            .validate("NoSuchSchema", "9.9.9", &json!({}), None)
            .unwrap_err();
        assert_eq!(err.field_errors[0].kind, "unregistered_schema");
    }
}
