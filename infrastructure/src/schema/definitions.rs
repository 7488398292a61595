//! Literal JSON Schema documents for every structured LLM output (spec.md
//! §4.1). Each schema is keyed by `(name, version)` in [`super::SchemaRegistry`]
//! and compiled once at startup.

use serde_json::{json, Value};

/// `ExpandedProposal@1.0.0` — the `expand` step's output shape, matching
/// `quorum_domain::ExpandedProposal` field for field.
pub fn expanded_proposal_v1() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "ExpandedProposal",
        "type": "object",
        "required": ["problem_statement", "proposed_solution", "assumptions", "scope_non_goals"],
        "properties": {
            "problem_statement": { "type": "string", "minLength": 1 },
            "proposed_solution": { "type": "string", "minLength": 1 },
            "assumptions": { "type": "array", "items": { "type": "string" } },
            "scope_non_goals": { "type": "array", "items": { "type": "string" } },
            "title": { "type": ["string", "null"] },
            "summary": { "type": ["string", "null"] }
        },
        "additionalProperties": false
    })
}

/// `PersonaReview@1.0.0` — the shape every one of the five fixed personas
/// must produce, matching `quorum_domain::ReviewPayload`.
pub fn persona_review_v1() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "PersonaReview",
        "type": "object",
        "required": ["confidence_score", "estimated_effort"],
        "properties": {
            "confidence_score": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "strengths": { "type": "array", "items": { "type": "string" } },
            "concerns": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["text", "is_blocking"],
                    "properties": {
                        "text": { "type": "string" },
                        "is_blocking": { "type": "boolean" }
                    },
                    "additionalProperties": false
                }
            },
            "recommendations": { "type": "array", "items": { "type": "string" } },
            "blocking_issues": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["text"],
                    "properties": {
                        "text": { "type": "string" },
                        "security_critical": { "type": "boolean" }
                    },
                    "additionalProperties": false
                }
            },
            "estimated_effort": { "type": "string", "minLength": 1 },
            "dependency_risks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["description"],
                    "properties": {
                        "description": { "type": "string" },
                        "severity": { "type": ["string", "null"] }
                    },
                    "additionalProperties": false
                }
            }
        },
        "additionalProperties": false
    })
}

/// `DecisionAggregation@1.0.0` — the `aggregate` step's output shape,
/// matching `quorum_domain::DecisionJson` field for field.
pub fn decision_aggregation_v1() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "DecisionAggregation",
        "type": "object",
        "required": [
            "decision",
            "weighted_confidence",
            "security_veto",
            "any_blocking",
            "score_breakdown",
            "minority_reports"
        ],
        "properties": {
            "decision": { "type": "string", "enum": ["approve", "revise", "reject"] },
            "weighted_confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "security_veto": { "type": "boolean" },
            "any_blocking": { "type": "boolean" },
            "score_breakdown": {
                "type": "object",
                "required": ["weights", "individual_scores", "weighted_contributions", "formula"],
                "properties": {
                    "weights": { "type": "object", "additionalProperties": { "type": "number" } },
                    "individual_scores": { "type": "object", "additionalProperties": { "type": "number" } },
                    "weighted_contributions": { "type": "object", "additionalProperties": { "type": "number" } },
                    "formula": { "type": "string" }
                },
                "additionalProperties": false
            },
            "minority_reports": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["persona_id", "persona_name", "confidence_score"],
                    "properties": {
                        "persona_id": { "type": "string" },
                        "persona_name": { "type": "string" },
                        "confidence_score": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                        "blocking_summary": { "type": ["string", "null"] },
                        "mitigation_recommendation": { "type": ["string", "null"] }
                    },
                    "additionalProperties": false
                }
            }
        },
        "additionalProperties": false
    })
}
