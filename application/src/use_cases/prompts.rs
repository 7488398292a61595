//! Prompt construction for the expand, persona-review, and revision
//! re-expand LLM calls.
//!
//! Kept as pure string-building functions — no I/O — so the pipeline use
//! cases stay testable without an LLM client.

use quorum_domain::{ExpandedProposal, Persona};

use crate::ports::llm_client::ProducePayload;

pub fn expand_system_prompt() -> String {
    "You expand a short idea into a structured project proposal. Respond only with \
     the fields requested: problem_statement, proposed_solution, assumptions \
     (ordered list), scope_non_goals (ordered list), and optionally title and \
     summary. Be concrete; do not invent requirements the idea does not support."
        .to_string()
}

pub fn expand_user_prompt(idea: &str, extra_context: Option<&serde_json::Value>) -> String {
    let mut prompt = format!("Idea:\n{idea}\n");
    if let Some(context) = extra_context {
        prompt.push_str(&format!("\nAdditional context:\n{context}\n"));
    }
    prompt
}

pub fn expand_payload(idea: &str, extra_context: Option<&serde_json::Value>) -> ProducePayload {
    ProducePayload {
        system: expand_system_prompt(),
        user: expand_user_prompt(idea, extra_context),
    }
}

/// Re-expansion for a revision: merges the edited input into the same
/// expansion contract so the result is diffable field-for-field against the
/// parent (spec.md §4.6 step 1).
pub fn revision_expand_payload(
    parent: &ExpandedProposal,
    edited_proposal: Option<&serde_json::Value>,
    edit_notes: Option<&str>,
) -> ProducePayload {
    let system = format!(
        "{} You are revising an existing proposal in light of an edit. Preserve \
         anything the edit does not touch.",
        expand_system_prompt()
    );

    let parent_json = serde_json::to_string_pretty(parent).unwrap_or_default();
    let mut user = format!("Prior proposal:\n{parent_json}\n");
    if let Some(edited) = edited_proposal {
        user.push_str(&format!("\nRequested edit (structured):\n{edited}\n"));
    }
    if let Some(notes) = edit_notes {
        user.push_str(&format!("\nEdit notes:\n{notes}\n"));
    }

    ProducePayload { system, user }
}

fn persona_voice(persona: Persona) -> &'static str {
    match persona {
        Persona::Architect => {
            "You are the Architect. You judge technical soundness: does the proposed \
             solution actually solve the stated problem, are the assumptions load-bearing \
             and reasonable, and is the scope coherent. You favor designs that are simple \
             to build and extend."
        }
        Persona::Critic => {
            "You are the Critic. You look for what's missing, underspecified, or likely to \
             fail in practice. You are skeptical of optimistic assumptions and call out gaps \
             between the stated problem and the proposed solution."
        }
        Persona::Optimist => {
            "You are the Optimist. You evaluate the upside: what this unlocks, how it \
             compounds with existing capability, and whether the team is underselling the \
             idea. You still flag real blockers, but you do not manufacture concerns."
        }
        Persona::SecurityGuardian => {
            "You are the Security Guardian. You evaluate the proposal strictly for security, \
             privacy, and abuse-resistance implications. Any issue you consider severe enough \
             to block release must be reported as a blocking_issue with security_critical set \
             to true — this is the only path by which your review can force rejection \
             regardless of the other scores."
        }
        Persona::UserAdvocate => {
            "You are the User Advocate. You evaluate the proposal from the perspective of the \
             people who will use it: clarity, friction, and whether the scope_non_goals leave \
             an obviously-needed capability out."
        }
    }
}

pub fn review_system_prompt(persona: Persona) -> String {
    format!(
        "{} Respond only with the fields requested: confidence_score (0.0-1.0), \
         strengths, concerns (each with is_blocking), recommendations, blocking_issues \
         (each with security_critical), estimated_effort, and dependency_risks.",
        persona_voice(persona)
    )
}

pub fn review_user_prompt(proposal: &ExpandedProposal, edit_notes: Option<&str>) -> String {
    let proposal_json = serde_json::to_string_pretty(proposal).unwrap_or_default();
    let mut prompt = format!("Proposal to review:\n{proposal_json}\n");
    if let Some(notes) = edit_notes {
        prompt.push_str(&format!(
            "\nThis proposal was just revised. Edit notes from the author:\n{notes}\n"
        ));
    }
    prompt
}

pub fn review_payload(
    persona: Persona,
    proposal: &ExpandedProposal,
    edit_notes: Option<&str>,
) -> ProducePayload {
    ProducePayload {
        system: review_system_prompt(persona),
        user: review_user_prompt(proposal, edit_notes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> ExpandedProposal {
        ExpandedProposal {
            problem_statement: "Users cannot export data.".into(),
            proposed_solution: "Add a CSV export button.".into(),
            assumptions: vec!["Data fits in memory".into()],
            scope_non_goals: vec!["No streaming export".into()],
            title: Some("CSV export".into()),
            summary: None,
        }
    }

    #[test]
    fn security_guardian_prompt_mentions_security_critical() {
        let prompt = review_system_prompt(Persona::SecurityGuardian);
        assert!(prompt.contains("security_critical"));
    }

    #[test]
    fn every_persona_has_a_distinct_voice() {
        let mut voices = std::collections::HashSet::new();
        for persona in quorum_domain::PERSONAS {
            voices.insert(persona_voice(persona));
        }
        assert_eq!(voices.len(), 5);
    }

    #[test]
    fn expand_prompt_includes_idea() {
        let payload = expand_payload("Build a thing.", None);
        assert!(payload.user.contains("Build a thing."));
    }

    #[test]
    fn review_prompt_embeds_proposal_json() {
        let payload = review_payload(Persona::Critic, &proposal(), None);
        assert!(payload.user.contains("Add a CSV export button."));
    }
}
