//! Heuristic refinement agents over proposed field mappings.
//!
//! Three platform-family agents (banking, CRM, ERP) adjust candidate
//! confidences with domain rules, and an optional completion-provider
//! integration folds language-model proposals back into the mapping
//! set. Field names under payment-card or privacy tags are redacted
//! before anything leaves the process.

pub mod agent;
pub mod banking;
pub mod crm;
pub mod erp;
pub mod llm;
pub mod redaction;

pub use agent::{AgentContext, AgentRegistry, DomainAgent};
pub use banking::BankingAgent;
pub use crm::CrmAgent;
pub use erp::ErpAgent;
pub use llm::{
    ChatMessage, Completion, CompletionProvider, HINT_CONFIDENCE, MAX_HINTS,
    MIN_PROPOSAL_CONFIDENCE, MappingProposal, ProposalIntegrator, extract_json_array,
};
pub use redaction::{
    REDACTED_CARD, REDACTED_PII, RedactedField, describe_entity, presentable_name,
    redact_fields, redacted_count, redaction_placeholder,
};
