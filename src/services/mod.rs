//! External collaborators, specified at their interface boundaries:
//! candidate lookups on the relational store, the template catalog, and the
//! best-effort generative text service.

pub mod candidates;
pub mod generation;
pub mod templates;

pub use candidates::{CandidateStore, CandidateStoreError, PgCandidateStore};
pub use generation::{
    GeneratedMessage, GenerationError, GenerationRequest, GenerationSource, GenerativeClient,
    HttpGenerativeClient, MessageGenerationService,
};
pub use templates::{PgTemplateStore, TemplateStore, TemplateStoreError};
