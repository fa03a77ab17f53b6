//! Boundary to the external collaborators: manual search and the text
//! assistant. Nothing here is needed to produce a diagnosis.

mod assistant;
mod enrich;
mod error;
mod resolver;
mod search;

pub use assistant::{format_system_state, render_prompt, Assistant, AssistantReply, PROMPT_TEMPLATE};
pub use enrich::{Collaborators, EnrichedResult};
pub use error::CollaboratorError;
pub use search::{KeywordIndex, ManualSearch, ManualSection, SearchHit};
