//! AI analysis layer: prompt construction, model completion, and validation
//! of the structured output against the review analysis schema.

mod error;
pub mod extract;
pub mod gemini;
pub mod prompt;
pub mod throttle;

pub use error::ExtractionError;
pub use extract::{CompletionModel, Extractor, parse_analyses, strip_code_fences};
pub use gemini::GeminiClient;
pub use prompt::{ReviewProjection, SYSTEM_PROMPT, build_prompt, project_batch};
pub use throttle::Throttle;
