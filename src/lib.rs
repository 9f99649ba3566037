pub mod core;
pub mod server;
pub mod services;

pub use crate::core::config::Config;
pub use crate::core::error::{GenerationError, ModelCallError, ResponseParseError};
pub use crate::core::story::{CharacterHint, StoryDocument, StoryPage, StoryRequest};
pub use crate::services::story::StoryGenerator;
