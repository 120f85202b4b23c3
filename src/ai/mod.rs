pub mod gemini;
pub mod http_client;
pub mod model_selector;
pub mod prompts;
pub mod provider;
pub mod vision;

pub use gemini::{GeminiClient, GeminiConfig};
pub use model_selector::{select_model, ModelPreference, SelectionError};
pub use provider::{InlineImage, ModelInfo, ProviderError, VisionProvider};
pub use vision::{ImageError, ImageInput, PreparedImage};
