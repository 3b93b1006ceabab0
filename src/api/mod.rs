mod gemini;

pub use gemini::{GeminiClient, Operation, Thumbnail};
