pub mod chat;
pub mod image;
pub mod media;
pub mod transcription;

pub use chat::call_chat_completion;
pub use self::image::{generate_image, GeneratedImage, ImageGenerationError};
pub use transcription::{transcribe_audio, AudioClip};
