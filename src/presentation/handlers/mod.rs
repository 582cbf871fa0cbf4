mod chat;
mod conversation;
mod health;
mod transcribe;
mod transcribe_url;
mod transcription;

pub use chat::chat_handler;
pub use conversation::get_conversation_handler;
pub use health::health_handler;
pub use transcribe::transcribe_handler;
pub use transcribe_url::transcribe_url_handler;
pub use transcription::get_transcription_handler;
