mod audio_source;
mod chunk_plan;
mod conversation;
mod media_source;
mod message;
mod transcription;

pub use audio_source::AudioSource;
pub use chunk_plan::{ChunkPlan, PlannedChunk};
pub use conversation::{Conversation, ConversationId};
pub use media_source::MediaSource;
pub use message::{Message, MessageId, MessageRole};
pub use transcription::{MediaKind, TranscriptionId, TranscriptionRecord};
