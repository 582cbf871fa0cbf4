use std::sync::Arc;
use std::sync::Mutex;

use skald::application::ports::{ChatModel, ChatModelError, ChatTurn, CompletionParams, TurnRole};
use skald::application::services::ChatService;
use skald::domain::{ConversationId, Message, MessageRole};

/// Returns a canned response and records the turns of the last call.
struct MockChatModel {
    response: Result<String, String>,
    last_turns: Mutex<Vec<ChatTurn>>,
    last_temperature: Mutex<Option<f32>>,
}

impl MockChatModel {
    fn replying(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            last_turns: Mutex::new(Vec::new()),
            last_temperature: Mutex::new(None),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            last_turns: Mutex::new(Vec::new()),
            last_temperature: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for MockChatModel {
    async fn complete(
        &self,
        turns: &[ChatTurn],
        params: CompletionParams,
    ) -> Result<String, ChatModelError> {
        *self.last_turns.lock().unwrap() = turns.to_vec();
        *self.last_temperature.lock().unwrap() = Some(params.temperature);
        self.response
            .clone()
            .map_err(ChatModelError::Unavailable)
    }
}

#[tokio::test]
async fn given_transcript_when_answering_then_grounding_turn_comes_first() {
    let model = Arc::new(MockChatModel::replying("An answer"));
    let service = ChatService::new(Arc::clone(&model) as Arc<dyn ChatModel>);

    let answer = service
        .answer("What is discussed?", Some("People talk about boats."), &[])
        .await
        .unwrap();

    assert_eq!(answer, "An answer");
    let turns = model.last_turns.lock().unwrap();
    assert_eq!(turns[0].role, TurnRole::System);
    assert!(turns[0].content.contains("People talk about boats."));
    assert_eq!(turns.last().unwrap().role, TurnRole::User);
    assert_eq!(turns.last().unwrap().content, "What is discussed?");
}

#[tokio::test]
async fn given_no_transcript_when_answering_then_no_system_turn() {
    let model = Arc::new(MockChatModel::replying("Plain answer"));
    let service = ChatService::new(Arc::clone(&model) as Arc<dyn ChatModel>);

    service.answer("Hello", None, &[]).await.unwrap();

    let turns = model.last_turns.lock().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, TurnRole::User);
}

#[tokio::test]
async fn given_history_when_answering_then_prior_turns_are_replayed_in_order() {
    let model = Arc::new(MockChatModel::replying("ok"));
    let service = ChatService::new(Arc::clone(&model) as Arc<dyn ChatModel>);

    let conversation_id = ConversationId::new();
    let history = vec![
        Message::new(conversation_id, MessageRole::User, "first".to_string()),
        Message::new(conversation_id, MessageRole::Assistant, "second".to_string()),
    ];

    service
        .answer("third", Some("a transcript"), &history)
        .await
        .unwrap();

    let turns = model.last_turns.lock().unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[1].role, TurnRole::User);
    assert_eq!(turns[1].content, "first");
    assert_eq!(turns[2].role, TurnRole::Assistant);
    assert_eq!(turns[2].content, "second");
    assert_eq!(turns[3].content, "third");
}

#[tokio::test]
async fn given_transcript_request_when_answering_then_transcript_returned_without_model() {
    let model = Arc::new(MockChatModel::failing("must not be called"));
    let service = ChatService::new(Arc::clone(&model) as Arc<dyn ChatModel>);

    let answer = service
        .answer(
            "Please show me the transcript",
            Some("the whole text"),
            &[],
        )
        .await
        .unwrap();

    assert_eq!(answer, "the whole text");
    assert!(model.last_turns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_model_failure_when_answering_then_error_propagates() {
    let model = Arc::new(MockChatModel::failing("down"));
    let service = ChatService::new(model as Arc<dyn ChatModel>);

    let result = service.answer("question", None, &[]).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn given_clean_json_when_generating_metadata_then_fields_parse() {
    let model = Arc::new(MockChatModel::replying(
        r#"{"title": "Boat Talk", "summary": "boats, harbors, sailing"}"#,
    ));
    let service = ChatService::new(Arc::clone(&model) as Arc<dyn ChatModel>);

    let metadata = service.generate_metadata("a transcript about boats").await;

    assert_eq!(metadata.title, "Boat Talk");
    assert_eq!(metadata.summary, "boats, harbors, sailing");
    // Metadata generation runs cold.
    assert_eq!(*model.last_temperature.lock().unwrap(), Some(0.1));
}

#[tokio::test]
async fn given_fenced_json_when_generating_metadata_then_fences_are_stripped() {
    let model = Arc::new(MockChatModel::replying(
        "```json\n{\"title\": \"Fenced\", \"summary\": \"still parses\"}\n```",
    ));
    let service = ChatService::new(model as Arc<dyn ChatModel>);

    let metadata = service.generate_metadata("whatever").await;

    assert_eq!(metadata.title, "Fenced");
    assert_eq!(metadata.summary, "still parses");
}

#[tokio::test]
async fn given_invalid_json_when_generating_metadata_then_fallback_is_used() {
    let model = Arc::new(MockChatModel::replying("not json at all"));
    let service = ChatService::new(model as Arc<dyn ChatModel>);

    let metadata = service
        .generate_metadata("one two three four five six seven eight")
        .await;

    // First six words become the title.
    assert_eq!(metadata.title, "one two three four five six");
    assert!(metadata.summary.starts_with("one two three"));
}

#[tokio::test]
async fn given_model_failure_when_generating_metadata_then_fallback_is_used() {
    let model = Arc::new(MockChatModel::failing("down"));
    let service = ChatService::new(model as Arc<dyn ChatModel>);

    let long_transcript = "word ".repeat(100);
    let metadata = service.generate_metadata(&long_transcript).await;

    assert!(!metadata.title.is_empty());
    assert!(metadata.title.chars().count() <= 35);
    assert!(metadata.summary.chars().count() <= 80);
}

#[tokio::test]
async fn given_empty_transcript_when_falling_back_then_dated_title_is_used() {
    let model = Arc::new(MockChatModel::failing("down"));
    let service = ChatService::new(model as Arc<dyn ChatModel>);

    let metadata = service.generate_metadata("").await;

    assert!(metadata.title.starts_with("Transcription "));
}
