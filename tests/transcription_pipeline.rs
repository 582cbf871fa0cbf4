use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use skald::application::ports::{
    AudioSplitter, MediaProbe, SpeechToText, SpeechToTextError, SplitToolError,
};
use skald::application::services::{
    ChunkingConfig, TranscriptionError, TranscriptionService, plan_chunk_duration,
};

const FAIL_MARKER: &str = "FAIL";

/// Test-sized chunking knobs so fixtures stay a few hundred bytes.
fn test_config() -> ChunkingConfig {
    ChunkingConfig {
        max_direct_bytes: 100,
        safety_margin: 0.85,
        min_chunk_secs: 1.0,
        recheck_factor: 0.95,
        min_chunk_bytes: 8,
        max_split_depth: 3,
        max_concurrent: 5,
    }
}

/// Transcribes a payload into its trimmed UTF-8 content. Payloads containing
/// the fail marker error out; per-content delays let tests scramble the
/// completion order.
struct MockSpeech {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    delays_ms: HashMap<String, u64>,
    always_too_large: bool,
}

impl MockSpeech {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            delays_ms: HashMap::new(),
            always_too_large: false,
        }
    }

    fn with_delays(delays_ms: HashMap<String, u64>) -> Self {
        Self {
            delays_ms,
            ..Self::new()
        }
    }

    fn payload_too_large() -> Self {
        Self {
            always_too_large: true,
            ..Self::new()
        }
    }
}

#[async_trait::async_trait]
impl SpeechToText for MockSpeech {
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, SpeechToTextError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(current, Ordering::SeqCst);

        let content = String::from_utf8_lossy(audio_data).trim().to_string();
        if let Some(delay) = self.delays_ms.get(&content) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        } else if !self.delays_ms.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.always_too_large {
            return Err(SpeechToTextError::PayloadTooLarge);
        }
        if content.contains(FAIL_MARKER) {
            return Err(SpeechToTextError::Unavailable("mock failure".to_string()));
        }
        Ok(content)
    }
}

struct MockProbe {
    duration: Option<f64>,
}

#[async_trait::async_trait]
impl MediaProbe for MockProbe {
    async fn duration_secs(&self, _path: &Path) -> Option<f64> {
        self.duration
    }
}

/// Writes a scripted set of segment files per invocation; the scripts queue
/// is consumed front to back across nested re-splits.
struct ScriptedSplitter {
    scripts: Mutex<VecDeque<Vec<String>>>,
    calls: AtomicUsize,
}

impl ScriptedSplitter {
    fn new(scripts: Vec<Vec<String>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl AudioSplitter for ScriptedSplitter {
    async fn split(
        &self,
        _source: &Path,
        _chunk_duration_secs: f64,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, SplitToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let contents = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SplitToolError::ToolFailed("splitter script exhausted".to_string()))?;

        let mut paths = Vec::with_capacity(contents.len());
        for (i, content) in contents.iter().enumerate() {
            let path = out_dir.join(format!("chunk_{:03}.mp3", i));
            tokio::fs::write(&path, content.as_bytes()).await?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Pads a label with trailing spaces so the chunk file has a chosen size
/// while the mock transcript stays readable.
fn padded(label: &str, size: usize) -> String {
    assert!(label.len() <= size);
    format!("{}{}", label, " ".repeat(size - label.len()))
}

fn service(
    speech: Arc<MockSpeech>,
    probe: Arc<MockProbe>,
    splitter: Arc<ScriptedSplitter>,
    config: ChunkingConfig,
    temp_root: PathBuf,
) -> TranscriptionService {
    TranscriptionService::new(speech, probe, splitter, config, temp_root)
}

async fn write_source(dir: &Path, size: usize) -> PathBuf {
    let path = dir.join("source.mp3");
    tokio::fs::write(&path, vec![b'a'; size]).await.unwrap();
    path
}

#[test]
fn given_size_and_duration_when_planning_then_duration_scales_with_budget() {
    // 200 bytes over 100s against a 100-byte budget at 0.85 margin.
    let secs = plan_chunk_duration(200, 100.0, 100, 0.85);
    assert!((secs - 42.5).abs() < 1e-9);

    // Double the file size, half the chunk duration.
    let secs = plan_chunk_duration(400, 100.0, 100, 0.85);
    assert!((secs - 21.25).abs() < 1e-9);
}

#[test]
fn given_default_config_then_limits_match_remote_endpoint() {
    let config = ChunkingConfig::default();
    assert_eq!(config.max_direct_bytes, 10 * 1024 * 1024);
    assert_eq!(config.min_chunk_bytes, 10 * 1024);
    assert_eq!(config.max_concurrent, 5);
    assert_eq!(config.max_split_depth, 3);
    assert_eq!(config.recheck_bytes(), 9_961_472);
}

#[tokio::test]
async fn given_small_file_when_transcribing_then_single_call_and_no_split() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 80).await;

    let speech = Arc::new(MockSpeech::new());
    let splitter = Arc::new(ScriptedSplitter::new(vec![]));
    let svc = service(
        Arc::clone(&speech),
        Arc::new(MockProbe { duration: None }),
        Arc::clone(&splitter),
        test_config(),
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "a".repeat(80));
    assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
    assert_eq!(splitter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_scrambled_completion_order_when_merging_then_index_order_wins() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    // First chunk finishes last, last chunk finishes first.
    let delays = HashMap::from([
        ("alpha".to_string(), 60),
        ("bravo".to_string(), 30),
        ("charlie".to_string(), 5),
    ]);
    let speech = Arc::new(MockSpeech::with_delays(delays));
    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![
        padded("alpha", 40),
        padded("bravo", 40),
        padded("charlie", 40),
    ]]));
    let svc = service(
        Arc::clone(&speech),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "alpha\n\nbravo\n\ncharlie");
    assert_eq!(speech.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_one_failing_chunk_when_merging_then_failure_is_excluded() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![
        padded("alpha", 40),
        padded(FAIL_MARKER, 40),
        padded("charlie", 40),
    ]]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "alpha\n\ncharlie");
}

#[tokio::test]
async fn given_every_chunk_failing_when_merging_then_all_chunks_failed() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![
        padded(FAIL_MARKER, 40),
        padded(FAIL_MARKER, 40),
    ]]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        dir.path().join("tmp"),
    );

    let err = svc.transcribe(&source).await.unwrap_err();

    assert!(matches!(
        err,
        TranscriptionError::AllChunksFailed { failed: 2 }
    ));
}

#[tokio::test]
async fn given_near_empty_chunks_when_merging_then_they_count_as_success() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    // "x" is below the 8-byte floor and must be skipped, not transcribed.
    let speech = Arc::new(MockSpeech::new());
    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![
        padded("alpha", 40),
        "x".to_string(),
    ]]));
    let svc = service(
        Arc::clone(&speech),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "alpha");
    assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_only_near_empty_chunks_when_merging_then_empty_transcript() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![
        "x".to_string(),
        "y".to_string(),
    ]]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "");
}

#[tokio::test]
async fn given_many_chunks_when_fanning_out_then_concurrency_stays_capped() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let chunks: Vec<String> = (0..8).map(|i| padded(&format!("part{}", i), 40)).collect();
    let delays: HashMap<String, u64> = (0..8).map(|i| (format!("part{}", i), 25)).collect();

    let speech = Arc::new(MockSpeech::with_delays(delays));
    let splitter = Arc::new(ScriptedSplitter::new(vec![chunks]));
    let svc = service(
        Arc::clone(&speech),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        dir.path().join("tmp"),
    );

    svc.transcribe(&source).await.unwrap();

    assert_eq!(speech.calls.load(Ordering::SeqCst), 8);
    assert!(speech.high_water.load(Ordering::SeqCst) <= 5);
}

#[tokio::test]
async fn given_small_file_when_remote_rejects_payload_then_no_split_is_attempted() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 80).await;

    let splitter = Arc::new(ScriptedSplitter::new(vec![]));
    let svc = service(
        Arc::new(MockSpeech::payload_too_large()),
        Arc::new(MockProbe { duration: None }),
        Arc::clone(&splitter),
        test_config(),
        dir.path().join("tmp"),
    );

    let err = svc.transcribe(&source).await.unwrap_err();

    assert!(matches!(
        err,
        TranscriptionError::Remote(SpeechToTextError::PayloadTooLarge)
    ));
    assert_eq!(splitter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_too_dense_source_when_planning_then_split_is_infeasible() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let mut config = test_config();
    config.min_chunk_secs = 50.0; // planned 42.5s falls below this floor

    let splitter = Arc::new(ScriptedSplitter::new(vec![]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        Arc::clone(&splitter),
        config,
        dir.path().join("tmp"),
    );

    let err = svc.transcribe(&source).await.unwrap_err();

    assert!(matches!(err, TranscriptionError::SplitInfeasible { .. }));
    assert_eq!(splitter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_unknown_duration_when_planning_then_probe_failure_is_terminal() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe { duration: None }),
        Arc::new(ScriptedSplitter::new(vec![])),
        test_config(),
        dir.path().join("tmp"),
    );

    let err = svc.transcribe(&source).await.unwrap_err();

    assert!(matches!(err, TranscriptionError::ProbeFailed { .. }));
}

#[tokio::test]
async fn given_chunk_exactly_at_recheck_bound_then_it_is_not_resplit() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    // recheck bound is 95 bytes; exactly 95 must go straight to transcription.
    let speech = Arc::new(MockSpeech::new());
    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![padded("edge", 95)]]));
    let svc = service(
        Arc::clone(&speech),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        Arc::clone(&splitter),
        test_config(),
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "edge");
    assert_eq!(splitter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_chunk_over_recheck_bound_then_it_is_split_again() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    // First split yields one 96-byte chunk (over the 95-byte bound), the
    // nested split breaks it into two small ones.
    let splitter = Arc::new(ScriptedSplitter::new(vec![
        vec![padded("alpha", 40), padded("big", 96)],
        vec![padded("left", 40), padded("right", 40)],
    ]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        Arc::clone(&splitter),
        test_config(),
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "alpha\n\nleft\n\nright");
    assert_eq!(splitter.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn given_chunk_that_never_shrinks_then_depth_ceiling_fails_that_chunk() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let mut config = test_config();
    config.max_split_depth = 2;

    // Every level re-produces an oversized chunk; the sibling still merges.
    let splitter = Arc::new(ScriptedSplitter::new(vec![
        vec![padded("alpha", 40), padded("stuck", 96)],
        vec![padded("stuck", 96)],
    ]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        Arc::clone(&splitter),
        config,
        dir.path().join("tmp"),
    );

    let text = svc.transcribe(&source).await.unwrap();

    assert_eq!(text, "alpha");
    assert_eq!(splitter.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn given_chunked_run_when_finished_then_working_directories_are_gone() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;
    let temp_root = dir.path().join("tmp");

    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![
        padded("alpha", 40),
        padded("bravo", 40),
    ]]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        temp_root.clone(),
    );

    svc.transcribe(&source).await.unwrap();

    let mut entries = tokio::fs::read_dir(&temp_root).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn given_failed_chunked_run_when_finished_then_working_directories_are_gone() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;
    let temp_root = dir.path().join("tmp");

    let splitter = Arc::new(ScriptedSplitter::new(vec![vec![padded(FAIL_MARKER, 40)]]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        temp_root.clone(),
    );

    svc.transcribe(&source).await.unwrap_err();

    let mut entries = tokio::fs::read_dir(&temp_root).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn given_same_source_when_transcribed_twice_then_results_match() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), 200).await;

    let splitter = Arc::new(ScriptedSplitter::new(vec![
        vec![padded("alpha", 40), padded("bravo", 40)],
        vec![padded("alpha", 40), padded("bravo", 40)],
    ]));
    let svc = service(
        Arc::new(MockSpeech::new()),
        Arc::new(MockProbe {
            duration: Some(100.0),
        }),
        splitter,
        test_config(),
        dir.path().join("tmp"),
    );

    let first = svc.transcribe(&source).await.unwrap();
    let second = svc.transcribe(&source).await.unwrap();

    assert_eq!(first, second);
}
