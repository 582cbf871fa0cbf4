use std::path::PathBuf;

use url::Url;

use skald::domain::{AudioSource, ChunkPlan, MediaSource};

fn parsed(url: &str) -> Url {
    Url::parse(url).unwrap()
}

#[test]
fn given_supabase_storage_url_when_classifying_then_storage_url() {
    let url = parsed("https://abc.supabase.co/storage/v1/object/public/media/talk");

    let source = MediaSource::classify(url.clone());

    assert!(matches!(source, MediaSource::StorageUrl(_)));
    assert_eq!(source.url(), &url);
}

#[test]
fn given_s3_url_with_media_extension_when_classifying_then_storage_wins() {
    let source = MediaSource::classify(parsed("https://bucket.s3.amazonaws.com/clips/talk.mp3"));

    assert!(matches!(source, MediaSource::StorageUrl(_)));
}

#[test]
fn given_direct_link_with_media_extension_when_classifying_then_direct_url() {
    let source = MediaSource::classify(parsed("https://cdn.example.com/episodes/42.mp3"));

    assert!(matches!(source, MediaSource::DirectUrl(_)));
}

#[test]
fn given_uppercase_extension_when_classifying_then_direct_url() {
    let source = MediaSource::classify(parsed("https://cdn.example.com/episodes/42.MP3"));

    assert!(matches!(source, MediaSource::DirectUrl(_)));
}

#[test]
fn given_extensionless_platform_page_when_classifying_then_platform_url() {
    let source = MediaSource::classify(parsed("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));

    assert!(matches!(source, MediaSource::PlatformUrl(_)));
}

#[test]
fn given_page_with_unrelated_extension_when_classifying_then_platform_url() {
    let source = MediaSource::classify(parsed("https://example.com/articles/episode.html"));

    assert!(matches!(source, MediaSource::PlatformUrl(_)));
}

fn segment(name: &str, size_bytes: u64) -> AudioSource {
    AudioSource::new(PathBuf::from(name), size_bytes, None)
}

#[test]
fn given_segment_list_when_planning_then_indices_are_contiguous_from_zero() {
    let plan = ChunkPlan::new(
        90.0,
        vec![
            segment("chunk_000.mp3", 100),
            segment("chunk_001.mp3", 100),
            segment("chunk_002.mp3", 100),
        ],
    );

    assert_eq!(plan.chunk_duration_secs, 90.0);
    assert_eq!(plan.len(), 3);
    assert!(!plan.is_empty());
    let indices: Vec<usize> = plan.chunks.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn given_no_segments_when_planning_then_plan_is_empty() {
    let plan = ChunkPlan::new(90.0, Vec::new());

    assert_eq!(plan.len(), 0);
    assert!(plan.is_empty());
}
