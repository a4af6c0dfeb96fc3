mod helpers;

use tempfile::TempDir;

use rookery::application::ports::{MediaDir, MediaStore, MediaStoreError};
use rookery::domain::EpisodeId;
use rookery::infrastructure::storage::LocalMediaStore;

fn create_test_store() -> (TempDir, LocalMediaStore) {
    let dir = TempDir::new().unwrap();
    let store = LocalMediaStore::new(dir.path().to_path_buf()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn given_saved_source_when_reading_then_bytes_match_original() {
    let (_dir, store) = create_test_store();
    let episode_id = EpisodeId::new();

    store
        .save_source(episode_id, "ep1-alice.wav", b"audio bytes")
        .await
        .unwrap();

    let data = store
        .read(episode_id, MediaDir::Source, "ep1-alice.wav")
        .await
        .unwrap();
    assert_eq!(data, b"audio bytes");
}

#[tokio::test]
async fn given_files_with_mixed_extensions_when_listing_then_filter_and_sort_apply() {
    let (_dir, store) = create_test_store();
    let episode_id = EpisodeId::new();

    let dir = store
        .ensure_dir(episode_id, MediaDir::Preprocessed)
        .await
        .unwrap();
    std::fs::write(dir.join("ep1-bob.wav"), b"b").unwrap();
    std::fs::write(dir.join("ep1-alice.wav"), b"a").unwrap();
    std::fs::write(dir.join("ep1-alice.srt"), b"s").unwrap();

    let wavs = store
        .list(episode_id, MediaDir::Preprocessed, Some("wav"))
        .await
        .unwrap();
    assert_eq!(wavs, vec!["ep1-alice.wav", "ep1-bob.wav"]);

    let all = store
        .list(episode_id, MediaDir::Preprocessed, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn given_missing_directory_when_listing_then_returns_empty() {
    let (_dir, store) = create_test_store();

    let listed = store
        .list(EpisodeId::new(), MediaDir::Postprocessed, Some("wav"))
        .await
        .unwrap();

    assert!(listed.is_empty());
}

#[tokio::test]
async fn given_traversal_filename_when_saving_then_rejected() {
    let (_dir, store) = create_test_store();

    let result = store
        .save_source(EpisodeId::new(), "../escape.wav", b"x")
        .await;

    assert!(matches!(result, Err(MediaStoreError::UnsafeFilename(_))));
}

#[tokio::test]
async fn given_traversal_filename_when_reading_then_rejected() {
    let (_dir, store) = create_test_store();

    let result = store
        .read(EpisodeId::new(), MediaDir::Source, "../../etc/passwd")
        .await;

    assert!(matches!(result, Err(MediaStoreError::UnsafeFilename(_))));
}

#[tokio::test]
async fn given_missing_file_when_reading_then_not_found() {
    let (_dir, store) = create_test_store();

    let result = store
        .read(EpisodeId::new(), MediaDir::Source, "missing.wav")
        .await;

    assert!(matches!(result, Err(MediaStoreError::NotFound(_))));
}

#[tokio::test]
async fn given_stored_files_when_deleting_episode_then_subtree_is_removed() {
    let (dir, store) = create_test_store();
    let episode_id = EpisodeId::new();

    store
        .save_source(episode_id, "ep1-alice.wav", b"audio")
        .await
        .unwrap();
    store
        .ensure_dir(episode_id, MediaDir::Preprocessed)
        .await
        .unwrap();

    let episode_root = dir.path().join("episodes").join(episode_id.to_string());
    assert!(episode_root.exists());

    store.delete_episode(episode_id).await.unwrap();

    assert!(!episode_root.exists());
}

#[tokio::test]
async fn given_unknown_episode_when_deleting_then_succeeds_quietly() {
    let (_dir, store) = create_test_store();

    store.delete_episode(EpisodeId::new()).await.unwrap();
}
