use shop_portal::storage::{
    LocalDiskStorage, MockStorageService, StorageService, sanitize_filename,
};
use tokio::test;
use uuid::Uuid;

// --- Filename sanitization ---

#[test]
async fn sanitize_strips_directory_navigation() {
    assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_filename("photos/2024/cat.jpg"), "cat.jpg");
    assert_eq!(sanitize_filename("..\\..\\boot.ini"), "boot.ini");
}

#[test]
async fn sanitize_replaces_unsafe_characters() {
    assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
    assert_eq!(sanitize_filename("naïve.jpg"), "na_ve.jpg");
}

#[test]
async fn sanitize_never_yields_an_empty_name() {
    assert_eq!(sanitize_filename(""), "upload");
    assert_eq!(sanitize_filename("../.."), "upload");
    assert_eq!(sanitize_filename("..."), "upload");
}

// --- Disk storage ---

#[test]
async fn disk_storage_writes_into_the_upload_dir() {
    let dir = std::env::temp_dir().join(format!("shop-portal-test-{}", Uuid::new_v4()));
    let storage = LocalDiskStorage::new(dir.clone());
    storage.ensure_upload_dir().await.expect("create dir");

    let stored = storage
        .save_photo("lamp.png", b"image-bytes")
        .await
        .expect("save");
    assert_eq!(stored, "lamp.png");

    let on_disk = tokio::fs::read(dir.join("lamp.png")).await.expect("read");
    assert_eq!(on_disk, b"image-bytes");

    // Collisions are last write wins.
    storage
        .save_photo("lamp.png", b"newer-bytes")
        .await
        .expect("save again");
    let replaced = tokio::fs::read(dir.join("lamp.png")).await.expect("read");
    assert_eq!(replaced, b"newer-bytes");

    tokio::fs::remove_dir_all(dir).await.expect("cleanup");
}

// --- Mock storage ---

#[test]
async fn mock_storage_records_saves_and_can_fail() {
    let mock = MockStorageService::new();
    mock.save_photo("a b.png", b"x").await.expect("save");
    assert_eq!(mock.saved_files(), vec!["a_b.png".to_string()]);

    let failing = MockStorageService::new_failing();
    assert!(failing.save_photo("a.png", b"x").await.is_err());
}
