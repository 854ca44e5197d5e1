// End-to-end synchronisation runs against a mock remote and a real in-memory
// store: reconcile → bounded fetch pool → publish, plus the invariants the
// published manifests must honour.

use vault_mirror_core::config::SyncConfig;
use vault_mirror_core::contract::{ContentStore, EntryKind, MockRemoteRepository, TreeEntry};
use vault_mirror_core::manifest::{
    article_content_key, image_content_key, ArticleManifest, ImageManifest,
    ARTICLE_MANIFEST_KEY, IMAGE_MANIFEST_KEY,
};
use vault_mirror_core::pipeline::ProcessorKind;
use vault_mirror_core::publish::Publisher;
use vault_mirror_core::store::MemoryStore;
use vault_mirror_core::synchronise::synchronise;

fn blob(path: &str, hash: &str) -> TreeEntry {
    TreeEntry {
        path: path.to_string(),
        content_hash: hash.to_string(),
        kind: EntryKind::Blob,
    }
}

fn config() -> SyncConfig {
    SyncConfig {
        processor: ProcessorKind::Raw,
        ..SyncConfig::default()
    }
}

async fn read_article_manifest(store: &MemoryStore) -> ArticleManifest {
    let bytes = store
        .get(ARTICLE_MANIFEST_KEY)
        .await
        .expect("store read should succeed")
        .expect("article manifest must be published");
    serde_json::from_slice(&bytes).expect("manifest must deserialize")
}

async fn read_image_manifest(store: &MemoryStore) -> ImageManifest {
    let bytes = store
        .get(IMAGE_MANIFEST_KEY)
        .await
        .expect("store read should succeed")
        .expect("image manifest must be published");
    serde_json::from_slice(&bytes).expect("manifest must deserialize")
}

#[tokio::test]
async fn first_run_fetches_everything_and_publishes_consistent_manifests() {
    let mut remote = MockRemoteRepository::new();
    remote.expect_list_tree().return_once(|_| {
        Ok(vec![
            blob("Article/First Post.md", "A1"),
            blob("Article/Second Post.md", "A2"),
            blob("Attachment/photo one.png", "I1"),
            blob("Article/notes.txt", "X1"),
            blob("README.md", "X2"),
        ])
    });
    remote.expect_fetch_raw().times(3).returning(|path| {
        if path.ends_with(".png") {
            Ok(vec![0x89, 0x50])
        } else {
            Ok(format!("content of {path}").into_bytes())
        }
    });

    let store = MemoryStore::new();
    let publisher = Publisher::new();
    let report = synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("first run should succeed");

    assert_eq!(report.articles.total, 2);
    assert_eq!(report.articles.fetched, 2);
    assert_eq!(report.articles.unchanged, 0);
    assert_eq!(report.articles.failed, 0);
    assert_eq!(report.images.total, 1);
    assert_eq!(report.images.fetched, 1);

    // Write-before-publish: every published entry resolves to stored content.
    let manifest = read_article_manifest(&store).await;
    for info in &manifest.articles {
        let content = store
            .get(&article_content_key(&info.content_hash))
            .await
            .unwrap();
        assert!(
            content.is_some(),
            "published entry '{}' must have persisted content",
            info.slug
        );
    }
    let images = read_image_manifest(&store).await;
    assert_eq!(images.images[0].name, "photo-one.png");
    assert!(store
        .get(&image_content_key("photo-one.png"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn second_run_against_unchanged_tree_fetches_nothing() {
    let tree = vec![blob("Article/Post.md", "A1")];

    let mut remote = MockRemoteRepository::new();
    let first_tree = tree.clone();
    remote
        .expect_list_tree()
        .return_once(move |_| Ok(first_tree));
    remote
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(b"hello".to_vec()));

    let store = MemoryStore::new();
    let publisher = Publisher::new();
    synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("first run should succeed");
    let first_manifest = read_article_manifest(&store).await;

    // Fresh mock for the second run: listing only, zero fetches allowed.
    let mut remote = MockRemoteRepository::new();
    remote.expect_list_tree().return_once(move |_| Ok(tree));
    remote.expect_fetch_raw().times(0);

    let report = synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("second run should succeed");

    assert_eq!(report.articles.fetched, 0, "idempotent run fetches nothing");
    assert_eq!(report.articles.unchanged, 1);
    assert_eq!(report.articles.deleted, 0);

    let second_manifest = read_article_manifest(&store).await;
    assert_eq!(
        second_manifest.articles, first_manifest.articles,
        "entries must be identical modulo last_update"
    );
    assert!(second_manifest.last_update >= first_manifest.last_update);
}

#[tokio::test]
async fn known_hash_is_carried_forward_and_new_file_is_fetched() {
    let mut remote = MockRemoteRepository::new();
    remote
        .expect_list_tree()
        .return_once(|_| Ok(vec![blob("Article/a.md", "H1")]));
    remote
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(b"original a".to_vec()));

    let store = MemoryStore::new();
    let publisher = Publisher::new();
    synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("seeding run should succeed");

    let mut remote = MockRemoteRepository::new();
    remote.expect_list_tree().return_once(|_| {
        Ok(vec![blob("Article/a.md", "H1"), blob("Article/b.md", "H2")])
    });
    remote
        .expect_fetch_raw()
        .withf(|path| path == "Article/b.md")
        .times(1)
        .returning(|_| Ok(b"brand new b".to_vec()));

    let report = synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("incremental run should succeed");

    assert_eq!(report.articles.total, 2);
    assert_eq!(report.articles.unchanged, 1);
    assert_eq!(report.articles.fetched, 1);
    assert_eq!(report.articles.deleted, 0);

    // a's cached content is untouched, b's is persisted.
    assert_eq!(
        store.get(&article_content_key("H1")).await.unwrap().unwrap(),
        b"original a".to_vec()
    );
    assert_eq!(
        store.get(&article_content_key("H2")).await.unwrap().unwrap(),
        b"brand new b".to_vec()
    );
}

#[tokio::test]
async fn emptied_remote_prunes_manifest_and_cached_content() {
    let mut remote = MockRemoteRepository::new();
    remote
        .expect_list_tree()
        .return_once(|_| Ok(vec![blob("Article/a.md", "H1")]));
    remote
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(b"doomed".to_vec()));

    let store = MemoryStore::new();
    let publisher = Publisher::new();
    synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("seeding run should succeed");
    assert!(store.get(&article_content_key("H1")).await.unwrap().is_some());

    let mut remote = MockRemoteRepository::new();
    remote.expect_list_tree().return_once(|_| Ok(vec![]));
    remote.expect_fetch_raw().times(0);

    let report = synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("deletion run should succeed");

    assert_eq!(report.articles.total, 0);
    assert_eq!(report.articles.deleted, 1);
    let manifest = read_article_manifest(&store).await;
    assert!(manifest.articles.is_empty(), "manifest must end up empty");
    assert!(
        store.get(&article_content_key("H1")).await.unwrap().is_none(),
        "deleted entry's cached content must be removed"
    );
}

#[tokio::test]
async fn single_file_failure_is_skipped_without_aborting_the_run() {
    let mut remote = MockRemoteRepository::new();
    remote.expect_list_tree().return_once(|_| {
        Ok(vec![
            blob("Article/good.md", "G1"),
            blob("Article/bad.md", "B1"),
        ])
    });
    remote.expect_fetch_raw().times(2).returning(|path| {
        if path == "Article/bad.md" {
            Err("transient network failure".into())
        } else {
            Ok(b"fine".to_vec())
        }
    });

    let store = MemoryStore::new();
    let publisher = Publisher::new();
    let report = synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("run must survive a single file failure");

    assert_eq!(report.articles.fetched, 1);
    assert_eq!(report.articles.failed, 1);
    assert_eq!(report.articles.total, 1);

    let manifest = read_article_manifest(&store).await;
    assert_eq!(manifest.articles.len(), 1);
    assert_eq!(
        manifest.articles[0].source_path, "Article/good.md",
        "the failed file must not appear in the manifest"
    );
}

#[tokio::test]
async fn failed_tree_listing_leaves_previous_manifest_intact() {
    let mut remote = MockRemoteRepository::new();
    remote
        .expect_list_tree()
        .return_once(|_| Ok(vec![blob("Article/a.md", "H1")]));
    remote
        .expect_fetch_raw()
        .returning(|_| Ok(b"survivor".to_vec()));

    let store = MemoryStore::new();
    let publisher = Publisher::new();
    synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("seeding run should succeed");
    let before = read_article_manifest(&store).await;

    let mut remote = MockRemoteRepository::new();
    remote
        .expect_list_tree()
        .return_once(|_| Err("remote is down".into()));

    let result = synchronise(&config(), &remote, &store, &publisher).await;
    assert!(result.is_err(), "a failed listing is fatal to the run");

    let after = read_article_manifest(&store).await;
    assert_eq!(
        after, before,
        "an aborted run must leave the previous manifest untouched"
    );
}

#[tokio::test]
async fn malformed_stored_manifest_is_rebuilt_from_scratch() {
    let store = MemoryStore::new();
    store
        .set(ARTICLE_MANIFEST_KEY, b"this is not json".to_vec())
        .await
        .unwrap();

    let mut remote = MockRemoteRepository::new();
    remote
        .expect_list_tree()
        .return_once(|_| Ok(vec![blob("Article/a.md", "H1")]));
    remote
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(b"rebuilt".to_vec()));

    let publisher = Publisher::new();
    let report = synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("a malformed manifest must not fail the run");

    assert_eq!(report.articles.fetched, 1, "everything is re-fetched");
    let manifest = read_article_manifest(&store).await;
    assert_eq!(manifest.articles.len(), 1);
}

#[tokio::test]
async fn hash_identity_shared_hash_means_shared_content() {
    // Two remote paths with the same blob hash: fetched once, one manifest
    // entry, one cached blob.
    let mut remote = MockRemoteRepository::new();
    remote.expect_list_tree().return_once(|_| {
        Ok(vec![
            blob("Article/a.md", "SAME"),
            blob("Article/a-copy.md", "SAME"),
        ])
    });
    remote
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(b"shared bytes".to_vec()));

    let store = MemoryStore::new();
    let publisher = Publisher::new();
    let report = synchronise(&config(), &remote, &store, &publisher)
        .await
        .expect("run should succeed");

    assert_eq!(report.articles.fetched, 1);
    let manifest = read_article_manifest(&store).await;
    assert_eq!(manifest.articles.len(), 1);
    assert_eq!(
        store
            .get(&article_content_key("SAME"))
            .await
            .unwrap()
            .unwrap(),
        b"shared bytes".to_vec()
    );
}
