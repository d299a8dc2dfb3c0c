use manifold_indexer::{IndexerConfig, RepoIndexer, RepoWatcher, WatcherConfig};
use manifold_store::{MemoryStore, StoreConfig, StoreError, StructuralIndex};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

const SETTLE_BUDGET: Duration = Duration::from_secs(10);

fn setup(root: &Path) -> (Arc<StructuralIndex>, Arc<RepoIndexer>) {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    let indexer = Arc::new(
        RepoIndexer::new(root, index.clone(), IndexerConfig::default()).unwrap(),
    );
    (index, indexer)
}

async fn wait_until<F, Fut>(mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + SETTLE_BUDGET;
    while tokio::time::Instant::now() < deadline {
        if probe().await {
            return true;
        }
        sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test]
async fn new_files_appear_in_the_index() {
    let dir = TempDir::new().unwrap();
    let (index, indexer) = setup(dir.path());
    let watcher = RepoWatcher::start(indexer, WatcherConfig::default()).unwrap();

    let body: Vec<u8> = b"watched content line\n"
        .iter()
        .copied()
        .cycle()
        .take(400)
        .collect();
    tokio::fs::write(dir.path().join("foo.txt"), &body)
        .await
        .unwrap();

    let index_probe = index.clone();
    let appeared = wait_until(move || {
        let index = index_probe.clone();
        async move { index.get_body("foo.txt").await.is_ok() }
    })
    .await;
    assert!(appeared, "foo.txt never showed up in the index");
    assert_eq!(index.get_body("foo.txt").await.unwrap(), body);

    watcher.stop().await;
}

#[tokio::test]
async fn deletions_evict_the_record() {
    let dir = TempDir::new().unwrap();
    let (index, indexer) = setup(dir.path());

    let watcher = RepoWatcher::start(indexer, WatcherConfig::default()).unwrap();

    let target = dir.path().join("doomed.txt");
    tokio::fs::write(&target, vec![b'z'; 512]).await.unwrap();

    // Wait for the create to land first so the delete has a target.
    let index_probe = index.clone();
    assert!(
        wait_until(move || {
            let index = index_probe.clone();
            async move { index.get_body("doomed.txt").await.is_ok() }
        })
        .await
    );

    tokio::fs::remove_file(&target).await.unwrap();

    let index_probe = index.clone();
    let evicted = wait_until(move || {
        let index = index_probe.clone();
        async move {
            matches!(
                index.get_body("doomed.txt").await,
                Err(StoreError::NotFound(_))
            )
        }
    })
    .await;
    assert!(evicted, "doomed.txt survived deletion");

    watcher.stop().await;
}

#[tokio::test]
async fn rewrites_replace_the_body() {
    let dir = TempDir::new().unwrap();
    let (index, indexer) = setup(dir.path());
    let watcher = RepoWatcher::start(indexer, WatcherConfig::default()).unwrap();

    let target = dir.path().join("mut.txt");
    tokio::fs::write(&target, vec![b'a'; 256]).await.unwrap();

    let index_probe = index.clone();
    assert!(
        wait_until(move || {
            let index = index_probe.clone();
            async move { index.get_body("mut.txt").await.is_ok() }
        })
        .await
    );

    tokio::fs::write(&target, vec![b'b'; 512]).await.unwrap();

    let index_probe = index.clone();
    let replaced = wait_until(move || {
        let index = index_probe.clone();
        async move {
            index
                .get_body("mut.txt")
                .await
                .map(|body| body == vec![b'b'; 512])
                .unwrap_or(false)
        }
    })
    .await;
    assert!(replaced, "rewrite never reached the index");

    watcher.stop().await;
}
