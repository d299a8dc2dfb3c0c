use manifold_chaos::{ChaosAnalyzer, ChaosConfig};
use manifold_encoder::{EncoderConfig, ManifoldEncoder};
use manifold_store::{
    FileRecord, MemoryStore, Scope, StoreConfig, StoreError, StructuralIndex,
};
use std::sync::Arc;

fn encoder() -> ManifoldEncoder {
    ManifoldEncoder::new(EncoderConfig::default())
}

fn index_over(store: Arc<MemoryStore>) -> StructuralIndex {
    StructuralIndex::new(store, StoreConfig::default())
}

fn text_record(path: &str, body: &[u8]) -> FileRecord {
    let encoded = encoder().encode(body).unwrap();
    let chaos = ChaosAnalyzer::new(ChaosConfig::default())
        .analyze(&encoded.windows)
        .ok();
    FileRecord::text(path, body.to_vec(), 1_700_000_000, &encoded, chaos)
}

fn sample_body(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(31).wrapping_add(u32::from(seed)) as u8)
        .collect()
}

#[tokio::test]
async fn round_trip_by_path() {
    let index = index_over(Arc::new(MemoryStore::new()));
    let body: Vec<u8> = b"abc".iter().copied().cycle().take(3000).collect();
    let record = text_record("file", &body);
    let expected_sig = record.signature.unwrap();

    index.put_file(&record).await.unwrap();

    assert_eq!(index.get_body("file").await.unwrap(), body);
    assert_eq!(index.get_signature("file").await.unwrap(), expected_sig);
    let chaos = index.get_chaos("file").await.unwrap();
    assert_eq!(chaos.windows_analyzed, 63);
}

#[tokio::test]
async fn missing_paths_are_not_found() {
    let index = index_over(Arc::new(MemoryStore::new()));
    assert!(matches!(
        index.get_file("nope").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        index.get_signature("nope").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn signature_index_stays_consistent() {
    let index = index_over(Arc::new(MemoryStore::new()));
    for (path, seed) in [("a.rs", 1), ("b.rs", 2), ("c.rs", 3)] {
        index
            .put_file(&text_record(path, &sample_body(seed, 2000)))
            .await
            .unwrap();
    }

    // Every path with a signature appears under exactly that signature,
    // and every indexed path resolves back to the same signature.
    for path in index.list_files().await.unwrap() {
        let sig = index.get_signature(&path).await.unwrap();
        let neighbors = index.neighbors(&sig.to_string(), 0.0, "*", 100).await.unwrap();
        assert!(
            neighbors.iter().any(|n| n.path == path),
            "{path} missing from its own signature bucket"
        );
        for neighbor in neighbors.iter().filter(|n| n.distance == 0.0) {
            assert_eq!(
                index.get_signature(&neighbor.path).await.unwrap(),
                sig,
                "stale sigidx entry for {}",
                neighbor.path
            );
        }
    }
}

#[tokio::test]
async fn replacing_a_body_moves_its_signature_bucket() {
    let index = index_over(Arc::new(MemoryStore::new()));
    let first = text_record("f.rs", &sample_body(1, 2000));
    let old_sig = first.signature.unwrap().to_string();
    index.put_file(&first).await.unwrap();

    let second = text_record("f.rs", &vec![0u8; 2000]);
    let new_sig = second.signature.unwrap().to_string();
    assert_ne!(old_sig, new_sig);
    index.put_file(&second).await.unwrap();

    let stale = index.neighbors(&old_sig, 0.0, "*", 10).await.unwrap();
    assert!(stale.iter().all(|n| n.path != "f.rs"));
    let fresh = index.neighbors(&new_sig, 0.0, "*", 10).await.unwrap();
    assert!(fresh.iter().any(|n| n.path == "f.rs"));
}

#[tokio::test]
async fn deletion_removes_every_trace() {
    let store = Arc::new(MemoryStore::new());
    let index = index_over(store.clone());
    index
        .put_file(&text_record("doomed.rs", &sample_body(7, 1500)))
        .await
        .unwrap();
    index.delete_file("doomed.rs").await.unwrap();

    assert!(matches!(
        index.get_file("doomed.rs").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(index.list_files().await.unwrap().is_empty());

    // No key in any family may still mention the path.
    let dump = store.dump().await;
    for key in dump
        .strings
        .keys()
        .chain(dump.hashes.keys())
        .chain(dump.sets.keys())
    {
        assert!(!key.contains("doomed.rs"), "dangling key {key}");
    }
    for (key, members) in &dump.sets {
        assert!(
            !members.contains("doomed.rs"),
            "dangling member in {key}"
        );
    }
}

#[tokio::test]
async fn repeated_put_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let index = index_over(store.clone());
    let record = text_record("same.rs", &sample_body(9, 2500));

    index.put_file(&record).await.unwrap();
    let first = store.dump().await;
    index.put_file(&record).await.unwrap();
    let second = store.dump().await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn neighborhood_is_symmetric_and_ranked() {
    let index = index_over(Arc::new(MemoryStore::new()));
    let body_a = sample_body(4, 4096);
    let mut body_b = body_a.clone();
    let last = body_b.len() - 1;
    body_b[last] ^= 0x01;

    let rec_a = text_record("pair_a.rs", &body_a);
    let rec_b = text_record("pair_b.rs", &body_b);
    let sig_a = rec_a.signature.unwrap();
    let sig_b = rec_b.signature.unwrap();
    index.put_file(&rec_a).await.unwrap();
    index.put_file(&rec_b).await.unwrap();

    let around_a = index
        .neighbors(&sig_a.to_string(), 0.05, "*", 10)
        .await
        .unwrap();
    let paths_a: Vec<&str> = around_a.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths_a, vec!["pair_a.rs", "pair_b.rs"]);
    assert!(around_a[1].distance <= 0.02);

    // Symmetry: if b is in a's neighborhood, a is in b's.
    let around_b = index
        .neighbors(&sig_b.to_string(), 0.05, "*", 10)
        .await
        .unwrap();
    assert!(around_b.iter().any(|n| n.path == "pair_a.rs"));
}

#[tokio::test]
async fn neighbors_rejects_malformed_signature() {
    let index = index_over(Arc::new(MemoryStore::new()));
    assert!(matches!(
        index.neighbors("c0.5_bogus", 0.05, "*", 10).await,
        Err(StoreError::InvalidSignature(_))
    ));
}

#[tokio::test]
async fn list_paths_applies_glob_and_surfaces_facts() {
    let index = index_over(Arc::new(MemoryStore::new()));
    index
        .put_file(&text_record("src/lib.rs", &sample_body(1, 1000)))
        .await
        .unwrap();
    index
        .put_file(&text_record("src/deep/mod.rs", &sample_body(2, 1000)))
        .await
        .unwrap();
    index
        .put_file(&text_record("README.md", &sample_body(3, 1000)))
        .await
        .unwrap();
    index.put_fact("arch-note", "the store is valkey").await.unwrap();

    let all = index.list_paths("*").await.unwrap();
    assert_eq!(
        all,
        vec!["README.md", "__fact__/arch-note", "src/deep/mod.rs", "src/lib.rs"]
    );

    let rs_only = index.list_paths("src/*.rs").await.unwrap();
    assert_eq!(rs_only, vec!["src/lib.rs"]);

    let recursive = index.list_paths("src/**").await.unwrap();
    assert_eq!(recursive, vec!["src/deep/mod.rs", "src/lib.rs"]);

    assert!(matches!(
        index.list_paths("src/[oops").await,
        Err(StoreError::InvalidGlob { .. })
    ));
}

#[tokio::test]
async fn facts_resolve_through_get_body_and_delete_cleanly() {
    let index = index_over(Arc::new(MemoryStore::new()));
    index.put_fact("note", "remember the debounce").await.unwrap();

    let body = index.get_body("__fact__/note").await.unwrap();
    assert_eq!(body, b"remember the debounce");

    index.delete_fact("note").await.unwrap();
    assert!(matches!(
        index.get_body("__fact__/note").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(index.list_paths("*").await.unwrap().is_empty());
}

#[tokio::test]
async fn chaos_ranking_is_stable_across_runs() {
    let index = index_over(Arc::new(MemoryStore::new()));
    for (path, seed) in [("x.rs", 11), ("y.rs", 12), ("z.rs", 13), ("w.rs", 14)] {
        index
            .put_file(&text_record(path, &sample_body(seed, 3000)))
            .await
            .unwrap();
    }

    let first = index.rank_by_chaos("*", 20, true).await.unwrap();
    let second = index.rank_by_chaos("*", 20, true).await.unwrap();
    let order_a: Vec<&str> = first.iter().map(|(p, _)| p.as_str()).collect();
    let order_b: Vec<&str> = second.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(order_a, order_b);
    assert_eq!(order_a.len(), 4);

    for pair in first.windows(2) {
        assert!(pair[0].1.chaos_score >= pair[1].1.chaos_score);
    }
}

#[tokio::test]
async fn clear_wipes_the_namespace() {
    let store = Arc::new(MemoryStore::new());
    let index = index_over(store.clone());
    index
        .put_file(&text_record("a.rs", &sample_body(5, 1200)))
        .await
        .unwrap();
    index.put_fact("f", "text").await.unwrap();
    index.set_ingest_meta(b"{}").await.unwrap();

    index.clear().await.unwrap();

    let dump = store.dump().await;
    assert!(dump.strings.is_empty(), "strings left: {:?}", dump.strings.keys());
    assert!(dump.sets.is_empty(), "sets left: {:?}", dump.sets.keys());
    assert!(dump.hashes.is_empty(), "hashes left: {:?}", dump.hashes.keys());
}

#[tokio::test]
async fn window_signature_lookup_finds_the_holder() {
    let index = index_over(Arc::new(MemoryStore::new()));
    let record = text_record("holder.rs", &sample_body(21, 2000));
    let winsig = record.meta.window_signatures[0].clone();
    index.put_file(&record).await.unwrap();

    let holders = index.paths_with_window_signature(&winsig).await.unwrap();
    assert_eq!(holders, vec!["holder.rs"]);

    index.delete_file("holder.rs").await.unwrap();
    assert!(index
        .paths_with_window_signature(&winsig)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn stats_count_each_family() {
    let index = index_over(Arc::new(MemoryStore::new()));
    index
        .put_file(&text_record("t.rs", &sample_body(2, 1000)))
        .await
        .unwrap();
    index
        .put_file(&FileRecord::opaque("blob.bin", vec![0, 159, 146, 150], 1_700_000_000, false))
        .await
        .unwrap();
    index.put_fact("f1", "x").await.unwrap();

    let stats = index.stats().await.unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.signatures, 1);
    assert_eq!(stats.chaos_profiles, 1);
    assert_eq!(stats.facts, 1);
}

#[test]
fn scope_single_char_wildcard() {
    let scope = Scope::parse("docs/ch?.md").unwrap();
    assert!(scope.matches("docs/ch1.md"));
    assert!(!scope.matches("docs/chapter.md"));
}
