use manifold_chaos::{ChaosAnalyzer, ChaosConfig, SymbolicState};
use manifold_encoder::{EncoderConfig, ManifoldEncoder};
use manifold_query::{QueryConfig, QueryError, QuerySurface};
use manifold_store::{FileRecord, MemoryStore, StoreConfig, StructuralIndex};
use std::sync::Arc;

fn encoder() -> ManifoldEncoder {
    ManifoldEncoder::new(EncoderConfig::default())
}

async fn put_text(index: &StructuralIndex, path: &str, body: &[u8]) {
    // Bodies below one window are indexed without a signature, the same
    // way the ingestion coordinator stores them.
    let record = match encoder().encode(body) {
        Ok(encoded) => {
            let chaos = ChaosAnalyzer::new(ChaosConfig::default())
                .analyze(&encoded.windows)
                .ok();
            FileRecord::text(path, body.to_vec(), 1_700_000_000, &encoded, chaos)
        }
        Err(_) => FileRecord::opaque(path, body.to_vec(), 1_700_000_000, true),
    };
    index.put_file(&record).await.unwrap();
}

fn surface_over(index: Arc<StructuralIndex>) -> QuerySurface {
    QuerySurface::new(
        index,
        EncoderConfig::default(),
        ChaosConfig::default(),
        QueryConfig::default(),
    )
}

fn code_body(marker: &str, len: usize) -> Vec<u8> {
    format!("fn {marker}(input: &[u8]) -> usize {{ input.iter().map(|b| *b as usize).sum() }}\n")
        .into_bytes()
        .into_iter()
        .cycle()
        .take(len)
        .collect()
}

#[tokio::test]
async fn search_finds_matches_with_context() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    let body = b"line one\nline two\nthe needle sits here\nline four\nline five\n";
    put_text(&index, "src/haystack.rs", body).await;
    put_text(&index, "src/other.rs", b"nothing interesting at all in this file\n").await;

    let surface = surface_over(index);
    let outcome = surface
        .search_substring("needle", "*", false, 10)
        .await
        .unwrap();

    assert_eq!(outcome.hits.len(), 1);
    assert_eq!(outcome.files_scanned, 2);
    let hit = &outcome.hits[0];
    assert_eq!(hit.path, "src/haystack.rs");
    assert_eq!(hit.match_count, 1);
    let numbers: Vec<usize> = hit.context.iter().map(|l| l.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn search_scope_and_regex_mode() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    put_text(&index, "src/a.rs", b"fn alpha_handler() {}\n").await;
    put_text(&index, "docs/a.md", b"fn alpha_handler() {}\n").await;

    let surface = surface_over(index);
    let scoped = surface
        .search_substring(r"fn \w+_handler", "src/**", true, 10)
        .await
        .unwrap();
    assert_eq!(scoped.hits.len(), 1);
    assert_eq!(scoped.hits[0].path, "src/a.rs");

    assert!(matches!(
        surface.search_substring("broken(regex", "*", false, 10).await,
        Err(QueryError::InvalidRegex { .. })
    ));
}

#[tokio::test]
async fn search_covers_fact_records() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    index
        .put_fact("deploy-note", "the canary cluster drains before rollout")
        .await
        .unwrap();

    let surface = surface_over(index);
    let outcome = surface
        .search_substring("canary", "*", false, 10)
        .await
        .unwrap();
    assert_eq!(outcome.hits.len(), 1);
    assert_eq!(outcome.hits[0].path, "__fact__/deploy-note");
}

#[tokio::test]
async fn verify_exact_subset_reaches_full_coverage() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    let body = code_body("fold_rows", 2048);
    put_text(&index, "src/fold.rs", &body).await;
    put_text(&index, "src/unrelated.rs", &code_body("other_thing", 1024)).await;

    let surface = surface_over(index);
    let report = surface
        .verify_snippet(std::str::from_utf8(&body).unwrap(), 1.0, "*")
        .await
        .unwrap();

    assert!(report.verified);
    assert_eq!(report.safe_coverage, 1.0);
    assert_eq!(report.raw_match_ratio, 1.0);
    assert!(report
        .matched_documents
        .contains(&"src/fold.rs".to_string()));
}

#[tokio::test]
async fn verify_half_threshold_on_long_indexed_body() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    // Body at least two windows long, exactly as indexed.
    let body = code_body("stream_windows", 160);
    put_text(&index, "src/stream.rs", &body).await;

    let surface = surface_over(index);
    let report = surface
        .verify_snippet(std::str::from_utf8(&body).unwrap(), 0.5, "*")
        .await
        .unwrap();
    assert!(report.total_windows >= 2);
    assert!(report.verified);
    assert!(report.safe_coverage >= 0.5);
}

#[tokio::test]
async fn verify_rejects_foreign_snippets() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    put_text(&index, "src/base.rs", &code_body("base", 1024)).await;

    // Random-ish binary-looking text shares no structure with the corpus.
    let foreign: String = (0u32..1024)
        .map(|i| char::from((i.wrapping_mul(37) % 94 + 33) as u8))
        .collect();

    let surface = surface_over(index);
    let report = surface.verify_snippet(&foreign, 0.9, "*").await.unwrap();
    assert!(!report.verified);
}

#[tokio::test]
async fn verify_snippet_below_one_window_is_rejected() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    let surface = surface_over(index);
    assert!(matches!(
        surface.verify_snippet("tiny", 0.5, "*").await,
        Err(QueryError::SnippetTooSmall { .. })
    ));
}

#[tokio::test]
async fn clustering_groups_structural_lookalikes() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    // Two structural families: repetitive source text and flat bytes.
    for i in 0..4 {
        put_text(&index, &format!("src/code{i}.rs"), &code_body("walk", 2000)).await;
    }
    for i in 0..4 {
        put_text(&index, &format!("data/flat{i}.txt"), &vec![b'.'; 2000]).await;
    }

    let surface = surface_over(index);
    let report = surface.cluster("*", 2).await.unwrap();

    assert_eq!(report.files, 8);
    assert_eq!(report.clusters.len(), 2);
    for cluster in &report.clusters {
        let from_src = cluster
            .members
            .iter()
            .filter(|m| m.path.starts_with("src/"))
            .count();
        // Each cluster is homogeneous: all src or all data.
        assert!(from_src == 0 || from_src == cluster.members.len());
        assert!(!cluster.label.is_empty());
    }
}

#[tokio::test]
async fn clustering_is_deterministic_for_a_fixed_seed() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    for i in 0..6 {
        let body: Vec<u8> = (0u32..1800)
            .map(|j| (j.wrapping_mul(11 + i) % 94 + 32) as u8)
            .collect();
        put_text(&index, &format!("f{i}.src"), &body).await;
    }

    let surface = surface_over(index.clone());
    let a = surface.cluster("*", 3).await.unwrap();
    let b = surface.cluster("*", 3).await.unwrap();

    let shape = |report: &manifold_query::ClusterReport| -> Vec<Vec<String>> {
        report
            .clusters
            .iter()
            .map(|c| c.members.iter().map(|m| m.path.clone()).collect())
            .collect()
    };
    assert_eq!(shape(&a), shape(&b));
}

#[tokio::test]
async fn empty_scope_cannot_be_clustered() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    let surface = surface_over(index);
    assert!(matches!(
        surface.cluster("*", 3).await,
        Err(QueryError::EmptyScope(_))
    ));
}

#[tokio::test]
async fn chaos_report_and_outlook_band_scores() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    put_text(&index, "calm.txt", &vec![b'x'; 1024]).await;

    let surface = surface_over(index);
    let report = surface.chaos_report("calm.txt").await.unwrap();
    assert_eq!(report.profile.chaos_score, 0.0);

    let outlook = surface.stability_outlook("calm.txt").await.unwrap();
    assert_eq!(outlook.state, SymbolicState::LowFluctuation);
}

#[tokio::test]
async fn neighbor_passthrough_uses_default_tolerance() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    let body = code_body("anchor", 3000);
    put_text(&index, "anchor.rs", &body).await;
    let sig = index.get_signature("anchor.rs").await.unwrap();

    let surface = surface_over(index);
    let neighbors = surface
        .neighbors(&sig.to_string(), "*", 10)
        .await
        .unwrap();
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].path, "anchor.rs");
    assert_eq!(neighbors[0].distance, 0.0);
}
