use manifold_encoder::{EncoderConfig, ManifoldEncoder};
use manifold_graph::{GraphConfig, GraphHandle, LineImportExtractor};
use manifold_store::{FileRecord, MemoryStore, StoreConfig, StructuralIndex};
use std::sync::Arc;

fn pad_to_window(source: &str) -> Vec<u8> {
    let mut body = source.as_bytes().to_vec();
    while body.len() < 64 {
        body.push(b'\n');
    }
    body
}

async fn put_source(index: &StructuralIndex, path: &str, source: &str) {
    let body = pad_to_window(source);
    let encoded = ManifoldEncoder::new(EncoderConfig::default())
        .encode(&body)
        .unwrap();
    let record = FileRecord::text(path, body, 1_700_000_000, &encoded, None);
    index.put_file(&record).await.unwrap();
}

fn handle_over(index: Arc<StructuralIndex>) -> GraphHandle {
    GraphHandle::new(
        index,
        Arc::new(LineImportExtractor::new()),
        GraphConfig::default(),
    )
}

#[tokio::test]
async fn builds_edges_from_python_imports() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    put_source(&index, "pkg/util.py", "def helper():\n    return 1\n").await;
    put_source(&index, "pkg/service.py", "from pkg.util import helper\n").await;
    put_source(&index, "main.py", "import pkg.service\n").await;

    let handle = handle_over(index);
    let blast = handle.blast_radius("pkg/util.py").await.unwrap();
    assert_eq!(blast.size, 2);
    assert!(blast.imported_by.contains("pkg/service.py"));
    assert!(blast.imported_by.contains("main.py"));

    let imports = handle.imports("pkg/service.py").await.unwrap();
    assert!(imports.contains("pkg/util.py"));
}

#[tokio::test]
async fn snapshot_is_invalidated_by_index_mutations() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    put_source(&index, "base.py", "VALUE = 1\n").await;
    put_source(&index, "user.py", "from base import VALUE\n").await;

    let handle = handle_over(index.clone());
    assert_eq!(handle.blast_radius("base.py").await.unwrap().size, 1);

    // A new importer lands; the next query must see it.
    put_source(&index, "late.py", "import base\n").await;
    assert_eq!(handle.blast_radius("base.py").await.unwrap().size, 2);

    index.delete_file("late.py").await.unwrap();
    assert_eq!(handle.blast_radius("base.py").await.unwrap().size, 1);
}

#[tokio::test]
async fn binary_records_stay_out_of_the_graph() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    put_source(&index, "only.py", "import nothing_indexed\n").await;
    index
        .put_file(&FileRecord::opaque(
            "asset.bin",
            vec![0u8, 1, 2, 3],
            1_700_000_000,
            false,
        ))
        .await
        .unwrap();

    let handle = handle_over(index);
    let graph = handle.snapshot().await.unwrap();
    assert!(graph.contains("only.py"));
    assert!(!graph.contains("asset.bin"));
}

#[tokio::test]
async fn is_core_uses_the_configured_threshold() {
    let index = Arc::new(StructuralIndex::new(
        Arc::new(MemoryStore::new()),
        StoreConfig::default(),
    ));
    put_source(&index, "hub.py", "HUB = True\n").await;
    for i in 0..3 {
        put_source(&index, &format!("user{i}.py"), "import hub\n").await;
    }

    let strict = GraphHandle::new(
        index.clone(),
        Arc::new(LineImportExtractor::new()),
        GraphConfig::default(),
    );
    assert!(!strict.is_core("hub.py").await.unwrap());

    let loose = GraphHandle::new(
        index,
        Arc::new(LineImportExtractor::new()),
        GraphConfig {
            core_threshold: 3,
            ..Default::default()
        },
    );
    assert!(loose.is_core("hub.py").await.unwrap());
}
