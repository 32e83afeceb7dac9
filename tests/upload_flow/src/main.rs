fn main() {
    println!("Run `cargo test -p upload-flow` to execute the end-to-end upload tests.");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pixvault_gallery::AssetGallery;
    use pixvault_intake::{CandidateFile, DragEvent, DropZone, Selection};
    use pixvault_stats::UploadStats;
    use pixvault_store::MemoryStore;
    use pixvault_transfer::{
        BatchEvent, BatchUploader, UploadEngine, UploadEvent, UploadStatus,
    };
    use tokio::sync::mpsc;

    fn png(name: &str, size: usize) -> CandidateFile {
        CandidateFile::new(name, "image/png", vec![9u8; size])
    }

    /// The full flow: drop → validate → batch upload → gallery refresh.
    #[tokio::test]
    async fn drop_to_gallery_pipeline() {
        let store = Arc::new(MemoryStore::new("https://cdn.test"));
        let stats = Arc::new(UploadStats::new());

        // Drop two images and a stray text file on the zone.
        let mut zone = DropZone::new();
        zone.on_drag_enter();
        let result = zone
            .handle(DragEvent::Drop(vec![
                png("sunset.png", 2048),
                CandidateFile::new("notes.txt", "text/plain", vec![1u8; 10]),
                png("ocean.png", 1024),
            ]))
            .unwrap();

        assert!(!result.valid);
        assert_eq!(result.errors, vec![r#""notes.txt" is not an image file"#]);
        assert_eq!(result.accepted.len(), 2);

        // Proceed with the partial batch.
        let mut selection = Selection::new();
        selection.replace(result.accepted);
        assert_eq!(selection.total_bytes(), 3072);

        let mut engine = UploadEngine::new(store.clone());
        engine.add_sink(stats.clone());
        let batch = BatchUploader::new(engine);
        let outcomes = batch.upload(selection.take()).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.status == UploadStatus::Completed));
        for outcome in &outcomes {
            let url = outcome.url.as_deref().unwrap();
            assert!(url.starts_with("https://cdn.test/images/"));
        }

        // The gallery now shows both uploads with real metadata.
        let mut gallery = AssetGallery::new(store.clone());
        gallery.add_sink(stats.clone());
        let assets = gallery.list("images").await.unwrap();
        assert_eq!(assets.len(), 2);
        assert!(assets.iter().any(|a| a.name.ends_with("_sunset.png")));
        assert!(assets.iter().any(|a| a.name.ends_with("_ocean.png")));
        assert!(assets.iter().all(|a| a.content_type == "image/png"));

        // Delete one and refresh.
        let doomed = assets
            .iter()
            .find(|a| a.name.ends_with("_ocean.png"))
            .unwrap();
        gallery.delete(&doomed.remote_path).await.unwrap();
        let assets = gallery.list("images").await.unwrap();
        assert_eq!(assets.len(), 1);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.batches_started, 1);
        assert_eq!(snapshot.uploads_started, 2);
        assert_eq!(snapshot.uploads_completed, 2);
        assert_eq!(snapshot.bytes_transferred, 3072);
        assert_eq!(snapshot.assets_deleted, 1);
    }

    /// Aggregate progress stays the mean of member fractions and every
    /// member stream ends terminally.
    #[tokio::test]
    async fn batch_progress_reaches_100() {
        let store = Arc::new(MemoryStore::new("https://cdn.test"));
        let options = pixvault_transfer::UploadOptions {
            chunk_size: 8,
            ..Default::default()
        };
        let mut batch =
            BatchUploader::new(UploadEngine::new(store).with_options(options));
        let mut events = batch.take_events().unwrap();

        let outcomes = batch
            .upload(vec![png("a.png", 32), png("b.png", 16), png("c.png", 24)])
            .await;
        assert!(outcomes.iter().all(|o| o.status == UploadStatus::Completed));

        let mut last_aggregate = 0.0f64;
        let mut terminals = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                BatchEvent::Progress { fraction } => {
                    assert!(fraction >= last_aggregate, "aggregate went backwards");
                    assert!(fraction <= 100.0 + 1e-9);
                    last_aggregate = fraction;
                }
                BatchEvent::Upload(member) => {
                    if member.is_terminal() {
                        terminals += 1;
                    }
                }
            }
        }
        assert_eq!(terminals, 3);
        assert!((last_aggregate - 100.0).abs() < 1e-9);
    }

    /// A single 1 KiB PNG streamed through the engine ends at exactly
    /// 100 with a non-empty URL and no overshooting emission.
    #[tokio::test]
    async fn single_small_png_contract() {
        let store = Arc::new(MemoryStore::new("https://cdn.test"));
        let engine = UploadEngine::new(store);

        let (tx, mut rx) = mpsc::channel(64);
        let handle = engine.start(png("tiny.png", 1024), tx);
        let outcome = handle.join().await;

        assert_eq!(outcome.status, UploadStatus::Completed);
        assert!(!outcome.url.as_deref().unwrap().is_empty());

        let mut last = 0.0f64;
        let mut saw_terminal = false;
        while let Some(event) = rx.recv().await {
            match event {
                UploadEvent::Progress { fraction, .. } => {
                    assert!(fraction >= last);
                    assert!(fraction <= 100.0);
                    last = fraction;
                }
                UploadEvent::Completed { url, .. } => {
                    assert!(!url.is_empty());
                    saw_terminal = true;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert!(saw_terminal);
    }

    /// Partial failure: one member fails, the siblings and the batch
    /// itself still settle.
    #[tokio::test]
    async fn partial_failure_settles_with_mixed_outcomes() {
        let store = Arc::new(MemoryStore::new("https://cdn.test"));
        // 11 MiB exceeds the engine's pre-flight bound; the middle file
        // fails without ever reaching the store.
        let files = vec![
            png("one.png", 64),
            png("huge.png", 11 * 1024 * 1024),
            png("three.png", 64),
        ];

        let batch = BatchUploader::new(UploadEngine::new(store.clone()));
        let outcomes = batch.upload(files).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, UploadStatus::Completed);
        assert_eq!(outcomes[1].status, UploadStatus::Failed);
        assert!(outcomes[1].error.as_deref().unwrap().contains("too large"));
        assert_eq!(outcomes[2].status, UploadStatus::Completed);
        assert_eq!(store.committed_count(), 2);

        // The failed member left no orphan behind.
        let gallery = AssetGallery::new(store);
        let assets = gallery.list("images").await.unwrap();
        assert_eq!(assets.len(), 2);
    }

    /// Cancelling a batch aborts in-flight members, leaves no committed
    /// object behind for them, and the partial leftovers stay invisible
    /// to the gallery.
    #[tokio::test]
    async fn cancelled_batch_leaves_gallery_consistent() {
        let store = Arc::new(MemoryStore::new("https://cdn.test"));
        let batch = BatchUploader::new(UploadEngine::new(store.clone()));
        batch.cancel();

        let outcomes = batch.upload(vec![png("a.png", 64), png("b.png", 64)]).await;
        assert!(outcomes.iter().all(|o| o.status == UploadStatus::Cancelled));
        assert!(outcomes.iter().all(|o| o.error.is_none()));

        let gallery = AssetGallery::new(store);
        let assets = gallery.list("images").await.unwrap();
        assert!(assets.is_empty());
    }
}
