//! Download Coordinator — bounded-concurrency parallel retrieval
//!
//! One task is spawned per matched file. Before touching the network a task
//! acquires a permit from a counting semaphore sized to the concurrency cap;
//! the permit is released by RAII on every exit path, so the cap holds no
//! matter how a transfer ends. The coordinator returns only after every task
//! has completed — full fan-out, full fan-in, no early exit on failure.

use crate::drive::FileStore;
use crate::types::{DownloadOutcome, MatchSet, OutcomeKind};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

/// Download every entry of `matches` into `dest_dir`, at most
/// `max_concurrent` transfers in flight at once
///
/// Returns one [`DownloadOutcome`] per entry, in no particular order. A
/// failed transfer is logged and reported in its outcome; siblings proceed
/// unaffected and there are no retries. An empty match set returns
/// immediately without spawning anything.
///
/// Files whose display names collide are written to the same local path and
/// the last writer wins (see DESIGN.md).
pub async fn download_all(
    store: Arc<dyn FileStore>,
    matches: &MatchSet,
    dest_dir: &Path,
    max_concurrent: usize,
) -> Vec<DownloadOutcome> {
    let admission = Arc::new(Semaphore::new(max_concurrent));
    let mut handles = Vec::with_capacity(matches.len());

    for (id, name) in matches.iter() {
        let store = Arc::clone(&store);
        let admission = Arc::clone(&admission);
        let id = id.to_string();
        let name = name.to_string();
        let dest = dest_dir.join(&name);

        handles.push(tokio::spawn(async move {
            // acquire_owned only fails on a closed semaphore; ours lives
            // exactly as long as the tasks, so hold the permit via Option.
            let _permit = admission.acquire_owned().await.ok();
            let kind = transfer(store.as_ref(), &id, &name, &dest).await;
            DownloadOutcome { id, name, kind }
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => tracing::error!(error = %e, "download task panicked"),
        }
    }

    let failed = outcomes.iter().filter(|o| !o.kind.is_success()).count();
    tracing::info!(
        total = outcomes.len(),
        failed,
        "download phase complete"
    );
    outcomes
}

/// Single retrieval: open the remote stream, create the local file, copy all
/// chunks. The caller holds the admission permit for the whole call.
async fn transfer(store: &dyn FileStore, id: &str, name: &str, dest: &Path) -> OutcomeKind {
    tracing::info!(name, "Download");

    let mut stream = match store.open_stream(id).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(name, error = %e, "Download failed");
            return OutcomeKind::StreamError;
        }
    };

    let mut out = match tokio::fs::File::create(dest).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(name, path = %dest.display(), error = %e, "create failed");
            return OutcomeKind::LocalWriteError;
        }
    };

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::error!(name, error = %e, "copy failed");
                return OutcomeKind::CopyError;
            }
        };
        if let Err(e) = out.write_all(&chunk).await {
            tracing::error!(name, error = %e, "copy failed");
            return OutcomeKind::CopyError;
        }
    }

    if let Err(e) = out.flush().await {
        tracing::error!(name, error = %e, "copy failed");
        return OutcomeKind::CopyError;
    }

    OutcomeKind::Success
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::ByteStream;
    use crate::error::{Error, Result};
    use crate::types::FilePage;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Decrements the in-flight gauge when the transfer's stream is dropped
    struct FlightGuard(Arc<AtomicUsize>);

    impl Drop for FlightGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// In-memory store with controllable timing and failure injection
    struct FakeStore {
        contents: HashMap<String, Vec<u8>>,
        fail_open: HashSet<String>,
        fail_mid_copy: HashSet<String>,
        hold: Duration,
        in_flight: Arc<AtomicUsize>,
        high_water: Arc<AtomicUsize>,
        opens: AtomicUsize,
    }

    impl FakeStore {
        fn new(contents: &[(&str, &[u8])]) -> Self {
            Self {
                contents: contents
                    .iter()
                    .map(|(id, body)| (id.to_string(), body.to_vec()))
                    .collect(),
                fail_open: HashSet::new(),
                fail_mid_copy: HashSet::new(),
                hold: Duration::from_millis(0),
                in_flight: Arc::new(AtomicUsize::new(0)),
                high_water: Arc::new(AtomicUsize::new(0)),
                opens: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FileStore for FakeStore {
        async fn list_page(&self, _page_token: Option<&str>) -> Result<FilePage> {
            unimplemented!("coordinator tests never list")
        }

        async fn open_stream(&self, file_id: &str) -> Result<ByteStream> {
            self.opens.fetch_add(1, Ordering::SeqCst);

            if self.fail_open.contains(file_id) {
                return Err(Error::RemoteApi {
                    endpoint: format!("drive/v3/files/{}", file_id),
                    status: 404,
                });
            }

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(current, Ordering::SeqCst);
            let guard = FlightGuard(Arc::clone(&self.in_flight));

            tokio::time::sleep(self.hold).await;

            let body = self.contents.get(file_id).cloned().unwrap_or_default();
            let mut chunks: Vec<Result<Bytes>> = body
                .chunks(4)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            if self.fail_mid_copy.contains(file_id) {
                chunks.truncate(1);
                chunks.push(Err(Error::RemoteApi {
                    endpoint: format!("drive/v3/files/{}", file_id),
                    status: 500,
                }));
            }

            // The guard rides along in the closure so the gauge drops when
            // the transfer drops the stream.
            Ok(futures::stream::iter(chunks)
                .inspect(move |_| {
                    let _ = &guard;
                })
                .boxed())
        }
    }

    fn match_set(entries: &[(&str, &str)]) -> MatchSet {
        entries
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn downloads_every_match_and_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::new(&[
            ("id1", b"january report" as &[u8]),
            ("id3", b"february report"),
        ]));

        let matches = match_set(&[("id1", "report_jan.csv"), ("id3", "report_feb.csv")]);
        let outcomes = download_all(store, &matches, dir.path(), 5).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.kind.is_success()));
        assert_eq!(
            std::fs::read(dir.path().join("report_jan.csv")).unwrap(),
            b"january report"
        );
        assert_eq!(
            std::fs::read(dir.path().join("report_feb.csv")).unwrap(),
            b"february report"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn in_flight_transfers_never_exceed_the_cap() {
        let dir = tempfile::tempdir().unwrap();

        let entries: Vec<(String, String)> = (0..12)
            .map(|i| (format!("id{}", i), format!("file_{}.bin", i)))
            .collect();
        let contents: Vec<(String, Vec<u8>)> = entries
            .iter()
            .map(|(id, _)| (id.clone(), vec![b'x'; 32]))
            .collect();

        let mut store = FakeStore::new(&[]);
        store.contents = contents.into_iter().collect();
        store.hold = Duration::from_millis(50);
        let store = Arc::new(store);

        let matches: MatchSet = entries.into_iter().collect();
        let outcomes = download_all(Arc::clone(&store) as Arc<dyn FileStore>, &matches, dir.path(), 5).await;

        assert_eq!(outcomes.len(), 12, "coordinator must wait for all tasks");
        assert!(outcomes.iter().all(|o| o.kind.is_success()));

        let high_water = store.high_water.load(Ordering::SeqCst);
        assert!(
            high_water <= 5,
            "concurrency cap exceeded: {} transfers in flight",
            high_water
        );
        assert!(
            high_water >= 2,
            "expected some parallelism with 12 items held 50ms each, saw {}",
            high_water
        );
        assert_eq!(
            store.in_flight.load(Ordering::SeqCst),
            0,
            "every transfer must have finished before download_all returned"
        );
    }

    #[tokio::test]
    async fn empty_match_set_returns_immediately_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::new(&[]));

        let outcomes =
            download_all(Arc::clone(&store) as Arc<dyn FileStore>, &MatchSet::new(), dir.path(), 5)
                .await;

        assert!(outcomes.is_empty());
        assert_eq!(store.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failures_are_reported_per_item_and_do_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FakeStore::new(&[
            ("ok", b"all good" as &[u8]),
            ("gone", b"never sent"),
            ("cut", b"truncated body"),
        ]);
        store.fail_open.insert("gone".to_string());
        store.fail_mid_copy.insert("cut".to_string());
        let store = Arc::new(store);

        let matches = match_set(&[("ok", "ok.txt"), ("gone", "gone.txt"), ("cut", "cut.txt")]);
        let outcomes = download_all(store, &matches, dir.path(), 2).await;

        assert_eq!(outcomes.len(), 3);
        let kind_of = |name: &str| {
            outcomes
                .iter()
                .find(|o| o.name == name)
                .map(|o| o.kind)
                .unwrap()
        };
        assert_eq!(kind_of("ok.txt"), OutcomeKind::Success);
        assert_eq!(kind_of("gone.txt"), OutcomeKind::StreamError);
        assert_eq!(kind_of("cut.txt"), OutcomeKind::CopyError);

        // The sibling completed untouched; the failed copy leaves a partial file.
        assert_eq!(std::fs::read(dir.path().join("ok.txt")).unwrap(), b"all good");
        assert!(!dir.path().join("gone.txt").exists());
        let partial = std::fs::read(dir.path().join("cut.txt")).unwrap();
        assert!(partial.len() < b"truncated body".len());
    }

    #[tokio::test]
    async fn unwritable_destination_is_a_local_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let store = Arc::new(FakeStore::new(&[("id1", b"payload" as &[u8])]));

        let matches = match_set(&[("id1", "file.txt")]);
        let outcomes = download_all(store, &matches, &missing, 5).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].kind, OutcomeKind::LocalWriteError);
    }

    #[tokio::test]
    async fn duplicate_display_names_collapse_to_one_file() {
        // Two distinct remote files share a display name. No suffixing is
        // applied: both write the same path and one payload survives.
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::new(&[
            ("id1", b"payload one" as &[u8]),
            ("id2", b"payload two"),
        ]));

        let matches = match_set(&[("id1", "shared.txt"), ("id2", "shared.txt")]);
        let outcomes = download_all(store, &matches, dir.path(), 2).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.kind.is_success()));

        let written = std::fs::read(dir.path().join("shared.txt")).unwrap();
        assert!(
            written == b"payload one" || written == b"payload two",
            "exactly one payload must win, got: {:?}",
            written
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn rerun_overwrites_rather_than_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FakeStore::new(&[("id1", b"stable contents" as &[u8])]));
        let matches = match_set(&[("id1", "file.txt")]);

        let first =
            download_all(Arc::clone(&store) as Arc<dyn FileStore>, &matches, dir.path(), 5).await;
        assert!(first.iter().all(|o| o.kind.is_success()));
        let after_first = std::fs::read(dir.path().join("file.txt")).unwrap();

        let second = download_all(store, &matches, dir.path(), 5).await;
        assert!(second.iter().all(|o| o.kind.is_success()));
        let after_second = std::fs::read(dir.path().join("file.txt")).unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(after_second, b"stable contents");
    }
}
