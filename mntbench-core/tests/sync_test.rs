//! Corpus synchronization against an in-memory release source

mod common;

use common::{init_test_logging, paths, version_sync, MockReleaseSource, MUX21_FILES};
use mntbench_core::catalog::FilterSpec;
use mntbench_core::context::{BenchContext, LastSyncResult, SyncOutcome};
use mntbench_core::error::BenchError;
use mntbench_core::sync::{CorpusLock, SyncState, CORPORA_DIR, STAGING_DIR};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn corpus_dirs(data_dir: &Path) -> usize {
    std::fs::read_dir(data_dir.join(CORPORA_DIR))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

fn staged_files(data_dir: &Path) -> usize {
    std::fs::read_dir(data_dir.join(STAGING_DIR))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_first_sync_installs_corpus() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));

    let status = context.ensure_ready().await.unwrap();
    assert_eq!(status.version.unwrap().as_str(), "v1.0.0");
    assert_eq!(status.entry_count, 3);
    assert!(matches!(
        status.last_sync.unwrap().result,
        LastSyncResult::Updated { from: None, .. }
    ));
    assert!(matches!(context.sync_state(), SyncState::Ready { .. }));

    let lock = CorpusLock::load(data_dir.path()).unwrap().unwrap();
    assert_eq!(lock.version.as_str(), "v1.0.0");
    assert_eq!(lock.entry_count, 3);
    assert!(lock.digest.unwrap().starts_with("sha256:"));
    assert!(!data_dir.path().join(STAGING_DIR).read_dir().unwrap().any(|_| true));
}

#[tokio::test]
async fn test_second_sync_with_unchanged_remote_is_noop() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));

    let first = context.sync().await.unwrap();
    assert_eq!(first.outcome, SyncOutcome::Updated);
    let before = context.run_query(&FilterSpec::new()).unwrap();
    let snapshot_before = context.snapshot().unwrap();

    let second = context.sync().await.unwrap();
    assert_eq!(second.outcome, SyncOutcome::UpToDate);
    assert_eq!(source.downloads(), 1);
    assert_eq!(source.checks(), 2);

    let after = context.run_query(&FilterSpec::new()).unwrap();
    assert_eq!(paths(&before), paths(&after));
    assert!(std::sync::Arc::ptr_eq(
        &snapshot_before,
        &context.snapshot().unwrap()
    ));
    assert!(matches!(context.sync_state(), SyncState::UpToDate { .. }));
}

#[tokio::test]
async fn test_new_release_replaces_corpus() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));
    context.sync().await.unwrap();

    source.publish("v1.1.0", &["mux21.v", "xor2.v", "c17.v", "c17_ONE_BEST.fgl"]);
    let report = context.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::Updated);
    assert_eq!(report.entry_count, 4);

    let status = context.corpus_status();
    assert_eq!(status.version.unwrap().as_str(), "v1.1.0");
    assert!(matches!(
        status.last_sync.unwrap().result,
        LastSyncResult::Updated { from: Some(_), .. }
    ));

    // the old corpus stays on disk until the next sync cleans it up
    assert_eq!(corpus_dirs(data_dir.path()), 2);
    context.sync().await.unwrap();
    assert_eq!(corpus_dirs(data_dir.path()), 1);
}

#[tokio::test]
async fn test_mid_download_failure_keeps_previous_corpus() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));
    context.sync().await.unwrap();
    let before = context.corpus_status();

    source.publish("v2.0.0", &["xor2.v"]);
    source.fail_next_download_midway();
    let err = context.sync().await.unwrap_err();
    assert!(matches!(err, BenchError::NetworkError { .. }));
    assert!(matches!(
        context.sync_state(),
        SyncState::DownloadFailed { .. }
    ));

    let after = context.corpus_status();
    assert_eq!(after.version, before.version);
    assert_eq!(after.entry_count, before.entry_count);
    assert_eq!(after.corpus_root, before.corpus_root);
    assert!(matches!(
        after.last_sync.unwrap().result,
        LastSyncResult::Failed {
            state: SyncState::DownloadFailed { .. },
            ..
        }
    ));

    let lock = CorpusLock::load(data_dir.path()).unwrap().unwrap();
    assert_eq!(lock.version.as_str(), "v1.0.0");
    assert_eq!(corpus_dirs(data_dir.path()), 1);
    assert_eq!(context.run_query(&FilterSpec::new()).unwrap().len(), 3);
}

#[tokio::test]
async fn test_digest_mismatch_is_download_failure() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    source.publish_with_bad_digest("v1.0.0", MUX21_FILES);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));

    assert!(matches!(
        context.sync().await,
        Err(BenchError::DownloadFailed { .. })
    ));
    assert!(context.snapshot().is_none());
    assert!(CorpusLock::load(data_dir.path()).unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_identities_in_release_are_rejected() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));
    context.sync().await.unwrap();

    source.publish("v1.1.0", &["a/mux21.v", "b/mux21.v"]);
    let err = context.sync().await.unwrap_err();
    assert!(matches!(err, BenchError::DuplicateIdentity { .. }));
    assert!(matches!(
        context.sync_state(),
        SyncState::ExtractFailed { .. }
    ));

    assert_eq!(context.corpus_status().version.unwrap().as_str(), "v1.0.0");
    assert_eq!(corpus_dirs(data_dir.path()), 1);
}

#[tokio::test]
async fn test_concurrent_sync_is_coalesced() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    source.set_delay(Duration::from_millis(50));
    let context = BenchContext::new(version_sync(&source, data_dir.path()));

    let (first, second) = tokio::join!(context.sync(), context.sync());
    let mut outcomes = vec![first.unwrap().outcome, second.unwrap().outcome];
    outcomes.sort_by_key(|o| format!("{o:?}"));
    assert_eq!(outcomes, vec![SyncOutcome::Coalesced, SyncOutcome::Updated]);
    assert_eq!(source.downloads(), 1);
}

#[tokio::test]
async fn test_no_corpus_and_unreachable_remote_is_fatal() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    source.set_unreachable(true);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));

    assert!(matches!(
        context.ensure_ready().await,
        Err(BenchError::CorpusUnavailable { .. })
    ));
    assert!(matches!(
        context.run_query(&FilterSpec::new()),
        Err(BenchError::CorpusUnavailable { .. })
    ));
    assert!(matches!(context.sync_state(), SyncState::CheckFailed { .. }));
}

#[tokio::test]
async fn test_unreachable_remote_with_installed_corpus_continues() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    BenchContext::new(version_sync(&source, data_dir.path()))
        .sync()
        .await
        .unwrap();

    source.set_unreachable(true);
    let restarted = BenchContext::new(version_sync(&source, data_dir.path()));
    let status = restarted.ensure_ready().await.unwrap();
    assert_eq!(status.version.unwrap().as_str(), "v1.0.0");
    assert_eq!(status.entry_count, 3);
    assert!(matches!(
        status.last_sync.unwrap().result,
        LastSyncResult::Failed {
            state: SyncState::CheckFailed { .. },
            ..
        }
    ));
    assert_eq!(source.downloads(), 1);
}

#[tokio::test]
async fn test_slow_remote_check_times_out() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    source.set_delay(Duration::from_millis(500));
    let sync = version_sync(&source, data_dir.path())
        .with_timeouts(Duration::from_millis(20), Duration::from_secs(5));

    assert!(matches!(
        sync.check_remote_version().await,
        Err(BenchError::NetworkError { .. })
    ));
    assert!(matches!(sync.state(), SyncState::CheckFailed { .. }));
}

#[tokio::test]
async fn test_slow_download_times_out_and_keeps_previous_corpus() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    let sync = version_sync(&source, data_dir.path())
        .with_timeouts(Duration::from_secs(5), Duration::from_millis(50));
    let context = BenchContext::new(sync);
    context.sync().await.unwrap();
    let before = context.corpus_status();

    source.publish("v2.0.0", &["xor2.v"]);
    source.set_download_delay(Some(Duration::from_millis(500)));
    let err = context.sync().await.unwrap_err();
    assert!(matches!(err, BenchError::NetworkError { .. }));
    assert!(matches!(
        context.sync_state(),
        SyncState::DownloadFailed { .. }
    ));

    let after = context.corpus_status();
    assert_eq!(after.version, before.version);
    assert_eq!(after.entry_count, before.entry_count);
    assert_eq!(after.corpus_root, before.corpus_root);
    assert_eq!(staged_files(data_dir.path()), 0);
    assert_eq!(corpus_dirs(data_dir.path()), 1);

    let lock = CorpusLock::load(data_dir.path()).unwrap().unwrap();
    assert_eq!(lock.version.as_str(), "v1.0.0");
}

#[tokio::test]
async fn test_dropped_sync_is_restarted_by_next_sync() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    source.set_download_delay(Some(Duration::from_millis(500)));
    let context = BenchContext::new(version_sync(&source, data_dir.path()));

    let dropped = tokio::time::timeout(Duration::from_millis(50), context.sync()).await;
    assert!(dropped.is_err());
    assert!(matches!(context.sync_state(), SyncState::Downloading { .. }));
    assert_eq!(staged_files(data_dir.path()), 1);

    source.set_download_delay(None);
    let report = context.sync().await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::Updated);
    assert!(matches!(context.sync_state(), SyncState::Ready { .. }));
    assert_eq!(source.downloads(), 2);
    assert_eq!(staged_files(data_dir.path()), 0);
}

#[tokio::test]
async fn test_restart_syncs_before_indexing_installed_corpus() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    BenchContext::new(version_sync(&source, data_dir.path()))
        .sync()
        .await
        .unwrap();

    // the installed corpus can no longer be indexed
    let lock = CorpusLock::load(data_dir.path()).unwrap().unwrap();
    let installed = lock.corpus_root(data_dir.path());
    std::fs::create_dir_all(installed.join("copy")).unwrap();
    std::fs::write(installed.join("copy/mux21.v"), "").unwrap();

    source.publish("v1.1.0", &["xor2.v", "c17.v"]);
    let restarted = BenchContext::new(version_sync(&source, data_dir.path()));
    let status = restarted.ensure_ready().await.unwrap();
    assert_eq!(status.version.unwrap().as_str(), "v1.1.0");
    assert_eq!(status.entry_count, 2);
    assert!(matches!(
        status.last_sync.unwrap().result,
        LastSyncResult::Updated { from: Some(from), .. } if from.as_str() == "v1.0.0"
    ));

    // unchanged remote: the installed corpus is indexed once, nothing downloaded
    let again = BenchContext::new(version_sync(&source, data_dir.path()));
    let status = again.ensure_ready().await.unwrap();
    assert_eq!(status.version.unwrap().as_str(), "v1.1.0");
    assert_eq!(status.entry_count, 2);
    assert!(matches!(
        status.last_sync.unwrap().result,
        LastSyncResult::UpToDate { .. }
    ));
    assert_eq!(source.downloads(), 2);
}

#[tokio::test]
async fn test_check_remote_version_reports_update() {
    init_test_logging();
    let data_dir = TempDir::new().unwrap();
    let source = MockReleaseSource::new("v1.0.0", MUX21_FILES);
    let context = BenchContext::new(version_sync(&source, data_dir.path()));

    assert_eq!(context.check_remote_version().await.unwrap(), source.version());
    assert!(matches!(
        context.sync_state(),
        SyncState::UpdateAvailable { local: None, .. }
    ));
    assert_eq!(source.downloads(), 0);
}
