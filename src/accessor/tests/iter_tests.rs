use super::*;
use crate::accessor::{AccessOptions, CancellationToken, SiteOutcome};
use crate::constants::SITE_ID_COLUMN;
use crate::error::SoundDbError;
use crate::models::{Collected, Resolved};

#[test]
fn test_iter_skips_missing_site() {
    let fixture = Fixture::new();
    let accessor = srcid_accessor();
    let options = AccessOptions::default();

    let mut iter = accessor.iter(&fixture.index, [UPST, "DENAXXXX2015"], &options);
    let records: Vec<_> = iter.by_ref().collect();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key.site_id(), UPST);
    assert_eq!(records[0].data.len(), 1);

    assert_eq!(iter.skipped().len(), 1);
    assert_eq!(iter.skipped()[0].site, "DENAXXXX2015");
    assert!(matches!(
        iter.skipped()[0].error,
        SoundDbError::SiteNotFound { .. }
    ));
    assert!(iter.into_result().is_ok());
}

#[test]
fn test_iter_skips_every_failure_kind() {
    let fixture = Fixture::new();
    let accessor = srcid_accessor();
    let options = AccessOptions::default().verbose();

    // bad identifier, unknown site, site without the file
    let sites = ["bad", "DENAXXXX2015", TEKL];
    let mut iter = accessor.iter(&fixture.index, sites, &options);

    assert!(iter.next().is_none());
    let skipped = iter.into_result().unwrap();
    assert_eq!(skipped.len(), 3);
    assert!(matches!(skipped[0].error, SoundDbError::InvalidIdentifier { .. }));
    assert!(matches!(skipped[1].error, SoundDbError::SiteNotFound { .. }));
    assert!(matches!(skipped[2].error, SoundDbError::FileNotFound { .. }));
}

#[test]
fn test_iter_preserves_input_order() {
    let fixture = Fixture::new();
    let accessor = nvspl_accessor();
    let options = AccessOptions::default();

    let ids: Vec<String> = accessor
        .iter(&fixture.index, [TEKL, UPST], &options)
        .map(|record| record.key.site_id())
        .collect();
    assert_eq!(ids, vec![TEKL, UPST]);

    // restartable from the same input
    let again = accessor.iter(&fixture.index, [TEKL, UPST], &options).count();
    assert_eq!(again, 2);
}

#[test]
fn test_next_outcome_reports_skips() {
    let fixture = Fixture::new();
    let accessor = srcid_accessor();
    let options = AccessOptions::default();
    let mut iter = accessor.iter(&fixture.index, [TEKL, UPST], &options);

    match iter.next_outcome() {
        Some(SiteOutcome::Skipped(skip)) => assert_eq!(skip.site, TEKL),
        other => panic!("expected a skipped site, got {:?}", other),
    }
    assert!(matches!(iter.next_outcome(), Some(SiteOutcome::Loaded(_))));
    assert!(iter.next_outcome().is_none());

    // skips seen through next_outcome land in the same log as next()
    let skipped = iter.into_result().unwrap();
    assert_eq!(skipped.len(), 1);
    assert!(matches!(skipped[0].error, SoundDbError::FileNotFound { .. }));
}

#[test]
fn test_collect_all_with_reports_each_site() {
    let fixture = Fixture::new();
    let accessor = srcid_accessor();

    let mut loaded = 0;
    let mut skipped = Vec::new();
    let collected = accessor
        .collect_all_with(
            &fixture.index,
            [UPST, TEKL, "DENAXXXX2015"],
            &AccessOptions::default(),
            |outcome| match outcome {
                SiteOutcome::Loaded(_) => loaded += 1,
                SiteOutcome::Skipped(skip) => skipped.push(skip.site.clone()),
            },
        )
        .unwrap();

    assert_eq!(loaded, 1);
    assert_eq!(skipped, vec![TEKL, "DENAXXXX2015"]);
    assert_eq!(collected.as_table().unwrap().height(), 1);
}

#[test]
fn test_iter_stops_on_interrupt() {
    let fixture = Fixture::new();
    let accessor = nvspl_accessor();
    let cancellation_token = CancellationToken::new();
    let options = AccessOptions::default().with_cancellation_token(cancellation_token.clone());

    let mut iter = accessor.iter(&fixture.index, [UPST, TEKL], &options);
    assert!(iter.next().is_some());
    cancellation_token.cancel();
    assert!(iter.next().is_none());
    assert!(iter.interrupted());
    assert!(matches!(
        iter.into_result(),
        Err(SoundDbError::Interrupted { .. })
    ));
}

#[test]
fn test_collect_all_stacks_tables() {
    let fixture = Fixture::new();
    let accessor = nvspl_accessor();

    let collected = accessor
        .collect_all(&fixture.index, [UPST, "DENAXXXX2015", TEKL], &AccessOptions::default())
        .unwrap();

    let df = collected.as_table().expect("tables should stack");
    assert_eq!(df.height(), 4);
    assert_eq!(collected.site_count(), 2);

    let ids = df.column(SITE_ID_COLUMN).unwrap();
    let ids = ids.as_materialized_series().str().unwrap();
    assert_eq!(ids.get(0), Some(UPST));
    assert_eq!(ids.get(3), Some(TEKL));
}

#[test]
fn test_collect_all_duplicate_ids_keep_one_entry() {
    let fixture = Fixture::new();
    let accessor = srcid_accessor();

    let collected = accessor
        .collect_all(&fixture.index, [UPST, UPST], &AccessOptions::default())
        .unwrap();
    assert_eq!(collected.as_table().unwrap().height(), 1);
}

#[test]
fn test_collect_all_nothing_found() {
    let fixture = Fixture::new();
    let accessor = srcid_accessor();

    let collected = accessor
        .collect_all(&fixture.index, [TEKL], &AccessOptions::default())
        .unwrap();
    assert!(matches!(collected, Collected::BySite(ref r) if r.is_empty()));
}

#[test]
fn test_collect_all_interrupted() {
    let fixture = Fixture::new();
    let accessor = nvspl_accessor();
    let cancellation_token = CancellationToken::new();
    cancellation_token.cancel();
    let options = AccessOptions::default().with_cancellation_token(cancellation_token);

    let result = accessor.collect_all(&fixture.index, [UPST], &options);
    assert!(matches!(result, Err(SoundDbError::Interrupted { .. })));
}

#[test]
fn test_paths_skip_unresolvable_sites() {
    let fixture = Fixture::new();
    let options = AccessOptions::default().verbose();

    let srcid: Vec<_> = srcid_accessor()
        .paths(&fixture.index, ["bad", TEKL, UPST], &options)
        .collect();
    assert_eq!(srcid.len(), 1);
    assert_eq!(srcid[0].1.site_id(), UPST);
    assert!(matches!(srcid[0].0, Resolved::File(_)));

    let nvspl: Vec<_> = nvspl_accessor()
        .paths(&fixture.index, [UPST, TEKL], &options)
        .collect();
    assert_eq!(nvspl.len(), 2);
    assert_eq!(nvspl[0].0.paths().len(), 2);
    assert_eq!(nvspl[1].0.paths().len(), 1);
}

#[test]
fn test_paths_stop_on_interrupt() {
    let fixture = Fixture::new();
    let accessor = nvspl_accessor();
    let cancellation_token = CancellationToken::new();
    let options = AccessOptions::default().with_cancellation_token(cancellation_token.clone());

    let mut paths = accessor.paths(&fixture.index, [UPST, TEKL], &options);
    assert!(paths.next().is_some());
    cancellation_token.cancel();
    assert!(paths.next().is_none());
    assert!(paths.interrupted());
    assert!(matches!(
        paths.into_result(),
        Err(SoundDbError::Interrupted { .. })
    ));

    let default_options = AccessOptions::default();
    let finished = accessor.paths(&fixture.index, [UPST], &default_options);
    assert!(finished.into_result().is_ok());
}
