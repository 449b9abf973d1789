//! Integration tests for the SoundDb facade over a synthetic raw data root
//!
//! The fixture mirrors the layout of real acoustic monitoring archives: one
//! directory per site-year, hourly NVSPL files under `01 DATA/NVSPL`, SPL
//! analysis outputs under `02 ANALYSIS/SPL Analysis`, audio and photos.

use sound_db::constants::{ROW_COLUMN, SITE_ID_COLUMN, SOURCE_FILE_COLUMN};
use sound_db::{
    AccessOptions, CancellationToken, Collected, IndexWarning, ParseOptions, SiteData, SiteSpecifier, SoundDb,
    SoundDbConfig, SoundDbError, encode_data_dir_name,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(path: PathBuf, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn nvspl_hour(site: &str, hour: u32, levels: &[f64]) -> String {
    let mut contents = String::from("SiteID,STime,H,dbA\n");
    for (second, level) in levels.iter().enumerate() {
        contents.push_str(&format!(
            "{},2015-06-01 {:02}:00:{:02},20.0,{}\n",
            site, hour, second, level
        ));
    }
    contents
}

/// Three site-years plus clutter the index must ignore
fn build_root(root: &Path) {
    let upst = root.join(encode_data_dir_name("DENA", "UPST", "2015", "Upper Station"));
    let nvspl = upst.join("01 DATA").join("NVSPL");
    write(
        nvspl.join("NVSPL_DENAUPST2015_06_01_00.txt"),
        &nvspl_hour("UPST", 0, &[31.5, 30.9]),
    );
    write(
        nvspl.join("NVSPL_DENAUPST2015_06_01_01.txt"),
        &nvspl_hour("UPST", 1, &[29.1]),
    );
    let spl = upst.join("02 ANALYSIS").join("SPL Analysis");
    write(
        spl.join("SRCID_DENAUPST.txt"),
        "nvsplDate\thr\tsrcID\tlen\n2015-06-01\t7\t1.1\t30\n2015-06-01\t9\t0\t12\n",
    );
    write(
        spl.join("DAILYPA_DENAUPST.txt"),
        "Date\tPctAudible\n2015-06-01\t12.5\n",
    );
    write(upst.join("01 DATA").join("AUDIO").join("DENAUPST_20150601_000000.wav"), "");
    write(upst.join("01 DATA").join("PHOTOS").join("north.jpg"), "");

    let tekl = root.join("2015 DENATEKL Teklanika");
    write(
        tekl.join("01 DATA").join("NVSPL").join("NVSPL_DENATEKL2015_06_01_00.txt"),
        &nvspl_hour("TEKL", 0, &[27.0, 26.5, 26.0]),
    );
    write(
        tekl.join("02 ANALYSIS").join("SPL Analysis").join("SRCID_DENATEKL.txt"),
        "nvsplDate\thr\tsrcID\tlen\n2015-06-02\t3\t2.1\t8\n",
    );

    // indexed but empty
    fs::create_dir_all(root.join("2016 GLBAHGBP Hugh Miller")).unwrap();

    // ignored by the index
    write(root.join("notes.txt"), "field notes");
    fs::create_dir_all(root.join("Archive")).unwrap();
}

fn open(root: &Path) -> SoundDb {
    SoundDb::open(SoundDbConfig::default().with_raw_data_root(root))
}

#[test]
fn test_index_ignores_clutter() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    let db = open(temp_dir.path());

    let ids: Vec<String> = db.index().entries().map(|(key, _)| key.site_id()).collect();
    assert_eq!(ids, vec!["DENATEKL2015", "DENAUPST2015", "GLBAHGBP2016"]);
    assert!(db.index().warnings().is_empty());
}

#[test]
fn test_missing_root_defers_failure() {
    let temp_dir = TempDir::new().unwrap();
    let db = open(&temp_dir.path().join("not-mounted"));

    assert!(db.index().is_empty());
    assert!(matches!(
        db.index().warnings(),
        [IndexWarning::RootNotFound { .. }]
    ));

    let result = db.access("srcid", &"DENAUPST2015".into(), &ParseOptions::new());
    assert!(matches!(result, Err(SoundDbError::SiteNotFound { .. })));
}

#[test]
fn test_read_nvspl_across_sites() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    let db = open(temp_dir.path());

    let collected = db
        .read(
            "nvspl",
            ["DENAUPST2015", "DENATEKL2015", "GLBAHGBP2016", "YUCHXXXX2015"],
            &AccessOptions::default(),
        )
        .unwrap();

    let df = collected.as_table().expect("NVSPL tables should stack");
    assert_eq!(df.height(), 6);
    assert_eq!(collected.site_count(), 2);

    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
    assert_eq!(&names[..2], &[SITE_ID_COLUMN, ROW_COLUMN]);
    assert!(names.iter().any(|n| n == SOURCE_FILE_COLUMN));

    let ids = df.column(SITE_ID_COLUMN).unwrap().str().unwrap();
    assert_eq!(ids.get(0), Some("DENAUPST2015"));
    assert_eq!(ids.get(5), Some("DENATEKL2015"));
}

#[test]
fn test_read_tab_tables_with_options() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    let db = open(temp_dir.path());

    let options = AccessOptions::default()
        .with_parse_options(ParseOptions::new().with("columns", "srcID,len"));
    let collected = db
        .read("srcid", ["DENAUPST2015", "DENATEKL2015"], &options)
        .unwrap();

    let df = collected.as_table().unwrap();
    assert_eq!(df.height(), 3);
    assert_eq!(df.width(), 4);
}

#[test]
fn test_read_file_listings_by_site() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    let db = open(temp_dir.path());

    let collected = db
        .read("audio", ["DENAUPST2015", "DENATEKL2015"], &AccessOptions::default())
        .unwrap();

    match collected {
        Collected::BySite(results) => {
            assert_eq!(results.len(), 2);
            assert_eq!(results[0].1.len(), 1);
            // TEKL has no audio folder: an empty listing, not a failure
            assert_eq!(results[1].0.site_id(), "DENATEKL2015");
            assert!(results[1].1.is_empty());
        }
        Collected::Table(_) => panic!("file listings cannot be stacked"),
    }
}

#[test]
fn test_paths_without_parsing() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    let db = open(temp_dir.path());

    let resolved = db
        .paths(
            "dailypa",
            ["DENAUPST2015", "DENATEKL2015", "bad"],
            &AccessOptions::default().verbose(),
        )
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].0.paths()[0].ends_with("DAILYPA_DENAUPST.txt"));
}

#[test]
fn test_paths_cancelled() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    let db = open(temp_dir.path());

    let cancellation_token = CancellationToken::new();
    cancellation_token.cancel();
    let options = AccessOptions::default().with_cancellation_token(cancellation_token);

    let result = db.paths("nvspl", ["DENAUPST2015", "DENATEKL2015"], &options);
    assert!(matches!(result, Err(SoundDbError::Interrupted { .. })));
}

#[test]
fn test_read_nvspl_with_whole_number_hour() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    // an hour whose levels are all whole numbers infers as integers
    write(
        temp_dir
            .path()
            .join("2015 DENATEKL Teklanika")
            .join("01 DATA")
            .join("NVSPL")
            .join("NVSPL_DENATEKL2015_06_01_01.txt"),
        "SiteID,STime,H,dbA\nTEKL,2015-06-01 01:00:00,20.0,26\n",
    );
    let db = open(temp_dir.path());

    let collected = db
        .read("nvspl", ["DENAUPST2015", "DENATEKL2015"], &AccessOptions::default())
        .unwrap();

    let df = collected.as_table().expect("NVSPL tables should stack");
    assert_eq!(df.height(), 7);
    assert_eq!(collected.site_count(), 2);
}

#[test]
fn test_access_single_site() {
    let temp_dir = TempDir::new().unwrap();
    build_root(temp_dir.path());
    let db = open(temp_dir.path());

    let specifier = SiteSpecifier::from_parts(&["DENA", "UPST", "2015"]).unwrap();
    let photos = db
        .access("photos", &specifier, &ParseOptions::new())
        .unwrap();
    match photos {
        SiteData::Files(files) => {
            assert_eq!(files.len(), 1);
            assert!(files[0].ends_with("north.jpg"));
        }
        SiteData::Table(_) => panic!("photos are listed, not parsed"),
    }

    let missing = db.access("dailypa", &"DENATEKL2015".into(), &ParseOptions::new());
    assert!(matches!(missing, Err(SoundDbError::FileNotFound { .. })));

    let unknown = db.access("spectrogram", &"DENAUPST2015".into(), &ParseOptions::new());
    assert!(matches!(unknown, Err(SoundDbError::UnknownAccessor { .. })));
}

#[test]
fn test_rebuild_index() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    build_root(first.path());
    fs::create_dir_all(second.path().join("2017 KATMBRKS Brooks Falls")).unwrap();

    let mut db = open(first.path());
    assert_eq!(db.index().len(), 3);

    let warnings = db.rebuild_index(second.path());
    assert!(warnings.is_empty());
    assert_eq!(db.index().len(), 1);
    assert_eq!(db.config().raw_data_root, second.path());
}
