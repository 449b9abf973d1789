use super::*;
use crate::error::SoundDbError;
use crate::models::{ParseOptions, SiteKey, SiteSpecifier};

#[test]
fn test_access_by_id() {
    let fixture = Fixture::new();
    let data = srcid_accessor()
        .access(&fixture.index, &SiteSpecifier::from(UPST), &ParseOptions::new())
        .unwrap();
    assert_eq!(data.as_table().unwrap().height(), 1);
}

#[test]
fn test_access_by_every_specifier_form() {
    let fixture = Fixture::new();
    let accessor = nvspl_accessor();
    let dir = fixture.site_dir("2015 DENAUPST Upper Station");
    let dir_str = dir.to_string_lossy().into_owned();

    let forms = [
        SiteSpecifier::from_parts(&[UPST]).unwrap(),
        SiteSpecifier::from_parts(&[dir_str.as_str()]).unwrap(),
        SiteSpecifier::from_parts(&["DENA", "UPST", "2015"]).unwrap(),
        SiteSpecifier::from_parts(&[dir_str.as_str(), "DENA", "UPST", "2015"]).unwrap(),
    ];
    assert!(matches!(forms[1], SiteSpecifier::Directory(_)));

    for form in &forms {
        let data = accessor
            .access(&fixture.index, form, &ParseOptions::new())
            .unwrap();
        assert_eq!(data.len(), 3, "{:?}", form);
    }
}

#[test]
fn test_access_propagates_errors() {
    let fixture = Fixture::new();
    let accessor = srcid_accessor();
    let options = ParseOptions::new();

    let missing_site = accessor.access(&fixture.index, &"DENAXXXX2015".into(), &options);
    assert!(matches!(missing_site, Err(SoundDbError::SiteNotFound { .. })));

    let bad_id = accessor.access(&fixture.index, &"bad".into(), &options);
    assert!(matches!(bad_id, Err(SoundDbError::InvalidIdentifier { .. })));

    let missing_file = accessor.access(&fixture.index, &TEKL.into(), &options);
    assert!(matches!(missing_file, Err(SoundDbError::FileNotFound { .. })));

    let bad_shape = SiteSpecifier::from_parts(&["DENA", "UPST"]);
    assert!(matches!(bad_shape, Err(SoundDbError::InvalidSpecifier { .. })));
}

#[test]
fn test_access_with_explicit_directory_bypasses_index() {
    let fixture = Fixture::new();
    let elsewhere = TempDir::new().unwrap();
    let site = make_site(elsewhere.path(), "copied");
    write_file(
        &site.join("02 ANALYSIS").join("SPL Analysis"),
        "SRCID_GLBAHGBP2016.txt",
        "srcID\tlen\n0\t12\n",
    );

    let accessor = Accessor::new(
        "srcid_year",
        "SRCID with year in name",
        parse_single(TableFormat::tab()),
        "02 ANALYSIS/SPL Analysis/SRCID_{unit}{site}{year}.txt",
    );
    let key = SiteKey::new("GLBA", "HGBP", "2016").unwrap();
    let data = accessor
        .access(
            &fixture.index,
            &SiteSpecifier::DirectoryKey(site, key),
            &ParseOptions::new(),
        )
        .unwrap();
    assert_eq!(data.len(), 1);
}

#[test]
fn test_access_parse_options() {
    let fixture = Fixture::new();
    let options = ParseOptions::new().with("n_rows", "1");
    let data = nvspl_accessor()
        .access(&fixture.index, &UPST.into(), &options)
        .unwrap();
    // one row per hourly file
    assert_eq!(data.len(), 2);
}
