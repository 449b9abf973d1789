//! Fixtures for accessor tests
//!
//! Builds a small raw-data root with two DENA sites:
//!
//! - `2015 DENAUPST Upper Station` - NVSPL hours and an SRCID table
//! - `2015 DENATEKL Teklanika` - NVSPL hours only

use crate::accessor::Accessor;
use crate::index::DirectoryIndex;
use crate::parsers::table::{TableFormat, parse_many, parse_single};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

mod access_tests;
mod iter_tests;

pub const UPST: &str = "DENAUPST2015";
pub const TEKL: &str = "DENATEKL2015";

pub const NVSPL_HEADER: &str = "SiteID,STime,H,dbA\n";

/// Raw-data root kept alive for the duration of a test
pub struct Fixture {
    pub root: TempDir,
    pub index: DirectoryIndex,
}

impl Fixture {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();

        let upst = make_site(root.path(), "2015 DENAUPST Upper Station");
        write_nvspl(&upst, "DENAUPST", "2015_06_01_00", &[31.5, 30.9]);
        write_nvspl(&upst, "DENAUPST", "2015_06_01_01", &[29.1]);
        write_file(
            &upst.join("02 ANALYSIS").join("SPL Analysis"),
            "SRCID_DENAUPST.txt",
            "nvsplDate\thr\tsrcID\tlen\n2015-06-01\t7\t1.1\t30\n",
        );

        let tekl = make_site(root.path(), "2015 DENATEKL Teklanika");
        write_nvspl(&tekl, "DENATEKL", "2015_06_01_00", &[27.0]);

        let index = DirectoryIndex::build(root.path());
        Self { root, index }
    }

    pub fn site_dir(&self, name: &str) -> PathBuf {
        std::path::absolute(self.root.path().join(name)).unwrap()
    }
}

pub fn make_site(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("01 DATA").join("NVSPL")).unwrap();
    fs::create_dir_all(dir.join("02 ANALYSIS").join("SPL Analysis")).unwrap();
    dir
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn write_nvspl(site_dir: &Path, unit_site: &str, hour: &str, levels: &[f64]) -> PathBuf {
    let site = &unit_site[4..];
    let mut contents = String::from(NVSPL_HEADER);
    for (second, level) in levels.iter().enumerate() {
        contents.push_str(&format!(
            "{},{} {:02},20.0,{}\n",
            site, hour, second, level
        ));
    }
    write_file(
        &site_dir.join("01 DATA").join("NVSPL"),
        &format!("NVSPL_{}{}.txt", unit_site, hour),
        &contents,
    )
}

pub fn nvspl_accessor() -> Accessor {
    Accessor::new(
        "nvspl",
        "Hourly NVSPL sound level files",
        parse_many(TableFormat::comma()),
        "01 DATA/NVSPL/NVSPL_{unit}{site}*.txt",
    )
}

pub fn srcid_accessor() -> Accessor {
    Accessor::new(
        "srcid",
        "Noise source identification table",
        parse_single(TableFormat::tab()),
        "02 ANALYSIS/SPL Analysis/SRCID_{unit}{site}.txt",
    )
}
