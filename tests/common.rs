#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn rl() -> Command {
    cargo_bin_cmd!("rlounge")
}

/// `rlounge --db <db> --test <args…>`
pub fn rl_db(db_path: &str, args: &[&str]) -> Command {
    let mut cmd = rl();
    cmd.args(["--db", db_path, "--test"]).args(args);
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rlounge.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Initialize a DB with two consoles (300/h) and one pool table (200/h)
pub fn init_db_with_stations(db_path: &str) {
    rl_db(db_path, &["init"]).assert().success();

    for (id, kind, rate) in [("s1", "ps", "300"), ("s2", "ps", "300"), ("pool-1", "pool", "200")] {
        rl_db(db_path, &["station", "add", id, "--kind", kind, "--rate", rate])
            .assert()
            .success();
    }
}
