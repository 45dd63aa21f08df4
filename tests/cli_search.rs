use predicates::prelude::*;

mod campusnet_stub;

use campusnet_stub::CampusNetStub;

fn cmd(base_url: &str, cache_dir: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("coursescrape");
    cmd.env_remove("RUST_LOG")
        .env("CAMPUSNET_USERNAME", "student")
        .env("CAMPUSNET_PASSWORD", "secret")
        .args(["--base-url", base_url, "--cache-dir"])
        .arg(cache_dir);
    cmd
}

#[test]
fn terms_lists_term_labels() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;

    cmd(&stub.base_url, temp.path())
        .arg("terms")
        .assert()
        .success()
        .stdout("114-Fall 2025\n115-Spr 2026\n");
    Ok(())
}

#[test]
fn subjects_uses_first_matching_term() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;

    cmd(&stub.base_url, temp.path())
        .args(["subjects", "--term", "fall"])
        .assert()
        .success()
        .stdout("CIS, STA\n");

    assert!(
        temp.path()
            .join("subjects")
            .join("114-Fall%202025")
            .join("GRAD.xml")
            .exists()
    );
    Ok(())
}

#[test]
fn search_prints_section_table_with_topic() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;

    cmd(&stub.base_url, temp.path())
        .args(["search", "--term", "114-Fall 2025", "--subject", "CIS", "STA"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("# 114-Fall 2025: CIS")
                .and(predicate::str::contains(
                    "CIS 895 Doctoral Research - Distributed Systems",
                ))
                .and(predicate::str::contains("2644"))
                .and(predicate::str::contains("# 114-Fall 2025: STA")),
        );

    let search_dir = temp.path().join("search").join("114-Fall%202025");
    assert!(search_dir.join("CIS.xml").exists());
    assert!(search_dir.join("STA.xml").exists());
    Ok(())
}

#[test]
fn search_details_json_merges_section_and_detail() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;

    let output = cmd(&stub.base_url, temp.path())
        .args(["search", "-t", "fall 2025", "-s", "CIS", "--details", "--json"])
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(lines[0])?;
    assert_eq!(record["term"], "114-Fall 2025");
    assert_eq!(record["subject"], "CIS");
    assert_eq!(record["name"], "CIS 895 Doctoral Research");
    assert_eq!(record["topic"], "Distributed Systems");
    assert_eq!(record["classnr"], "2644");
    assert_eq!(record["credits"], "3.00");
    assert_eq!(record["lastdaytodrop"], "09/08/2025");
    assert_eq!(record["description"], "An introduction to research methods.");
    assert!(record["consent"].is_null());

    assert!(
        temp.path()
            .join("details")
            .join("114")
            .join("2644")
            .join("GRAD.xml")
            .exists()
    );
    Ok(())
}

#[test]
fn cached_run_replays_without_network() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let args = ["search", "-t", "114-Fall 2025", "-s", "CIS", "--details", "--json"];

    let first = {
        let stub = CampusNetStub::spawn();
        let output = cmd(&stub.base_url, temp.path()).args(args).output()?;
        assert!(output.status.success());
        assert!(stub.requests() > 0);
        output.stdout
    };

    // The stub is gone; only the cache can answer, and no login is attempted.
    let replay = assert_cmd::cargo::cargo_bin_cmd!("coursescrape")
        .env_remove("RUST_LOG")
        .env_remove("CAMPUSNET_USERNAME")
        .env_remove("CAMPUSNET_PASSWORD")
        .args(["--base-url", "http://127.0.0.1:9", "--cache-dir"])
        .arg(temp.path())
        .args(args)
        .output()?;
    assert!(replay.status.success());
    assert_eq!(replay.stdout, first);
    Ok(())
}

#[test]
fn no_cache_fetches_every_time_and_writes_nothing() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;
    let cache_dir = temp.path().join("cache");

    for _ in 0..2 {
        cmd(&stub.base_url, &cache_dir)
            .args(["--no-cache", "search", "-t", "114-Fall 2025", "-s", "CIS"])
            .assert()
            .success();
    }

    // login, terms page, search: per run
    assert_eq!(stub.requests(), 6);
    assert!(!cache_dir.exists());
    Ok(())
}

#[test]
fn missing_credentials_fail_on_first_network_fetch() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;

    assert_cmd::cargo::cargo_bin_cmd!("coursescrape")
        .env_remove("CAMPUSNET_USERNAME")
        .env_remove("CAMPUSNET_PASSWORD")
        .args(["--base-url", &stub.base_url, "--cache-dir"])
        .arg(temp.path())
        .arg("terms")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing login credentials"));
    assert_eq!(stub.requests(), 0);
    Ok(())
}

#[test]
fn unknown_term_pattern_fails() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;

    cmd(&stub.base_url, temp.path())
        .args(["search", "-t", "winter", "-s", "CIS"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no term matches: winter"));
    Ok(())
}

#[test]
fn rust_log_debug_emits_parsed_cli_without_password() -> anyhow::Result<()> {
    let stub = CampusNetStub::spawn();
    let temp = tempfile::TempDir::new()?;

    cmd(&stub.base_url, temp.path())
        .env("RUST_LOG", "debug")
        .arg("terms")
        .assert()
        .success()
        .stderr(
            predicate::str::contains("parsed cli")
                .and(predicate::str::contains("secret").not()),
        );
    Ok(())
}
