use assert_cmd::Command;

fn shelf_cli() -> Command {
    let mut cmd = Command::cargo_bin("shelf-cli").unwrap();
    cmd.env_remove("DATABASE_URL")
        .env_remove("SHELF_DATABASE__URL")
        .env("SHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"))
        .current_dir(std::env::temp_dir());
    cmd
}

fn stderr_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    String::from_utf8(output.stderr).unwrap()
}

#[test]
fn help_lists_subcommands() {
    let output = shelf_cli().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("books"));
    assert!(stdout.contains("ping"));
}

#[test]
fn zero_limit_fails_before_connecting() {
    let stderr = stderr_of(shelf_cli().args(["books", "--limit", "0"]));
    assert!(stderr.contains("invalid limit"), "stderr: {}", stderr);
}

#[test]
fn negative_offset_fails_before_connecting() {
    let stderr = stderr_of(shelf_cli().args(["books", "--offset", "-3"]));
    assert!(stderr.contains("invalid offset"), "stderr: {}", stderr);
}

#[test]
fn unknown_sort_fails_before_connecting() {
    let stderr = stderr_of(shelf_cli().args(["books", "--sort", "title"]));
    assert!(stderr.contains("invalid sort"), "stderr: {}", stderr);
}

#[test]
fn valid_query_without_database_url_is_a_configuration_error() {
    let stderr = stderr_of(shelf_cli().args(["books", "--limit", "5"]));
    assert!(stderr.contains("DATABASE_URL"), "stderr: {}", stderr);
}
