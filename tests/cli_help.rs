use assert_cmd::Command;

#[test]
fn cli_help_smoke() {
    let mut cmd = Command::cargo_bin("kira-bashthebug").unwrap();
    cmd.arg("--help");
    cmd.assert().success();
}

#[test]
fn plates_show_lists_builtin_tables() {
    let mut cmd = Command::cargo_bin("kira-bashthebug").unwrap();
    cmd.args(["plates", "show"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("version v1"));
    assert!(text.contains("UKMYC5\tBDQ\t8"));
    assert!(text.contains("UKMYC6\tBDQ\t7"));
}
