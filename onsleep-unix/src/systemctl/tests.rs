use super::*;

#[test]
fn test_parse_show_output() {
    let out = "ActiveState=active\nLoadState=loaded\nMainPID=1234\n";
    let props = parse_show_output(out);
    assert_eq!(props.get("ActiveState").map(String::as_str), Some("active"));
    assert_eq!(props.get("LoadState").map(String::as_str), Some("loaded"));
    assert_eq!(props.get("MainPID").map(String::as_str), Some("1234"));
}

#[test]
fn test_parse_show_output_value_with_equals() {
    let props = parse_show_output("ExecStart=/bin/foo --opt=1\n");
    assert_eq!(
        props.get("ExecStart").map(String::as_str),
        Some("/bin/foo --opt=1")
    );
}

#[test]
fn test_parse_show_output_skips_garbage() {
    let props = parse_show_output("no separator here\n=novalue\n\nRequiredBy=\n");
    assert_eq!(props.len(), 1);
    assert_eq!(props.get("RequiredBy").map(String::as_str), Some(""));
}

#[test]
fn test_split_unit_list() {
    let units: Vec<&str> = split_unit_list("a.service  b.service\tc.target").collect();
    assert_eq!(units, vec!["a.service", "b.service", "c.target"]);
    assert_eq!(split_unit_list("").count(), 0);
}

#[test]
fn test_error_line_picks_first_non_empty() {
    let output = SystemctlOutput {
        code: Some(5),
        stdout: String::new(),
        stderr: "\n  Failed to stop foo.service: Unit foo.service not loaded.\nmore\n".to_string(),
    };
    assert!(!output.success());
    assert_eq!(
        output.error_line(),
        "Failed to stop foo.service: Unit foo.service not loaded."
    );
    assert_eq!(output.code_or_signal(), 5);
}

#[test]
fn test_signal_exit_maps_to_minus_one() {
    let output = SystemctlOutput {
        code: None,
        stdout: String::new(),
        stderr: String::new(),
    };
    assert_eq!(output.code_or_signal(), -1);
    assert_eq!(output.error_line(), "");
}

#[cfg(unix)]
#[test]
fn test_run_missing_binary_is_io_error() {
    let systemctl = Systemctl::with_program("/nonexistent/systemctl-onsleep-test");
    assert!(systemctl.run(["--version"]).is_err());
}

#[cfg(unix)]
#[test]
fn test_run_captures_exit_code_and_output() {
    // `sh -c` stands in for systemctl: argv[1..] are passed straight through
    let systemctl = Systemctl::with_program("sh");
    let output = systemctl
        .run(["-c", "echo ActiveState=inactive; echo oops >&2; exit 3"])
        .unwrap();
    assert_eq!(output.code, Some(3));
    assert_eq!(output.stdout.trim(), "ActiveState=inactive");
    assert_eq!(output.error_line(), "oops");
}
