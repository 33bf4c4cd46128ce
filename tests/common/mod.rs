//! Runs tests using actual binary, apapted from 'fd' method: https://github.com/sharkdp/fd/blob/master/tests/testenv/mod.rs
#![allow(dead_code)]
use std::env;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Complete AudioControl interface of a stereo speaker: header, clock source, USB streaming input terminal, feature unit and speaker output terminal
pub const SPEAKER_AC_HEX: &str = "./tests/data/speaker_ac.hex";
/// AS General plus Format Type I of a 24 bit stereo alt setting
pub const AS_INTERFACE_HEX: &str = "./tests/data/as_interface.hex";
/// Dump of a single programmable clock source
pub const CLOCK_SOURCE_DUMP: &str = "./tests/data/clock_source_dump.txt";
/// Config so tests do not pick up the user config
pub const TEST_CONFIG: &str = "./tests/data/uacdesc.json";
/// Programmable clock source with frequency read/write and validity read-only
pub const CLOCK_SOURCE_BYTES: &[&str] = &["08", "24", "0a", "29", "03", "07", "00", "00"];

pub fn read_dump(file_name: &str) -> BufReader<File> {
    let f = File::open(file_name).expect("Unable to open dump file");
    BufReader::new(f)
}

pub fn read_dump_to_string(file_name: &str) -> String {
    let mut ret = String::new();
    let mut br = read_dump(file_name);
    br.read_to_string(&mut ret)
        .unwrap_or_else(|_| panic!("Failed to read {}", file_name));
    ret
}

/// Environment for the integration tests.
pub struct TestEnv {
    /// Path to the *uacdesc* executable.
    uacdesc_exe: PathBuf,
    /// Strip whitespace at start
    strip_start: bool,
}

/// Find the *uacdesc* executable.
fn find_uacdesc_exe() -> PathBuf {
    // Tests exe is in target/debug/deps, the *uacdesc* exe is in target/debug
    let root = env::current_exe()
        .expect("tests executable")
        .parent()
        .expect("tests executable directory")
        .parent()
        .expect("uacdesc executable directory")
        .to_path_buf();

    let exe_name = if cfg!(windows) {
        "uacdesc.exe"
    } else {
        "uacdesc"
    };

    root.join(exe_name)
}

/// Format an error message for when *uacdesc* did not exit as expected.
fn format_exit_error(args: &[&str], output: &process::Output) -> String {
    format!(
        "`uacdesc {}` exited with {}.\nstdout:\n---\n{}---\nstderr:\n---\n{}---",
        args.join(" "),
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// Format an error message for when the output of *uacdesc* did not match the expected output.
fn format_output_error(args: &[&str], expected: &str, actual: &str) -> String {
    // Generate diff text.
    let diff_text = diff::lines(expected, actual)
        .into_iter()
        .map(|diff| match diff {
            diff::Result::Left(l) => format!("-{}", l),
            diff::Result::Both(l, _) => format!(" {}", l),
            diff::Result::Right(r) => format!("+{}", r),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        concat!(
            "`uacdesc {}` did not produce the expected output.\n",
            "Showing diff between expected and actual:\n{}\n"
        ),
        args.join(" "),
        diff_text
    )
}

/// Trim whitespace from the beginning of each line.
fn trim_lines(s: &str) -> String {
    s.lines()
        .map(|line| line.trim_start())
        .fold(String::new(), |mut str, line| {
            str.push_str(line);
            str.push('\n');
            str
        })
}

impl TestEnv {
    pub fn new() -> TestEnv {
        TestEnv {
            uacdesc_exe: find_uacdesc_exe(),
            strip_start: false,
        }
    }

    pub fn strip_start(self, strip_start: bool) -> TestEnv {
        TestEnv {
            uacdesc_exe: self.uacdesc_exe,
            strip_start,
        }
    }

    /// Get the path of the uacdesc executable.
    #[cfg_attr(windows, allow(unused))]
    pub fn test_exe(&self) -> &PathBuf {
        &self.uacdesc_exe
    }

    /// Run *uacdesc* with the test config and no colour, feeding `stdin` if given
    pub fn run(&self, args: &[&str], stdin: Option<&str>) -> process::Output {
        let mut cmd = process::Command::new(&self.uacdesc_exe);
        cmd.arg("--no-color")
            .arg("--config")
            .arg(TEST_CONFIG)
            .args(args)
            .stdout(process::Stdio::piped())
            .stderr(process::Stdio::piped());

        match stdin {
            Some(input) => {
                cmd.stdin(process::Stdio::piped());
                let mut child = cmd.spawn().expect("uacdesc spawn");
                child
                    .stdin
                    .take()
                    .expect("uacdesc stdin")
                    .write_all(input.as_bytes())
                    .expect("write uacdesc stdin");
                child.wait_with_output().expect("uacdesc output")
            }
            None => {
                cmd.stdin(process::Stdio::null());
                cmd.output().expect("uacdesc output")
            }
        }
    }

    /// Assert that calling *uacdesc* with the specified arguments succeeds
    pub fn assert_success_and_get_output(&self, args: &[&str], stdin: Option<&str>) -> String {
        let output = self.run(args, stdin);

        // Check for exit status.
        if !output.status.success() {
            panic!("{}", format_exit_error(args, &output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if self.strip_start {
            trim_lines(&stdout)
        } else {
            stdout
        }
    }

    /// Assert that calling *uacdesc* fails and return stderr
    pub fn assert_failure_and_get_stderr(&self, args: &[&str]) -> String {
        let output = self.run(args, None);

        if output.status.success() {
            panic!("{}", format_exit_error(args, &output));
        }

        String::from_utf8_lossy(&output.stderr).to_string()
    }

    /// Assert that calling *uacdesc* with the specified arguments produces the expected output.
    pub fn assert_output(&self, args: &[&str], expected: &str, contains: bool) {
        let actual = self.assert_success_and_get_output(args, None);
        let expected = if self.strip_start {
            trim_lines(expected)
        } else {
            expected.to_string()
        };

        if contains {
            if !actual.contains(&expected) {
                panic!("{}", format_output_error(args, &expected, &actual));
            }
        } else if expected != actual {
            panic!("{}", format_output_error(args, &expected, &actual));
        }
    }

    /// Parse the output as JSON and check `expected` is included in it
    pub fn assert_output_json(&self, args: &[&str], expected: serde_json::Value) {
        let actual = self.assert_success_and_get_output(args, None);
        let actual: serde_json::Value =
            serde_json::from_str(&actual).unwrap_or_else(|e| panic!("{}: {}", e, actual));

        assert_json_diff::assert_json_include!(actual: actual, expected: expected);
    }
}
