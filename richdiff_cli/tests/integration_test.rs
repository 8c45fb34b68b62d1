use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper struct holding input files and an isolated config home
struct TestFixture {
    dir: TempDir,
    config_home: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            dir: TempDir::new().expect("Failed to create temp directory"),
            config_home: TempDir::new().expect("Failed to create config dir"),
        }
    }

    /// Write a JSON value to a file in the fixture directory
    fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, serde_json::to_string(value).unwrap()).expect("Failed to write file");
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Run the CLI binary with config lookups confined to the fixture
    fn run(&self, args: &[&str]) -> std::process::Output {
        let exe = env!("CARGO_BIN_EXE_richdiff_cli");
        let home = self.config_home.path();
        Command::new(exe)
            .args(args)
            .env("XDG_CONFIG_HOME", home)
            .env("APPDATA", home)
            .env("HOME", home)
            .env("RUST_LOG", "warn")
            .output()
            .expect("Failed to execute command")
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        if !output.status.success() {
            eprintln!("STDERR:\n{}", String::from_utf8_lossy(&output.stderr));
            panic!("Command failed with status: {}", output.status);
        }
        serde_json::from_slice(&output.stdout).expect("invalid json output")
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_diff_appended_word() {
    let fixture = TestFixture::new();
    let old = fixture.write_json("old.json", &json!([{"insert": "Tomas"}]));
    let new = fixture.write_json("new.json", &json!([{"insert": "Tomas test"}]));

    let script = fixture.run_json(&["diff", arg(&old), arg(&new)]);
    assert_eq!(script, json!([{"retain": 5}, {"insert": " test"}]));
}

#[test]
fn test_diff_accepts_ops_wrapper() {
    let fixture = TestFixture::new();
    let old = fixture.write_json("old.json", &json!({"ops": [{"insert": "Lorem ipsum"}]}));
    let new = fixture.write_json("new.json", &json!({"ops": [{"insert": "Dolor Sit Amet"}]}));

    let script = fixture.run_json(&["diff", arg(&old), arg(&new)]);
    assert_eq!(
        script,
        json!([
            {"insert": "Dolor"},
            {"delete": 5},
            {"retain": 1},
            {"insert": "Sit Amet"},
            {"delete": 5}
        ])
    );
}

#[test]
fn test_diff_embed_resolution_flags() {
    let fixture = TestFixture::new();
    let old = fixture.write_json(
        "old.json",
        &json!([
            {"insert": {"block-embed": {"uuid": "a"}}},
            {"insert": {"block-embed": {"uuid": "b"}}}
        ]),
    );
    let new = fixture.write_json("new.json", &json!([{"insert": {"block-embed": {"uuid": "b"}}}]));

    let resolved = fixture.run_json(&["diff", "--resolve-embeds", arg(&old), arg(&new)]);
    assert_eq!(resolved, json!([{"delete": 1}]));

    // Without ids the first embed is kept by position and rewritten
    let positional = fixture.run_json(&["diff", "--no-resolve-embeds", arg(&old), arg(&new)]);
    assert_eq!(
        positional,
        json!([{"insert": {"block-embed": {"uuid": "b"}}}, {"delete": 2}])
    );
}

#[test]
fn test_apply_reproduces_new_document() {
    let fixture = TestFixture::new();
    let new_doc = json!([
        {"insert": "Hello "},
        {"insert": "brave", "attributes": {"bold": true}},
        {"insert": " world\n"}
    ]);
    let old = fixture.write_json("old.json", &json!([{"insert": "Hello world\n"}]));
    let new = fixture.write_json("new.json", &new_doc);

    let script = fixture.run_json(&["diff", arg(&old), arg(&new)]);
    let script_path = fixture.write_json("script.json", &script);

    let applied = fixture.run_json(&["apply", arg(&old), arg(&script_path)]);
    assert_eq!(applied, new_doc);
}

#[test]
fn test_classify_comment_only_change() {
    let fixture = TestFixture::new();
    let baseline = fixture.write_json(
        "baseline.json",
        &json!([
            {"insert": "Intro\n"},
            {"insert": {"block-embed": {"uuid": "U", "size": "small", "embedData": {"id": "X"}}}}
        ]),
    );
    let script = fixture.write_json(
        "script.json",
        &json!([
            {"retain": 6},
            {"insert": {"block-embed": {
                "uuid": "U",
                "size": "small",
                "embedData": {"id": "X", "threadIds": ["t1"]}
            }}},
            {"delete": 1}
        ]),
    );

    let report = fixture.run_json(&["classify", arg(&script), "--baseline", arg(&baseline)]);
    assert_eq!(report, json!({"contains_changes": true, "comment_only": true}));

    let report = fixture.run_json(&["classify", arg(&script)]);
    assert_eq!(report, json!({"contains_changes": true, "comment_only": null}));
}

#[test]
fn test_classify_formatting_only_script() {
    let fixture = TestFixture::new();
    let script = fixture.write_json(
        "script.json",
        &json!([{"retain": 3}, {"retain": 4, "attributes": {"italic": true}}]),
    );

    let report = fixture.run_json(&["classify", arg(&script)]);
    assert_eq!(report["contains_changes"], json!(false));
}

#[test]
fn test_pretty_output_from_config_file() {
    let fixture = TestFixture::new();
    let config = fixture.path("richdiff.toml");
    fs::write(&config, "pretty_output = true\n").unwrap();
    let doc = fixture.write_json("doc.json", &json!([{"insert": "a"}]));
    let script = fixture.write_json("script.json", &json!([{"insert": "b"}]));

    let output = fixture.run(&["--config", arg(&config), "apply", arg(&doc), arg(&script)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\n  {"));
    let value: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value, json!([{"insert": "ba"}]));
}

#[test]
fn test_config_init_writes_defaults() {
    let fixture = TestFixture::new();
    let config = fixture.path("conf").join("richdiff.toml");

    let output = fixture.run(&["--config", arg(&config), "config", "--init"]);
    assert!(output.status.success());
    assert!(config.exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("resolve_embed_ids = true"));
    assert!(stdout.contains("pretty_output = false"));
}
