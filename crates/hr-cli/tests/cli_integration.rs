//! End-to-end tests for the `hr` binary.
//!
//! Every command runs with a scratch XDG config directory and without the
//! HR_* environment so a developer's own config cannot leak in.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

const GEORGE_DIGEST: &str = "R1CMtFEve0aq6zS0pRTGPWPsJAvyjLxEEK3dSGfBAGY=";

#[allow(deprecated)]
fn hr(scratch: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("hr");
    cmd.env_remove("HR_CONFIG")
        .env_remove("HR_ENCRYPTION_KEY")
        .env_remove("HR_LOG")
        .env_remove("HR_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", scratch.path().join("xdg"))
        .timeout(std::time::Duration::from_secs(30));
    cmd
}

fn keygen(scratch: &TempDir) -> std::path::PathBuf {
    let path = scratch.path().join("redaction.key");
    hr(scratch)
        .args(["keygen", "--output"])
        .arg(&path)
        .assert()
        .success();
    path
}

fn parse_stdout(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("stdout should be JSON")
}

fn redact_stdout(scratch: &TempDir, key: &Path, args: &[&str], input: &str) -> Vec<u8> {
    let output = hr(scratch)
        .arg("redact")
        .arg("--key-file")
        .arg(key)
        .args(args)
        .write_stdin(input.to_string())
        .output()
        .unwrap();
    assert!(output.status.success(), "redact failed: {:?}", output);
    output.stdout
}

mod keygen {
    use super::*;

    #[test]
    fn writes_key_file() {
        let scratch = TempDir::new().unwrap();
        let path = keygen(&scratch);

        let file: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(file["algorithm"], "aes-256-gcm");
        assert_eq!(file["schema_version"], "1.0.0");
        assert!(file["key_material"].as_str().is_some());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn prints_key_without_output() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .arg("keygen")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"key_material\""));
    }
}

mod redact {
    use super::*;

    #[test]
    fn digests_and_removes() {
        let scratch = TempDir::new().unwrap();
        let output = hr(&scratch)
            .args(["redact", "-p", "email=digest", "-p", "ssn"])
            .write_stdin(r#"{"email": "george@example.com", "ssn": "123-45-6789", "name": "George"}"#)
            .output()
            .unwrap();
        assert!(output.status.success());

        let record = parse_stdout(&output.stdout);
        assert_eq!(record["email_digest"], GEORGE_DIGEST);
        assert_eq!(record["name"], "George");
        assert!(record.get("email").is_none());
        assert!(record.get("ssn").is_none());
    }

    #[test]
    fn salt_changes_digest() {
        let scratch = TempDir::new().unwrap();
        let output = hr(&scratch)
            .args(["redact", "-p", "email=digest", "--salt", "pepper"])
            .write_stdin(r#"{"email": "george@example.com"}"#)
            .output()
            .unwrap();
        assert!(output.status.success());

        let record = parse_stdout(&output.stdout);
        assert_ne!(record["email_digest"], GEORGE_DIGEST);
    }

    #[test]
    fn no_digest_empty_copies_empty_values() {
        let scratch = TempDir::new().unwrap();
        let input = r#"{"email": "", "name": "George"}"#;

        let output = hr(&scratch)
            .args(["redact", "-p", "email=digest", "-p", "name=digest"])
            .write_stdin(input)
            .output()
            .unwrap();
        assert!(output.status.success());
        let hashed = parse_stdout(&output.stdout);
        assert_eq!(
            hashed["email_digest"],
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );

        let output = hr(&scratch)
            .args(["redact", "-p", "email=digest", "-p", "name=digest", "--no-digest-empty"])
            .write_stdin(input)
            .output()
            .unwrap();
        assert!(output.status.success());
        let copied = parse_stdout(&output.stdout);
        assert_eq!(copied["email_digest"], "");
        assert_eq!(copied["name_digest"], hashed["name_digest"]);
        assert!(copied.get("email").is_none());
    }

    #[test]
    fn no_timestamps_starts_lines_with_level() {
        let scratch = TempDir::new().unwrap();
        let output = hr(&scratch)
            .args(["-v", "--no-timestamps", "redact", "-p", "ssn"])
            .write_stdin(r#"{"ssn": "123-45-6789"}"#)
            .output()
            .unwrap();
        assert!(output.status.success());

        let stderr = String::from_utf8_lossy(&output.stderr);
        let line = stderr
            .lines()
            .find(|line| line.contains("redacted records"))
            .expect("info event on stderr");
        assert!(line.trim_start().starts_with("INFO"), "{}", line);
    }

    #[test]
    fn whitelist_drops_unnamed_fields() {
        let scratch = TempDir::new().unwrap();
        let output = hr(&scratch)
            .args(["redact", "--whitelist", "-p", "name=keep", "-p", "email=digest"])
            .write_stdin(r#"{"email": "george@example.com", "name": "George", "age": 25}"#)
            .output()
            .unwrap();
        assert!(output.status.success());

        let record = parse_stdout(&output.stdout);
        assert_eq!(record["name"], "George");
        assert_eq!(record["email_digest"], GEORGE_DIGEST);
        assert!(record.get("age").is_none());
        assert!(record.get("email").is_none());
    }

    #[test]
    fn jsonl_in_jsonl_out() {
        let scratch = TempDir::new().unwrap();
        let output = hr(&scratch)
            .args(["redact", "--jsonl", "-p", "ssn=remove"])
            .write_stdin("{\"ssn\": \"1\", \"id\": 1}\n{\"ssn\": \"2\", \"id\": 2}\n")
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines, vec!["{\"id\":1}", "{\"id\":2}"]);
    }

    #[test]
    fn unnamed_large_integer_is_untouched() {
        let scratch = TempDir::new().unwrap();
        let output = hr(&scratch)
            .args(["redact", "-p", "email=digest"])
            .write_stdin(r#"{"id": 18446744073709551615, "email": "george@example.com"}"#)
            .output()
            .unwrap();
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).unwrap();
        assert_eq!(
            stdout,
            format!(
                "{{\"email_digest\":\"{}\",\"id\":18446744073709551615}}\n",
                GEORGE_DIGEST
            )
        );
    }

    #[test]
    fn reads_input_file() {
        let scratch = TempDir::new().unwrap();
        let input = scratch.path().join("records.json");
        std::fs::write(&input, r#"[{"ssn": "1"}, {"ssn": "2", "id": 2}]"#).unwrap();

        let output = hr(&scratch)
            .args(["redact", "-p", "ssn"])
            .arg("--input")
            .arg(&input)
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(parse_stdout(&output.stdout), serde_json::json!([{}, {"id": 2}]));
    }

    #[test]
    fn policy_from_config_file() {
        let scratch = TempDir::new().unwrap();
        let key = keygen(&scratch);
        let config = scratch.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "key_file = {:?}\nencode_iv = \"hex\"\n\n[redact]\nemail = \"digest\"\naddress = \"encrypt\"\n",
                key.display().to_string()
            ),
        )
        .unwrap();

        let output = hr(&scratch)
            .arg("redact")
            .arg("--config")
            .arg(&config)
            .write_stdin(r#"{"email": "george@example.com", "address": "22nd St, NY"}"#)
            .output()
            .unwrap();
        assert!(output.status.success());

        let record = parse_stdout(&output.stdout);
        assert_eq!(record["email_digest"], GEORGE_DIGEST);
        let iv = record["encrypted_address_iv"].as_str().unwrap();
        assert_eq!(iv.len(), 24);
        assert!(iv.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn xdg_config_is_discovered() {
        let scratch = TempDir::new().unwrap();
        let dir = scratch.path().join("xdg").join("hash-redactor");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[redact]\nssn = \"remove\"\n").unwrap();

        let output = hr(&scratch)
            .arg("redact")
            .write_stdin(r#"{"ssn": "123", "id": 1}"#)
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(parse_stdout(&output.stdout), serde_json::json!({"id": 1}));
    }
}

mod round_trip {
    use super::*;

    #[test]
    fn decrypt_restores_encrypted_fields() {
        let scratch = TempDir::new().unwrap();
        let key = keygen(&scratch);
        let input = r#"{"address": "22nd St, NY", "email": "george@example.com"}"#;

        let redacted = redact_stdout(
            &scratch,
            &key,
            &["-p", "address=encrypt", "-p", "email=digest"],
            input,
        );
        let record = parse_stdout(&redacted);
        assert!(record.get("address").is_none());
        assert!(record["encrypted_address"].is_string());
        assert!(record["encrypted_address_iv"].is_string());

        let output = hr(&scratch)
            .args(["decrypt", "-p", "address=encrypt"])
            .arg("--key-file")
            .arg(&key)
            .write_stdin(redacted)
            .output()
            .unwrap();
        assert!(output.status.success());

        let restored = parse_stdout(&output.stdout);
        assert_eq!(restored["address"], "22nd St, NY");
        assert_eq!(restored["email_digest"], GEORGE_DIGEST);
        assert!(restored.get("encrypted_address").is_none());
        assert!(restored.get("encrypted_address_iv").is_none());
    }

    #[test]
    fn unencoded_companions_survive_json() {
        let scratch = TempDir::new().unwrap();
        let key = keygen(&scratch);

        let redacted = redact_stdout(
            &scratch,
            &key,
            &["-p", "ssn=encrypt", "--encode", "false", "--encode-iv", "false"],
            r#"{"ssn": "123-45-6789"}"#,
        );
        let record = parse_stdout(&redacted);
        assert_eq!(record["encrypted_ssn_iv"].as_array().unwrap().len(), 12);

        let output = hr(&scratch)
            .args(["decrypt", "-p", "ssn=encrypt", "--encode", "false", "--encode-iv", "false"])
            .arg("--key-file")
            .arg(&key)
            .write_stdin(redacted)
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(parse_stdout(&output.stdout)["ssn"], "123-45-6789");
    }

    #[test]
    fn key_from_environment() {
        let scratch = TempDir::new().unwrap();
        let key = hr_redact::EncryptionKey::from_bytes([3u8; 32]).to_base64();

        let output = hr(&scratch)
            .args(["redact", "-p", "ssn=encrypt"])
            .env("HR_ENCRYPTION_KEY", &key)
            .write_stdin(r#"{"ssn": "123"}"#)
            .output()
            .unwrap();
        assert!(output.status.success());

        let output = hr(&scratch)
            .args(["decrypt", "-p", "ssn=encrypt", "--key", &key])
            .write_stdin(output.stdout)
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(parse_stdout(&output.stdout)["ssn"], "123");
    }
}

mod failures {
    use super::*;

    #[test]
    fn missing_policy_is_config_error() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .arg("redact")
            .write_stdin(r#"{"email": "george@example.com"}"#)
            .assert()
            .code(11)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("don't know what to redact"));
    }

    #[test]
    fn unknown_operation_is_config_error() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .args(["redact", "-p", "email=weird_new_operation"])
            .write_stdin(r#"{"email": "george@example.com"}"#)
            .assert()
            .code(11)
            .stderr(predicate::str::contains(
                "unknown operation on email: weird_new_operation",
            ));
    }

    #[test]
    fn encrypt_without_key_is_key_error() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .args(["redact", "-p", "ssn=encrypt"])
            .write_stdin(r#"{"ssn": "123"}"#)
            .assert()
            .code(12)
            .stderr(predicate::str::contains("no encryption key"));
    }

    #[test]
    fn bad_key_is_key_error() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .args(["redact", "-p", "ssn=encrypt", "--key", "c2hvcnQ="])
            .write_stdin(r#"{"ssn": "123"}"#)
            .assert()
            .code(12);
    }

    #[test]
    fn wrong_key_is_decrypt_error() {
        let scratch = TempDir::new().unwrap();
        let key = keygen(&scratch);
        let redacted = redact_stdout(&scratch, &key, &["-p", "ssn=encrypt"], r#"{"ssn": "123"}"#);

        let other = hr_redact::EncryptionKey::from_bytes([5u8; 32]).to_base64();
        hr(&scratch)
            .args(["decrypt", "-p", "ssn=encrypt", "--key", &other])
            .write_stdin(redacted)
            .assert()
            .code(13)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("123").not());
    }

    #[test]
    fn nested_record_is_args_error() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .args(["redact", "-p", "ssn"])
            .write_stdin(r#"{"address": {"street": "22nd St"}}"#)
            .assert()
            .code(10);
    }

    #[test]
    fn missing_config_file() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .args(["redact", "-p", "ssn", "--config"])
            .arg(scratch.path().join("absent.toml"))
            .write_stdin(r#"{"ssn": "123"}"#)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("config file not found"));
    }

    #[test]
    fn bad_flag_is_args_error() {
        let scratch = TempDir::new().unwrap();
        hr(&scratch)
            .args(["redact", "--filter-mode", "sideways"])
            .assert()
            .code(10);
    }
}
