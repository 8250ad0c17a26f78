// tests/config_test.rs
use mkrelease::config::{load_config, Config, CONFIG_FILE_NAME};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// Restores the working directory when dropped
struct CwdGuard(PathBuf);

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        CwdGuard(previous)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.0);
    }
}

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.paths.manifest, Path::new("src/materialized/Cargo.toml"));
    assert_eq!(config.paths.license, Path::new("LICENSE"));
    assert_eq!(config.paths.doc_versions, Path::new("doc/user/config.toml"));
    assert_eq!(config.project.product_name, "Materialize");
    assert_eq!(config.project.cargo_package, "materialized");
    assert_eq!(config.project.upstream_repo, "MaterializeInc/materialize");
    assert_eq!(config.github.api_base, "https://api.github.com");
    assert_eq!(config.github.max_concurrent_requests, 10);
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[project]
product_name = "Widget"
cargo_package = "widgetd"
upstream_repo = "acme/widget"

[github]
token_path = "/tmp/widget-token"
max_concurrent_requests = 4
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path())).unwrap();
    assert_eq!(config.project.product_name, "Widget");
    assert_eq!(config.project.cargo_package, "widgetd");
    assert_eq!(config.project.upstream_repo, "acme/widget");
    assert_eq!(config.github.max_concurrent_requests, 4);
    assert_eq!(
        config.github.resolved_token_path(),
        PathBuf::from("/tmp/widget-token")
    );
    // Untouched sections keep their defaults
    assert_eq!(config.paths.license, Path::new("LICENSE"));
    assert_eq!(config.github.api_base, "https://api.github.com");
}

#[test]
fn test_invalid_file_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[project\nname = ").unwrap();
    temp_file.flush().unwrap();

    assert!(load_config(Some(temp_file.path())).is_err());
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(load_config(Some(dir.path().join("absent.toml").as_path())).is_err());
}

#[test]
#[serial]
fn test_discovers_file_in_current_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[paths]\nmanifest = \"crates/app/Cargo.toml\"\n",
    )
    .unwrap();

    let _cwd = CwdGuard::enter(dir.path());
    let config = load_config(None).unwrap();
    assert_eq!(config.paths.manifest, Path::new("crates/app/Cargo.toml"));
}
