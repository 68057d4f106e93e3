use firecamp_config::load_request;
use std::path::Path;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn load_valid_fixture() {
    let req = load_request(&fixture("redis.yml")).expect("should load without error");
    assert_eq!(req.service_name.as_str(), "myredis");
    assert_eq!(req.replicas, 2);
    assert_eq!(req.replica_configs.len(), 2);
    assert!(req.require_static_ip);
}

#[test]
fn unknown_volume_type_is_conversion_error() {
    let err = load_request(&fixture("bad_volume_type.yml")).unwrap_err();
    assert!(matches!(err, firecamp_config::ConfigError::Conversion { .. }));
}

#[test]
fn missing_file_returns_io_error() {
    let err = load_request(Path::new("/nonexistent/path/does/not/exist.yml")).unwrap_err();
    assert!(matches!(err, firecamp_config::ConfigError::Io { .. }));
}
