use workfan::config::{Config, DEFAULT_ITEMS, DEFAULT_WORKERS, PoolConfig};

#[test]
fn defaults_match_demo_counts() {
    let config = Config::default();
    assert_eq!(config.pool.workers, 5);
    assert_eq!(config.items, 10);
    assert_eq!(config.pool.workers, DEFAULT_WORKERS);
    assert_eq!(config.items, DEFAULT_ITEMS);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.otel_endpoint, None);
}

#[test]
fn toml_overrides_only_given_keys() {
    let config = Config::from_toml_str(
        r#"
        items = 3

        [pool]
        workers = 2
        "#,
    )
    .unwrap();

    assert_eq!(config.items, 3);
    assert_eq!(
        config.pool,
        PoolConfig {
            workers: 2,
            ..PoolConfig::default()
        }
    );
    assert_eq!(config.log_level, "info");
}

#[test]
fn toml_rejects_bad_values() {
    assert!(Config::from_toml_str("items = -1").is_err());
    assert!(Config::from_toml_str("[pool]\nthread_name_prefix = \"\"").is_err());
}

#[test]
fn from_file_reports_missing_path() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/workfan.toml")).unwrap_err();
    assert!(err.to_string().contains("cannot read config"));
}

#[test]
fn from_file_reads_toml() {
    let path = std::env::temp_dir().join(format!("workfan-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        "log_level = \"debug\"\notel_endpoint = \"http://localhost:4318\"\n[pool]\nworkers = 0\n",
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.pool.workers, 0);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.otel_endpoint.as_deref(), Some("http://localhost:4318"));
}

// All environment mutation lives in one test so parallel tests never race on it.
#[test]
fn config_from_env() {
    unsafe {
        std::env::remove_var("WORKFAN_WORKERS");
        std::env::remove_var("WORKFAN_ITEMS");
        std::env::remove_var("WORKFAN_THREAD_PREFIX");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.pool.workers, DEFAULT_WORKERS);
    assert_eq!(config.items, DEFAULT_ITEMS);

    unsafe {
        std::env::set_var("WORKFAN_WORKERS", "8");
        std::env::set_var("WORKFAN_ITEMS", " 40 ");
        std::env::set_var("WORKFAN_THREAD_PREFIX", "bench");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.pool.workers, 8);
    assert_eq!(config.items, 40);
    assert_eq!(config.pool.thread_name_prefix, "bench");

    unsafe {
        std::env::set_var("WORKFAN_WORKERS", "many");
    }
    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("WORKFAN_WORKERS"));

    // Same rule as the TOML path: an empty prefix would name threads "-0", "-1".
    unsafe {
        std::env::remove_var("WORKFAN_WORKERS");
        std::env::set_var("WORKFAN_THREAD_PREFIX", "");
    }
    let err = Config::from_env().unwrap_err();
    assert!(err.to_string().contains("thread_name_prefix"));
    assert!(Config::from_toml_str("[pool]\nthread_name_prefix = \"\"").is_err());

    unsafe {
        std::env::remove_var("WORKFAN_WORKERS");
        std::env::remove_var("WORKFAN_ITEMS");
        std::env::remove_var("WORKFAN_THREAD_PREFIX");
    }
}
