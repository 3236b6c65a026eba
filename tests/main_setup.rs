use editor_gate::{AppConfig, ScryptCost, config::Env};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 7] = [
    "APP_ENV",
    "DATABASE_URL",
    "BIND_ADDR",
    "SCRYPT_LOG_N",
    "SCRYPT_R",
    "SCRYPT_P",
    "MAX_CONCURRENT_DERIVATIONS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with the given variables set (and every other config variable cleared),
/// restoring the original environment afterwards even if the closure panics.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> std::thread::Result<R>
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    result
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    // DATABASE_URL is mandatory in production.
    let result = run_with_env(&[("APP_ENV", "production")], AppConfig::load);

    assert!(
        result.is_err(),
        "Production config loading should panic without DATABASE_URL"
    );
}

#[test]
#[serial]
fn test_app_config_production_with_database() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://user:pass@db/editor"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.db_url, "postgres://user:pass@db/editor");
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(&[("APP_ENV", "local")], AppConfig::load).unwrap();

    assert_eq!(config.env, Env::Local);
    assert!(config.db_url.starts_with("postgres://"));
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.kdf_cost, ScryptCost::default());
}

#[test]
#[serial]
fn test_app_config_reads_kdf_cost() {
    let config = run_with_env(
        &[("SCRYPT_LOG_N", "15"), ("SCRYPT_R", "16"), ("SCRYPT_P", "2")],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(
        config.kdf_cost,
        ScryptCost {
            log_n: 15,
            r: 16,
            p: 2,
        }
    );
}

#[test]
#[serial]
fn test_app_config_rejects_unparsable_kdf_cost() {
    let result = run_with_env(&[("SCRYPT_LOG_N", "fourteen")], AppConfig::load);

    assert!(result.is_err(), "A non-numeric cost must stop startup");
}

#[test]
#[serial]
fn test_app_config_reads_derivation_limit() {
    let config = run_with_env(&[("MAX_CONCURRENT_DERIVATIONS", "3")], AppConfig::load).unwrap();
    assert_eq!(config.max_concurrent_derivations, 3);

    let config = run_with_env(&[], AppConfig::load).unwrap();
    assert!(config.max_concurrent_derivations >= 1);
}

#[test]
fn test_default_config_uses_default_cost() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.kdf_cost, ScryptCost::default());
}
