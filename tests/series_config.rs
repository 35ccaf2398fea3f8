// tests/series_config.rs
use middlington_api::config::series::ENV_SERIES_CONFIG_PATH;
use middlington_api::SeriesCatalog;
use std::path::Path;
use std::{env, fs};

#[serial_test::serial]
#[test]
fn shipped_catalogue_matches_builtin_seed() {
    let shipped = SeriesCatalog::load_from(Path::new("config/series.toml")).unwrap();
    assert_eq!(shipped, SeriesCatalog::default_seed());
}

#[serial_test::serial]
#[test]
fn json_catalogue_loads() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("series.json");
    fs::write(
        &p,
        r#"{"series":[{"topic":"cpi","route":"/ons-cpi","label":"CPI","data_source":"ONS",
            "description":"CPI","dataset":"cpih01","version":"6","window":3}]}"#,
    )
    .unwrap();
    let cat = SeriesCatalog::load_from(&p).unwrap();
    assert_eq!(cat.len(), 1);
    assert_eq!(cat.by_route("/ons-cpi").unwrap().window, 3);
}

#[serial_test::serial]
#[test]
fn invalid_catalogue_is_rejected_with_path_in_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("series.toml");
    fs::write(&p, "[[series]]\ntopic = \"x\"\n").unwrap();
    let err = SeriesCatalog::load_from(&p).unwrap_err();
    assert!(format!("{err:#}").contains("series.toml"));
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_SERIES_CONFIG_PATH);

    // 1) Nothing on disk -> built-in seed
    let v = SeriesCatalog::load_default().unwrap();
    assert_eq!(v, SeriesCatalog::default_seed());

    // 2) ./config/series.json fallback
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("series.json"),
        r#"{"series":[{"topic":"a","label":"A","data_source":"s","description":"d","dataset":"x","version":"1"}]}"#,
    )
    .unwrap();
    let vj = SeriesCatalog::load_default().unwrap();
    assert!(vj.get("a").is_some());

    // 3) Env wins
    let p_env = tmp.path().join("other.toml");
    fs::write(
        &p_env,
        r#"
[[series]]
topic = "b"
label = "B"
data_source = "s"
description = "d"
dataset = "y"
version = "2"
"#,
    )
    .unwrap();
    env::set_var(ENV_SERIES_CONFIG_PATH, p_env.display().to_string());
    let ve = SeriesCatalog::load_default().unwrap();
    assert!(ve.get("b").is_some());
    assert!(ve.get("a").is_none());

    // 4) Env pointing nowhere is an error
    env::set_var(ENV_SERIES_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(SeriesCatalog::load_default().is_err());
    env::remove_var(ENV_SERIES_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}
