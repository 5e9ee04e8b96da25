use std::fs;

use icon_bundler::load_config::load_config;
use icon_bundler::regenerate::BundleMode;
use tempfile::tempdir;

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.yml");
    fs::write(&path, contents).unwrap();
    (tmp, path)
}

#[test]
fn loads_sprite_settings_from_yaml() {
    let (_tmp, path) = write_config(
        r#"
store:
  icon_dir: /srv/icons
  output_dir: /srv/uploads
bundle:
  mode: sprite
"#,
    );

    let settings = load_config(&path).expect("config should load");
    assert_eq!(settings.icon_dir, std::path::PathBuf::from("/srv/icons"));
    assert_eq!(settings.output_dir, std::path::PathBuf::from("/srv/uploads"));
    assert_eq!(settings.mode, BundleMode::Sprite);
    assert!(settings.glyph_compiler.is_none());
}

#[test]
fn loads_font_settings_with_compiler() {
    let (_tmp, path) = write_config(
        r#"
store:
  icon_dir: icons
  output_dir: uploads
bundle:
  mode: font
font:
  compiler: /usr/local/bin/glyphc
"#,
    );

    let settings = load_config(&path).expect("config should load");
    assert_eq!(settings.mode, BundleMode::Font);
    assert_eq!(
        settings.glyph_compiler,
        Some(std::path::PathBuf::from("/usr/local/bin/glyphc"))
    );
}

#[test]
fn font_mode_without_compiler_is_rejected() {
    let (_tmp, path) = write_config(
        r#"
store:
  icon_dir: icons
  output_dir: uploads
bundle:
  mode: font
"#,
    );

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("font.compiler"));
}

#[test]
fn missing_file_is_an_error() {
    let tmp = tempdir().unwrap();
    let err = load_config(tmp.path().join("nope.yml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn malformed_yaml_is_an_error() {
    let (_tmp, path) = write_config("store: [not, a, mapping");
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

// Single test covers every base-URL source so no other test races on the
// process-wide CDN_BASE_URL variable.
#[test]
fn base_url_resolution_order_is_env_then_yaml_then_default() {
    std::env::remove_var("CDN_BASE_URL");

    let (_tmp, bare) = write_config(
        r#"
store:
  icon_dir: icons
  output_dir: uploads
bundle:
  mode: sprite
"#,
    );
    let settings = load_config(&bare).unwrap();
    assert_eq!(settings.public_base_url, "http://localhost:3002/uploads");

    let (_tmp2, with_url) = write_config(
        r#"
store:
  icon_dir: icons
  output_dir: uploads
bundle:
  mode: sprite
  public_base_url: https://cdn.example/assets
"#,
    );
    let settings = load_config(&with_url).unwrap();
    assert_eq!(settings.public_base_url, "https://cdn.example/assets");

    std::env::set_var("CDN_BASE_URL", "https://edge.example/u");
    let settings = load_config(&with_url).unwrap();
    assert_eq!(settings.public_base_url, "https://edge.example/u");
    std::env::remove_var("CDN_BASE_URL");
}
