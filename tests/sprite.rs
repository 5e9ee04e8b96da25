use icon_bundler::error::PipelineError;
use icon_bundler::sprite::SpriteBuilder;
use icon_bundler::store::IconStore;
use std::fs;
use tempfile::{tempdir, TempDir};

fn fixture(tmp: &TempDir) -> (IconStore, SpriteBuilder) {
    let store = IconStore::new(tmp.path().join("icons"), tmp.path().join("out"));
    store.ensure_ready().unwrap();
    let builder = SpriteBuilder::new(tmp.path().join("out").join("sprites"));
    (store, builder)
}

#[test]
fn two_icons_yield_two_symbols_and_a_full_lookup_table() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    store
        .put("a.svg", b"<svg viewBox=\"0 0 24 24\"><path d=\"M1 1\"/></svg>")
        .unwrap();
    store
        .put("b.svg", b"<svg viewBox=\"0 0 16 16\"><circle r=\"4\"/></svg>")
        .unwrap();

    let bundle = builder
        .build(&store.list_all().unwrap(), Some("test".to_string()))
        .unwrap();
    assert_eq!(bundle.icon_ids, vec!["a", "b"]);
    assert_eq!(bundle.svg_count, 2);

    let svg = fs::read_to_string(&bundle.svg_path).unwrap();
    assert_eq!(svg.matches("<symbol").count(), 2);
    assert!(svg.contains("id=\"a\""));
    assert!(svg.contains("id=\"b\""));
    assert!(svg.contains("viewBox=\"0 0 16 16\""));
    assert!(svg.contains("display: none;"));
    assert!(svg.contains("aria-hidden=\"true\""));

    let js = fs::read_to_string(&bundle.js_path).unwrap();
    assert!(js.contains("'a': 'a'"));
    assert!(js.contains("'b': 'b'"));
    assert!(js.contains("window.SVG_ICONS"));
    assert!(js.contains("document.body.insertBefore"));

    let dts = fs::read_to_string(&bundle.dts_path).unwrap();
    assert!(dts.contains("export type SvgIconName = 'a' | 'b';"));
}

#[test]
fn colliding_names_keep_one_entry_with_later_content() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    // Both normalize to the symbolic id "a-"; "a!.svg" sorts before "a?.svg".
    store
        .put("a!.svg", b"<svg viewBox=\"0 0 24 24\"><path d=\"M1 1\"/></svg>")
        .unwrap();
    store
        .put("a?.svg", b"<svg viewBox=\"0 0 24 24\"><path d=\"M2 2\"/></svg>")
        .unwrap();

    let bundle = builder
        .build(&store.list_all().unwrap(), Some("collide".to_string()))
        .unwrap();
    assert_eq!(bundle.icon_ids, vec!["a-"]);
    assert_eq!(bundle.svg_count, 2);

    let svg = fs::read_to_string(&bundle.svg_path).unwrap();
    assert_eq!(svg.matches("<symbol").count(), 1);
    assert!(svg.contains("M2 2"));
    assert!(!svg.contains("M1 1"));

    let js = fs::read_to_string(&bundle.js_path).unwrap();
    assert_eq!(js.matches("'a-': 'a-'").count(), 1);
}

#[test]
fn empty_input_builds_an_empty_lookup_table() {
    let tmp = tempdir().unwrap();
    let (_store, builder) = fixture(&tmp);

    let bundle = builder.build(&[], Some("empty".to_string())).unwrap();
    assert!(bundle.icon_ids.is_empty());

    let js = fs::read_to_string(&bundle.js_path).unwrap();
    assert!(js.contains("window.SVG_ICONS"));
    let dts = fs::read_to_string(&bundle.dts_path).unwrap();
    assert!(dts.contains("export type SvgIconName = never;"));
}

#[test]
fn caller_supplied_bundle_id_names_the_artifacts() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    store.put("a.svg", b"<svg/>").unwrap();

    let bundle = builder
        .build(&store.list_all().unwrap(), Some("release-7".to_string()))
        .unwrap();
    assert_eq!(bundle.id, "release-7");
    assert!(bundle.svg_path.ends_with("release-7.svg"));
    assert!(bundle.js_path.ends_with("release-7.js"));
    assert!(bundle.dts_path.ends_with("release-7.d.ts"));
}

#[test]
fn missing_bundle_id_generates_a_fresh_one() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    store.put("a.svg", b"<svg/>").unwrap();

    let first = builder.build(&store.list_all().unwrap(), None).unwrap();
    let second = builder.build(&store.list_all().unwrap(), None).unwrap();
    assert_ne!(first.id, second.id);
}

#[test]
fn empty_defs_are_stripped_and_populated_defs_survive() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    store
        .put(
            "clean.svg",
            b"<svg viewBox=\"0 0 8 8\"><defs></defs><path d=\"M0 0h8\"/></svg>",
        )
        .unwrap();
    store
        .put(
            "grad.svg",
            b"<svg viewBox=\"0 0 8 8\"><defs><linearGradient id=\"g\"/></defs><rect/></svg>",
        )
        .unwrap();

    let bundle = builder
        .build(&store.list_all().unwrap(), Some("defs".to_string()))
        .unwrap();
    let svg = fs::read_to_string(&bundle.svg_path).unwrap();
    assert_eq!(svg.matches("<defs").count(), 1);
    assert!(svg.contains("linearGradient"));
}

#[test]
fn malformed_svg_aborts_the_build() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    store.put("ok.svg", b"<svg/>").unwrap();
    store.put("broken.svg", b"<svg><path></svg>").unwrap();

    let err = builder
        .build(&store.list_all().unwrap(), Some("broken".to_string()))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Build(_)));
    // Nothing was published for this bundle id.
    assert!(!tmp.path().join("out/sprites/broken.svg").exists());
}

#[test]
fn non_svg_root_is_rejected() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    store.put("div.svg", b"<div>nope</div>").unwrap();

    let err = builder
        .build(&store.list_all().unwrap(), Some("div".to_string()))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Build(_)));
}

#[test]
fn embedded_sprite_text_is_escaped_for_the_template_literal() {
    let tmp = tempdir().unwrap();
    let (store, builder) = fixture(&tmp);
    store
        .put(
            "tricky.svg",
            b"<svg viewBox=\"0 0 8 8\"><text>tick ` slash \\</text></svg>",
        )
        .unwrap();

    let bundle = builder
        .build(&store.list_all().unwrap(), Some("tricky".to_string()))
        .unwrap();
    let js = fs::read_to_string(&bundle.js_path).unwrap();
    assert!(js.contains("tick \\` slash \\\\"));
}
