//! Integration tests over compiled inputs
//!
//! The app here is what a linked APK carries: a binary resource table, a
//! binary manifest, compiled layouts and a dex file.

mod common;

use common::{entry, read_zip, write_zip, Fixture};
use resshrink::graph::ResourceDir;
use resshrink::parser::ANDROID_NS;
use resshrink::shrinker::{TINY_BINARY_XML, TINY_PNG};
use resshrink::testing::{ArscBuilder, AxmlBuilder, DexBuilder};
use resshrink::{LinkedResourcesFormat, ResourceGatherer, ResourceShrinker, RewriteStats, UsageRecorder};
use std::path::PathBuf;

const ANDROID_ICON: u32 = 0x0101_0002;

/// Lay out the compiled app and return the archive holding it
fn compiled_app(fixture: &Fixture) -> PathBuf {
    let table = ArscBuilder::new()
        .package(0x7f, "com.example")
        .file("drawable", "ic_launcher", "res/drawable/ic_launcher.png")
        .file("drawable", "unused", "res/drawable/unused.png")
        .file("layout", "activity_main", "res/layout/activity_main.xml")
        .file("layout", "unused_screen", "res/layout/unused_screen.xml")
        .string("string", "app_name", "Example")
        .string("string", "hello", "Hello")
        .reference("string", "alias", 0x7f030000)
        .bag("style", "Base", 0, &[])
        .bag("style", "AppTheme", 0x7f040000, &[(ANDROID_ICON, 0x7f010000)])
        .build();

    let manifest = AxmlBuilder::new("manifest")
        .attr(None, "package", "com.example")
        .child(
            AxmlBuilder::new("application")
                .reference(Some(ANDROID_NS), "icon", "@drawable/ic_launcher", 0x7f010000)
                .reference(Some(ANDROID_NS), "label", "@string/app_name", 0x7f030000)
                .reference(Some(ANDROID_NS), "theme", "@style/AppTheme", 0x7f040001),
        )
        .build();

    let activity_main = AxmlBuilder::new("LinearLayout")
        .child(AxmlBuilder::new("TextView").reference(
            Some(ANDROID_NS),
            "text",
            "@string/hello",
            0x7f030001,
        ))
        .build();
    let unused_screen = AxmlBuilder::new("ImageView")
        .reference(Some(ANDROID_NS), "src", "@drawable/unused", 0x7f010001)
        .build();

    let dex = DexBuilder::new()
        .class("Lcom/example/MainActivity;")
        .const_high16(0x7f02)
        .sget("Lcom/example/R$string;", "alias")
        .class("Lcom/example/R$layout;")
        .const_int(0x7f020001)
        .build();

    let entries: Vec<(String, Vec<u8>)> = vec![
        ("AndroidManifest.xml".to_string(), manifest),
        ("resources.arsc".to_string(), table),
        ("classes.dex".to_string(), dex),
        ("res/drawable/ic_launcher.png".to_string(), common::PNG_BYTES.to_vec()),
        ("res/drawable/unused.png".to_string(), common::PNG_BYTES.to_vec()),
        ("res/layout/activity_main.xml".to_string(), activity_main),
        ("res/layout/unused_screen.xml".to_string(), unused_screen),
    ];
    for (name, contents) in &entries {
        fixture.write(name, contents);
    }
    let apk = fixture.path("app.apk");
    write_zip(&apk, &entries);
    apk
}

fn compiled_shrinker(fixture: &Fixture, precise: bool) -> ResourceShrinker {
    let mut shrinker = ResourceShrinker::new(false)
        .with_gatherer(ResourceGatherer::Table {
            path: fixture.path("resources.arsc"),
        })
        .with_resource_dir(ResourceDir {
            path: fixture.path("res"),
            package: Some("com.example".to_string()),
        })
        .with_recorder(UsageRecorder::Manifest {
            path: fixture.path("AndroidManifest.xml"),
            package: None,
        })
        .with_recorder(UsageRecorder::Code {
            paths: vec![fixture.path("classes.dex")],
        })
        .with_precise_shrinking(precise);
    shrinker.analyze().unwrap();
    shrinker
}

#[test]
fn test_compiled_app_model_dump() {
    let fixture = Fixture::new();
    compiled_app(&fixture);

    let shrinker = compiled_shrinker(&fixture, false);
    assert_eq!(
        shrinker.dump_resource_model(),
        "\
@drawable/ic_launcher : reachable=true
@drawable/unused : reachable=false
@layout/activity_main : reachable=true
    @string/hello
@layout/unused_screen : reachable=false
    @drawable/unused
@string/alias : reachable=true
    @string/app_name
@string/app_name : reachable=true
@string/hello : reachable=true
@style/AppTheme : reachable=true
    @style/Base
    @drawable/ic_launcher
@style/Base : reachable=true
"
    );
}

#[test]
fn test_compiled_app_rewrite() {
    let fixture = Fixture::new();
    let input = compiled_app(&fixture);
    let output = fixture.path("app-shrunk.apk");

    let stats = compiled_shrinker(&fixture, false)
        .rewrite_apk(&input, &output, LinkedResourcesFormat::Binary)
        .unwrap();
    assert_eq!(
        stats,
        RewriteStats {
            entries: 7,
            replaced: 2,
            removed: 0
        }
    );

    let before = read_zip(&input);
    let after = read_zip(&output);
    let names = |entries: &[(String, Vec<u8>)]| -> Vec<String> {
        entries.iter().map(|(n, _)| n.clone()).collect()
    };
    assert_eq!(names(&before), names(&after));

    assert_eq!(entry(&after, "res/drawable/unused.png"), Some(TINY_PNG));
    assert_eq!(entry(&after, "res/layout/unused_screen.xml"), Some(TINY_BINARY_XML));
    for kept in [
        "AndroidManifest.xml",
        "resources.arsc",
        "classes.dex",
        "res/drawable/ic_launcher.png",
        "res/layout/activity_main.xml",
    ] {
        assert_eq!(entry(&after, kept), entry(&before, kept), "{}", kept);
    }
}

#[test]
fn test_compiled_app_precise_rewrite() {
    let fixture = Fixture::new();
    let input = compiled_app(&fixture);
    let output = fixture.path("app-shrunk.apk");

    let stats = compiled_shrinker(&fixture, true)
        .rewrite_apk(&input, &output, LinkedResourcesFormat::Binary)
        .unwrap();
    assert_eq!(stats.removed, 2);

    let after = read_zip(&output);
    assert_eq!(after.len(), 5);
    assert!(entry(&after, "res/drawable/unused.png").is_none());
    assert!(entry(&after, "res/layout/unused_screen.xml").is_none());
    assert!(entry(&after, "res/layout/activity_main.xml").is_some());
}
