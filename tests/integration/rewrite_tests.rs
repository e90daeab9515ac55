//! Integration tests for archive rewriting after analysis

mod common;

use common::{entry, read_zip, write_zip, Fixture};
use resshrink::graph::ResourceDir;
use resshrink::shrinker::{TINY_BINARY_XML, TINY_PNG, TINY_PROTO_XML};
use resshrink::{LinkedResourcesFormat, ResourceGatherer, ResourceShrinker, RewriteStats, UsageRecorder};
use std::collections::HashMap;

fn analyzed(fixture: &Fixture, precise: bool) -> ResourceShrinker {
    let mut shrinker = ResourceShrinker::new(false)
        .with_gatherer(ResourceGatherer::Symbols {
            path: fixture.path("R.txt"),
            package: "com.example".to_string(),
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
            paths: vec![fixture.path("smali")],
        })
        .with_precise_shrinking(precise);
    shrinker.analyze().unwrap();
    shrinker
}

#[test]
fn test_unused_entries_get_placeholders() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    let input = fixture.sample_apk("app.apk");
    let output = fixture.path("app-shrunk.apk");

    let shrinker = analyzed(&fixture, false);
    let stats = shrinker
        .rewrite_apk(&input, &output, LinkedResourcesFormat::Binary)
        .unwrap();
    assert_eq!(
        stats,
        RewriteStats {
            entries: 6,
            replaced: 1,
            removed: 0
        }
    );

    let entries = read_zip(&output);
    assert_eq!(entries.len(), 6);
    assert_eq!(entry(&entries, "res/drawable/unused.png"), Some(TINY_PNG));
    assert_eq!(
        entry(&entries, "res/drawable/ic_launcher.png"),
        Some(common::PNG_BYTES)
    );
    assert_eq!(
        entry(&entries, "res/layout/activity_main.xml"),
        Some(common::ACTIVITY_MAIN.as_bytes())
    );
    assert_eq!(entry(&entries, "classes.dex"), Some(&b"dex\n035\0"[..]));
}

#[test]
fn test_entry_order_is_preserved() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    let input = fixture.sample_apk("app.apk");
    let output = fixture.path("out.apk");

    analyzed(&fixture, false)
        .rewrite_apk(&input, &output, LinkedResourcesFormat::Binary)
        .unwrap();

    let before: Vec<String> = read_zip(&input).into_iter().map(|(n, _)| n).collect();
    let after: Vec<String> = read_zip(&output).into_iter().map(|(n, _)| n).collect();
    assert_eq!(before, after);
}

#[test]
fn test_precise_mode_removes_entries() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    let input = fixture.sample_apk("app.apk");
    let output = fixture.path("app-shrunk.apk");

    let stats = analyzed(&fixture, true)
        .rewrite_apk(&input, &output, LinkedResourcesFormat::Binary)
        .unwrap();
    assert_eq!(stats.removed, 1);
    assert_eq!(stats.replaced, 0);

    let entries = read_zip(&output);
    assert_eq!(entries.len(), 5);
    assert!(entry(&entries, "res/drawable/unused.png").is_none());
    assert!(entry(&entries, "res/menu/main.xml").is_some());
}

#[test]
fn test_unused_xml_placeholders_follow_format() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    // Only the manifest is an entry point, so the layout and menu go unused
    std::fs::remove_dir_all(fixture.path("smali")).unwrap();
    let input = fixture.sample_apk("app.apk");

    let shrinker = analyzed(&fixture, false);

    let binary = fixture.path("binary.apk");
    shrinker
        .rewrite_apk(&input, &binary, LinkedResourcesFormat::Binary)
        .unwrap();
    let entries = read_zip(&binary);
    assert_eq!(
        entry(&entries, "res/layout/activity_main.xml"),
        Some(TINY_BINARY_XML)
    );
    assert_eq!(entry(&entries, "res/menu/main.xml"), Some(TINY_BINARY_XML));

    let proto = fixture.path("proto.apk");
    shrinker
        .rewrite_apk(&input, &proto, LinkedResourcesFormat::Proto)
        .unwrap();
    let entries = read_zip(&proto);
    assert_eq!(
        entry(&entries, "res/layout/activity_main.xml"),
        Some(TINY_PROTO_XML)
    );
    // The manifest is not a resource entry
    assert_eq!(
        entry(&entries, "AndroidManifest.xml"),
        Some(common::MANIFEST.as_bytes())
    );
}

#[test]
fn test_bundle_modules_resolve_packages() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    let input = fixture.path("app.aab");
    let png = common::PNG_BYTES.to_vec();
    write_zip(
        &input,
        &[
            ("base/manifest/AndroidManifest.xml".to_string(), common::MANIFEST.as_bytes().to_vec()),
            ("base/res/drawable/ic_launcher.png".to_string(), png.clone()),
            ("base/res/drawable/unused.png".to_string(), png.clone()),
            ("base/dex/classes.dex".to_string(), b"dex\n035\0".to_vec()),
            ("BundleConfig.pb".to_string(), vec![0x0a, 0x00]),
        ],
    );
    let output = fixture.path("app-shrunk.aab");

    let packages = HashMap::from([("base".to_string(), "com.example".to_string())]);
    let stats = analyzed(&fixture, false)
        .rewrite_bundle(&input, &output, &packages)
        .unwrap();
    assert_eq!(stats.replaced, 1);

    let entries = read_zip(&output);
    assert_eq!(entry(&entries, "base/res/drawable/unused.png"), Some(TINY_PNG));
    assert_eq!(entry(&entries, "base/res/drawable/ic_launcher.png"), Some(png.as_slice()));
    assert_eq!(entry(&entries, "BundleConfig.pb"), Some(&[0x0a, 0x00][..]));
}

#[test]
fn test_missing_archive_is_an_error() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    let output = fixture.path("out.apk");

    let result = analyzed(&fixture, false).rewrite_apk(
        &fixture.path("missing.apk"),
        &output,
        LinkedResourcesFormat::Binary,
    );
    assert!(result.is_err());
    assert!(!output.exists());
}
