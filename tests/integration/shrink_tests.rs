//! Integration tests for the analysis pipeline
//!
//! These tests run gatherers, recorders and the graph builder together
//! against a small app laid out on disk.

mod common;

use common::Fixture;
use resshrink::graph::ResourceDir;
use resshrink::proguard::ProguardMappingsRecorder;
use resshrink::{ResourceGatherer, ResourceShrinker, ResourceType, ShrinkError, UsageRecorder};
use std::collections::BTreeSet;

const PACKAGE: &str = "com.example";

fn sample_shrinker(fixture: &Fixture, recorders: &[&str]) -> ResourceShrinker {
    let mut shrinker = ResourceShrinker::new(false)
        .with_gatherer(ResourceGatherer::Symbols {
            path: fixture.path("R.txt"),
            package: PACKAGE.to_string(),
        })
        .with_resource_dir(ResourceDir {
            path: fixture.path("res"),
            package: Some(PACKAGE.to_string()),
        });
    for recorder in recorders {
        shrinker = shrinker.with_recorder(match *recorder {
            "manifest" => UsageRecorder::Manifest {
                path: fixture.path("AndroidManifest.xml"),
                package: Some(PACKAGE.to_string()),
            },
            "code" => UsageRecorder::Code {
                paths: vec![fixture.path("smali")],
            },
            "keep" => UsageRecorder::ToolsAttribute {
                dir: fixture.path("res/raw"),
            },
            other => panic!("unknown recorder {}", other),
        });
    }
    shrinker
}

fn is_reachable(shrinker: &ResourceShrinker, ty: ResourceType, name: &str) -> bool {
    let ids = shrinker.store().find(None, ty, name);
    assert!(!ids.is_empty(), "{}/{} is not declared", ty, name);
    ids.iter().all(|id| shrinker.store().is_reachable(*id))
}

fn reachable_set(shrinker: &ResourceShrinker) -> BTreeSet<String> {
    shrinker
        .store()
        .resources()
        .filter(|(_, r)| r.is_reachable())
        .map(|(_, r)| r.url(true))
        .collect()
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_sample_app_model_dump() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code"]);
    shrinker.analyze().unwrap();

    assert_eq!(
        shrinker.dump_resource_model(),
        "\
@dimen/horizontal : reachable=true
@drawable/ic_launcher : reachable=true
@drawable/unused : reachable=false
@id/action_settings : reachable=true
@layout/activity_main : reachable=true
    @dimen/horizontal
    @style/AppTheme
    @string/hello_world
@menu/main : reachable=true
    @id/action_settings
    @string/action_settings
@string/action_settings : reachable=true
@string/app_name : reachable=true
@string/hello_world : reachable=true
@style/AppTheme : reachable=true
"
    );
    assert_eq!(
        shrinker.dump_config().lines().find(|l| l.starts_with("drawable/unused")),
        Some("drawable/unused#remove")
    );

    let unused = shrinker.unused_resources();
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].files, vec!["res/drawable/unused.png"]);
}

#[test]
fn test_closure_is_sound() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code"]);
    shrinker.analyze().unwrap();

    let store = shrinker.store();
    for (_, resource) in store.resources().filter(|(_, r)| r.is_reachable()) {
        for reference in resource.references() {
            assert!(
                store.is_reachable(reference),
                "{} is reachable but references unreachable {}",
                resource.url(false),
                store.get(reference).url(false)
            );
        }
    }
}

#[test]
fn test_more_recorders_never_shrink_reachable_set() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    let mut manifest_only = sample_shrinker(&fixture, &["manifest"]);
    manifest_only.analyze().unwrap();
    let mut both = sample_shrinker(&fixture, &["manifest", "code"]);
    both.analyze().unwrap();

    let fewer = reachable_set(&manifest_only);
    let more = reachable_set(&both);
    assert!(fewer.is_subset(&more));
    assert!(fewer.len() < more.len());
    assert!(!is_reachable(&manifest_only, ResourceType::Layout, "activity_main"));
}

#[test]
fn test_analysis_is_idempotent() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code"]);
    shrinker.analyze().unwrap();
    let first = shrinker.dump_resource_model();
    shrinker.analyze().unwrap();
    assert_eq!(shrinker.dump_resource_model(), first);
}

// ============================================================================
// Keep / discard
// ============================================================================

#[test]
fn test_keep_and_discard_directives() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    fixture.write(
        "res/raw/keep.xml",
        r#"<resources xmlns:tools="http://schemas.android.com/tools"
    tools:keep="@drawable/unused"
    tools:discard="@menu/main"/>"#,
    );

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code", "keep"]);
    shrinker.analyze().unwrap();

    assert!(is_reachable(&shrinker, ResourceType::Drawable, "unused"));
    assert!(!is_reachable(&shrinker, ResourceType::Menu, "main"));
    // The discarded menu's own references keep their marks
    assert!(is_reachable(&shrinker, ResourceType::String, "action_settings"));
    assert!(is_reachable(&shrinker, ResourceType::Id, "action_settings"));
}

#[test]
fn test_keep_wildcards() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    fixture.write(
        "res/raw/keep.xml",
        r#"<resources xmlns:tools="http://schemas.android.com/tools" tools:keep="@drawable/un*, @string/*"/>"#,
    );

    let mut shrinker = sample_shrinker(&fixture, &["keep"]);
    shrinker.analyze().unwrap();

    assert!(is_reachable(&shrinker, ResourceType::Drawable, "unused"));
    assert!(is_reachable(&shrinker, ResourceType::String, "hello_world"));
    assert!(!is_reachable(&shrinker, ResourceType::Drawable, "ic_launcher"));
}

// ============================================================================
// Dynamic lookups
// ============================================================================

const DYNAMIC_LOOKUP: &str = r#".class public Lcom/example/Codecs;
.super Ljava/lang/Object;

.method public static icon(Landroid/content/Context;I)I
    .locals 3
    invoke-virtual {p0}, Landroid/content/Context;->getResources()Landroid/content/res/Resources;
    move-result-object v0
    const-string v1, "ic_video_codec_"
    const-string v2, "drawable"
    invoke-virtual {v0, v1, v2, v2}, Landroid/content/res/Resources;->getIdentifier(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)I
    move-result v0
    return v0
.end method
"#;

fn dynamic_lookup_fixture() -> Fixture {
    let fixture = Fixture::new();
    fixture.sample_app("");
    fixture.write(
        "R.txt",
        format!(
            "{}int drawable ic_video_codec_1 0x7f020002\nint drawable ic_video_codec_2 0x7f020003\n",
            common::R_TXT
        ),
    );
    fixture.write("smali/com/example/Codecs.smali", DYNAMIC_LOOKUP);
    fixture
}

#[test]
fn test_get_identifier_marks_name_prefixes() {
    let fixture = dynamic_lookup_fixture();

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code"]);
    shrinker.analyze().unwrap();

    assert!(shrinker.model().found_get_identifier());
    assert!(is_reachable(&shrinker, ResourceType::Drawable, "ic_video_codec_1"));
    assert!(is_reachable(&shrinker, ResourceType::Drawable, "ic_video_codec_2"));
    assert!(!is_reachable(&shrinker, ResourceType::Drawable, "unused"));
}

#[test]
fn test_strict_mode_disables_guessing() {
    let fixture = dynamic_lookup_fixture();
    fixture.write(
        "res/raw/keep.xml",
        r#"<resources xmlns:tools="http://schemas.android.com/tools" tools:shrinkMode="strict"/>"#,
    );

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code", "keep"]);
    shrinker.analyze().unwrap();

    assert!(!shrinker.store().safe_mode());
    assert!(!is_reachable(&shrinker, ResourceType::Drawable, "ic_video_codec_1"));
}

#[test]
fn test_web_content_references() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    fixture.write(
        "R.txt",
        format!(
            "{}int drawable background 0x7f020004\nint raw page 0x7f090000\nint raw script 0x7f090001\n",
            common::R_TXT
        ),
    );
    fixture.write(
        "res/raw/page.html",
        r#"<html><script src="file:///android_res/raw/script.js"></script></html>"#,
    );
    fixture.write("res/raw/script.js", "document.body.style.background = 'file:///android_res/drawable/background.png';");
    fixture.write("res/drawable/background.png", common::PNG_BYTES);
    fixture.write(
        "smali/com/example/Web.smali",
        r#".class public Lcom/example/Web;
.super Ljava/lang/Object;

.method public static show(Landroid/webkit/WebView;)V
    .locals 1
    const-string v0, "file:///android_res/raw/page.html"
    invoke-virtual {p0, v0}, Landroid/webkit/WebView;->loadUrl(Ljava/lang/String;)V
    return-void
.end method
"#,
    );

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code"]);
    shrinker.analyze().unwrap();

    assert!(shrinker.model().found_web_content());
    assert!(is_reachable(&shrinker, ResourceType::Raw, "page"));
    assert!(is_reachable(&shrinker, ResourceType::Raw, "script"));
    assert!(is_reachable(&shrinker, ResourceType::Drawable, "background"));
}

// ============================================================================
// Obfuscation, multiple packages, inputs
// ============================================================================

#[test]
fn test_obfuscated_field_references() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    fixture.write(
        "smali/com/example/MainActivity.smali",
        r#".class public Lcom/example/a;
.super Landroid/app/Activity;

.method protected onCreate(Landroid/os/Bundle;)V
    .locals 1
    sget v0, Lcom/example/b$c;->d:I
    return-void
.end method
"#,
    );
    let mapping = fixture.write(
        "mapping.txt",
        "com.example.MainActivity -> com.example.a:\n\
         com.example.R$drawable -> com.example.b$c:\n\
         \x20   int unused -> d\n\
         \x20   int ic_launcher -> e\n",
    );

    let mut shrinker =
        sample_shrinker(&fixture, &["manifest", "code"]).with_mapping(ProguardMappingsRecorder::new(mapping));
    shrinker.analyze().unwrap();

    assert!(is_reachable(&shrinker, ResourceType::Drawable, "unused"));
    assert!(!is_reachable(&shrinker, ResourceType::Layout, "activity_main"));
}

#[test]
fn test_multi_package_resolution() {
    let fixture = Fixture::new();
    fixture.write("base/R.txt", "int drawable icon 0x7f020000\nint layout home 0x7f030000\n");
    fixture.write("base/res/drawable/icon.png", common::PNG_BYTES);
    fixture.write("base/res/layout/home.xml", "<FrameLayout/>");
    fixture.write(
        "feature/R.txt",
        "int drawable icon 0x80020000\nint layout screen 0x80030000\n",
    );
    fixture.write("feature/res/drawable/icon.png", common::PNG_BYTES);
    fixture.write(
        "feature/res/layout/screen.xml",
        r#"<ImageView xmlns:android="http://schemas.android.com/apk/res/android" android:src="@drawable/icon"/>"#,
    );
    fixture.write(
        "feature/AndroidManifest.xml",
        r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.feature">
    <application android:logo="@layout/screen"/>
</manifest>"#,
    );

    let mut shrinker = ResourceShrinker::new(true);
    for (module, package) in [("base", "com.example"), ("feature", "com.example.feature")] {
        shrinker = shrinker
            .with_gatherer(ResourceGatherer::Symbols {
                path: fixture.path(&format!("{}/R.txt", module)),
                package: package.to_string(),
            })
            .with_resource_dir(ResourceDir {
                path: fixture.path(&format!("{}/res", module)),
                package: Some(package.to_string()),
            });
    }
    shrinker = shrinker.with_recorder(UsageRecorder::Manifest {
        path: fixture.path("feature/AndroidManifest.xml"),
        package: None,
    });
    shrinker.analyze().unwrap();

    let dump = shrinker.dump_resource_model();
    assert!(dump.contains("@com.example:drawable/icon : reachable=false"));
    assert!(dump.contains("@com.example.feature:drawable/icon : reachable=true"));
    assert!(dump.contains("@com.example.feature:layout/screen : reachable=true\n    @com.example.feature:drawable/icon\n"));
    assert!(dump.contains("@com.example:layout/home : reachable=false"));
}

#[test]
fn test_feature_module_without_code() {
    let fixture = Fixture::new();
    fixture.sample_app("");

    let mut shrinker = sample_shrinker(&fixture, &["manifest"]).with_recorder(UsageRecorder::Code {
        paths: vec![fixture.path("no-such-dir")],
    });
    shrinker.analyze().unwrap();
    assert!(is_reachable(&shrinker, ResourceType::Drawable, "ic_launcher"));
}

#[test]
fn test_malformed_dex_is_fatal() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    fixture.write("smali/classes.dex", b"definitely not dex");

    let mut shrinker = sample_shrinker(&fixture, &["manifest", "code"]);
    assert!(matches!(shrinker.analyze(), Err(ShrinkError::MalformedDex { .. })));
    assert!(!shrinker.is_analyzed());
}

#[test]
fn test_malformed_symbols_are_fatal() {
    let fixture = Fixture::new();
    fixture.sample_app("");
    fixture.write("R.txt", "int drawable\n");

    let mut shrinker = sample_shrinker(&fixture, &["manifest"]);
    assert!(matches!(
        shrinker.analyze(),
        Err(ShrinkError::MalformedResourceTable { .. })
    ));
}
