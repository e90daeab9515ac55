//! Shared fixtures for integration tests
//!
//! A small app is laid out in a temporary directory the way an unpacked
//! module looks before linking: an R.txt, a res/ tree, a text manifest and
//! smali code.
#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const R_TXT: &str = "\
int dimen horizontal 0x7f040000
int drawable ic_launcher 0x7f020000
int drawable unused 0x7f020001
int id action_settings 0x7f080000
int layout activity_main 0x7f030000
int menu main 0x7f070000
int string action_settings 0x7f050002
int string app_name 0x7f050001
int string hello_world 0x7f050000
int style AppTheme 0x7f060000
";

pub const ACTIVITY_MAIN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<RelativeLayout xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools"
    android:paddingLeft="@dimen/horizontal"
    tools:context=".MainActivity">
    <TextView
        style="@style/AppTheme"
        android:text="@string/hello_world"/>
</RelativeLayout>
"#;

pub const VALUES: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <dimen name="horizontal">16dp</dimen>
    <string name="app_name">Example</string>
    <string name="hello_world">Hello world!</string>
    <string name="action_settings">Settings</string>
    <style name="AppTheme" parent="android:Theme.Holo.Light"/>
</resources>
"#;

pub const MENU_MAIN: &str = r#"<menu xmlns:android="http://schemas.android.com/apk/res/android">
    <item android:id="@+id/action_settings" android:title="@string/action_settings"/>
</menu>
"#;

pub const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example">
    <application android:icon="@drawable/ic_launcher" android:label="@string/app_name">
        <activity android:name=".MainActivity"/>
    </application>
</manifest>
"#;

pub const MAIN_ACTIVITY: &str = r#".class public Lcom/example/MainActivity;
.super Landroid/app/Activity;

.method protected onCreate(Landroid/os/Bundle;)V
    .locals 2
    invoke-super {p0, p1}, Landroid/app/Activity;->onCreate(Landroid/os/Bundle;)V
    const v0, 0x7f030000
    invoke-virtual {p0, v0}, Lcom/example/MainActivity;->setContentView(I)V
    sget v1, Lcom/example/R$drawable;->ic_launcher:I
    return-void
.end method

.method public onCreateOptionsMenu(Landroid/view/Menu;)Z
    .locals 2
    const/high16 v0, 0x7f070000
    return v1
.end method
"#;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Lay out the sample app under `prefix` (empty for the fixture root)
    pub fn sample_app(&self, prefix: &str) {
        let at = |rel: &str| format!("{}{}", prefix, rel);
        self.write(&at("R.txt"), R_TXT);
        self.write(&at("AndroidManifest.xml"), MANIFEST);
        self.write(&at("res/layout/activity_main.xml"), ACTIVITY_MAIN);
        self.write(&at("res/values/values.xml"), VALUES);
        self.write(&at("res/menu/main.xml"), MENU_MAIN);
        self.write(&at("res/drawable/ic_launcher.png"), PNG_BYTES);
        self.write(&at("res/drawable/unused.png"), PNG_BYTES);
        self.write(&at("smali/com/example/MainActivity.smali"), MAIN_ACTIVITY);
    }

    /// Zip the sample app's res/ tree and manifest into an APK-shaped archive
    pub fn sample_apk(&self, rel: &str) -> PathBuf {
        let entries: Vec<(String, Vec<u8>)> = [
            "AndroidManifest.xml",
            "res/layout/activity_main.xml",
            "res/menu/main.xml",
            "res/drawable/ic_launcher.png",
            "res/drawable/unused.png",
        ]
        .iter()
        .map(|name| (name.to_string(), std::fs::read(self.path(name)).unwrap()))
        .chain([("classes.dex".to_string(), b"dex\n035\0".to_vec())])
        .collect();
        let path = self.path(rel);
        write_zip(&path, &entries);
        path
    }
}

pub fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        writer.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
}

pub fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).unwrap();
            (entry.name().to_string(), contents)
        })
        .collect()
}

pub fn entry<'a>(entries: &'a [(String, Vec<u8>)], name: &str) -> Option<&'a [u8]> {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, contents)| contents.as_slice())
}
