// Web content usage recorder
//
// Opt-in heuristic: any text asset that embeds a resource URL keeps the
// resource it names.

use crate::error::{read_file, Result};
use crate::model::{ResourceUrl, ShrinkerModel};
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, info};
use walkdir::WalkDir;

const WEB_EXTENSIONS: &[&str] = &["html", "htm", "css", "js", "json", "txt", "xml"];

pub struct WebContentScanner {
    android_res: Regex,
    resource_path: Regex,
    resource_id: Regex,
}

impl WebContentScanner {
    pub fn new() -> Self {
        Self {
            android_res: Regex::new(r"file:///android_res/([a-z]+)/([\w.\-]+)").unwrap(),
            resource_path: Regex::new(r"android\.resource://[\w.]+/([a-z]+)/([\w.\-]+)").unwrap(),
            resource_id: Regex::new(r"android\.resource://[\w.]+/(\d+)\b").unwrap(),
        }
    }

    /// Scan the text of one asset and mark what it names; returns the number of URLs found
    pub fn scan(&self, text: &str, model: &mut ShrinkerModel) -> usize {
        let mut found = 0;
        for captures in self
            .android_res
            .captures_iter(text)
            .chain(self.resource_path.captures_iter(text))
        {
            let url = format!("@{}/{}", &captures[1], &captures[2]);
            if let Some(url) = ResourceUrl::parse(&url) {
                model.mark_url(&url);
                found += 1;
            }
        }
        for captures in self.resource_id.captures_iter(text) {
            if let Ok(id) = captures[1].parse::<u32>() {
                model.mark_id(id);
                found += 1;
            }
        }
        found
    }

    /// Scan every web asset under the given directories
    pub fn record(&self, dirs: &[PathBuf], model: &mut ShrinkerModel) -> Result<()> {
        let mut found = 0;
        for dir in dirs {
            if !dir.exists() {
                debug!("Web content directory {} does not exist, skipping", dir.display());
                continue;
            }
            for entry in WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let is_web = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| WEB_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
                if !is_web {
                    continue;
                }
                let bytes = read_file(entry.path())?;
                found += self.scan(&String::from_utf8_lossy(&bytes), model);
            }
        }
        info!("Web content referenced {} resource URLs", found);
        Ok(())
    }
}

impl Default for WebContentScanner {
    fn default() -> Self {
        Self::new()
    }
}
