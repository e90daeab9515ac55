//! Possible-resource marker
//!
//! When code looks resources up by name at runtime (`Resources.getIdentifier`)
//! or loads web content, any string constant in the app might name a resource.
//! Each pooled string is classified and the resources it could denote are
//! kept, trading precision for never removing a resource that is used.

use crate::model::{
    ResourceId, ResourceStore, ResourceType, ResourceUrl, ShrinkerModel, ANDROID_RESOURCE_URL,
    ANDROID_RES_URL,
};
use regex::Regex;
use tracing::{debug, info};

/// Pattern returned for format strings too ambiguous to match anything useful
pub const NO_MATCH: &str = "-nomatch-";

/// Translate a `printf`-style format string into an anchored regular expression
///
/// A single `%d` becomes `\p{Digit}+` and any other single conversion `.*`.
/// Two or more conversions, or a format with no literal letters, yield
/// [`NO_MATCH`].
pub fn convert_format_string_to_regex(format: &str) -> String {
    let mut pattern = String::new();
    let mut literal = String::new();
    let mut specifiers = 0;
    let mut has_letters = false;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            has_letters |= c.is_alphabetic();
            literal.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                literal.push('%');
                continue;
            }
            Some('n') => {
                chars.next();
                literal.push('\n');
                continue;
            }
            _ => {}
        }

        // [argument_index$][flags][width][.precision]conversion
        while let Some(&f) = chars.peek() {
            if f.is_ascii_digit() || matches!(f, '$' | '-' | '#' | '+' | ' ' | ',' | '(' | '.' | '<') {
                chars.next();
            } else {
                break;
            }
        }
        let Some(conversion) = chars.next() else {
            // Trailing `%` is kept literally
            literal.push('%');
            break;
        };
        if matches!(conversion, 't' | 'T') {
            chars.next();
        }

        specifiers += 1;
        if specifiers > 1 {
            return NO_MATCH.to_string();
        }
        pattern.push_str(&regex::escape(&std::mem::take(&mut literal)));
        pattern.push_str(match conversion {
            'd' => r"\p{Digit}+",
            'x' | 'X' => "[[:xdigit:]]+",
            'o' => "[0-7]+",
            _ => ".*",
        });
    }
    pattern.push_str(&regex::escape(&literal));

    if !has_letters {
        return NO_MATCH.to_string();
    }
    format!("^(?:{})$", pattern)
}

/// Resources a single pooled string could denote
pub fn possible_matches(store: &ResourceStore, value: &str) -> Vec<ResourceId> {
    if let Some(rest) = value.strip_prefix(ANDROID_RESOURCE_URL) {
        let parts: Vec<&str> = rest.split('/').collect();
        return match parts.as_slice() {
            [_, ty, name] => by_url(store, &format!("@{}/{}", ty, name)),
            [_, id] => by_id(store, id),
            _ => Vec::new(),
        };
    }
    if let Some(rest) = value.strip_prefix(ANDROID_RES_URL) {
        return by_url(store, &format!("@{}", rest));
    }
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return by_id(store, value);
    }

    if !value.contains(['/', '.', ':', '%']) {
        return store
            .resources()
            .filter(|(_, r)| r.name.starts_with(value))
            .map(|(id, _)| id)
            .collect();
    }

    if value.contains('%') && !value.contains('/') {
        let pattern = convert_format_string_to_regex(value);
        if pattern == NO_MATCH {
            return Vec::new();
        }
        return match Regex::new(&pattern) {
            Ok(regex) => store
                .resources()
                .filter(|(_, r)| regex.is_match(&r.name))
                .map(|(id, _)| id)
                .collect(),
            Err(e) => {
                debug!("Ignoring format string {}: {}", value, e);
                Vec::new()
            }
        };
    }

    if let Some((head, name)) = value.rsplit_once('/') {
        // `[pkg:]type/name` with a known type, otherwise just the name
        let type_name = head.rsplit(':').next().unwrap_or(head);
        if ResourceType::from_name(type_name).is_some() {
            return by_url(store, &format!("@{}", value));
        }
        return store.find_by_name(&crate::model::normalize_name(name));
    }

    if let Some((_, last)) = value.rsplit_once('.') {
        if !last.is_empty() {
            return store.find_by_name(last);
        }
    }
    Vec::new()
}

fn by_url(store: &ResourceStore, url: &str) -> Vec<ResourceId> {
    match ResourceUrl::parse(url) {
        Some(url) => store.find(url.package.as_deref(), url.resource_type, &url.name),
        None => Vec::new(),
    }
}

fn by_id(store: &ResourceStore, digits: &str) -> Vec<ResourceId> {
    digits
        .parse::<u32>()
        .ok()
        .and_then(|id| store.find_by_id(id))
        .into_iter()
        .collect()
}

/// Marks every resource a pooled string constant could name
pub struct PossibleResourceMarker;

impl PossibleResourceMarker {
    pub fn new() -> Self {
        Self
    }

    /// Whether dynamic lookups were seen and the shrink mode allows guessing
    pub fn is_enabled(model: &ShrinkerModel) -> bool {
        (model.found_get_identifier() || model.found_web_content()) && model.store.safe_mode()
    }

    /// Mark possible targets of every pooled string; returns the number newly marked
    pub fn mark(&self, model: &mut ShrinkerModel) -> usize {
        if !Self::is_enabled(model) {
            debug!("Possible-resource marking disabled");
            return 0;
        }
        let mut matches = Vec::new();
        for value in model.strings() {
            matches.extend(possible_matches(&model.store, value));
        }
        let newly = matches
            .into_iter()
            .filter(|id| model.store.mark_reachable(*id))
            .count();
        info!(
            "Marked {} resources possibly referenced by {} string constants",
            newly,
            model.strings().len()
        );
        newly
    }
}

impl Default for PossibleResourceMarker {
    fn default() -> Self {
        Self::new()
    }
}
