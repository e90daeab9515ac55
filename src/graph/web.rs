// Tokenizers for raw HTML, CSS and JavaScript resources
//
// Only the tokens that could name a resource are extracted: URLs in HTML
// attributes and CSS, and JavaScript string literals.

use regex::Regex;

pub struct WebTokenizer {
    html_url: Regex,
    html_script: Regex,
    html_style: Regex,
    css_url: Regex,
}

impl WebTokenizer {
    pub fn new() -> Self {
        Self {
            html_url: Regex::new(r#"(?i)\b(?:src|href)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap(),
            html_script: Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").unwrap(),
            html_style: Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>").unwrap(),
            css_url: Regex::new(r#"url\(\s*["']?([^"')]+?)["']?\s*\)"#).unwrap(),
        }
    }

    /// Tokens of a raw resource by file extension; other extensions yield nothing
    pub fn tokenize(&self, extension: &str, text: &str) -> Vec<String> {
        match extension.to_ascii_lowercase().as_str() {
            "html" | "htm" => self.tokenize_html(text),
            "css" => self.tokenize_css(text),
            "js" => tokenize_js(text),
            _ => Vec::new(),
        }
    }

    pub fn tokenize_html(&self, text: &str) -> Vec<String> {
        let mut tokens: Vec<String> = self
            .html_url
            .captures_iter(text)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        for script in self.html_script.captures_iter(text) {
            tokens.extend(tokenize_js(&script[1]));
        }
        for style in self.html_style.captures_iter(text) {
            tokens.extend(self.tokenize_css(&style[1]));
        }
        tokens
    }

    pub fn tokenize_css(&self, text: &str) -> Vec<String> {
        self.css_url
            .captures_iter(text)
            .map(|c| c[1].trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl Default for WebTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// String literals of a script, skipping comments
pub fn tokenize_js(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' | '\'' | '`' => {
                let quote = c;
                let mut literal = String::new();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                literal.push(escaped);
                            }
                        }
                        c if c == quote => break,
                        c => literal.push(c),
                    }
                }
                if !literal.is_empty() {
                    tokens.push(literal);
                }
            }
            _ => {}
        }
    }
    tokens
}
