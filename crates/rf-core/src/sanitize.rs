use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub const DEFAULT_TAGS: &[&str] = &["a", "b", "em", "i", "strong", "p", "br"];
pub const DEFAULT_ATTRIBUTES: &[&str] = &["target", "href", "rel", "name", "download"];

const OPAQUE_TAGS: &[&str] = &["script", "style", "template"];

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<(/?)\s*([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>").expect("valid tag regex")
});
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#)
        .expect("valid attribute regex")
});

pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListSanitizer {
    tags: BTreeSet<String>,
    attributes: BTreeSet<String>,
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS, DEFAULT_ATTRIBUTES)
    }
}

impl AllowListSanitizer {
    pub fn new(tags: &[&str], attributes: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|tag| tag.to_ascii_lowercase()).collect(),
            attributes: attributes
                .iter()
                .map(|attr| attr.to_ascii_lowercase())
                .collect(),
        }
    }

    fn rebuild(&self, closing: bool, name: &str, rest: &str) -> String {
        if closing {
            return format!("</{name}>");
        }
        let mut tag = format!("<{name}");
        for caps in ATTRIBUTE.captures_iter(rest) {
            let attr = caps[1].to_ascii_lowercase();
            if !self.attributes.contains(&attr) {
                continue;
            }
            match caps.get(2) {
                Some(value) => {
                    let value = value.as_str().trim_matches(['"', '\'']);
                    if attr == "href" && is_script_url(value) {
                        continue;
                    }
                    tag.push_str(&format!(" {attr}=\"{}\"", value.replace('"', "&quot;")));
                }
                None => tag.push_str(&format!(" {attr}")),
            }
        }
        tag.push('>');
        tag
    }
}

fn is_script_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:") || compact.starts_with("vbscript:")
}

impl Sanitizer for AllowListSanitizer {
    /// Drops disallowed tags but keeps their text. Text is passed through
    /// without re-escaping.
    fn sanitize(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;
        let mut skipping: Option<String> = None;

        for caps in TAG.captures_iter(html) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if skipping.is_none() {
                out.push_str(&html[last..whole.start()]);
            }
            last = whole.end();

            let Some(name) = caps.get(2).map(|name| name.as_str().to_ascii_lowercase()) else {
                // Comment.
                continue;
            };
            let closing = caps.get(1).is_some_and(|slash| !slash.as_str().is_empty());

            if let Some(open) = &skipping {
                if closing && *open == name {
                    skipping = None;
                }
                continue;
            }
            if OPAQUE_TAGS.contains(&name.as_str()) {
                if !closing {
                    skipping = Some(name);
                }
                continue;
            }
            if self.tags.contains(&name) {
                let rest = caps.get(3).map_or("", |rest| rest.as_str());
                out.push_str(&self.rebuild(closing, &name, rest));
            }
        }
        if skipping.is_none() {
            out.push_str(&html[last..]);
        }
        out
    }
}
