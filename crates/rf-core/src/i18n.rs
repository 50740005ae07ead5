use std::collections::HashMap;

pub trait Catalog: Send + Sync {
    fn translate(&self, text: &str) -> String;

    /// Picks the singular or plural form for `count`.
    fn translate_plural(&self, singular: &str, plural: &str, count: usize) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    overrides: HashMap<String, String>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, source: &str, translated: &str) -> Self {
        self.overrides
            .insert(source.to_string(), translated.to_string());
        self
    }
}

impl Catalog for SourceCatalog {
    fn translate(&self, text: &str) -> String {
        self.overrides
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }

    fn translate_plural(&self, singular: &str, plural: &str, count: usize) -> String {
        let source = if count == 1 { singular } else { plural };
        self.translate(source)
    }
}

pub fn format_count(template: &str, count: usize) -> String {
    template.replacen("%d", &count.to_string(), 1)
}
