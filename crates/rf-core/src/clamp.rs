use regex::Regex;
use std::sync::LazyLock;

pub const DEFAULT_ELLIPSIS: &str = "&hellip;";

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[a-zA-Z][^>]*>").expect("valid tag regex")
});
static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^</?\s*([a-zA-Z][a-zA-Z0-9]*)").expect("valid tag name regex"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^&[a-zA-Z0-9#]+;").expect("valid entity regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("valid space regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateOptions {
    pub limit: usize,
    pub suffix: String,
    pub word_break: bool,
    pub preserve_whitespace: bool,
}

impl TruncateOptions {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            suffix: "...".to_string(),
            word_break: false,
            preserve_whitespace: false,
        }
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_string();
        self
    }

    #[must_use]
    pub fn with_word_break(mut self, word_break: bool) -> Self {
        self.word_break = word_break;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated {
    pub html: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    Text(&'a str),
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for found in TAG.find_iter(html) {
        if found.start() > last {
            tokens.push(Token::Text(&html[last..found.start()]));
        }
        tokens.push(Token::Tag(found.as_str()));
        last = found.end();
    }
    if last < html.len() {
        tokens.push(Token::Text(&html[last..]));
    }
    tokens
}

pub fn text_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        let len = ENTITY
            .find(rest)
            .map_or(ch.len_utf8(), |entity| entity.end());
        units.push(&rest[..len]);
        rest = &rest[len..];
    }
    units
}

fn normalize_spaces(text: &str, preserve: bool) -> std::borrow::Cow<'_, str> {
    if preserve {
        std::borrow::Cow::Borrowed(text)
    } else {
        SPACES.replace_all(text, " ")
    }
}

pub fn visible_len(html: &str, preserve_whitespace: bool) -> usize {
    tokenize(html)
        .into_iter()
        .map(|token| match token {
            Token::Text(text) => text_units(&normalize_spaces(text, preserve_whitespace)).len(),
            Token::Tag(_) => 0,
        })
        .sum()
}

fn tag_name(tag: &str) -> Option<String> {
    TAG_NAME
        .captures(tag)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_ascii_lowercase())
}

fn back_off(units: &[&str], mut cut: usize) -> usize {
    while cut > 0 && units[cut - 1] == " " {
        cut -= 1;
    }
    cut
}

fn cut_point(units: &[&str], cut: usize, word_break: bool, has_prior_text: bool) -> usize {
    if word_break || units.get(cut).is_some_and(|unit| *unit == " ") {
        return back_off(units, cut);
    }
    match units[..cut].iter().rposition(|unit| *unit == " ") {
        Some(space) => back_off(units, space),
        None if has_prior_text => 0,
        None => cut,
    }
}

/// Cuts `html` after `options.limit` visible units. After the cut, a closing
/// tag survives only if its opening tag did.
pub fn truncate_html(html: &str, options: &TruncateOptions) -> Truncated {
    let mut out = String::with_capacity(html.len());
    let mut count = 0;
    let mut truncated = false;
    let mut dropped: Vec<String> = Vec::new();

    for token in tokenize(html) {
        match token {
            Token::Text(_) if truncated => {}
            Token::Text(text) => {
                let normalized = normalize_spaces(text, options.preserve_whitespace);
                let units = text_units(&normalized);
                if count + units.len() <= options.limit {
                    count += units.len();
                    out.push_str(text);
                    continue;
                }
                let cut = cut_point(
                    &units,
                    options.limit - count,
                    options.word_break,
                    count > 0,
                );
                out.push_str(&units[..cut].concat());
                out.push_str(&options.suffix);
                count = options.limit;
                truncated = true;
            }
            Token::Tag(tag) if !truncated => out.push_str(tag),
            Token::Tag(tag) => {
                let Some(name) = tag_name(tag) else {
                    continue;
                };
                if !tag.starts_with("</") {
                    dropped.push(name);
                } else if let Some(open) = dropped.iter().rposition(|open| *open == name) {
                    dropped.truncate(open);
                } else {
                    out.push_str(tag);
                }
            }
        }
    }

    Truncated {
        html: out,
        truncated,
    }
}

pub trait Measure {
    fn height(&self, html: &str) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMeasure {
    pub columns: usize,
    pub line_height: u32,
}

impl MonospaceMeasure {
    pub fn new(columns: usize, line_height: u32) -> Self {
        Self {
            columns: columns.max(1),
            line_height,
        }
    }

    fn wrap(&self, paragraph: &str) -> usize {
        let mut lines = 0;
        let mut current = 0;
        for word in paragraph.split_whitespace() {
            let len = text_units(word).len();
            if current == 0 {
                lines += 1 + (len.saturating_sub(1)) / self.columns;
                current = (len.saturating_sub(1)) % self.columns + 1;
            } else if current + 1 + len <= self.columns {
                current += 1 + len;
            } else {
                lines += 1 + (len.saturating_sub(1)) / self.columns;
                current = (len.saturating_sub(1)) % self.columns + 1;
            }
        }
        lines
    }
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6",
];

impl Measure for MonospaceMeasure {
    fn height(&self, html: &str) -> u32 {
        let mut paragraphs = vec![String::new()];
        for token in tokenize(html) {
            match token {
                Token::Text(text) => {
                    if let Some(current) = paragraphs.last_mut() {
                        current.push_str(text);
                    }
                }
                Token::Tag(tag) => {
                    if tag_name(tag).is_some_and(|name| BLOCK_TAGS.contains(&name.as_str())) {
                        paragraphs.push(String::new());
                    }
                }
            }
        }
        let lines: usize = paragraphs.iter().map(|paragraph| self.wrap(paragraph)).sum();
        u32::try_from(lines)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.line_height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clamped {
    pub html: String,
    pub clamped: bool,
}

/// The budget is `max_lines` one-character lines plus one unit of slack.
pub fn clamp_html(
    content: &str,
    measure: &dyn Measure,
    max_lines: usize,
    ellipsis: &str,
) -> Clamped {
    let unchanged = || Clamped {
        html: content.to_string(),
        clamped: false,
    };
    let line_height = u64::from(measure.height("."));
    if line_height == 0 {
        return unchanged();
    }
    let lines = u64::try_from(max_lines).unwrap_or(u64::MAX);
    let budget = line_height.saturating_mul(lines).saturating_add(1);
    let fits = |html: &str| u64::from(measure.height(html)) <= budget;
    if fits(content) {
        return unchanged();
    }

    let probe = |limit: usize| {
        truncate_html(content, &TruncateOptions::new(limit).with_suffix(ellipsis)).html
    };
    let mut low = 0;
    let mut high = visible_len(content, false);
    let mut best = 0;
    while low <= high {
        let middle = low + (high - low) / 2;
        if fits(&probe(middle)) {
            best = middle;
            low = middle + 1;
        } else if middle == 0 {
            break;
        } else {
            high = middle - 1;
        }
    }
    let full = visible_len(content, false);
    if best >= full {
        return unchanged();
    }
    Clamped {
        html: probe(best),
        clamped: true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMoreView<'a> {
    Summary(&'a str),
    Full(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadMore {
    content: String,
    max_lines: usize,
    ellipsis: String,
    summary: Option<String>,
    expanded: bool,
    pub more_text: &'static str,
    pub less_text: &'static str,
}

impl ReadMore {
    pub fn new(content: &str, max_lines: usize, measure: &dyn Measure) -> Self {
        let mut read_more = Self {
            content: content.to_string(),
            max_lines,
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
            summary: None,
            expanded: false,
            more_text: "Read more",
            less_text: "Read less",
        };
        read_more.recompute(measure);
        read_more
    }

    pub fn for_review(content: &str, max_lines: usize, measure: &dyn Measure) -> Self {
        Self {
            more_text: "Read full review",
            less_text: "Hide full review",
            ..Self::new(content, max_lines, measure)
        }
    }

    fn recompute(&mut self, measure: &dyn Measure) {
        let clamped = clamp_html(&self.content, measure, self.max_lines, &self.ellipsis);
        self.summary = clamped.clamped.then_some(clamped.html);
    }

    /// Re-clamps only when the content or line count changed. Returns whether
    /// anything was recomputed.
    pub fn update(&mut self, content: &str, max_lines: usize, measure: &dyn Measure) -> bool {
        if content == self.content && max_lines == self.max_lines {
            return false;
        }
        self.content = content.to_string();
        self.max_lines = max_lines;
        self.expanded = false;
        self.recompute(measure);
        true
    }

    pub fn toggle(&mut self) {
        if self.summary.is_some() {
            self.expanded = !self.expanded;
        }
    }

    pub fn is_clamped(&self) -> bool {
        self.summary.is_some()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn view(&self) -> ReadMoreView<'_> {
        match &self.summary {
            Some(summary) if !self.expanded => ReadMoreView::Summary(summary),
            _ => ReadMoreView::Full(&self.content),
        }
    }

    pub fn toggle_label(&self) -> Option<&'static str> {
        self.summary.as_ref().map(|_| {
            if self.expanded {
                self.less_text
            } else {
                self.more_text
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: &str = "<p>The beanie kept me warm through a whole winter of early \
        morning runs and it still looks <strong>brand new</strong> after many washes. \
        I would happily buy another one in a different colour.</p>";

    fn assert_balanced(html: &str) {
        let mut open = Vec::new();
        for token in tokenize(html) {
            if let Token::Tag(tag) = token {
                let name = tag_name(tag).unwrap();
                if tag.starts_with("</") {
                    assert_eq!(open.pop(), Some(name), "unbalanced in {html}");
                } else if name != "br" {
                    open.push(name);
                }
            }
        }
        assert!(open.is_empty(), "unclosed tags in {html}");
        assert!(!html.contains('<') || html.matches('<').count() == html.matches('>').count());
    }

    #[test]
    fn test_short_input_is_unchanged() {
        let html = "<p>Nice <em>hat</em></p>";
        let result = truncate_html(html, &TruncateOptions::new(8));
        assert_eq!(result.html, html);
        assert!(!result.truncated);
    }

    #[test]
    fn test_cut_backs_off_to_word_boundary() {
        let result = truncate_html("<p>Warm and cosy hat</p>", &TruncateOptions::new(11));
        assert_eq!(result.html, "<p>Warm and...</p>");
        assert!(result.truncated);
    }

    #[test]
    fn test_word_break_cuts_mid_word() {
        let options = TruncateOptions::new(11).with_word_break(true);
        let result = truncate_html("<p>Warm and cosy hat</p>", &options);
        assert_eq!(result.html, "<p>Warm and co...</p>");
    }

    #[test]
    fn test_single_long_word_is_hard_broken() {
        let result = truncate_html("Supercalifragilistic", &TruncateOptions::new(5));
        assert_eq!(result.html, "Super...");
    }

    #[test]
    fn test_tags_after_cut_are_dropped_but_open_tags_closed() {
        let html = "<p>First words here</p><p>Second <em>paragraph</em></p>";
        let result = truncate_html(html, &TruncateOptions::new(8));
        assert_eq!(result.html, "<p>First...</p>");
        assert_balanced(&result.html);

        let result = truncate_html(html, &TruncateOptions::new(20));
        assert_balanced(&result.html);
        assert!(result.html.starts_with("<p>First words here</p><p>"));
    }

    #[test]
    fn test_entity_counts_as_one_unit() {
        assert_eq!(text_units("a&amp;b").len(), 3);
        let result = truncate_html("Fish &amp; chips forever", &TruncateOptions::new(16));
        assert_eq!(result.html, "Fish &amp; chips...");
        let result = truncate_html("&hellip;&hellip;&hellip;", &TruncateOptions::new(3));
        assert!(!result.truncated);
    }

    #[test]
    fn test_space_runs_count_once() {
        assert_eq!(visible_len("a    b", false), 3);
        assert_eq!(visible_len("a    b", true), 6);
    }

    #[test]
    fn test_monospace_wraps_words() {
        let measure = MonospaceMeasure::new(10, 20);
        assert_eq!(measure.height("."), 20);
        assert_eq!(measure.height("aaaa bbbb cccc"), 40);
        assert_eq!(measure.height("<p>one</p><p>two</p>"), 40);
        assert_eq!(measure.height(""), 0);
    }

    #[test]
    fn test_clamp_leaves_fitting_content_alone() {
        let measure = MonospaceMeasure::new(80, 20);
        let result = clamp_html("<p>Short and sweet.</p>", &measure, 3, DEFAULT_ELLIPSIS);
        assert_eq!(result.html, "<p>Short and sweet.</p>");
        assert!(!result.clamped);
    }

    #[test]
    fn test_zero_line_height_returns_full_content() {
        let measure = MonospaceMeasure::new(10, 0);
        let result = clamp_html(LONG, &measure, 1, DEFAULT_ELLIPSIS);
        assert_eq!(result.html, LONG);
        assert!(!result.clamped);
    }

    #[test]
    fn test_clamp_fits_budget_and_never_splits_tags() {
        let measure = MonospaceMeasure::new(30, 18);
        for max_lines in 1..=4 {
            let result = clamp_html(LONG, &measure, max_lines, DEFAULT_ELLIPSIS);
            assert!(result.clamped);
            let lines = u32::try_from(max_lines).unwrap();
            assert!(measure.height(&result.html) <= 18 * lines);
            assert!(result.html.ends_with("&hellip;</p>"), "{}", result.html);
            assert_balanced(&result.html);
        }
    }

    #[test]
    fn test_clamp_is_monotonic_in_max_lines() {
        let measure = MonospaceMeasure::new(24, 16);
        let mut previous = 0;
        for max_lines in 1..=8 {
            let result = clamp_html(LONG, &measure, max_lines, DEFAULT_ELLIPSIS);
            let shown = visible_len(&result.html, false);
            assert!(shown >= previous, "max_lines={max_lines}");
            previous = shown;
        }
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let result = truncate_html("<p>aaa bbb ccc I <3 it</p>", &TruncateOptions::new(3));
        assert_eq!(result.html, "<p>aaa...</p>");
        assert_eq!(visible_len("I <3 it", false), 7);

        let result = truncate_html("<p>I <3 it <!-- note --> a lot</p>", &TruncateOptions::new(7));
        assert_eq!(result.html, "<p>I <3 it...</p>");
    }

    #[test]
    fn test_content_one_line_over_is_cut() {
        let measure = MonospaceMeasure::new(10, 20);
        let content = "<p>line</p>".repeat(20);
        assert_eq!(measure.height(&content), 400);

        let result = clamp_html(&content, &measure, 19, DEFAULT_ELLIPSIS);
        assert!(result.clamped);
        assert_ne!(result.html, content);
        assert!(result.html.ends_with("&hellip;</p>"), "{}", result.html);
        assert!(measure.height(&result.html) <= 20 * 19);

        let read_more = ReadMore::new(&content, 19, &measure);
        assert!(matches!(read_more.view(), ReadMoreView::Summary(summary) if summary != content));
    }

    #[test]
    fn test_read_more_toggles_between_slots() {
        let measure = MonospaceMeasure::new(30, 18);
        let mut read_more = ReadMore::for_review(LONG, 2, &measure);
        assert!(read_more.is_clamped());
        assert!(matches!(read_more.view(), ReadMoreView::Summary(_)));
        assert_eq!(read_more.toggle_label(), Some("Read full review"));

        read_more.toggle();
        assert_eq!(read_more.view(), ReadMoreView::Full(LONG));
        assert_eq!(read_more.toggle_label(), Some("Hide full review"));

        assert!(!read_more.update(LONG, 2, &measure));
        assert!(read_more.is_expanded());
        assert!(read_more.update(LONG, 20, &measure));
        assert!(!read_more.is_clamped());
        assert_eq!(read_more.toggle_label(), None);
        read_more.toggle();
        assert_eq!(read_more.view(), ReadMoreView::Full(LONG));
    }
}
