use crate::clamp::{Measure, ReadMore, ReadMoreView};
use crate::controller::FeedSnapshot;
use crate::i18n::Catalog;
use crate::normalize::NormalizedError;
use crate::sanitize::Sanitizer;
use crate::settings::HostSettings;
use crate::types::block::BlockAttributes;
use crate::types::enums::{ImageType, SortKey};
use crate::types::review::{FeedEntry, Review};

pub const ERROR_IMAGE: &str = "block-error.svg";

const SORT_OPTIONS: [(SortKey, &str); 3] = [
    (SortKey::MostRecent, "Most recent"),
    (SortKey::HighestRating, "Highest rating"),
    (SortKey::LowestRating, "Lowest rating"),
];

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').and_then(|end| {
            let decoded = match &tail[1..end] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                entity => entity
                    .strip_prefix('#')
                    .and_then(|code| code.parse::<u32>().ok())
                    .and_then(char::from_u32),
            };
            decoded.map(|ch| (ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Attributes after host settings are applied: images need avatars or the
/// product image type, ratings need ratings enabled store-wide.
pub fn effective_attributes(attributes: &BlockAttributes, settings: HostSettings) -> BlockAttributes {
    BlockAttributes {
        show_review_image: (settings.show_avatars || attributes.image_type == ImageType::Product)
            && attributes.show_review_image,
        show_review_rating: settings.review_ratings_enabled && attributes.show_review_rating,
        ..attributes.clone()
    }
}

pub struct Renderer<'a> {
    pub settings: HostSettings,
    pub catalog: &'a dyn Catalog,
    pub sanitizer: &'a dyn Sanitizer,
    pub measure: &'a dyn Measure,
    pub max_lines: usize,
    pub asset_url: &'a str,
}

impl Renderer<'_> {
    fn t(&self, text: &str) -> String {
        self.catalog.translate(text)
    }

    pub fn render_feed(&self, snapshot: &FeedSnapshot, attributes: &BlockAttributes) -> String {
        if let Some(error) = &snapshot.error {
            return self.render_error_panel(Some(error));
        }
        if snapshot.reviews.is_empty() {
            return String::new();
        }
        let effective = effective_attributes(attributes, self.settings);
        let mut out = String::new();
        if attributes.show_orderby && self.settings.review_ratings_enabled {
            out.push_str(&self.render_sort_select(&snapshot.sort_key));
        }
        out.push_str(&self.render_review_list(&snapshot.reviews, &effective));
        if attributes.show_load_more && snapshot.total_reviews > snapshot.reviews.len() {
            out.push_str(&self.render_load_more());
        }
        out
    }

    pub fn render_review_list(&self, entries: &[FeedEntry], attributes: &BlockAttributes) -> String {
        let mut out = String::from(r#"<ul class="wc-block-review-list wc-block-components-review-list">"#);
        if entries.is_empty() {
            out.push_str(&self.render_review_item(&FeedEntry::Placeholder, attributes));
        }
        for entry in entries {
            out.push_str(&self.render_review_item(entry, attributes));
        }
        out.push_str("</ul>");
        out
    }

    pub fn render_review_item(&self, entry: &FeedEntry, attributes: &BlockAttributes) -> String {
        let review = entry.review();
        let loading = review.is_none();
        let rating = review
            .and_then(|review| review.rating)
            .filter(|_| attributes.show_review_rating);

        let mut classes =
            String::from("wc-block-review-list-item__item wc-block-components-review-list-item__item");
        if loading {
            classes.push_str(" is-loading");
        }
        if attributes.show_review_image {
            classes.push_str(" wc-block-components-review-list-item__item--has-image");
        }
        let mut out = format!(r#"<li class="{classes}" aria-hidden="{loading}">"#);

        let show_meta = attributes.show_product_name
            || attributes.show_reviewer_name
            || attributes.show_review_date
            || rating.is_some();
        if show_meta || attributes.show_review_image {
            out.push_str(r#"<div class="wc-block-review-list-item__info wc-block-components-review-list-item__info">"#);
            if attributes.show_review_image {
                out.push_str(&self.render_image(review, attributes.image_type));
            }
            if show_meta {
                out.push_str(&self.render_meta(review, rating, attributes));
            }
            out.push_str("</div>");
        }
        if attributes.show_review_content {
            out.push_str(&self.render_text(review));
        }
        out.push_str("</li>");
        out
    }

    fn render_image(&self, review: Option<&Review>, image_type: ImageType) -> String {
        let open = r#"<div class="wc-block-review-list-item__image wc-block-components-review-list-item__image">"#;
        let Some(review) = review else {
            return format!("{open}</div>");
        };
        let (alt, src) = match image_type {
            ImageType::Product => review
                .product_image
                .as_ref()
                .map_or(("", ""), |image| (image.alt.as_str(), image.thumbnail.as_str())),
            ImageType::Reviewer => ("", review.avatar_url(96).unwrap_or("")),
        };
        let mut out = format!(
            r#"{open}<img aria-hidden="true" alt="{}" src="{}">"#,
            escape_html(alt),
            escape_html(src)
        );
        if review.verified {
            let label = escape_html(&self.t("Verified buyer"));
            out.push_str(&format!(
                r#"<div class="wc-block-review-list-item__verified wc-block-components-review-list-item__verified" title="{label}">{label}</div>"#
            ));
        }
        out.push_str("</div>");
        out
    }

    fn render_meta(
        &self,
        review: Option<&Review>,
        rating: Option<u8>,
        attributes: &BlockAttributes,
    ) -> String {
        let mut out = String::from(
            r#"<div class="wc-block-review-list-item__meta wc-block-components-review-list-item__meta">"#,
        );
        if let Some(rating) = rating {
            out.push_str(&self.render_rating(rating));
        }
        if let Some(review) = review {
            if attributes.show_product_name {
                out.push_str(&format!(
                    r#"<div class="wc-block-review-list-item__product wc-block-components-review-list-item__product"><a href="{}">{}</a></div>"#,
                    escape_html(&review.product_permalink),
                    escape_html(&decode_entities(&review.product_name))
                ));
            }
            if attributes.show_reviewer_name {
                out.push_str(&format!(
                    r#"<div class="wc-block-review-list-item__author wc-block-components-review-list-item__author">{}</div>"#,
                    escape_html(&review.reviewer)
                ));
            }
            if attributes.show_review_date {
                out.push_str(&format!(
                    r#"<time class="wc-block-review-list-item__published-date wc-block-components-review-list-item__published-date" datetime="{}">{}</time>"#,
                    review.date_created.format("%Y-%m-%dT%H:%M:%S"),
                    escape_html(&review.formatted_date_created)
                ));
            }
        }
        out.push_str("</div>");
        out
    }

    fn render_rating(&self, rating: u8) -> String {
        let label = self.t("Rated %s out of 5");
        let aria = label.replacen("%s", &rating.to_string(), 1);
        let visible = label.replacen("%s", &format!(r#"<strong class="rating">{rating}</strong>"#), 1);
        let width = u32::from(rating) * 100 / 5;
        format!(
            r#"<div aria-hidden="true" class="wc-block-review-list-item__rating wc-block-components-review-list-item__rating"><div class="wc-block-review-list-item__rating__stars wc-block-components-review-list-item__rating__stars wc-block-review-list-item__rating__stars--{rating}" role="img" aria-label="{}"><span style="width:{width}%">{visible}</span></div></div>"#,
            escape_html(&aria)
        )
    }

    fn render_text(&self, review: Option<&Review>) -> String {
        let class = "wc-block-review-list-item__text wc-block-components-review-list-item__text";
        let content = review.map_or("", |review| review.review.as_str());
        if content.is_empty() {
            return String::new();
        }
        let read_more = ReadMore::for_review(content, self.max_lines, self.measure);
        let mut out = format!(r#"<div class="{class}">"#);
        match read_more.view() {
            ReadMoreView::Summary(summary) => out.push_str(&format!(r#"<div aria-hidden="false">{summary}</div>"#)),
            ReadMoreView::Full(full) => out.push_str(&format!("<div>{full}</div>")),
        }
        if let Some(label) = read_more.toggle_label() {
            out.push_str(&format!(
                r##"<a href="#more" class="{}__read_more" aria-expanded="true" role="button">{}</a>"##,
                class.split(' ').next().unwrap_or(class),
                escape_html(&self.t(label))
            ));
        }
        out.push_str("</div>");
        out
    }

    pub fn render_sort_select(&self, current: &SortKey) -> String {
        let mut out = format!(
            r#"<div class="wc-block-review-sort-select wc-block-components-review-sort-select"><label for="wc-block-review-sort-select"><span aria-hidden="true">{}</span><span class="screen-reader-text">{}</span></label><select id="wc-block-review-sort-select">"#,
            escape_html(&self.t("Order by")),
            escape_html(&self.t("Order reviews by"))
        );
        for (key, label) in &SORT_OPTIONS {
            let selected = if key == current { " selected" } else { "" };
            out.push_str(&format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                key.as_str(),
                escape_html(&self.t(label))
            ));
        }
        out.push_str("</select></div>");
        out
    }

    pub fn render_load_more(&self) -> String {
        format!(
            r#"<div class="wp-block-button wc-block-load-more wc-block-components-load-more"><button class="wp-block-button__link"><span aria-hidden="true">{}</span><span class="screen-reader-text">{}</span></button></div>"#,
            self.sanitizer.sanitize(&self.t("Load more")),
            escape_html(&self.t("Load more reviews"))
        )
    }

    pub fn render_error_panel(&self, error: Option<&NormalizedError>) -> String {
        render_error_panel(
            self.catalog,
            self.asset_url,
            error.map(|error| error.message.as_str()),
        )
    }
}

pub fn render_error_panel(catalog: &dyn Catalog, asset_url: &str, message: Option<&str>) -> String {
    let mut out = format!(
        r#"<div class="wc-block-error wc-block-components-error"><img class="wc-block-error__image wc-block-components-error__image" src="{}/{ERROR_IMAGE}" alt=""><div class="wc-block-error__content wc-block-components-error__content"><p class="wc-block-error__header wc-block-components-error__header">{}</p><p class="wc-block-error__text wc-block-components-error__text">{}</p>"#,
        escape_html(asset_url.trim_end_matches('/')),
        escape_html(&catalog.translate("Oops!")),
        escape_html(&catalog.translate("There was an error loading the content."))
    );
    if let Some(message) = message.filter(|message| !message.is_empty()) {
        out.push_str(&format!(
            r#"<p class="wc-block-error__message wc-block-components-error__message">{} {}</p>"#,
            escape_html(&catalog.translate("Error:")),
            escape_html(message)
        ));
    }
    out.push_str("</div></div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clamp::MonospaceMeasure;
    use crate::controller::FeedPhase;
    use crate::i18n::SourceCatalog;
    use crate::sanitize::AllowListSanitizer;
    use crate::test_support::review;
    use crate::types::enums::ErrorType;

    fn with_renderer<R>(settings: HostSettings, f: impl FnOnce(&Renderer<'_>) -> R) -> R {
        let catalog = SourceCatalog::new();
        let sanitizer = AllowListSanitizer::default();
        let measure = MonospaceMeasure::new(80, 20);
        let renderer = Renderer {
            settings,
            catalog: &catalog,
            sanitizer: &sanitizer,
            measure: &measure,
            max_lines: 10,
            asset_url: "/assets",
        };
        f(&renderer)
    }

    fn snapshot(reviews: Vec<FeedEntry>, total: usize) -> FeedSnapshot {
        FeedSnapshot {
            phase: FeedPhase::Loaded,
            reviews_to_display: reviews.len(),
            reviews,
            total_reviews: total,
            loading: false,
            error: None,
            sort_key: SortKey::HighestRating,
            settled_fetches: 1,
        }
    }

    #[test]
    fn test_effective_attributes_follow_host_settings() {
        let attributes = BlockAttributes::default();
        let effective = effective_attributes(
            &attributes,
            HostSettings {
                review_ratings_enabled: false,
                show_avatars: false,
            },
        );
        assert!(!effective.show_review_image);
        assert!(!effective.show_review_rating);

        let product = BlockAttributes {
            image_type: ImageType::Product,
            ..BlockAttributes::default()
        };
        let effective = effective_attributes(
            &product,
            HostSettings {
                review_ratings_enabled: true,
                show_avatars: false,
            },
        );
        assert!(effective.show_review_image);
        assert!(effective.show_review_rating);
    }

    #[test]
    fn test_feed_renders_controls_list_and_load_more() {
        let html = with_renderer(HostSettings::default(), |renderer| {
            let entries = vec![FeedEntry::Loaded(review(1)), FeedEntry::Loaded(review(2))];
            renderer.render_feed(&snapshot(entries, 5), &BlockAttributes::default())
        });
        assert!(html.starts_with(r#"<div class="wc-block-review-sort-select"#));
        assert!(html.contains(r#"<option value="highest-rating" selected>Highest rating</option>"#));
        assert_eq!(html.matches("<li ").count(), 2);
        assert!(html.contains("Reviewer 1"));
        assert!(html.contains("wc-block-load-more"));
        assert!(html.contains(r#"<span class="screen-reader-text">Load more reviews</span>"#));
    }

    #[test]
    fn test_load_more_hidden_when_everything_is_shown() {
        let html = with_renderer(HostSettings::default(), |renderer| {
            let entries = vec![FeedEntry::Loaded(review(1))];
            renderer.render_feed(&snapshot(entries, 1), &BlockAttributes::default())
        });
        assert!(!html.contains("wc-block-load-more"));
    }

    #[test]
    fn test_sort_select_needs_ratings() {
        let html = with_renderer(
            HostSettings {
                review_ratings_enabled: false,
                show_avatars: true,
            },
            |renderer| {
                let entries = vec![FeedEntry::Loaded(review(3))];
                renderer.render_feed(&snapshot(entries, 1), &BlockAttributes::default())
            },
        );
        assert!(!html.contains("sort-select"));
        assert!(!html.contains("__rating__stars"));
    }

    #[test]
    fn test_rating_and_verified_badge() {
        let html = with_renderer(HostSettings::default(), |renderer| {
            // Review 2: rating 3, verified.
            renderer.render_review_item(&FeedEntry::Loaded(review(2)), &BlockAttributes::default())
        });
        assert!(html.contains("wc-block-review-list-item__rating__stars--3"));
        assert!(html.contains(r#"aria-label="Rated 3 out of 5""#));
        assert!(html.contains(r#"style="width:60%""#));
        assert!(html.contains("Verified buyer"));
        assert!(html.contains(r#"aria-hidden="false""#));
    }

    #[test]
    fn test_placeholder_item_is_loading_skeleton() {
        let html = with_renderer(HostSettings::default(), |renderer| {
            renderer.render_review_list(&[], &BlockAttributes::default())
        });
        assert_eq!(html.matches("<li ").count(), 1);
        assert!(html.contains("is-loading"));
        assert!(html.contains(r#"aria-hidden="true""#));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut hostile = review(1);
        hostile.reviewer = "<script>x</script>".to_string();
        hostile.product_name = "Fish &amp; Chips".to_string();
        let attributes = BlockAttributes {
            show_product_name: true,
            ..BlockAttributes::default()
        };
        let html = with_renderer(HostSettings::default(), |renderer| {
            renderer.render_review_item(&FeedEntry::Loaded(hostile), &attributes)
        });
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains(">Fish &amp; Chips</a>"));
    }

    #[test]
    fn test_long_review_gets_read_more_toggle() {
        let mut long = review(1);
        long.review = format!("<p>{}</p>", "warm soft hat ".repeat(200));
        let html = with_renderer(HostSettings::default(), |renderer| {
            renderer.render_review_item(&FeedEntry::Loaded(long), &BlockAttributes::default())
        });
        assert!(html.contains("&hellip;"));
        assert!(html.contains(">Read full review</a>"));
    }

    #[test]
    fn test_error_panel_shows_message() {
        let error = NormalizedError {
            code: String::new(),
            message: "expected value at line 1".to_string(),
            kind: ErrorType::General,
        };
        let html = with_renderer(HostSettings::default(), |renderer| {
            let mut failed = snapshot(Vec::new(), 0);
            failed.error = Some(error);
            renderer.render_feed(&failed, &BlockAttributes::default())
        });
        assert!(html.contains(r#"src="/assets/block-error.svg""#));
        assert!(html.contains(">Oops!</p>"));
        assert!(html.contains("There was an error loading the content."));
        assert!(html.contains("Error: expected value at line 1"));
    }

    #[test]
    fn test_empty_feed_renders_nothing() {
        let html = with_renderer(HostSettings::default(), |renderer| {
            renderer.render_feed(&snapshot(Vec::new(), 0), &BlockAttributes::default())
        });
        assert!(html.is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("A &amp; B &#8211; C &bogus"), "A & B \u{2013} C &bogus");
    }
}
