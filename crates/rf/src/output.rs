use crate::LINE_HEIGHT;
use owo_colors::OwoColorize;
use rf_core::clamp::{MonospaceMeasure, clamp_html};
use rf_core::controller::FeedSnapshot;
use rf_core::render::decode_entities;
use rf_core::sanitize::{AllowListSanitizer, Sanitizer};
use rf_core::types::review::Review;

const SUMMARY_LINES: usize = 3;

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Review body as plain text, clamped to a few terminal lines.
fn plain_excerpt(review: &Review, columns: usize) -> String {
    let measure = MonospaceMeasure::new(columns, LINE_HEIGHT);
    let clamped = clamp_html(&review.review, &measure, SUMMARY_LINES, "...");
    let text = AllowListSanitizer::new(&[], &[]).sanitize(&clamped.html);
    decode_entities(&text).trim().to_string()
}

pub(crate) fn print_summary(snapshot: &FeedSnapshot, columns: usize) {
    if let Some(error) = &snapshot.error {
        println!("{} {}", "Error:".red().bold(), error.message);
        return;
    }
    if snapshot.reviews.is_empty() {
        println!("{}", "No reviews.".dimmed());
        return;
    }
    for review in snapshot.reviews.iter().filter_map(|entry| entry.review()) {
        let rating = review.rating.map(stars).unwrap_or_default();
        let verified = if review.verified { " verified" } else { "" };
        println!(
            "{} {} {}{}",
            rating.yellow(),
            review.reviewer.bold(),
            review.formatted_date_created.dimmed(),
            verified.green()
        );
        println!("  {}", review.product_name.cyan());
        for line in plain_excerpt(review, columns).lines() {
            println!("  {line}");
        }
        println!();
    }
    println!(
        "{}",
        format!(
            "Showing {} of {} reviews ({})",
            snapshot.reviews.len(),
            snapshot.total_reviews,
            snapshot.sort_key
        )
        .dimmed()
    );
}
