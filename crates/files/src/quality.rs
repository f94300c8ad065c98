//! Quality-variant extraction from the `video_quality_list` HTML fragment.
//!
//! The markup has one fixed shape:
//!
//! ```html
//! <div class="file_quality" data-url="https://…" data-quality="1080P">
//!   <p class="name">movie.1080p.mp4</p>
//!   <p class="speed"><span>5 MB/s</span></p>
//!   <p class="size">2.1 GB</p>
//! </div>
//! ```
//!
//! Anything optional that is missing comes back as `None`; the extractor
//! never fails.

use std::sync::LazyLock;

use boxbridge_core::QualityVariant;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

static QUALITY_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".file_quality").unwrap());

static NAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".name").unwrap());

// The speed value sits in an inner span.
static SPEED: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".speed span").unwrap());

static SIZE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".size").unwrap());

/// Parse every quality block in `html`, in document order.
pub fn extract(html: &str) -> Vec<QualityVariant> {
    let fragment = Html::parse_fragment(html);
    fragment.select(&QUALITY_BLOCK).filter_map(parse_block).collect()
}

fn parse_block(block: ElementRef<'_>) -> Option<QualityVariant> {
    let el = block.value();

    // Blocks without a link are dropped rather than given a made-up URL.
    let Some(url) = non_blank(el.attr("data-url")) else {
        warn!("skipping quality block without data-url");
        return None;
    };
    let Some(quality) = non_blank(el.attr("data-quality")) else {
        warn!(url = %url, "skipping quality block without data-quality");
        return None;
    };

    Some(QualityVariant {
        url,
        quality,
        name: child_text(block, &NAME),
        speed: child_text(block, &SPEED),
        size: child_text(block, &SIZE),
    })
}

fn child_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let node = block.select(selector).next()?;
    non_blank(Some(&node.text().collect::<String>()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
