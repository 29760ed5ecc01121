use std::collections::HashSet;
use std::iter;

use scraper::{Html, Selector};
use url::Url;

/// Probed after every declared icon.
pub const DEFAULT_ICON: &str = "/favicon.ico";

/// `href` values of `<link>` elements whose `rel` mentions an icon, in document order.
pub fn icon_links(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("link[rel][href]") else {
        return Vec::new();
    };

    Html::parse_document(html)
        .select(&selector)
        .filter(|link| {
            link.value()
                .attr("rel")
                .is_some_and(|rel| rel.to_ascii_lowercase().contains("icon"))
        })
        .filter_map(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Absolute icon URLs to probe: each declared href resolved against `base`,
/// then the default icon, each URL at most once.
///
/// Calling again with the same inputs starts the sequence over.
pub fn candidates<'a>(base: &'a Url, hrefs: &'a [String]) -> impl Iterator<Item = Url> + 'a {
    let mut seen = HashSet::new();
    hrefs
        .iter()
        .map(String::as_str)
        .chain(iter::once(DEFAULT_ICON))
        .filter_map(move |href| base.join(href).ok())
        .filter(move |url| seen.insert(url.to_string()))
}
