//! `Link` header parsing.

use url::Url;

/// Page numbers advertised by a `Link` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkPagination {
    pub next_page: Option<u32>,
    pub last_page: Option<u32>,
}

/// Parse a GitHub `Link` header.
///
/// ```text
/// <https://api.github.com/repositories/1/commits?author=x&per_page=1&page=2>; rel="next",
/// <https://api.github.com/repositories/1/commits?author=x&per_page=1&page=57>; rel="last"
/// ```
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel_type)) = (url, rel)
            && let Some(page) = page_from_url(url)
        {
            match rel_type {
                "last" => info.last_page = Some(page),
                "next" => info.next_page = Some(page),
                _ => {}
            }
        }
    }

    info
}

/// The `page` query parameter of a URL.
fn page_from_url(url: &str) -> Option<u32> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}
