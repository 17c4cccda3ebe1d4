/// A single article teaser discovered on a topic listing page. The `url` is
/// always absolute and origin-qualified by the time one of these exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRef {
    pub url: String,
    pub tag: String,
}

/// The fully extracted record for one article page. Every field is a plain
/// string; fields the page did not provide are empty rather than absent.
/// `created` and `updated` carry whatever timestamp text the page's metadata
/// declared, typically ISO-8601.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestedArticle {
    pub url: String,
    pub title: String,
    pub author: String,
    pub created: String,
    pub updated: String,
    pub content: String,
}
