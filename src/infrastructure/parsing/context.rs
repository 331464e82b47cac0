//! Parsing context for listing pages

/// Where the page being parsed came from
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// 1-based page index in the crawl
    pub page_index: u32,

    /// URL the body was fetched from
    pub source_url: String,
}

impl ParseContext {
    pub fn new(page_index: u32, source_url: impl Into<String>) -> Self {
        Self {
            page_index,
            source_url: source_url.into(),
        }
    }
}
