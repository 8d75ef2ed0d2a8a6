use url::Url;

use crate::error::{Error, Result};
use crate::pattern::PagePatterns;

/// The page's `window.location`, parsed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href).map_err(|err| Error::InvalidLocation {
            href: href.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { url })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    /// The URL a GET of this page goes out to; fragments never leave the client.
    pub fn request_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// `#fragment` including the leading `#`, or empty when there is none.
    pub fn hash(&self) -> String {
        match self.url.fragment() {
            Some(fragment) if !fragment.is_empty() => format!("#{fragment}"),
            _ => String::new(),
        }
    }

    pub(crate) fn thread_id(&self, patterns: &PagePatterns) -> Result<Option<String>> {
        patterns.thread_path.capture(self.pathname(), 1)
    }

    pub(crate) fn quote_target(&self, patterns: &PagePatterns) -> Result<Option<String>> {
        let hash = self.hash();
        if hash.is_empty() {
            return Ok(None);
        }
        patterns.quote_fragment.capture(&hash, 1)
    }
}
