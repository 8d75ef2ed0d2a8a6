use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct Regex {
    backend: fancy_regex::Regex,
}

impl Regex {
    pub(crate) fn new(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern).build()
    }

    pub(crate) fn is_match(&self, input: &str) -> Result<bool> {
        self.backend.is_match(input).map_err(pattern_error)
    }

    /// Text of capture group `group` in the first match, if any.
    pub(crate) fn capture(&self, input: &str, group: usize) -> Result<Option<String>> {
        let captures = self.backend.captures(input).map_err(pattern_error)?;
        Ok(captures
            .and_then(|captures| captures.get(group))
            .map(|matched| matched.as_str().to_string()))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RegexBuilder {
    pattern: String,
    case_insensitive: bool,
}

impl RegexBuilder {
    pub(crate) fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            case_insensitive: false,
        }
    }

    pub(crate) fn case_insensitive(&mut self, enabled: bool) -> &mut Self {
        self.case_insensitive = enabled;
        self
    }

    pub(crate) fn build(&self) -> Result<Regex> {
        let mut builder = fancy_regex::RegexBuilder::new(&self.pattern);
        builder.case_insensitive(self.case_insensitive);
        let backend = builder.build().map_err(pattern_error)?;
        Ok(Regex { backend })
    }
}

fn pattern_error(err: fancy_regex::Error) -> Error {
    Error::Pattern(err.to_string())
}

/// The page conventions shared by the host templates and this crate.
#[derive(Debug, Clone)]
pub(crate) struct PagePatterns {
    /// `.../res/<thread>.html`
    pub(crate) thread_path: Regex,
    /// `#q<post>`
    pub(crate) quote_fragment: Regex,
    /// `.../res/<thread>.html#<post>` or `#<post>`
    pub(crate) post_href: Regex,
    /// `>>123`
    pub(crate) quote_label: Regex,
    pub(crate) refresh_delay_global: Regex,
    pub(crate) blink_title_global: Regex,
}

impl PagePatterns {
    pub(crate) fn compile() -> Result<Self> {
        Ok(Self {
            thread_path: Regex::new(r"^.*/res/([0-9]+)\.html$")?,
            quote_fragment: RegexBuilder::new(r"^#q([0-9]+)$")
                .case_insensitive(true)
                .build()?,
            post_href: Regex::new(r"^(?:.*/res/[0-9]+\.html)?#([0-9]+)$")?,
            quote_label: Regex::new(r"^>>([0-9]+)$")?,
            refresh_delay_global: Regex::new(
                r"\b(?:var|let|const)\s+autoRefreshDelay\s*=\s*([0-9]+)",
            )?,
            blink_title_global: Regex::new(r"\b(?:var|let|const)\s+blinkTitle\s*=\s*(true|false)")?,
        })
    }
}
