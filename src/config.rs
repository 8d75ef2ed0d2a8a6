use crate::dom::Dom;
use crate::error::{Error, Result};
use crate::pattern::PagePatterns;

pub(crate) const DEFAULT_BLINK_INTERVAL_MS: i64 = 2_000;
pub(crate) const DEFAULT_REVEAL_DELAY_MS: i64 = 100;
pub(crate) const DEFAULT_TIMER_STEP_LIMIT: usize = 10_000;
/// Floor for the poll interval; a zero delay would reschedule at the same
/// instant forever.
pub(crate) const MIN_REFRESH_DELAY_MS: i64 = 1_000;

/// Host-page settings and timing constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    /// Seconds between reply polls. `None` disables polling.
    pub auto_refresh_delay_secs: Option<u64>,
    /// Initial blink state. `true` means a cycle is already marked running,
    /// so new replies will not start one until a focus clears it.
    pub blink_title: bool,
    /// Whether quote links get hover previews.
    pub hover_previews: bool,
    pub blink_interval_ms: i64,
    pub reveal_delay_ms: i64,
    pub timer_step_limit: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            auto_refresh_delay_secs: None,
            blink_title: false,
            hover_previews: true,
            blink_interval_ms: DEFAULT_BLINK_INTERVAL_MS,
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
            timer_step_limit: DEFAULT_TIMER_STEP_LIMIT,
        }
    }
}

impl PageConfig {
    /// Reads the globals the host page declares in inline scripts
    /// (`var autoRefreshDelay = 30;`, `var blinkTitle = false;`). Later
    /// declarations override earlier ones, as they would at runtime.
    pub fn from_document(dom: &Dom) -> Result<Self> {
        let patterns = PagePatterns::compile()?;
        let mut config = Self::default();

        for script in dom.elements_by_tag_from(dom.root(), "script") {
            let source = dom.text_content(script);
            if let Some(delay) = patterns.refresh_delay_global.capture(&source, 1)? {
                let secs = delay.parse::<u64>().map_err(|err| {
                    Error::InvalidSetting(format!("autoRefreshDelay {delay}: {err}"))
                })?;
                config.auto_refresh_delay_secs = Some(secs);
            }
            if let Some(flag) = patterns.blink_title_global.capture(&source, 1)? {
                config.blink_title = flag == "true";
            }
        }

        Ok(config)
    }

    pub fn with_auto_refresh_delay_secs(mut self, secs: u64) -> Self {
        self.auto_refresh_delay_secs = Some(secs);
        self
    }

    pub fn with_blink_title(mut self, blinking: bool) -> Self {
        self.blink_title = blinking;
        self
    }

    pub fn with_hover_previews(mut self, enabled: bool) -> Self {
        self.hover_previews = enabled;
        self
    }

    pub fn with_blink_interval_ms(mut self, interval_ms: i64) -> Self {
        self.blink_interval_ms = interval_ms;
        self
    }

    pub fn with_reveal_delay_ms(mut self, delay_ms: i64) -> Self {
        self.reveal_delay_ms = delay_ms;
        self
    }

    pub fn with_timer_step_limit(mut self, max_steps: usize) -> Self {
        self.timer_step_limit = max_steps;
        self
    }

    pub(crate) fn refresh_delay_ms(&self) -> Option<i64> {
        self.auto_refresh_delay_secs.map(|secs| {
            i64::try_from(secs.saturating_mul(1_000))
                .unwrap_or(i64::MAX)
                .max(MIN_REFRESH_DELAY_MS)
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.blink_interval_ms <= 0 {
            return Err(Error::InvalidSetting(format!(
                "blink_interval_ms must be positive, got {}",
                self.blink_interval_ms
            )));
        }
        if self.reveal_delay_ms < 0 {
            return Err(Error::InvalidSetting(format!(
                "reveal_delay_ms must not be negative, got {}",
                self.reveal_delay_ms
            )));
        }
        if self.timer_step_limit == 0 {
            return Err(Error::InvalidSetting(
                "timer_step_limit requires at least 1 step".into(),
            ));
        }
        Ok(())
    }
}
