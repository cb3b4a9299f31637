//! Post formatting pipeline
//!
//! Composes the stages that turn raw post text into a safe fragment:
//!
//! ```text
//! raw text -> paragraph -> repair -> builder -> sanitizer -> serializer -> fragment
//! ```
//!
//! Every call builds and drops its own tree, so a [`Formatter`] can be
//! shared between threads freely. The only shared state is the formatter's
//! policy and options, which are never mutated after construction.
//!
//! # Failure Model
//!
//! Malformed and hostile input is absorbed (repaired or pruned), never
//! rejected. `format` only returns `Err` when a resource limit trips or the
//! parser fails internally; an empty `Ok` string means there was simply no
//! content left. Callers rendering a page should prefer
//! [`Formatter::format_or_escape`], which falls back to escaped plain text.
//!
//! # Timeout Strategy
//!
//! The timeout is cooperative: the deadline is checked every 100 tree nodes
//! while building, and after each stage. There are no threads involved, so
//! a stage that is already running (html5ever parsing in particular) is not
//! interrupted; the error is raised at the next checkpoint.
//!
//! # Usage
//!
//! ```rust
//! use forum_markup::formatter::{FormatOptions, Formatter};
//! use forum_markup::policy::WhitelistPolicy;
//!
//! let formatter = Formatter::new(WhitelistPolicy::forum(), FormatOptions::default());
//! let html = formatter.format("first\n\nsecond line\nthird").unwrap();
//! assert_eq!(html, "<p>first</p><p>second line<br />third</p>");
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::builder::build_pruned_tree;
use crate::charset::decode_input;
use crate::error::FormatError;
use crate::paragraph::normalize_paragraphs;
use crate::policy::WhitelistPolicy;
use crate::repair::repair_markup;
use crate::sanitizer::sanitize;
use crate::serializer::{escape_text, serialize_fragment};

/// Default maximum element nesting depth
///
/// Every stage walks with an explicit stack, so this only bounds memory on
/// pathological input; ordinary deep nesting formats normally.
pub const DEFAULT_MAX_DEPTH: usize = 100_000;

/// Nodes processed between deadline checks
const CHECKPOINT_INTERVAL: u32 = 100;

/// Formatting limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Deepest element nesting accepted from the repaired markup
    pub max_depth: usize,
    /// Time budget for one call (`Duration::ZERO` means unlimited)
    pub timeout: Duration,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: Duration::ZERO,
        }
    }
}

/// Per-call state for limit enforcement
///
/// ```rust
/// use std::time::Duration;
/// use forum_markup::formatter::{FormatContext, FormatOptions};
///
/// let options = FormatOptions { timeout: Duration::from_secs(5), ..Default::default() };
/// let mut ctx = FormatContext::new(&options);
///
/// for _ in 0..1000 {
///     ctx.increment_and_check()?;
/// }
/// assert_eq!(ctx.node_count(), 1000);
/// # Ok::<(), forum_markup::FormatError>(())
/// ```
#[derive(Debug)]
pub struct FormatContext {
    start_time: Instant,
    timeout: Duration,
    max_depth: usize,
    node_count: u32,
}

impl FormatContext {
    pub fn new(options: &FormatOptions) -> Self {
        Self {
            start_time: Instant::now(),
            timeout: options.timeout,
            max_depth: options.max_depth,
            node_count: 0,
        }
    }

    /// Check if the time budget has been exceeded
    pub fn check_timeout(&self) -> Result<(), FormatError> {
        if self.timeout.is_zero() {
            return Ok(());
        }

        if self.start_time.elapsed() > self.timeout {
            return Err(FormatError::Timeout);
        }

        Ok(())
    }

    /// Count one node and check the deadline at checkpoints
    pub fn increment_and_check(&mut self) -> Result<(), FormatError> {
        self.node_count = self.node_count.saturating_add(1);

        if self.node_count % CHECKPOINT_INTERVAL == 0 {
            self.check_timeout()?;
        }

        Ok(())
    }

    /// Reject element nesting deeper than the configured maximum
    pub fn validate_depth(&self, depth: usize) -> Result<(), FormatError> {
        if depth > self.max_depth {
            return Err(FormatError::TooDeep {
                depth,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn node_count(&self) -> u32 {
        self.node_count
    }
}

impl Default for FormatContext {
    fn default() -> Self {
        Self::new(&FormatOptions::default())
    }
}

/// Post text formatter: a whitelist policy plus limits
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    policy: WhitelistPolicy,
    options: FormatOptions,
}

impl Formatter {
    pub fn new(policy: WhitelistPolicy, options: FormatOptions) -> Self {
        Self { policy, options }
    }

    pub fn policy(&self) -> &WhitelistPolicy {
        &self.policy
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Format raw post text into a sanitized fragment
    ///
    /// # Errors
    ///
    /// - `FormatError::TooDeep`: allowed markup nests past `max_depth`
    /// - `FormatError::Timeout`: the time budget ran out
    /// - `FormatError::Internal`: the parser or serializer panicked
    pub fn format(&self, raw: &str) -> Result<String, FormatError> {
        let mut ctx = FormatContext::new(&self.options);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(raw, &mut ctx)));

        match outcome {
            Ok(result) => result,
            Err(_) => Err(FormatError::Internal(
                "panic while formatting post text".to_string(),
            )),
        }
    }

    /// Decode byte input, then format it
    ///
    /// `charset` may be a bare label or a Content-Type value; see
    /// [`crate::charset::decode_input`].
    pub fn format_bytes(&self, raw: &[u8], charset: Option<&str>) -> Result<String, FormatError> {
        self.format(&decode_input(raw, charset))
    }

    /// Format raw post text, falling back to escaped plain text on failure
    ///
    /// The fallback keeps line breaks readable by turning newlines into
    /// `<br />`; everything else is escaped and no markup survives.
    ///
    /// ```rust
    /// use forum_markup::formatter::{FormatOptions, Formatter};
    /// use forum_markup::policy::WhitelistPolicy;
    ///
    /// let options = FormatOptions { max_depth: 2, ..Default::default() };
    /// let formatter = Formatter::new(WhitelistPolicy::forum(), options);
    ///
    /// let html = formatter.format_or_escape("<b><i><b>deep</b></i></b>\nnext");
    /// assert_eq!(html, "&lt;b&gt;&lt;i&gt;&lt;b&gt;deep&lt;/b&gt;&lt;/i&gt;&lt;/b&gt;<br />next");
    /// ```
    pub fn format_or_escape(&self, raw: &str) -> String {
        match self.format(raw) {
            Ok(html) => html,
            Err(error) => {
                tracing::warn!(
                    code = error.code(),
                    %error,
                    "post formatting failed, falling back to escaped text"
                );
                escape_text(&raw.replace('\r', "")).replace('\n', "<br />")
            }
        }
    }

    fn run_pipeline(&self, raw: &str, ctx: &mut FormatContext) -> Result<String, FormatError> {
        let paragraphs = normalize_paragraphs(raw);

        let repaired = repair_markup(&paragraphs);
        ctx.check_timeout()?;

        let built = build_pruned_tree(&repaired, &self.policy, ctx)?;
        drop(repaired);
        ctx.check_timeout()?;

        let mut tree = built.tree;
        let mut report = sanitize(&mut tree, &self.policy);
        report.pruned_elements += built.pruned_elements;
        ctx.check_timeout()?;

        let html = serialize_fragment(&tree);
        ctx.check_timeout()?;

        tracing::debug!(
            input_len = raw.len(),
            output_len = html.len(),
            nodes = ctx.node_count(),
            pruned_elements = report.pruned_elements,
            stripped_attributes = report.stripped_attributes,
            elapsed_us = ctx.elapsed().as_micros() as u64,
            "formatted post text"
        );

        Ok(html)
    }
}

/// Format raw post text with the forum policy and default limits
///
/// The formatter behind this function is built once per process and never
/// changes afterwards.
///
/// ```rust
/// use forum_markup::format_for_display;
///
/// let html = format_for_display("<a href=\"ok\" onclick=\"bad\">t</a>").unwrap();
/// assert_eq!(html, "<p><a href=\"ok\">t</a></p>");
/// ```
pub fn format_for_display(raw: &str) -> Result<String, FormatError> {
    static FORMATTER: OnceLock<Formatter> = OnceLock::new();
    FORMATTER.get_or_init(Formatter::default).format(raw)
}
