//! Whitelist policy for post markup
//!
//! A policy is an immutable value made of two name sets: the tags that may
//! appear in formatted output and the attributes that may appear on them.
//! The sets apply at every depth, and an attribute allowed on one tag is
//! allowed on every retained tag.
//!
//! # Threat Model
//!
//! Post text is written by any registered user and shown to every reader.
//! It may contain:
//! - Script-bearing elements (`<script>`, `<iframe>`, `<object>`, `<svg>`)
//! - Event handlers (`onclick`, `onerror`, ...) and inline `style`
//! - `javascript:` and similar URLs in links and images
//!
//! Tags and attributes are matched against an allow list rather than a deny
//! list, so anything unknown is removed. URL values are left alone by the
//! forum policy; hosts that want scheme filtering on `href` and `src` can
//! opt in with [`WhitelistPolicy::with_blocked_url_schemes`].

use std::collections::HashSet;

/// Tags kept by the forum policy
pub const FORUM_TAGS: &[&str] = &["a", "abbr", "b", "br", "i", "img", "p"];

/// Attributes kept by the forum policy
pub const FORUM_ATTRIBUTES: &[&str] = &["alt", "href", "src", "title"];

/// URL schemes commonly blocked by hosts that enable scheme filtering
pub const DANGEROUS_URL_SCHEMES: &[&str] = &[
    "javascript:", // JavaScript execution
    "data:",       // Can contain executable content
    "vbscript:",   // VBScript execution (legacy IE)
    "file:",       // Local file access
    "about:",      // Browser internal URLs
];

/// Attributes whose values are URLs
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// Allowed tag and attribute names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistPolicy {
    tags: HashSet<String>,
    attributes: HashSet<String>,
    blocked_url_schemes: Vec<String>,
}

impl WhitelistPolicy {
    /// Create a policy from explicit tag and attribute lists
    ///
    /// Names are compared ASCII case-insensitively, matching the lowercased
    /// names produced by the tree builder.
    pub fn new<T, A>(tags: T, attributes: A) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|tag| tag.as_ref().to_ascii_lowercase())
                .collect(),
            attributes: attributes
                .into_iter()
                .map(|attr| attr.as_ref().to_ascii_lowercase())
                .collect(),
            blocked_url_schemes: Vec::new(),
        }
    }

    /// The forum policy: `a abbr b br i img p` with `alt href src title`
    ///
    /// ```rust
    /// use forum_markup::policy::WhitelistPolicy;
    ///
    /// let policy = WhitelistPolicy::forum();
    /// assert!(policy.allows_tag("abbr"));
    /// assert!(!policy.allows_tag("div"));
    /// assert!(policy.allows_attribute("href"));
    /// assert!(!policy.allows_attribute("onclick"));
    /// ```
    pub fn forum() -> Self {
        Self::new(FORUM_TAGS, FORUM_ATTRIBUTES)
    }

    /// Also drop `href`/`src` attributes whose value uses one of `schemes`
    ///
    /// ```rust
    /// use forum_markup::policy::{DANGEROUS_URL_SCHEMES, WhitelistPolicy};
    ///
    /// let policy = WhitelistPolicy::forum().with_blocked_url_schemes(DANGEROUS_URL_SCHEMES);
    /// assert!(!policy.allows_attribute_value("href", " JavaScript:alert(1)"));
    /// assert!(policy.allows_attribute_value("href", "https://example.com"));
    /// assert!(policy.allows_attribute_value("title", "javascript: is fine as text"));
    /// ```
    pub fn with_blocked_url_schemes<S>(mut self, schemes: S) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        self.blocked_url_schemes = schemes
            .into_iter()
            .map(|scheme| scheme.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn allows_tag(&self, tag_name: &str) -> bool {
        self.tags.contains(&tag_name.to_ascii_lowercase())
    }

    pub fn allows_attribute(&self, attr_name: &str) -> bool {
        self.attributes.contains(&attr_name.to_ascii_lowercase())
    }

    /// Check an attribute name and, for URL attributes, its value
    pub fn allows_attribute_value(&self, attr_name: &str, value: &str) -> bool {
        if !self.allows_attribute(attr_name) {
            return false;
        }
        if self.blocked_url_schemes.is_empty()
            || !URL_ATTRIBUTES.contains(&attr_name.to_ascii_lowercase().as_str())
        {
            return true;
        }
        !self.is_blocked_url(value)
    }

    /// Check if a URL uses a blocked scheme
    ///
    /// Leading whitespace and control characters are ignored, as browsers
    /// ignore them when resolving the URL.
    pub fn is_blocked_url(&self, url: &str) -> bool {
        let url_lower: String = url
            .trim_start_matches(|c: char| c.is_whitespace() || c.is_control())
            .chars()
            .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
            .collect::<String>()
            .to_ascii_lowercase();
        self.blocked_url_schemes
            .iter()
            .any(|scheme| url_lower.starts_with(scheme.as_str()))
    }

    /// Allowed tag names, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Allowed attribute names, sorted
    pub fn attributes(&self) -> Vec<&str> {
        let mut attributes: Vec<&str> = self.attributes.iter().map(String::as_str).collect();
        attributes.sort_unstable();
        attributes
    }
}

impl Default for WhitelistPolicy {
    fn default() -> Self {
        Self::forum()
    }
}
