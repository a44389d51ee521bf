//! Client-side redirect directive.

use std::fmt;

/// A top-frame redirect performed by the browser.
///
/// Sending this response ends the request: nothing else should be written after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRedirect {
    url: String,
}

impl ClientRedirect {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Script tag that moves the top frame to the target URL.
    pub fn script(&self) -> String {
        // serde_json gives a quoted, escaped JS string literal; `</` must not close the tag
        let literal = serde_json::to_string(&self.url)
            .unwrap_or_else(|_| "\"\"".to_string())
            .replace("</", "<\\/");
        format!(
            "<script type=\"text/javascript\">top.location.href = {};</script>",
            literal
        )
    }
}

impl fmt::Display for ClientRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.script())
    }
}
