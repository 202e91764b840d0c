//! Escaping utilities for generated SOAP and metadata documents.
//!
//! All user-provided text placed inside XML element content MUST go through
//! [`xml::escape`]. Unescaped input can break the document or inject
//! additional elements into a deploy package.
//!
//! ```rust
//! use busbar_sf_client::security::xml;
//!
//! // CORRECT
//! let label = xml::escape("Orders & Returns");
//! let fragment = format!("<label>{}</label>", label);
//!
//! // WRONG - NEVER do this with user input
//! // let fragment = format!("<label>{}</label>", user_label);
//! ```

/// XML escaping utilities for SOAP/Metadata API.
pub mod xml {
    /// Escape a string for safe inclusion in XML content.
    ///
    /// This escapes the five predefined XML entities.
    ///
    /// # Example
    ///
    /// ```rust
    /// use busbar_sf_client::security::xml;
    ///
    /// let safe = xml::escape("Hello <World> & 'Friends'");
    /// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
    /// ```
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Check that a name is usable as a metadata file name.
    ///
    /// Rejects empty names and anything that could escape the package
    /// directory.
    #[must_use]
    pub fn is_safe_file_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0'])
            && !name.contains("##")
    }
}
