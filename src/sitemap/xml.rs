//! Sitemap XML serialization.
//!
//! The `<urlset>` body is written by hand so the layout stays byte-for-byte
//! stable (one `<url>` block per entry, tab-indented children). Only the
//! text that can carry markup characters goes through `quick_xml` escaping.
//!
//! # Output
//!
//! ```xml
//! <urlset xmlns="https://www.sitemaps.org/schemas/sitemap/0.9">
//! <url>
//! 	<loc>https://example.com/uploads/2023/05/report.pdf</loc>
//! 	<lastmod>2023-05-01T00:00:00Z</lastmod>
//! </url>
//! </urlset>
//! ```

use quick_xml::escape::escape;

use crate::scanner::FileEntry;

/// Namespace of the `<urlset>` element. Companion XSL stylesheets match on it.
pub const SITEMAP_NAMESPACE: &str = "https://www.sitemaps.org/schemas/sitemap/0.9";

/// XML declaration emitted by [`render_document`].
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize entries, in the given order, into a `<urlset>` document.
#[must_use]
pub fn urlset(entries: &[FileEntry]) -> String {
    let mut output = format!("<urlset xmlns=\"{SITEMAP_NAMESPACE}\">\n");

    for entry in entries {
        output.push_str("<url>\n");
        output.push_str(&format!("\t<loc>{}</loc>\n", escape(entry.url.as_str())));
        output.push_str(&format!("\t<lastmod>{}</lastmod>\n", entry.lastmod()));
        output.push_str("</url>\n");
    }

    output.push_str("</urlset>");
    output
}

/// The processing instruction that attaches an XSL stylesheet.
#[must_use]
pub fn stylesheet_line(stylesheet_url: &str) -> String {
    format!(
        "<?xml-stylesheet type=\"text/xsl\" href=\"{}\"?>",
        escape(stylesheet_url)
    )
}

/// Wrap a sitemap body into a standalone document.
///
/// Adds the XML declaration and, when given, the stylesheet line.
#[must_use]
pub fn render_document(body: &str, stylesheet_url: Option<&str>) -> String {
    let mut output = String::with_capacity(body.len() + 128);
    output.push_str(XML_DECLARATION);
    output.push('\n');
    if let Some(url) = stylesheet_url {
        output.push_str(&stylesheet_line(url));
        output.push('\n');
    }
    output.push_str(body);
    output.push('\n');
    output
}
