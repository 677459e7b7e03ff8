//! Idempotent unsubscribe footer composition.

use crate::{
    config::SenderConfig,
    render::{self, MergeValues},
};

/// The unsubscribe links available to one marketing recipient.
#[derive(Debug, Clone, Default)]
pub struct UnsubscribeLinks {
    /// Signed per-list unsubscribe URL. Empty for notification mail.
    pub unsubscribe_url: String,
    /// Signed global unsubscribe-all URL. Empty for notification mail.
    pub unsubscribe_all_url: String,
}

/// Appends or injects an unsubscribe footer into rendered content.
///
/// Idempotence contract: content that already contains the literal
/// unsubscribe URL is returned unchanged, so any re-render path cannot
/// produce a double footer.
#[derive(Debug, Clone, Default)]
pub struct FooterComposer {
    template: String,
    physical_address: String,
}

impl FooterComposer {
    /// Create a composer with an explicit footer template and postal
    /// address, either of which may be empty.
    pub fn new(template: impl Into<String>, physical_address: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            physical_address: physical_address.into(),
        }
    }

    /// Create a composer from the sender configuration.
    #[must_use]
    pub fn from_config(config: &SenderConfig) -> Self {
        Self::new(&config.unsubscribe_footer, &config.physical_address)
    }

    /// Inject the footer into HTML content.
    ///
    /// The footer is wrapped in a paragraph and inserted immediately before
    /// the last `</body>` close tag, or appended when no such tag exists.
    /// Empty content is returned unchanged.
    #[must_use]
    pub fn compose_html(&self, content: &str, links: &UnsubscribeLinks) -> String {
        if self.already_composed(content, links) {
            return content.to_owned();
        }

        let footer = format!("<p>{}</p>", self.footer(links));
        content.rfind("</body>").map_or_else(
            || format!("{content}{footer}"),
            |at| format!("{}{}{}", &content[..at], footer, &content[at..]),
        )
    }

    /// Append the footer to plain-text content after a blank-line separator.
    ///
    /// Empty content is returned unchanged.
    #[must_use]
    pub fn compose_text(&self, content: &str, links: &UnsubscribeLinks) -> String {
        if self.already_composed(content, links) {
            return content.to_owned();
        }

        format!("{content}\n\n{}", self.footer(links))
    }

    fn already_composed(&self, content: &str, links: &UnsubscribeLinks) -> bool {
        content.is_empty()
            || (!links.unsubscribe_url.is_empty() && content.contains(&links.unsubscribe_url))
    }

    fn footer(&self, links: &UnsubscribeLinks) -> String {
        if self.template.is_empty() {
            let mut footer = format!("Unsubscribe: {}", links.unsubscribe_url);
            if !links.unsubscribe_all_url.is_empty() {
                footer.push_str(" | Unsubscribe from all: ");
                footer.push_str(&links.unsubscribe_all_url);
            }
            if !self.physical_address.is_empty() {
                footer.push_str(" | ");
                footer.push_str(&self.physical_address);
            }
            return footer;
        }

        let mut values = MergeValues::default();
        values.insert(
            render::UNSUBSCRIBE_URL.to_owned(),
            links.unsubscribe_url.clone(),
        );
        values.insert(
            render::UNSUBSCRIBE_ALL_URL.to_owned(),
            links.unsubscribe_all_url.clone(),
        );
        values.insert(
            render::PHYSICAL_ADDRESS.to_owned(),
            self.physical_address.clone(),
        );
        render::render(&self.template, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> UnsubscribeLinks {
        UnsubscribeLinks {
            unsubscribe_url: "https://example.com/u/1".to_owned(),
            unsubscribe_all_url: "https://example.com/u/all".to_owned(),
        }
    }

    #[test]
    fn html_footer_lands_before_the_last_body_close() {
        let composer = FooterComposer::default();
        let out = composer.compose_html("<html><body>Hello</body></html>", &links());

        assert!(out.contains("Hello"));
        assert!(out.ends_with("</body></html>"));
        let footer_at = out.find("<p>Unsubscribe: https://example.com/u/1").unwrap_or(0);
        let body_close_at = out.rfind("</body>").unwrap_or(0);
        assert!(footer_at < body_close_at);
    }

    #[test]
    fn html_without_body_tag_gets_footer_appended() {
        let composer = FooterComposer::default();
        let out = composer.compose_html("Hello", &links());
        assert!(out.starts_with("Hello<p>Unsubscribe: "));
    }

    #[test]
    fn text_footer_follows_a_blank_line() {
        let composer = FooterComposer::default();
        let out = composer.compose_text("Hello", &links());
        assert!(out.starts_with("Hello\n\nUnsubscribe: https://example.com/u/1"));
        assert!(out.contains("Unsubscribe from all: https://example.com/u/all"));
    }

    #[test]
    fn composing_twice_is_the_same_as_once() {
        let composer = FooterComposer::default();
        let links = links();

        let html_once = composer.compose_html("<body>Hi</body>", &links);
        assert_eq!(composer.compose_html(&html_once, &links), html_once);

        let text_once = composer.compose_text("Hi", &links);
        assert_eq!(composer.compose_text(&text_once, &links), text_once);
    }

    #[test]
    fn empty_content_stays_empty() {
        let composer = FooterComposer::default();
        assert_eq!(composer.compose_html("", &links()), "");
        assert_eq!(composer.compose_text("", &links()), "");
    }

    #[test]
    fn configured_template_has_placeholders_substituted() {
        let composer = FooterComposer::new(
            "Opt out: {{unsubscribeUrl}} ({{physicalAddress}})",
            "1 Main St",
        );
        let out = composer.compose_text("Hi", &links());
        assert!(out.ends_with("Opt out: https://example.com/u/1 (1 Main St)"));
    }

    #[test]
    fn fallback_footer_includes_physical_address() {
        let composer = FooterComposer::new("", "1 Main St");
        let out = composer.compose_text("Hi", &links());
        assert!(out.ends_with(" | 1 Main St"));
    }
}
