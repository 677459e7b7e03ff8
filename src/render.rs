//! Merge-field template rendering.
//!
//! Rendering is a pure `{{key}}` token substitution: no escaping, no loops,
//! no conditionals. Tokens without a matching value are left verbatim.

use ahash::AHashMap;

/// Merge key for the subscriber's first name (falls back to a configured
/// literal, "there" by default).
pub const FIRST_NAME: &str = "firstName";
/// Merge key for the subscriber's last name.
pub const LAST_NAME: &str = "lastName";
/// Merge key for the subscriber's email address.
pub const EMAIL: &str = "email";
/// Merge key for the associated event's display name.
pub const EVENT_NAME: &str = "eventName";
/// Merge key for the associated event's start time.
pub const EVENT_DATE: &str = "eventDate";
/// Merge key for the per-list unsubscribe link (marketing only).
pub const UNSUBSCRIBE_URL: &str = "unsubscribeUrl";
/// Merge key for the global unsubscribe-all link (marketing only).
pub const UNSUBSCRIBE_ALL_URL: &str = "unsubscribeAllUrl";
/// Merge key for the sender's postal address (footer templates).
pub const PHYSICAL_ADDRESS: &str = "physicalAddress";

/// Values substituted into a template, keyed by merge field name.
pub type MergeValues = AHashMap<String, String>;

/// Render a template by substituting `{{key}}` tokens from `values`.
///
/// Unknown tokens and unterminated `{{` sequences are copied through
/// unchanged.
#[must_use]
pub fn render(template: &str, values: &MergeValues) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let Some(start) = rest.find("{{") else {
            out.push_str(rest);
            break;
        };

        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            // Unterminated token; emit the tail verbatim.
            out.push_str(&rest[start..]);
            break;
        };

        let key = &after[..end];
        if let Some(value) = values.get(key) {
            out.push_str(value);
        } else {
            out.push_str("{{");
            out.push_str(key);
            out.push_str("}}");
        }

        rest = &after[end + 2..];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> MergeValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn substitutes_known_tokens() {
        let rendered = render(
            "Hi {{firstName}}, see you at {{eventName}}!",
            &values(&[("firstName", "Jane"), ("eventName", "RustConf")]),
        );
        assert_eq!(rendered, "Hi Jane, see you at RustConf!");
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let rendered = render("Hi {{firstName}} {{mystery}}", &values(&[("firstName", "Jo")]));
        assert_eq!(rendered, "Hi Jo {{mystery}}");
    }

    #[test]
    fn empty_values_substitute_as_empty() {
        let rendered = render("[{{unsubscribeUrl}}]", &values(&[("unsubscribeUrl", "")]));
        assert_eq!(rendered, "[]");
    }

    #[test]
    fn unterminated_token_is_copied_through() {
        let rendered = render("broken {{firstName", &values(&[("firstName", "Jo")]));
        assert_eq!(rendered, "broken {{firstName");
    }

    #[test]
    fn no_tokens_is_identity() {
        let rendered = render("plain text, nothing to do", &MergeValues::default());
        assert_eq!(rendered, "plain text, nothing to do");
    }

    #[test]
    fn value_containing_a_token_is_not_rerendered() {
        let rendered = render(
            "{{firstName}}",
            &values(&[("firstName", "{{lastName}}"), ("lastName", "nope")]),
        );
        assert_eq!(rendered, "{{lastName}}");
    }
}
