//! Pure match evaluation: keyword and link substring search over one
//! message's text, plus a second pass over the platform's URL-entity spans.

use lookout_types::MessageEntity;

/// What the filters found in one message. Empty vectors mean no match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub keywords: Vec<String>,
    /// May contain duplicates: the plain-substring rule and the URL-entity
    /// rule are allowed to capture the same link.
    pub links: Vec<String>,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        !self.keywords.is_empty() || !self.links.is_empty()
    }
}

/// Evaluate one message against the tenant's keyword and link lists.
///
/// `keywords` and `links` must already be normalized (lower-cased, trimmed,
/// empties dropped) — that happens once at config load. Keyword and plain
/// link hits report the configured term; URL-entity hits report the span text
/// from the message verbatim.
pub fn evaluate(
    text: &str,
    entities: &[MessageEntity],
    keywords: &[String],
    links: &[String],
) -> MatchOutcome {
    let lowered = text.to_lowercase();

    let mut outcome = MatchOutcome::default();

    for keyword in keywords {
        if lowered.contains(keyword.as_str()) {
            outcome.keywords.push(keyword.clone());
        }
    }

    for link in links {
        if lowered.contains(link.as_str()) {
            outcome.links.push(link.clone());
        }
    }

    for entity in entities {
        let MessageEntity::Url { offset, length } = entity else {
            continue;
        };
        // Spans that fall outside the text or split a UTF-8 boundary are
        // ignored rather than trusted.
        let Some(span) = text.get(*offset..offset + length) else {
            continue;
        };
        let span_lower = span.to_lowercase();
        for link in links {
            if span_lower.contains(link.as_str()) {
                outcome.links.push(span.to_string());
            }
        }
    }

    outcome
}
