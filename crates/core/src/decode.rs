//! Best-effort decoding of raw sitemap path segments into slugs.
//!
//! Sitemap `<loc>` values arrive XML-escaped and percent-encoded, and a small
//! share of them carry byte sequences that are not valid UTF-8 once decoded.
//! Decoding never fails: invalid bytes are dropped, and a segment made only
//! of invalid bytes decodes to an empty slug that sanitization then rejects.

use percent_encoding::percent_decode_str;

/// Entities emitted by the sitemap generator. No entity is a prefix of another.
const HTML_ENTITIES: [(&str, char); 5] =
    [("&quot;", '"'), ("&apos;", '\''), ("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')];

/// Decoded slug plus its human-readable title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSlug {
    pub slug: String,
    pub title: String,
}

/// Decode a raw path segment: HTML entities first, then percent-encoding,
/// then drop any bytes that do not form valid UTF-8.
#[must_use]
pub fn decode_slug(raw: &str) -> DecodedSlug {
    let slug = percent_decode_scrubbed(&decode_html_entities(raw));
    if slug.is_empty() && !raw.is_empty() {
        tracing::debug!(raw, "no valid UTF-8 left after decoding");
    }
    let title = title_from_slug(&slug);
    DecodedSlug { slug, title }
}

/// Title shown for a slug: underscores become spaces.
#[must_use]
pub fn title_from_slug(slug: &str) -> String {
    slug.replace('_', " ")
}

/// Single left-to-right pass, so `&amp;lt;` decodes to `&lt;` and not `<`.
fn decode_html_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match HTML_ENTITIES.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &tail[entity.len()..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

fn percent_decode_scrubbed(input: &str) -> String {
    let bytes: Vec<u8> = percent_decode_str(input).collect();
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_encoded_ampersand() {
        let decoded = decode_slug("at%26t");
        assert_eq!(decoded.slug, "at&t");
        assert_eq!(decoded.title, "at&t");
    }

    #[test]
    fn underscores_become_spaces_in_title() {
        let decoded = decode_slug("Multiple_Word_Topic");
        assert_eq!(decoded.slug, "Multiple_Word_Topic");
        assert_eq!(decoded.title, "Multiple Word Topic");
    }

    #[test]
    fn html_entities_decoded_before_percent() {
        assert_eq!(decode_slug("AT&amp;T").slug, "AT&T");
        assert_eq!(decode_slug("&quot;Quoted&quot;_Title").slug, "\"Quoted\"_Title");
        assert_eq!(decode_slug("Rock_&apos;n&apos;_Roll").slug, "Rock_'n'_Roll");
        assert_eq!(decode_slug("a&lt;b&gt;c").slug, "a<b>c");
        // entity-encoded percent sign is still percent-decoded afterwards
        assert_eq!(decode_slug("100&amp;%25").slug, "100&%");
    }

    #[test]
    fn entities_are_not_decoded_twice() {
        assert_eq!(decode_slug("&amp;lt;").slug, "&lt;");
        assert_eq!(decode_slug("&amp;amp;").slug, "&amp;");
    }

    #[test]
    fn unknown_entities_and_bare_ampersands_pass_through() {
        assert_eq!(decode_slug("Tom_&_Jerry").slug, "Tom_&_Jerry");
        assert_eq!(decode_slug("&nbsp;x").slug, "&nbsp;x");
        assert_eq!(decode_slug("trailing&").slug, "trailing&");
    }

    #[test]
    fn multibyte_percent_sequences() {
        assert_eq!(decode_slug("Caf%C3%A9").slug, "Café");
        assert_eq!(decode_slug("%E6%9D%B1%E4%BA%AC").title, "東京");
    }

    #[test]
    fn invalid_utf8_bytes_are_dropped() {
        assert_eq!(decode_slug("Bad%FFByte").slug, "BadByte");
        assert_eq!(decode_slug("Caf%C3").slug, "Caf");
    }

    #[test]
    fn malformed_percent_sequences_are_kept_literally() {
        assert_eq!(decode_slug("100%").slug, "100%");
        assert_eq!(decode_slug("50%_off%zz").slug, "50%_off%zz");
    }

    #[test]
    fn only_invalid_bytes_decode_to_empty() {
        let decoded = decode_slug("%FF%FE");
        assert_eq!(decoded.slug, "");
        assert_eq!(decoded.title, "");
        assert_eq!(decode_slug("").slug, "");
    }
}
