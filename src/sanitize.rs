//! Text sanitization for anything user-supplied that leaves the process
//!
//! Chat webhooks render a markdown dialect and resolve mentions, so names
//! and free text are escaped before they are embedded in a report.

/// Characters the webhook renderer treats as markup
pub const MARKUP_CHARS: &[char] = &['\\', '*', '_', '~', '`', '|', '<', '>', ':', '@'];

/// Whole names that would ping every member of the channel
pub const RESERVED_NAMES: &[&str] = &["everyone", "here"];

/// Substrings the endpoint refuses inside a sender name (matched ignoring ASCII case)
pub const FORBIDDEN_SUBSTRINGS: &[&str] = &["discord", "clyde"];

/// Longest sender name the endpoint accepts, in characters
pub const MAX_DISPLAY_NAME_CHARS: usize = 80;

/// Prefix every markup character with a backslash
///
/// Single left-to-right pass: each original occurrence is escaped exactly
/// once and the inserted backslashes are not revisited. `None` is treated
/// as the empty string.
pub fn escape_markup<'a>(text: impl Into<Option<&'a str>>) -> String {
    let text = text.into().unwrap_or_default();
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if MARKUP_CHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Make a name acceptable as a webhook sender name
///
/// Reserved broadcast names are prefixed with an underscore and returned
/// as-is. Otherwise forbidden substrings are masked with asterisks and the
/// result is cut to [`MAX_DISPLAY_NAME_CHARS`].
pub fn normalize_display_name(name: &str) -> String {
    if RESERVED_NAMES.contains(&name) {
        return format!("_{}", name);
    }

    let mut masked = name.to_string();
    for pattern in FORBIDDEN_SUBSTRINGS {
        masked = mask_ignore_ascii_case(&masked, pattern);
    }

    if masked.chars().count() > MAX_DISPLAY_NAME_CHARS {
        masked = masked.chars().take(MAX_DISPLAY_NAME_CHARS).collect();
    }
    masked
}

/// Replace every ASCII-case-insensitive occurrence of `pattern` with `*`s
///
/// `pattern` must be ASCII. A match therefore only spans ASCII bytes, which
/// keeps every slice boundary on a char boundary.
fn mask_ignore_ascii_case(input: &str, pattern: &str) -> String {
    let needle = pattern.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        let bytes = rest.as_bytes();
        if bytes.len() >= needle.len() && bytes[..needle.len()].eq_ignore_ascii_case(needle) {
            out.extend(std::iter::repeat('*').take(needle.len()));
            rest = &rest[needle.len()..];
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup_each_char() {
        assert_eq!(escape_markup("a*b"), "a\\*b");
        assert_eq!(escape_markup("__init__"), "\\_\\_init\\_\\_");
        assert_eq!(escape_markup("<@123>"), "\\<\\@123\\>");
        assert_eq!(escape_markup("x|y~z`w:v"), "x\\|y\\~z\\`w\\:v");
        assert_eq!(escape_markup("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_escape_markup_plain_text_untouched() {
        assert_eq!(escape_markup("hello world 123"), "hello world 123");
        assert_eq!(escape_markup("héllo ✓"), "héllo ✓");
    }

    #[test]
    fn test_escape_markup_none_is_empty() {
        assert_eq!(escape_markup(None::<&str>), "");
        assert_eq!(escape_markup(""), "");
    }

    #[test]
    fn test_escape_markup_twice_escapes_backslashes() {
        let once = escape_markup("*");
        assert_eq!(once, "\\*");
        let twice = escape_markup(once.as_str());
        assert_eq!(twice, "\\\\\\*");
        assert_ne!(once, twice);
    }

    #[test]
    fn test_escape_markup_no_unescaped_sensitive_char() {
        let input = "**bold** _it_ ~~s~~ `c` |sp| <t:1> @everyone \\";
        let out = escape_markup(input);

        // Every sensitive char in the output is either an inserted escape
        // or directly preceded by one.
        let chars: Vec<char> = out.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            if MARKUP_CHARS.contains(&chars[i]) {
                assert_eq!(chars[i], '\\', "unescaped {:?} at {}", chars[i], i);
                assert!(i + 1 < chars.len());
                assert!(MARKUP_CHARS.contains(&chars[i + 1]));
                i += 2;
            } else {
                i += 1;
            }
        }
    }

    #[test]
    fn test_normalize_reserved_names() {
        assert_eq!(normalize_display_name("everyone"), "_everyone");
        assert_eq!(normalize_display_name("here"), "_here");
        // Case-sensitive whole-name check
        assert_eq!(normalize_display_name("Everyone"), "Everyone");
        assert_eq!(normalize_display_name("here!"), "here!");
    }

    #[test]
    fn test_normalize_masks_forbidden_substrings() {
        assert_eq!(normalize_display_name("discord"), "*******");
        assert_eq!(normalize_display_name("My DiScOrD server"), "My ******* server");
        assert_eq!(normalize_display_name("clydeclyde"), "**********");
        assert_eq!(normalize_display_name("Clyde & discord"), "***** & *******");
    }

    #[test]
    fn test_normalize_non_ascii_neighbours() {
        assert_eq!(normalize_display_name("ñdiscordñ"), "ñ*******ñ");
    }

    #[test]
    fn test_normalize_truncates_to_limit() {
        let long = "a".repeat(100);
        let out = normalize_display_name(&long);
        assert_eq!(out.chars().count(), 80);

        let short = "Friendly Server";
        assert_eq!(normalize_display_name(short), short);

        let wide = "é".repeat(90);
        assert_eq!(normalize_display_name(&wide).chars().count(), 80);
    }

    #[test]
    fn test_normalize_masks_before_truncation() {
        let name = format!("{}discord", "x".repeat(76));
        let out = normalize_display_name(&name);
        assert_eq!(out, format!("{}****", "x".repeat(76)));
    }
}
