use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub const MAX_CONTENT_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

/// Turns raw block text into a single line of tag-free display text.
///
/// Script and iframe blocks are removed together with their content,
/// `javascript:` fragments are dropped, every other tag is stripped while the
/// text around it is kept. Whitespace runs collapse to one space and the
/// result is capped at [`MAX_CONTENT_CHARS`] characters, ellipsis included.
pub fn sanitize(input: &str) -> String {
    let stripped = strip_markup(input);
    let collapsed = whitespace_re().replace_all(&stripped, " ");
    truncate(&collapsed).trim().to_string()
}

pub fn sanitize_value(input: &Value) -> String {
    match input {
        Value::String(text) => sanitize(text),
        _ => String::new(),
    }
}

fn whitespace_re() -> &'static Regex {
    static RE_WS: OnceLock<Regex> = OnceLock::new();
    RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn strip_markup(input: &str) -> String {
    let mut current = input.to_string();
    // Removing one fragment can splice a new one together, so strip until stable.
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    static RE_SCRIPT: OnceLock<Regex> = OnceLock::new();
    static RE_IFRAME: OnceLock<Regex> = OnceLock::new();
    static RE_JS_URI: OnceLock<Regex> = OnceLock::new();
    static RE_TAG: OnceLock<Regex> = OnceLock::new();
    static RE_OPEN_TAG: OnceLock<Regex> = OnceLock::new();

    let re_script =
        RE_SCRIPT.get_or_init(|| Regex::new(r"(?is)<script[^>]*>.*?</script[^>]*>").unwrap());
    let re_iframe =
        RE_IFRAME.get_or_init(|| Regex::new(r"(?is)<iframe[^>]*>.*?</iframe[^>]*>").unwrap());
    let re_js_uri = RE_JS_URI.get_or_init(|| Regex::new(r"(?i)javascript:[^;\s]*;?").unwrap());
    let re_tag = RE_TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    let re_open_tag = RE_OPEN_TAG.get_or_init(|| Regex::new(r"<[A-Za-z/!?][^>]*$").unwrap());

    let text = re_script.replace_all(text, "");
    let text = re_iframe.replace_all(&text, "");
    let text = re_js_uri.replace_all(&text, "");
    let text = re_tag.replace_all(&text, "");
    re_open_tag.replace_all(&text, "").into_owned()
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CONTENT_CHARS {
        return text.to_string();
    }
    let mut out: String = text
        .chars()
        .take(MAX_CONTENT_CHARS - ELLIPSIS.len())
        .collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_script_and_iframe_blocks() {
        assert_eq!(sanitize("<script>a</script>b<iframe>c</iframe>d"), "bd");
        assert_eq!(
            sanitize("<SCRIPT type=\"x\">\nalert(1)\n</Script>kept"),
            "kept"
        );
    }

    #[test]
    fn script_stripping_is_non_greedy() {
        assert_eq!(
            sanitize("<script>x</script>middle<script>y</script>end"),
            "middleend"
        );
    }

    #[test]
    fn keeps_text_between_tags() {
        let input = "\n  plain text\n  <div class=\"orca-table2\">\n    <div>cell one</div>\n  </div>\n  tail\n";
        assert_eq!(sanitize(input), "plain text cell one tail");
    }

    #[test]
    fn drops_javascript_uris() {
        assert_eq!(sanitize("click javascript:alert(1); here"), "click here");
        assert_eq!(sanitize("JavaScript:void(0) next"), "next");
    }

    #[test]
    fn spliced_fragments_do_not_survive() {
        assert_eq!(sanitize("<scr<script></script>ipt>x"), "x");
        assert_eq!(sanitize("java<b>script:alert(1)</b> ok"), "ok");
    }

    #[test]
    fn unterminated_tags_are_removed() {
        assert_eq!(sanitize("before <script src=x"), "before");
        assert_eq!(sanitize("i <3 rust"), "i <3 rust");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(sanitize("  a \t\t b\n\n c  "), "a b c");
    }

    #[test]
    fn truncates_long_text() {
        let cleaned = sanitize(&"a".repeat(300));
        assert_eq!(cleaned.chars().count(), 200);
        assert!(cleaned.ends_with("..."));
        assert!(cleaned.starts_with(&"a".repeat(197)));
    }

    #[test]
    fn truncation_counts_characters() {
        let cleaned = sanitize(&"节".repeat(250));
        assert_eq!(cleaned.chars().count(), 200);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn exactly_limit_is_untouched() {
        let input = "b".repeat(200);
        assert_eq!(sanitize(&input), input);
    }

    #[test]
    fn non_strings_become_empty() {
        assert_eq!(sanitize_value(&Value::Null), "");
        assert_eq!(sanitize_value(&json!(123)), "");
        assert_eq!(sanitize_value(&json!({"text": "x"})), "");
        assert_eq!(sanitize_value(&json!("")), "");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "<script>a</script>b<iframe>c</iframe>d",
            "  lots   of\n\nspace  ",
            "java<i>script:x</i>; y",
            "<<a>b>",
            "x < y and <3",
            "<p>unterminated <em",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "input: {sample:?}");
        }
        let long = format!("{} {}", "word ".repeat(80), "<b>bold</b>");
        let once = sanitize(&long);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn output_never_contains_tags() {
        let samples = [
            "<script>x",
            "<iframe src=a>",
            "<ScRiPt>x</sCrIpT><img src=x onerror=alert(1)>",
            "a<b>c</b>d",
        ];
        for sample in samples {
            let cleaned = sanitize(sample);
            let lower = cleaned.to_lowercase();
            assert!(!lower.contains("<script"), "{cleaned:?}");
            assert!(!lower.contains("<iframe"), "{cleaned:?}");
            assert!(!re_tag_shaped(&cleaned), "{cleaned:?}");
            assert!(cleaned.chars().count() <= MAX_CONTENT_CHARS);
        }
    }

    fn re_tag_shaped(text: &str) -> bool {
        Regex::new(r"<[^>]*>").unwrap().is_match(text)
    }
}
