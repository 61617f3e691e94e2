//! Property-based tests for the renderer
//!
//! - Raw `<script>` in model output never reaches the HTML as a tag
//! - Script-capable link and image schemes never survive into attributes
//! - Fence languages can't break out of the code block's class attribute

use super::MarkdownRenderer;
use proptest::prelude::*;
use std::sync::OnceLock;

fn renderer() -> &'static MarkdownRenderer {
    static RENDERER: OnceLock<MarkdownRenderer> = OnceLock::new();
    RENDERER.get_or_init(MarkdownRenderer::new)
}

fn arb_prose() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 *_#>`<&\"'=/()\\[\\]\n-]{0,60}"
}

fn arb_script_payload() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("<script>alert(1)</script>".to_string()),
        Just("<SCRIPT src=\"https://evil.example/x.js\"></SCRIPT>".to_string()),
        Just("<scr<script>ipt>alert(1)</script>".to_string()),
        Just("`<script>` and <script\n>alert(1)</script>".to_string()),
        "<[sS][cC][rR][iI][pP][tT][ a-z=\"]{0,10}>",
    ]
}

fn arb_unsafe_scheme() -> impl Strategy<Value = String> {
    prop_oneof![
        "[jJ][aA][vV][aA][sS][cC][rR][iI][pP][tT]:",
        "[vV][bB][sS][cC][rR][iI][pP][tT]:",
        "[dD][aA][tT][aA]:text/html,",
    ]
}

proptest! {
    #[test]
    fn script_tags_are_never_emitted(
        before in arb_prose(),
        payload in arb_script_payload(),
        after in arb_prose(),
    ) {
        let html = renderer().render(&format!("{before}{payload}{after}"));
        prop_assert!(!html.to_ascii_lowercase().contains("<script"), "{}", html);
    }

    #[test]
    fn unsafe_link_schemes_are_neutralized(
        label in "[a-z]{1,10}",
        scheme in arb_unsafe_scheme(),
        image in any::<bool>(),
    ) {
        let bang = if image { "!" } else { "" };
        let html = renderer().render(&format!("{bang}[{label}]({scheme}alert(1))"));
        let lower = html.to_ascii_lowercase();
        for attr in ["href=\"", "src=\""] {
            for bad in ["javascript:", "vbscript:", "data:text"] {
                prop_assert!(!lower.contains(&format!("{attr}{bad}")), "{}", html);
            }
        }
        prop_assert!(lower.contains("=\"#\""), "{}", html);
    }

    #[test]
    fn emphasis_is_rendered(word in "[a-z]{1,12}") {
        let html = renderer().render(&format!("**{word}**"));
        prop_assert_eq!(html, format!("<p><strong>{word}</strong></p>\n"));
    }

    #[test]
    fn fence_language_stays_inside_class(
        language in "[a-zA-Z0-9\"'<> =+#]{0,12}",
        code in "[a-z<>&; ]{0,40}",
    ) {
        let html = renderer().render(&format!("```{language}\n{code}\n```\n"));
        let class = html
            .strip_prefix("<pre><code class=\"language-")
            .and_then(|rest| rest.split('"').next());
        prop_assert!(class.is_some(), "{}", html);
        let class = class.unwrap_or_default();
        prop_assert!(!class.is_empty());
        prop_assert!(
            class
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-' | '_' | '.')),
            "{}",
            html
        );
        prop_assert!(!html.contains("<>"));
    }
}
