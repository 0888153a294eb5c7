use proptest::prelude::*;
use review_insight::text::clean;

#[test]
fn html_markup_is_stripped() {
    assert_eq!(
        clean("<p>Works as <b>described</b>&nbsp;&amp; arrived early</p>"),
        "Works as described arrived early"
    );
}

#[test]
fn emoji_and_symbols_become_spaces() {
    assert_eq!(clean("Love it \u{2764} 10/10 #winning"), "Love it 10 10 winning");
}

proptest! {
    #[test]
    fn clean_is_idempotent(input in ".*") {
        let once = clean(&input);
        prop_assert_eq!(clean(&once), once);
    }

    #[test]
    fn clean_never_leaves_edge_whitespace(input in ".*") {
        let cleaned = clean(&input);
        prop_assert_eq!(cleaned.trim(), &cleaned);
    }
}
