use crate::clipboard::Fragment;
use crate::model::Node;

/// One paragraph per line. A trailing newline yields a trailing empty
/// paragraph, so pasting `"a\n"` ends on a fresh line.
pub fn import_plain_text(text: &str) -> Fragment {
    if text.is_empty() {
        return Fragment::default();
    }
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    Fragment::normalized(text.split('\n').map(Node::paragraph_text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lines_become_paragraphs() {
        let fragment = import_plain_text("one\r\ntwo\n");
        assert_eq!(
            fragment.blocks,
            vec![
                Node::paragraph_text("one"),
                Node::paragraph_text("two"),
                Node::paragraph_text("")
            ]
        );
        assert!(import_plain_text("").is_empty());
    }
}
