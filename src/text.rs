use std::borrow::Cow;

/// Replace typographic quotation marks with their ASCII equivalents.
///
/// The tokenizer vocabulary only covers plain `'` and `"`, so smart quotes
/// pasted from word processors would otherwise drop out of the token
/// sequence. No other normalization (case, whitespace, punctuation) is
/// performed.
///
/// Returns `Cow::Borrowed` when the text contains no smart quotes.
pub fn normalize_quotes(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_smart_quote) {
        return Cow::Borrowed(text);
    }

    Cow::Owned(
        text.chars()
            .map(|ch| match ch {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201c}' | '\u{201d}' => '"',
                other => other,
            })
            .collect(),
    )
}

fn is_smart_quote(ch: char) -> bool {
    matches!(ch, '\u{2018}' | '\u{2019}' | '\u{201c}' | '\u{201d}')
}
