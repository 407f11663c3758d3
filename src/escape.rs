/// Standard SQL string literal: wrap in single quotes, double embedded single quotes.
/// This is the quoting all supported engines accept for text literals.
#[must_use]
pub(crate) fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push('\'');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Drop the first and last character of a quoted literal, leaving the escaped payload.
#[must_use]
pub(crate) fn strip_outer_quotes(quoted: &str) -> String {
    let mut chars = quoted.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(strip_outer_quotes(&quote_literal("O'Brien")), "O''Brien");
    }

    #[test]
    fn empty_and_multibyte_values() {
        assert_eq!(strip_outer_quotes(&quote_literal("")), "");
        assert_eq!(strip_outer_quotes(&quote_literal("café ''")), "café ''''");
        assert_eq!(strip_outer_quotes("'"), "");
    }
}
