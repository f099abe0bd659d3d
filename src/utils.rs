use std::borrow::Cow;

/// Backslash escaping for values emitted inside a quoted-string
pub trait QuoteForDigest {
    fn quote_for_digest(&self) -> Cow<'_, str>;
}

impl<T: AsRef<str> + ?Sized> QuoteForDigest for T {
    fn quote_for_digest(&self) -> Cow<'_, str> {
        let s = self.as_ref();
        if s.contains(['\\', '"']) {
            Cow::Owned(s.replace('\\', "\\\\").replace('"', "\\\""))
        } else {
            Cow::Borrowed(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QuoteForDigest;

    #[test]
    fn test_quote() {
        assert_eq!("plain".quote_for_digest(), "plain");
        assert_eq!(r#"a "b" \c"#.quote_for_digest(), r#"a \"b\" \\c"#);
        assert_eq!(String::from("x\"").quote_for_digest(), "x\\\"");
    }
}
