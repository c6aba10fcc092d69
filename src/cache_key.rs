/// Derives the string identity a `Loader` uses to deduplicate and cache keys.
///
/// Two keys with equal cache keys are the same request as far as the loader is concerned: they
/// share one dispatch slot within a frame and one cache entry afterwards. Implementations must be
/// deterministic, and distinct logical keys must never produce the same string. Composite keys
/// should go through [`join_parts`] rather than formatting fields together by hand.
pub trait CacheKey {
    fn cache_key(&self) -> String;
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for i64 {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

/// Joins key components with `:`, escaping `\` and `:` inside each component so that the result is
/// unambiguous (`["a:b", "c"]` and `["a", "b:c"]` stay distinct).
pub fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        for c in part.as_ref().chars() {
            if c == '\\' || c == ':' {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn plain_parts_are_colon_joined() {
        assert_eq!(join_parts(["c1", "COMMENT"]), "c1:COMMENT");
        assert_eq!(join_parts(["u1", "t1", "t2"]), "u1:t1:t2");
    }

    #[test]
    fn separators_inside_parts_are_escaped() {
        assert_eq!(join_parts(["a:b", "c"]), "a\\:b:c");
        assert_ne!(join_parts(["a:b", "c"]), join_parts(["a", "b:c"]));
        assert_ne!(join_parts(["a\\", "b"]), join_parts(["a", "\\b"]));
    }

    proptest! {
        #[test]
        fn distinct_pairs_never_collide(
            a in ".{0,6}", b in ".{0,6}", c in ".{0,6}", d in ".{0,6}",
        ) {
            let left = join_parts([&a, &b]);
            let right = join_parts([&c, &d]);
            prop_assert_eq!(left == right, a == c && b == d);
        }
    }
}
