//! `${…}` placeholder substitution for strings that embed properties,
//! such as repository URLs.

/// Replace every `${key}` occurrence in `input` using `lookup`, leaving
/// unresolvable keys as literals. Substituted values may themselves contain
/// placeholders; rewriting repeats until the string stabilizes, bounded so
/// self-referential properties terminate.
pub fn replace_placeholders<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = input.to_string();
    for _ in 0..20 {
        let mut out = String::with_capacity(result.len());
        let mut rest = result.as_str();
        let mut changed = false;

        while let Some(start) = rest.find("${") {
            let Some(end) = rest[start..].find('}') else {
                break;
            };
            out.push_str(&rest[..start]);
            let key = &rest[start + 2..start + end];
            match lookup(key) {
                Some(value) => {
                    out.push_str(&value);
                    changed = true;
                }
                None => out.push_str(&rest[start..start + end + 1]),
            }
            rest = &rest[start + end + 1..];
        }
        out.push_str(rest);

        if !changed {
            return out;
        }
        result = out;
    }
    result
}
