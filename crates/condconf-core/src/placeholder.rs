//! `${NAME}` and `${NAME:-fallback}` substitution.

/// Outcome of substituting one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub value: String,
    /// Placeholder names that had neither a value nor a fallback.
    pub undefined: Vec<String>,
}

/// Replace placeholders in `text` using `lookup`.
///
/// Fallbacks may contain placeholders of their own. A placeholder with no
/// value and no fallback becomes `NAME_IS_UNDEFINED`. An unterminated `${`
/// and an empty `${}` are kept as written.
pub fn substitute<F>(text: &str, lookup: F) -> Substitution
where
    F: Fn(&str) -> Option<String>,
{
    let mut undefined = Vec::new();
    let value = substitute_into(text, &lookup, &mut undefined);
    Substitution { value, undefined }
}

fn substitute_into<F>(text: &str, lookup: &F, undefined: &mut Vec<String>) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let body_start = start + 2;
        let Some(body_len) = closing_brace(&rest[body_start..]) else {
            out.push_str(&rest[start..]);
            return out;
        };
        let body = &rest[body_start..body_start + body_len];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name.trim(), Some(fallback)),
            None => (body.trim(), None),
        };
        if name.is_empty() {
            out.push_str(&rest[start..body_start + body_len + 1]);
        } else if let Some(value) = lookup(name) {
            out.push_str(&value);
        } else if let Some(fallback) = fallback {
            out.push_str(&substitute_into(fallback, lookup, undefined));
        } else {
            out.push_str(name);
            out.push_str("_IS_UNDEFINED");
            undefined.push(name.to_string());
        }
        rest = &rest[body_start + body_len + 1..];
    }
    out.push_str(rest);
    out
}

/// Length of the placeholder body, honoring nested `${...}`.
fn closing_brace(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'$' if bytes.get(idx + 1) == Some(&b'{') => {
                depth += 1;
                idx += 2;
                continue;
            }
            b'}' if depth == 0 => return Some(idx),
            b'}' => depth -= 1,
            _ => {}
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HOST" => Some("localhost".to_string()),
            "PORT" => Some("8080".to_string()),
            _ => None,
        }
    }

    #[test]
    fn replaces_known_names() {
        let result = substitute("http://${HOST}:${ PORT }/", lookup);
        assert_eq!(result.value, "http://localhost:8080/");
        assert!(result.undefined.is_empty());
    }

    #[test]
    fn uses_nested_fallbacks() {
        assert_eq!(substitute("${LEVEL:-INFO}", lookup).value, "INFO");
        assert_eq!(
            substitute("${MISSING:-${HOST}-${OTHER:-x}}", lookup).value,
            "localhost-x"
        );
        assert_eq!(substitute("${HOST:-ignored}", lookup).value, "localhost");
        assert_eq!(substitute("${EMPTY:-}", lookup).value, "");
    }

    #[test]
    fn marks_undefined_names() {
        let result = substitute("level=${LEVEL}", lookup);
        assert_eq!(result.value, "level=LEVEL_IS_UNDEFINED");
        assert_eq!(result.undefined, vec!["LEVEL".to_string()]);
    }

    #[test]
    fn keeps_unterminated_and_empty_placeholders() {
        assert_eq!(substitute("a ${HOST", lookup).value, "a ${HOST");
        assert_eq!(substitute("${} and $HOST", lookup).value, "${} and $HOST");
        assert_eq!(substitute("${HOST}${", lookup).value, "localhost${");
    }
}
