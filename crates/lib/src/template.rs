//! Named-placeholder prompt templates: `{name}` is replaced, `{{` and `}}` are literal braces.
//!
//! A placeholder may carry the `!s` conversion and a string format spec
//! (`[[fill]align][0][width][.precision][s]`, e.g. `{last_query:>10}` or `{search_query:.40}`).
//! Other conversions and numeric specs are rejected.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}} in prompt template")]
    UnknownPlaceholder(String),
    #[error("unmatched '{0}' at byte {1} in prompt template")]
    UnmatchedBrace(char, usize),
    #[error("unsupported format {{{0}}} in prompt template")]
    UnsupportedFormat(String),
}

/// Fill `template` with the given named values.
pub fn fill(template: &str, values: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, n)| n == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, n) in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    if n == '{' {
                        return Err(TemplateError::UnmatchedBrace('{', i));
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(TemplateError::UnmatchedBrace('{', i));
                }
                let field = Field::parse(&name);
                let value = values
                    .iter()
                    .find(|(k, _)| *k == field.name)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(field.name.to_string()))?;
                if !matches!(field.conversion, None | Some("s")) {
                    return Err(TemplateError::UnsupportedFormat(name));
                }
                match apply_spec(value, field.spec) {
                    Some(formatted) => out.push_str(&formatted),
                    None => return Err(TemplateError::UnsupportedFormat(name)),
                }
            }
            '}' => {
                if chars.next_if(|&(_, n)| n == '}').is_none() {
                    return Err(TemplateError::UnmatchedBrace('}', i));
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// `name[!conversion][:spec]` inside one pair of braces.
struct Field<'a> {
    name: &'a str,
    conversion: Option<&'a str>,
    spec: &'a str,
}

impl<'a> Field<'a> {
    fn parse(field: &'a str) -> Self {
        let end = field.find(['!', ':']).unwrap_or(field.len());
        let (name, rest) = field.split_at(end);
        let (conversion, spec) = match rest.strip_prefix('!') {
            Some(r) => match r.split_once(':') {
                Some((c, s)) => (Some(c), s),
                None => (Some(r), ""),
            },
            None => (None, rest.strip_prefix(':').unwrap_or("")),
        };
        Self {
            name,
            conversion,
            spec,
        }
    }
}

fn take_number(chars: &[char], pos: &mut usize) -> Option<usize> {
    let start = *pos;
    while chars.get(*pos).is_some_and(char::is_ascii_digit) {
        *pos += 1;
    }
    if *pos == start {
        return None;
    }
    chars[start..*pos].iter().collect::<String>().parse().ok()
}

/// Pad and truncate a string value per a format spec. `None` when the spec isn't a string spec.
fn apply_spec(value: &str, spec: &str) -> Option<String> {
    if spec.is_empty() {
        return Some(value.to_string());
    }
    let chars: Vec<char> = spec.chars().collect();
    let is_align = |c: char| matches!(c, '<' | '>' | '^');
    let (mut fill, align, mut pos) = if chars.len() >= 2 && is_align(chars[1]) {
        (Some(chars[0]), chars[1], 2)
    } else if is_align(chars[0]) {
        (None, chars[0], 1)
    } else {
        (None, '<', 0)
    };
    if chars.get(pos) == Some(&'0') {
        fill = fill.or(Some('0'));
        pos += 1;
    }
    let width = take_number(&chars, &mut pos).unwrap_or(0);
    let precision = if chars.get(pos) == Some(&'.') {
        pos += 1;
        Some(take_number(&chars, &mut pos)?)
    } else {
        None
    };
    if chars.get(pos) == Some(&'s') {
        pos += 1;
    }
    if pos != chars.len() {
        return None;
    }

    let text: String = match precision {
        Some(p) => value.chars().take(p).collect(),
        None => value.to_string(),
    };
    let pad = width.saturating_sub(text.chars().count());
    let (left, right) = match align {
        '>' => (pad, 0),
        '^' => (pad / 2, pad - pad / 2),
        _ => (0, pad),
    };
    let fill = fill.unwrap_or(' ');
    let mut out = String::with_capacity(text.len() + pad);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(&text);
    out.extend(std::iter::repeat(fill).take(right));
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_named_placeholders() {
        let out = fill(
            "Previous: {last_query}\nQuestion: {search_query}\n{search_query}",
            &[("last_query", "Q:a A:b"), ("search_query", "hours")],
        )
        .unwrap();
        assert_eq!(out, "Previous: Q:a A:b\nQuestion: hours\nhours");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let out = fill(r#"{{"answer": "{x}"}}"#, &[("x", "yes")]).unwrap();
        assert_eq!(out, r#"{"answer": "yes"}"#);
    }

    #[test]
    fn values_are_not_reinterpreted() {
        let out = fill("{r}", &[("r", r#"{"title":"a"}"#)]).unwrap();
        assert_eq!(out, r#"{"title":"a"}"#);
    }

    #[test]
    fn unused_values_are_fine_and_no_placeholders_is_identity() {
        assert_eq!(fill("plain text", &[("x", "y")]).unwrap(), "plain text");
        assert_eq!(fill("", &[]).unwrap(), "");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        assert_eq!(
            fill("{missing}", &[("x", "y")]),
            Err(TemplateError::UnknownPlaceholder("missing".to_string()))
        );
    }

    #[test]
    fn unmatched_braces_are_errors() {
        assert_eq!(fill("a { b", &[]), Err(TemplateError::UnmatchedBrace('{', 2)));
        assert_eq!(fill("a } b", &[]), Err(TemplateError::UnmatchedBrace('}', 2)));
        assert!(fill("{a{b}", &[("a", "")]).is_err());
    }

    #[test]
    fn string_conversion_and_format_specs() {
        let values = [("q", "hours"), ("last", "Q:a")];
        assert_eq!(fill("{q!s}", &values).unwrap(), "hours");
        assert_eq!(fill("[{last:>6}]", &values).unwrap(), "[   Q:a]");
        assert_eq!(fill("[{last:6}]", &values).unwrap(), "[Q:a   ]");
        assert_eq!(fill("[{q:*^9}]", &values).unwrap(), "[**hours**]");
        assert_eq!(fill("[{last:^6}]", &values).unwrap(), "[ Q:a  ]");
        assert_eq!(fill("{q:.3}", &values).unwrap(), "hou");
        assert_eq!(fill("{q!s:>7.2s}", &values).unwrap(), "     ho");
        assert_eq!(fill("{last:05}", &values).unwrap(), "Q:a00");
        assert_eq!(fill("{q:2}", &values).unwrap(), "hours");
    }

    #[test]
    fn non_string_formats_are_rejected() {
        let values = [("q", "hours")];
        for template in ["{q!r}", "{q!a}", "{q:d}", "{q:,}", "{q:.}", "{q:>10x}"] {
            assert_eq!(
                fill(template, &values),
                Err(TemplateError::UnsupportedFormat(
                    template.trim_start_matches('{').trim_end_matches('}').to_string()
                )),
                "template: {}",
                template
            );
        }
        assert_eq!(
            fill("{missing!s}", &values),
            Err(TemplateError::UnknownPlaceholder("missing".to_string()))
        );
    }
}
