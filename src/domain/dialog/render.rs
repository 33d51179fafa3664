//! Dialog template rendering and list joining.

use serde_json::{Map, Value as JsonValue};

/// Fills `{key}` placeholders from `data`; unknown keys render empty.
pub fn render_template(template: &str, data: &Map<String, JsonValue>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let key = rest[start + 1..start + len].trim();
        match data.get(key) {
            Some(JsonValue::String(s)) => out.push_str(s),
            Some(JsonValue::Null) | None => {}
            Some(other) => out.push_str(&other.to_string()),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `["a", "b", "c"]` with connector "or" -> `"a, b or c"`.
pub fn join_word_list(items: &[String], connector: &str, sep: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} {} {}", head.join(&format!("{} ", sep)), connector, last),
    }
}

/// `"MyFancySkill"` -> `"My Fancy Skill"`.
pub fn camel_case_split(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        let boundary = i > 0
            && c.is_uppercase()
            && (chars[i - 1].is_lowercase()
                || chars.get(i + 1).is_some_and(|next| next.is_lowercase())
                    && chars[i - 1].is_uppercase());
        if boundary {
            out.push(' ');
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn fills_placeholders() {
        let rendered = render_template(
            "Flying to {city} in {days} days",
            &data(json!({"city": "Lisbon", "days": 3})),
        );
        assert_eq!(rendered, "Flying to Lisbon in 3 days");
    }

    #[test]
    fn missing_keys_render_empty() {
        assert_eq!(render_template("Hello {name}!", &Map::new()), "Hello !");
    }

    #[test]
    fn joins_lists_with_connector() {
        let items: Vec<String> = vec!["tea".into(), "coffee".into(), "water".into()];
        assert_eq!(join_word_list(&items, "or", ","), "tea, coffee or water");
        assert_eq!(join_word_list(&items[..1], "or", ","), "tea");
        assert_eq!(join_word_list(&items[..2], "or", ","), "tea or coffee");
        assert_eq!(join_word_list(&[], "or", ","), "");
    }

    #[test]
    fn splits_camel_case() {
        assert_eq!(camel_case_split("MyFancySkill"), "My Fancy Skill");
        assert_eq!(camel_case_split("HTTPSkill"), "HTTP Skill");
        assert_eq!(camel_case_split("weather"), "weather");
    }
}
