//! Small JSON helpers: case-insensitive lookup, JSON pointers, snippets and property selectors.

use crate::error::CatalogError;
use serde_json::Value;

/// Look up `key` in an object, preferring an exact match over a case-insensitive one.
///
/// Returns the key as spelled in the document together with its value.
pub fn get_entry_ci<'a>(obj: &'a Value, key: &str) -> Option<(&'a str, &'a Value)> {
    let map = obj.as_object()?;
    if let Some((k, v)) = map.get_key_value(key) {
        return Some((k.as_str(), v));
    }
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(k, v)| (k.as_str(), v))
}

pub fn get_ci<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    get_entry_ci(obj, key).map(|(_, v)| v)
}

pub fn get_str_ci<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    get_ci(obj, key).and_then(Value::as_str)
}

/// Append one reference token to a JSON pointer, escaping `~` and `/`.
pub fn pointer_push(base: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    format!("{base}/{escaped}")
}

/// Render a value as a plain string: strings lose their quotes, everything else is compact JSON.
pub fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pretty-printed JSON truncated to `max_chars` characters.
pub fn snippet(value: &Value, max_chars: usize) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    match pretty.char_indices().nth(max_chars) {
        Some((idx, _)) => pretty[..idx].to_string(),
        None => pretty,
    }
}

/// One value found by a [`PropertySelector`], with its location in the document.
#[derive(Clone, Debug, PartialEq)]
pub struct Match<'a> {
    pub value: &'a Value,
    pub pointer: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
    Wildcard,
}

/// A parsed JSONPath subset: `$`, `.name`, `['name']`, `[n]`, `[*]` and `.*`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertySelector {
    raw: String,
    steps: Vec<Step>,
}

impl PropertySelector {
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidSelector {
            selector: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let mut rest = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let mut steps = Vec::new();
        // A bare selector such as `properties.x` reads as `$.properties.x`.
        let mut expect_name = !rest.is_empty() && !rest.starts_with('.') && !rest.starts_with('[');

        while !rest.is_empty() || expect_name {
            if expect_name || rest.starts_with('.') {
                if !expect_name {
                    rest = &rest[1..];
                }
                expect_name = false;
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                let name = &rest[..end];
                if name.is_empty() {
                    return Err(invalid("empty property name"));
                }
                steps.push(if name == "*" {
                    Step::Wildcard
                } else {
                    Step::Key(name.to_string())
                });
                rest = &rest[end..];
            } else if let Some(inner) = rest.strip_prefix('[') {
                let close = inner.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let body = inner[..close].trim();
                let step = if body == "*" {
                    Step::Wildcard
                } else if let Some(quoted) = strip_quotes(body) {
                    Step::Key(quoted.to_string())
                } else {
                    let idx = body
                        .parse::<usize>()
                        .map_err(|_| invalid("bracket must hold an index, '*' or a quoted name"))?;
                    Step::Index(idx)
                };
                steps.push(step);
                rest = &inner[close + 1..];
            } else {
                return Err(invalid("expected '.' or '['"));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Every value reachable from `root`; pointers are built on top of `base_pointer`.
    ///
    /// JSON `null` values are treated as absent.
    pub fn select<'a>(&self, root: &'a Value, base_pointer: &str) -> Vec<Match<'a>> {
        let mut current = vec![Match {
            value: root,
            pointer: base_pointer.to_string(),
        }];

        for step in &self.steps {
            let mut next = Vec::new();
            for m in &current {
                match step {
                    Step::Key(key) => {
                        if let Some((actual, v)) = get_entry_ci(m.value, key) {
                            next.push(Match {
                                value: v,
                                pointer: pointer_push(&m.pointer, actual),
                            });
                        }
                    }
                    Step::Index(idx) => {
                        if let Some(v) = m.value.as_array().and_then(|a| a.get(*idx)) {
                            next.push(Match {
                                value: v,
                                pointer: pointer_push(&m.pointer, &idx.to_string()),
                            });
                        }
                    }
                    Step::Wildcard => match m.value {
                        Value::Array(items) => {
                            for (i, v) in items.iter().enumerate() {
                                next.push(Match {
                                    value: v,
                                    pointer: pointer_push(&m.pointer, &i.to_string()),
                                });
                            }
                        }
                        Value::Object(map) => {
                            for (k, v) in map {
                                next.push(Match {
                                    value: v,
                                    pointer: pointer_push(&m.pointer, k),
                                });
                            }
                        }
                        _ => {}
                    },
                }
            }
            current = next;
            if current.is_empty() {
                break;
            }
        }

        current.retain(|m| !m.value.is_null());
        current
    }
}

fn strip_quotes(s: &str) -> Option<&str> {
    let quoted = |q: char| s.len() >= 2 && s.starts_with(q) && s.ends_with(q);
    if quoted('\'') || quoted('"') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn case_insensitive_lookup_prefers_exact_key() {
        let v = json!({ "Type": "a", "type": "b" });
        assert_eq!(get_str_ci(&v, "type"), Some("b"));
        assert_eq!(get_str_ci(&v, "TYPE"), Some("a"));
        assert_eq!(get_str_ci(&v, "missing"), None);
    }

    #[test]
    fn selector_walks_dotted_and_bracketed_paths() {
        let doc = json!({
            "properties": {
                "encryption": { "services": { "blob": { "enabled": true } } },
                "ipRules": [ { "value": "1.1.1.1" }, { "value": "0.0.0.0" } ]
            }
        });

        let sel = PropertySelector::parse("$.properties.encryption.services.blob.enabled").unwrap();
        let found = sel.select(&doc, "/resources/0");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, &json!(true));
        assert_eq!(
            found[0].pointer,
            "/resources/0/properties/encryption/services/blob/enabled"
        );

        let sel = PropertySelector::parse("$.properties.ipRules[*].value").unwrap();
        let found = sel.select(&doc, "");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].pointer, "/properties/ipRules/1/value");

        let sel = PropertySelector::parse("properties['ipRules'][0]").unwrap();
        assert_eq!(sel.select(&doc, "").len(), 1);
    }

    #[test]
    fn selector_matches_keys_case_insensitively() {
        let doc = json!({ "Properties": { "httpsOnly": true } });
        let sel = PropertySelector::parse("$.properties.HttpsOnly").unwrap();
        let found = sel.select(&doc, "");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pointer, "/Properties/httpsOnly");
    }

    #[test]
    fn selector_treats_null_as_absent() {
        let doc = json!({ "properties": { "x": null } });
        let sel = PropertySelector::parse("$.properties.x").unwrap();
        assert!(sel.select(&doc, "").is_empty());
    }

    #[test]
    fn selector_rejects_malformed_input() {
        assert!(PropertySelector::parse("$.properties[").is_err());
        assert!(PropertySelector::parse("$..x").is_err());
        assert!(PropertySelector::parse("$.a[x]").is_err());
    }

    #[test]
    fn pointer_segments_are_escaped() {
        assert_eq!(pointer_push("", "a/b~c"), "/a~1b~0c");
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let v = json!("ééééé");
        assert_eq!(snippet(&v, 3), "\"éé");
        assert_eq!(snippet(&json!(1), 10), "1");
    }
}
