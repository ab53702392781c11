//! Resolution of template expressions: `[parameters('x')]`, `[variables('x')]`, `[concat(..)]`,
//! `[substring(..)]`, deployment-context lookups and, for dependency references only,
//! `[resourceId(..)]`.
//!
//! Anything else is left opaque. The resolver only reads the template and the external
//! parameter document, so identical inputs resolve identically within one run.

use crate::json::{get_ci, plain_string};
use serde_json::{Value, json};
use thiserror::Error;

/// Maximum nesting of function calls inside one expression (outer call included).
pub const MAX_CALL_DEPTH: usize = 3;

/// Maximum chain of parameter defaults / variables that are themselves expressions.
pub const MAX_INDIRECTION: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("malformed expression: {0}")]
    Malformed(String),

    #[error("parameter '{0}' has no external value and no default value")]
    MissingParameter(String),

    #[error("variable '{0}' is not declared")]
    MissingVariable(String),

    #[error("member '{0}' does not exist on the resolved value")]
    MissingMember(String),

    #[error("substring start {start} length {length} is out of range for a value of length {len}")]
    SubstringOutOfRange { start: i64, length: i64, len: usize },

    #[error("function '{0}' is not supported here")]
    UnsupportedFunction(String),

    #[error("expression nesting is deeper than supported")]
    TooDeep,

    #[error("lookup key resolved to a non-string value: {0}")]
    NonStringKey(String),
}

/// Deployment-environment values substituted for `resourceGroup()` and `subscription()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentContext {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub resource_group_location: String,
}

impl Default for DeploymentContext {
    fn default() -> Self {
        Self {
            subscription_id: "00000000-0000-0000-0000-000000000000".to_string(),
            resource_group_name: "DefaultRG".to_string(),
            resource_group_location: "US East".to_string(),
        }
    }
}

impl DeploymentContext {
    fn subscription_path(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }

    fn resource_group_path(&self) -> String {
        format!(
            "{}/resourceGroups/{}",
            self.subscription_path(),
            self.resource_group_name
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    /// Not an expression. Escaped `[[` literals come back with the first `[` removed.
    Literal(Value),
    Value(Value),
    /// An expression whose outer function is not understood; carries the raw text.
    Opaque(String),
}

impl Resolved {
    pub fn into_value(self) -> Value {
        match self {
            Resolved::Literal(v) | Resolved::Value(v) => v,
            Resolved::Opaque(raw) => Value::String(raw),
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Resolved::Opaque(_))
    }
}

/// A dependency reference turned into a `type/name` path (or a bare name).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyPath(String);

impl DependencyPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn trailing_name(&self) -> &str {
        trailing_segment(&self.0)
    }

    /// Type prefix match plus case-insensitive comparison of the trailing name segment.
    ///
    /// A bare name (no `/`) only compares names.
    pub fn matches(&self, resource_type: &str, resource_name: &str) -> bool {
        let name_ok = self
            .trailing_name()
            .eq_ignore_ascii_case(trailing_segment(resource_name));
        if !self.0.contains('/') {
            return name_ok;
        }
        name_ok
            && !resource_type.is_empty()
            && self
                .0
                .to_ascii_lowercase()
                .starts_with(&resource_type.to_ascii_lowercase())
    }
}

pub fn trailing_segment(s: &str) -> &str {
    s.trim_end_matches('/').rsplit('/').next().unwrap_or(s)
}

pub struct ExpressionResolver<'a> {
    template: &'a Value,
    parameters: Option<&'a Value>,
    deployment: &'a DeploymentContext,
}

impl<'a> ExpressionResolver<'a> {
    pub fn new(
        template: &'a Value,
        parameters: Option<&'a Value>,
        deployment: &'a DeploymentContext,
    ) -> Self {
        Self {
            template,
            parameters,
            deployment,
        }
    }

    pub fn is_expression(raw: &str) -> bool {
        let t = raw.trim();
        t.len() >= 2 && t.starts_with('[') && t.ends_with(']') && !t.starts_with("[[")
    }

    /// Resolve a property value; non-string values are literals.
    pub fn resolve_value(&self, raw: &Value) -> Result<Resolved, ResolveError> {
        match raw {
            Value::String(s) => self.resolve_str(s),
            other => Ok(Resolved::Literal(other.clone())),
        }
    }

    pub fn resolve_str(&self, raw: &str) -> Result<Resolved, ResolveError> {
        self.resolve_at(raw, 0)
    }

    fn resolve_at(&self, raw: &str, indirection: usize) -> Result<Resolved, ResolveError> {
        if !Self::is_expression(raw) {
            let trimmed = raw.trim_start();
            let literal = match trimmed.strip_prefix("[[") {
                Some(rest) if trimmed.ends_with(']') => format!("[{rest}"),
                _ => raw.to_string(),
            };
            return Ok(Resolved::Literal(Value::String(literal)));
        }

        let call = Call::parse(expression_body(raw))?;
        if !call.is_value_function() {
            return Ok(Resolved::Opaque(raw.to_string()));
        }
        self.eval_call(&call, 0, indirection).map(Resolved::Value)
    }

    /// The parameter name when `raw` is exactly a `[parameters(..)]` reference.
    pub fn parameter_reference(&self, raw: &str) -> Option<Result<String, ResolveError>> {
        if !Self::is_expression(raw) {
            return None;
        }
        let call = match Call::parse(expression_body(raw)) {
            Ok(call) => call,
            Err(e) => return Some(Err(e)),
        };
        if !call.name.eq_ignore_ascii_case("parameters") || !call.members.is_empty() {
            return None;
        }
        Some(self.key_arg(&call, 0, 0))
    }

    /// Declared `type` of a template parameter.
    pub fn parameter_type(&self, key: &str) -> Option<&'a str> {
        get_ci(self.template, "parameters")
            .and_then(|ps| get_ci(ps, key))
            .and_then(|p| get_ci(p, "type"))
            .and_then(Value::as_str)
    }

    /// Turn a `dependsOn` entry into a canonical path.
    pub fn resolve_dependency(&self, reference: &str) -> Result<DependencyPath, ResolveError> {
        let path = if Self::is_expression(reference) {
            let call = Call::parse(expression_body(reference))?;
            if call.name.eq_ignore_ascii_case("resourceId") {
                self.resource_id_path(&call)?
            } else if call.is_value_function() {
                plain_string(&self.eval_call(&call, 0, 0)?)
            } else {
                return Err(ResolveError::UnsupportedFunction(call.name));
            }
        } else {
            reference.trim().to_string()
        };

        if path.is_empty() {
            return Err(ResolveError::Malformed(reference.to_string()));
        }
        Ok(DependencyPath(path))
    }

    fn resource_id_path(&self, call: &Call) -> Result<String, ResolveError> {
        let segments = call
            .args
            .iter()
            .map(|arg| self.segment(arg, 1, 0))
            .collect::<Result<Vec<_>, _>>()?;
        // Leading subscription / resource-group arguments carry no '/'; the type is the first that does.
        let type_at = segments
            .iter()
            .position(|s| s.contains('/'))
            .ok_or_else(|| ResolveError::Malformed(format!("resourceId without a type: {call}")))?;
        if type_at + 1 >= segments.len() {
            return Err(ResolveError::Malformed(format!(
                "resourceId without a name: {call}"
            )));
        }
        Ok(segments[type_at..].join("/"))
    }

    fn eval_call(
        &self,
        call: &Call,
        depth: usize,
        indirection: usize,
    ) -> Result<Value, ResolveError> {
        if depth >= MAX_CALL_DEPTH {
            return Err(ResolveError::TooDeep);
        }

        let value = match call.name.to_ascii_lowercase().as_str() {
            "parameters" => {
                let key = self.key_arg(call, depth, indirection)?;
                self.parameter(&key, indirection)?
            }
            "variables" => {
                let key = self.key_arg(call, depth, indirection)?;
                self.variable(&key, indirection)?
            }
            "concat" => {
                let mut out = String::new();
                for arg in &call.args {
                    out.push_str(&self.segment(arg, depth + 1, indirection)?);
                }
                Value::String(out)
            }
            "substring" => self.substring(call, depth, indirection)?,
            "resourcegroup" => json!({
                "id": self.deployment.resource_group_path(),
                "name": self.deployment.resource_group_name,
                "location": self.deployment.resource_group_location,
            }),
            "subscription" => json!({
                "id": self.deployment.subscription_path(),
                "subscriptionId": self.deployment.subscription_id,
            }),
            _ => return Err(ResolveError::UnsupportedFunction(call.name.clone())),
        };

        navigate(value, &call.members)
    }

    fn substring(
        &self,
        call: &Call,
        depth: usize,
        indirection: usize,
    ) -> Result<Value, ResolveError> {
        if call.args.len() < 2 || call.args.len() > 3 {
            return Err(ResolveError::Malformed(format!(
                "substring expects 2 or 3 arguments: {call}"
            )));
        }
        let text: Vec<char> = self
            .segment(&call.args[0], depth + 1, indirection)?
            .chars()
            .collect();
        let start = self.int_arg(&call.args[1], depth, indirection)?;
        let length = match call.args.get(2) {
            Some(arg) => self.int_arg(arg, depth, indirection)?,
            None => text.len() as i64 - start,
        };

        let out_of_range = ResolveError::SubstringOutOfRange {
            start,
            length,
            len: text.len(),
        };
        if start < 0 || length < 0 {
            return Err(out_of_range);
        }
        let (start, length) = (start as usize, length as usize);
        match start.checked_add(length) {
            Some(end) if end <= text.len() => {
                Ok(Value::String(text[start..end].iter().collect()))
            }
            _ => Err(out_of_range),
        }
    }

    fn int_arg(&self, arg: &str, depth: usize, indirection: usize) -> Result<i64, ResolveError> {
        let s = self.segment(arg, depth + 1, indirection)?;
        s.trim()
            .parse::<i64>()
            .map_err(|_| ResolveError::Malformed(format!("expected an integer, got '{s}'")))
    }

    fn key_arg(&self, call: &Call, depth: usize, indirection: usize) -> Result<String, ResolveError> {
        match call.args.as_slice() {
            [arg] if looks_like_call(arg.trim()) => {
                let inner = Call::parse(arg)?;
                match self.eval_call(&inner, depth + 1, indirection)? {
                    Value::String(key) => Ok(key),
                    other => Err(ResolveError::NonStringKey(other.to_string())),
                }
            }
            [arg] => self.segment(arg, depth + 1, indirection),
            _ => Err(ResolveError::Malformed(format!(
                "{} expects exactly one argument",
                call.name
            ))),
        }
    }

    /// Resolve one function argument to text: quoted literal, nested call, or bare literal.
    fn segment(&self, arg: &str, depth: usize, indirection: usize) -> Result<String, ResolveError> {
        let arg = arg.trim();
        if let Some(quoted) = unquote(arg) {
            return Ok(quoted);
        }
        if looks_like_call(arg) {
            let call = Call::parse(arg)?;
            return self
                .eval_call(&call, depth, indirection)
                .map(|v| plain_string(&v));
        }
        Ok(arg.to_string())
    }

    fn parameter(&self, key: &str, indirection: usize) -> Result<Value, ResolveError> {
        if let Some(v) = self.external(key, "parameters") {
            return Ok(v.clone());
        }
        match get_ci(self.template, "parameters")
            .and_then(|ps| get_ci(ps, key))
            .and_then(|p| get_ci(p, "defaultValue"))
        {
            Some(v) => self.indirect(v, indirection),
            None => Err(ResolveError::MissingParameter(key.to_string())),
        }
    }

    fn variable(&self, key: &str, indirection: usize) -> Result<Value, ResolveError> {
        if let Some(v) = self.external(key, "variables") {
            return Ok(v.clone());
        }
        match get_ci(self.template, "variables").and_then(|vs| get_ci(vs, key)) {
            Some(v) => self.indirect(v, indirection),
            None => Err(ResolveError::MissingVariable(key.to_string())),
        }
    }

    /// `{"<section>": {"<key>": {"value": ..}}}` in the external parameter document.
    fn external(&self, key: &str, section: &str) -> Option<&'a Value> {
        self.parameters
            .and_then(|doc| get_ci(doc, section))
            .and_then(|s| get_ci(s, key))
            .and_then(|entry| get_ci(entry, "value"))
    }

    /// Declared values may themselves be expressions.
    fn indirect(&self, value: &Value, indirection: usize) -> Result<Value, ResolveError> {
        match value {
            Value::String(s) if Self::is_expression(s) => {
                if indirection + 1 > MAX_INDIRECTION {
                    return Err(ResolveError::TooDeep);
                }
                Ok(self.resolve_at(s, indirection + 1)?.into_value())
            }
            other => Ok(other.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Member {
    Key(String),
    Index(usize),
}

/// One parsed function call: `name(args...)` followed by optional `.member` / `[n]` accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Call {
    name: String,
    args: Vec<String>,
    members: Vec<Member>,
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.args.join(", "))
    }
}

impl Call {
    fn parse(text: &str) -> Result<Call, ResolveError> {
        let malformed = || ResolveError::Malformed(text.to_string());
        let text = text.trim();
        let open = text.find('(').ok_or_else(malformed)?;
        let name = text[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed());
        }

        let close = matching_paren(text, open).ok_or_else(malformed)?;
        let args = split_args(&text[open + 1..close]);
        let members = parse_members(&text[close + 1..]).ok_or_else(malformed)?;

        Ok(Call {
            name: name.to_string(),
            args,
            members,
        })
    }

    /// Functions that produce a value; `resourceId` is only understood for dependency paths.
    fn is_value_function(&self) -> bool {
        ["parameters", "variables", "concat", "substring", "resourceGroup", "subscription"]
            .iter()
            .any(|f| self.name.eq_ignore_ascii_case(f))
    }
}

fn expression_body(raw: &str) -> &str {
    let t = raw.trim();
    t[1..t.len() - 1].trim()
}

fn looks_like_call(arg: &str) -> bool {
    match arg.find('(') {
        Some(open) => {
            let name = &arg[..open];
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn unquote(arg: &str) -> Option<String> {
    if arg.len() >= 2 && arg.starts_with('\'') && arg.ends_with('\'') {
        Some(arg[1..arg.len() - 1].replace("''", "'"))
    } else {
        None
    }
}

/// Index of the `)` closing the `(` at `open`, skipping quoted text.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut chars = text.char_indices().skip_while(|(i, _)| *i < open).peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\'' if in_quote => {
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                } else {
                    in_quote = false;
                }
            }
            '\'' => in_quote = true,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an argument list on top-level commas; commas inside quotes or nested calls are kept.
fn split_args(args: &str) -> Vec<String> {
    if args.trim().is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut chars = args.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' if in_quote => {
                current.push(c);
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_quote = false;
                }
            }
            '\'' => {
                in_quote = true;
                current.push(c);
            }
            '(' | '[' if !in_quote => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' if !in_quote => {
                depth -= 1;
                current.push(c);
            }
            ',' if !in_quote && depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    out.push(current.trim().to_string());
    out
}

fn parse_members(mut rest: &str) -> Option<Vec<Member>> {
    let mut members = Vec::new();
    rest = rest.trim();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '[']).unwrap_or(after.len());
            let name = after[..end].trim();
            if name.is_empty() {
                return None;
            }
            members.push(Member::Key(name.to_string()));
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']')?;
            let body = after[..close].trim();
            members.push(match unquote(body) {
                Some(key) => Member::Key(key),
                None => Member::Index(body.parse().ok()?),
            });
            rest = &after[close + 1..];
        } else {
            return None;
        }
    }
    Some(members)
}

fn navigate(mut value: Value, members: &[Member]) -> Result<Value, ResolveError> {
    for member in members {
        value = match member {
            Member::Key(key) => get_ci(&value, key)
                .cloned()
                .ok_or_else(|| ResolveError::MissingMember(key.clone()))?,
            Member::Index(idx) => value
                .as_array()
                .and_then(|a| a.get(*idx))
                .cloned()
                .ok_or_else(|| ResolveError::MissingMember(idx.to_string()))?,
        };
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> Value {
        json!({
            "parameters": {
                "p": { "type": "string", "defaultValue": "x" },
                "adminPassword": { "type": "securestring" },
                "prefix": { "type": "string", "defaultValue": "web" },
                "location": { "type": "string", "defaultValue": "[resourceGroup().location]" },
                "settings": { "type": "object", "defaultValue": { "tier": "Standard" } }
            },
            "variables": {
                "v": "abcdef",
                "b": "b",
                "key": "p",
                "nicName": "[concat(parameters('prefix'), '-nic')]"
            }
        })
    }

    fn resolve(tpl: &Value, params: Option<&Value>, raw: &str) -> Result<Value, ResolveError> {
        let ctx = DeploymentContext::default();
        let r = ExpressionResolver::new(tpl, params, &ctx);
        r.resolve_str(raw).map(Resolved::into_value)
    }

    #[test]
    fn parameters_prefer_external_override() {
        let tpl = template();
        let external = json!({ "parameters": { "p": { "value": "y" } } });
        assert_eq!(resolve(&tpl, Some(&external), "[parameters('p')]").unwrap(), json!("y"));
        assert_eq!(resolve(&tpl, None, "[parameters('p')]").unwrap(), json!("x"));
    }

    #[test]
    fn missing_parameter_is_a_typed_failure() {
        let tpl = template();
        assert_eq!(
            resolve(&tpl, None, "[parameters('adminPassword')]").unwrap_err(),
            ResolveError::MissingParameter("adminPassword".to_string())
        );
    }

    #[test]
    fn parameters_can_unwrap_a_nested_variable_key() {
        let tpl = template();
        assert_eq!(resolve(&tpl, None, "[parameters(variables('key'))]").unwrap(), json!("x"));
    }

    #[test]
    fn object_valued_key_is_rejected() {
        let tpl = template();
        assert!(matches!(
            resolve(&tpl, None, "[variables(parameters('settings'))]").unwrap_err(),
            ResolveError::NonStringKey(_)
        ));
    }

    #[test]
    fn concat_joins_literals_and_lookups() {
        let tpl = template();
        assert_eq!(resolve(&tpl, None, "[concat('a-', variables('b'))]").unwrap(), json!("a-b"));
    }

    #[test]
    fn concat_keeps_commas_inside_quotes() {
        let tpl = template();
        assert_eq!(
            resolve(&tpl, None, "[concat('a,b', '-', 'it''s')]").unwrap(),
            json!("a,b-it's")
        );
    }

    #[test]
    fn substring_takes_start_and_length() {
        let tpl = template();
        assert_eq!(resolve(&tpl, None, "[substring(variables('v'), 1, 2)]").unwrap(), json!("bc"));
        assert_eq!(resolve(&tpl, None, "[substring(variables('v'), 4)]").unwrap(), json!("ef"));
    }

    #[test]
    fn substring_out_of_range_fails() {
        let tpl = template();
        let err = resolve(&tpl, None, "[substring(variables('v'), 4, 5)]").unwrap_err();
        assert!(matches!(err, ResolveError::SubstringOutOfRange { len: 6, .. }));
    }

    #[test]
    fn variables_holding_expressions_are_resolved() {
        let tpl = template();
        assert_eq!(resolve(&tpl, None, "[variables('nicName')]").unwrap(), json!("web-nic"));
    }

    #[test]
    fn deployment_context_feeds_resource_group_lookups() {
        let tpl = template();
        assert_eq!(resolve(&tpl, None, "[parameters('location')]").unwrap(), json!("US East"));
        assert_eq!(
            resolve(&tpl, None, "[subscription().subscriptionId]").unwrap(),
            json!("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn member_access_navigates_objects() {
        let tpl = template();
        assert_eq!(resolve(&tpl, None, "[parameters('settings').tier]").unwrap(), json!("Standard"));
        assert!(matches!(
            resolve(&tpl, None, "[parameters('settings').sku]").unwrap_err(),
            ResolveError::MissingMember(_)
        ));
    }

    #[test]
    fn unknown_outer_function_is_opaque() {
        let tpl = template();
        let ctx = DeploymentContext::default();
        let r = ExpressionResolver::new(&tpl, None, &ctx);
        let resolved = r.resolve_str("[uniqueString(resourceGroup().id)]").unwrap();
        assert!(resolved.is_opaque());
    }

    #[test]
    fn unknown_nested_function_is_an_error() {
        let tpl = template();
        assert_eq!(
            resolve(&tpl, None, "[concat('a', uniqueString('x'))]").unwrap_err(),
            ResolveError::UnsupportedFunction("uniqueString".to_string())
        );
    }

    #[test]
    fn literals_pass_through_and_escapes_unwrap() {
        let tpl = template();
        assert_eq!(resolve(&tpl, None, "plain").unwrap(), json!("plain"));
        assert_eq!(resolve(&tpl, None, "[[not an expression]").unwrap(), json!("[not an expression]"));
    }

    #[test]
    fn dependency_paths_from_resource_id_and_literals() {
        let tpl = template();
        let ctx = DeploymentContext::default();
        let r = ExpressionResolver::new(&tpl, None, &ctx);

        let dep = r
            .resolve_dependency(
                "[resourceId('Microsoft.Network/networkInterfaces', variables('nicName'))]",
            )
            .unwrap();
        assert_eq!(dep.as_str(), "Microsoft.Network/networkInterfaces/web-nic");
        assert!(dep.matches("Microsoft.Network/networkInterfaces", "WEB-NIC"));
        assert!(!dep.matches("Microsoft.Compute/virtualMachines", "web-nic"));

        let dep = r
            .resolve_dependency("[resourceId('sub', 'rg', 'Microsoft.Sql/servers/databases', 'srv', 'db')]")
            .unwrap();
        assert_eq!(dep.as_str(), "Microsoft.Sql/servers/databases/srv/db");
        assert!(dep.matches("Microsoft.Sql/servers/databases", "srv/db"));

        let dep = r.resolve_dependency("web-nic").unwrap();
        assert!(dep.matches("Microsoft.Network/networkInterfaces", "web-nic"));

        assert!(r.resolve_dependency("[reference('x')]").is_err());
        assert!(r.resolve_dependency("[resourceId('only-a-name')]").is_err());
    }

    #[test]
    fn parameter_reference_reports_the_key() {
        let tpl = template();
        let ctx = DeploymentContext::default();
        let r = ExpressionResolver::new(&tpl, None, &ctx);
        assert_eq!(
            r.parameter_reference("[parameters('adminPassword')]"),
            Some(Ok("adminPassword".to_string()))
        );
        assert_eq!(r.parameter_reference("literal"), None);
        assert_eq!(r.parameter_reference("[variables('v')]"), None);
        assert_eq!(r.parameter_type("adminPassword"), Some("securestring"));
    }

    #[test]
    fn nesting_beyond_the_limit_fails() {
        let tpl = template();
        let err = resolve(
            &tpl,
            None,
            "[concat('a', concat('b', concat('c', parameters('p'))))]",
        )
        .unwrap_err();
        assert_eq!(err, ResolveError::TooDeep);
    }
}
