use crate::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex")
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Values supplied on the command line, overriding feature defaults.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse `-P key=value` arguments. Keys must be identifiers.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut params = Self::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid param '{}', expected key=value", arg))
            })?;
            let key = key.trim();
            if !is_identifier(key) {
                return Err(Error::Config(format!("invalid param name '{}'", key)));
            }
            params.values.insert(key.to_string(), value.to_string());
        }
        Ok(params)
    }
}

/// Parameter declared in a feature file.
///
/// Accepts either the full form or a bare value as shorthand for
/// `{ default: value }`:
///
/// ```yaml
/// params:
///   origin: RTM
///   destination:
///     required: true
///     description: Arrival airport code
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawParamDef")]
pub struct ParamDef {
    pub required: bool,
    pub default: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParamDef {
    Full {
        #[serde(default)]
        required: bool,
        default: Option<serde_yaml::Value>,
        description: Option<String>,
    },
    Value(serde_yaml::Value),
}

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<RawParamDef> for ParamDef {
    fn from(raw: RawParamDef) -> Self {
        match raw {
            RawParamDef::Full {
                required,
                default,
                description,
            } => ParamDef {
                required,
                default: default.and_then(scalar_to_string),
                description,
            },
            RawParamDef::Value(v) => ParamDef {
                required: false,
                default: scalar_to_string(v),
                description: None,
            },
        }
    }
}

/// Resolve one placeholder: CLI value, then declared default.
fn resolve(
    name: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<Option<String>> {
    if let Some(v) = params.get(name) {
        return Ok(Some(v.to_string()));
    }
    match defs.get(name) {
        Some(ParamDef {
            default: Some(d), ..
        }) => Ok(Some(d.clone())),
        Some(def) if def.required => Err(Error::Config(format!(
            "missing required parameter: {}",
            name
        ))),
        Some(_) => Ok(Some(String::new())),
        // Undeclared and not given: left untouched.
        None => Ok(None),
    }
}

/// Replace every `${name}` in `template`.
pub fn substitute(
    template: &str,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder().captures_iter(template) {
        let Some(whole) = caps.get(0).map(|m| m.range()) else {
            continue;
        };
        out.push_str(&template[last..whole.start]);
        match resolve(&caps[1], params, defs)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(&template[whole.clone()]),
        }
        last = whole.end;
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Names referenced by `${...}` in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    placeholder()
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// Substitute params in every string of a YAML tree except the `params` block.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    params: &Params,
    defs: &HashMap<String, ParamDef>,
) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => *s = substitute(s, params, defs)?,
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map.iter_mut() {
                if k.as_str() == Some("params") {
                    continue;
                }
                substitute_value(v, params, defs)?;
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                substitute_value(v, params, defs)?;
            }
        }
        _ => {}
    }
    Ok(())
}
