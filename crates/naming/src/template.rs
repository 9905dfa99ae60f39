//! Naming pattern rendering.
//!
//! Two dialects are understood:
//!
//! - **Plain**: every `{{ name }}` is replaced by the matching variable, or by
//!   nothing when the variable is unknown. No other syntax is interpreted.
//! - **Conditional**: rendered through [upon], so `{% if name %}`, `{% else %}`
//!   and nested field access (`{{ track.album.title }}`) work. On top of
//!   upon's syntax, numeric comparisons inside `if` tags are accepted:
//!
//!   ```text
//!   {% if mediums_count > 1 %}{{ medium_short }}/{% endif %}
//!   ```
//!
//!   Supported operators are `>`, `>=`, `<`, `<=`, `==` and `!=`, with a
//!   flat variable name on the left and a number on the right. A comparison
//!   whose variable is not numeric evaluates to false.
//!
//! Rendering never fails. A pattern that does not compile, or a render that
//! errors (an unknown variable, indexing into a missing relation), falls back
//! to plain substitution of the original text.
//!
//! Registered functions: `upper(s)`, `lower(s)` and `truncate(s, n)`.
//!
//! # Example
//!
//! ```
//! use renamarr_naming::{Pattern, Variables};
//!
//! let pattern: Pattern = "{{artist}}/{% if mediums_count > 1 %}CD/{% endif %}{{title}}".into();
//! let vars: Variables = [("artist", "A"), ("title", "T"), ("mediums_count", "2")].into_iter().collect();
//! assert_eq!(pattern.render(&vars), "A/CD/T");
//! ```

use crate::models::{MediaFile, Track};
use crate::variables::Variables;
use regex::{Captures, Regex};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, instrument};
use upon::{Engine, Template, Value};

/// Anything beyond a bare `{{name}}` placeholder means the pattern is meant
/// for the template engine.
static CONDITIONAL_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%.*?%\}|\{\{[^{}]*\}\}").expect("valid regex"));
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("valid regex"));
static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{%(-?)\s*(if|else\s+if)\s+(not\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*(>=|<=|==|!=|>|<)\s*(-?\d+(?:\.\d+)?)\s*(-?)%\}",
    )
    .expect("valid regex")
});

const COMPARISON_PREFIX: &str = "__cmp_";

/// A naming pattern, parsed once and rendered many times.
pub struct Pattern {
    source: String,
    conditional: Option<Conditional>,
}

struct Conditional {
    engine: Engine<'static>,
    template: Template<'static>,
    comparisons: Vec<Comparison>,
}

#[derive(Debug, Clone, PartialEq)]
struct Comparison {
    variable: String,
    operator: Operator,
    operand: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let conditional = match CONDITIONAL_SYNTAX.is_match(&source) {
            true => Conditional::compile(&source),
            false => None,
        };
        Self { source, conditional }
    }

    /// The unrendered pattern text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether rendering goes through the template engine.
    pub fn is_conditional(&self) -> bool {
        self.conditional.is_some()
    }

    /// Renders the pattern. Always produces a string.
    #[instrument(level = "trace", skip_all, fields(pattern = %self.source))]
    pub fn render(&self, vars: &Variables<'_>) -> String {
        let Some(conditional) = &self.conditional else {
            return self.substitute(vars);
        };
        match conditional.render(vars) {
            Ok(rendered) => rendered,
            Err(err) => {
                debug!(error = %err, "conditional render failed, using plain substitution");
                self.substitute(vars)
            },
        }
    }

    /// Plain `{{name}}` substitution over the original text.
    fn substitute(&self, vars: &Variables<'_>) -> String {
        PLACEHOLDER
            .replace_all(&self.source, |caps: &Captures<'_>| lookup(vars, &caps[1]))
            .into_owned()
    }
}

impl Conditional {
    fn compile(source: &str) -> Option<Self> {
        let mut comparisons = Vec::new();
        let rewritten = COMPARISON.replace_all(source, |caps: &Captures<'_>| {
            let name = format!("{COMPARISON_PREFIX}{}", comparisons.len());
            comparisons.push(Comparison {
                variable: caps[4].to_string(),
                operator: Operator::parse(&caps[5]),
                operand: caps[6].parse().unwrap_or_default(),
            });
            let keyword = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
            let negation = caps.get(3).map_or("", |_| "not ");
            format!("{{%{} {keyword} {negation}{name} {}%}}", &caps[1], &caps[7])
        });

        let mut engine = Engine::new();
        addons::configure(&mut engine);
        match engine.compile(rewritten.into_owned()) {
            Ok(template) => Some(Self { engine, template, comparisons }),
            Err(err) => {
                debug!(error = %err, "pattern does not compile, using plain substitution");
                None
            },
        }
    }

    fn render(&self, vars: &Variables<'_>) -> Result<String, upon::Error> {
        self.template.render(&self.engine, self.context(vars)).to_string()
    }

    fn context(&self, vars: &Variables<'_>) -> Value {
        let flat = vars.iter().map(|(k, v)| (k.to_string(), scalar(v)));
        let comparisons = self
            .comparisons
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("{COMPARISON_PREFIX}{i}"), Value::Bool(c.evaluate(vars))));
        let track = vars.track().map(|t| ("track".to_string(), track_value(t, vars.file())));
        Value::Map(flat.chain(comparisons).chain(track).collect())
    }
}

impl Comparison {
    fn evaluate(&self, vars: &Variables<'_>) -> bool {
        let Some(value) = vars.get(&self.variable).and_then(|v| v.trim().parse::<f64>().ok()) else {
            return false;
        };
        match self.operator {
            Operator::Gt => value > self.operand,
            Operator::Ge => value >= self.operand,
            Operator::Lt => value < self.operand,
            Operator::Le => value <= self.operand,
            Operator::Eq => value == self.operand,
            Operator::Ne => value != self.operand,
        }
    }
}

impl Operator {
    fn parse(s: &str) -> Self {
        match s {
            ">=" => Self::Ge,
            "<" => Self::Lt,
            "<=" => Self::Le,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            _ => Self::Gt,
        }
    }
}

impl FromStr for Pattern {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("conditional", &self.is_conditional())
            .finish()
    }
}

/// Canonical integers become numbers so that `"0"` is falsy; everything else
/// (including zero-padded ordinals like `"07"`) stays a string.
fn scalar(s: &str) -> Value {
    match s.parse::<i64>() {
        Ok(n) if n.to_string() == s => Value::Integer(n),
        _ => Value::String(s.to_string()),
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// The nested `track` object exposed to conditional patterns.
fn track_value(track: &Track, file: Option<&MediaFile>) -> Value {
    let artist = track.album.as_ref().and_then(|a| a.artist.as_ref()).map(|artist| {
        upon::value! {
            name: artist.name.as_str(),
            folder: artist.folder.as_deref(),
        }
    });
    let album = track.album.as_ref().map(|album| {
        upon::value! {
            title: album.title.as_str(),
            year: album.release_date.map(|d| i64::from(d.year())),
            artist: artist,
            mediums_count: count(album.mediums.len()),
        }
    });
    let medium = track.medium.as_ref().map(|medium| {
        upon::value! {
            title: medium.title.as_deref(),
            format: medium.format.as_deref(),
            position: i64::from(medium.position),
        }
    });
    let file = file.map(|file| {
        upon::value! {
            path: file.path.as_deref(),
            format: file.format.as_deref(),
            quality: file.quality.as_deref(),
        }
    });
    upon::value! {
        title: track.title.as_str(),
        track_number: track.track_number.as_str(),
        album: album,
        medium: medium,
        file: file,
    }
}

/// Resolves a placeholder for plain substitution: flat variables first, then
/// dotted paths into the track object. Unknown names resolve to nothing.
fn lookup(vars: &Variables<'_>, name: &str) -> String {
    if let Some(value) = vars.get(name) {
        return value.to_string();
    }
    let Some(path) = name.strip_prefix("track.") else {
        return String::new();
    };
    let Some(track) = vars.track() else {
        return String::new();
    };
    let mut current = track_value(track, vars.file());
    for segment in path.split('.') {
        current = match current {
            Value::Map(mut map) => match map.remove(segment) {
                Some(value) => value,
                None => return String::new(),
            },
            _ => return String::new(),
        };
    }
    match current {
        Value::String(s) => s,
        Value::Integer(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Extra functions available inside conditional patterns.
mod addons {
    use upon::Engine;

    fn upper(s: &str) -> String {
        s.to_uppercase()
    }

    fn lower(s: &str) -> String {
        s.to_lowercase()
    }

    /// Cuts to at most `max_chars` characters, never inside a character.
    fn truncate(s: &str, max_chars: usize) -> String {
        s.chars().take(max_chars).collect()
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_function("upper", upper);
        engine.add_function("lower", lower);
        engine.add_function("truncate", truncate);
    }
}
