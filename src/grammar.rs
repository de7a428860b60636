//! Grammar definition and the cached expansion engine.
//!
//! A [`GrammarDefinition`] is what an external loader hands over (its serde
//! shape uses camelCase keys). [`GrammarDefinition::load`] validates it and
//! falls back to the default `"L"` grammar when it is missing or malformed.
//! [`GrammarEngine`] owns a [`Grammar`] and memoizes the last expansion.

use crate::error::{LSystemError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Start symbol used when no usable definition is supplied.
pub const DEFAULT_START: &str = "L";

/// Numeric parameters steering the turtle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrammarParameters {
    /// Fractional change applied by the grow-angle symbols `(` / `)`.
    pub angle_growth: f32,
    /// Fractional change applied by the grow-size symbols `<` / `>`.
    pub size_growth: f32,
    /// Initial turn angle, in degrees.
    pub step_angle: f32,
    /// Initial forward step length.
    pub step_size: f32,
}

impl GrammarParameters {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("angleGrowth", self.angle_growth),
            ("sizeGrowth", self.size_growth),
            ("stepAngle", self.step_angle),
            ("stepSize", self.step_size),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(LSystemError::NonFiniteParameter(name));
            }
        }
        Ok(())
    }
}

/// A grammar as delivered by the (external) parameter-file loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarDefinition {
    /// The axiom.
    pub start: String,
    /// Production rules keyed by a single symbol.
    pub rules: BTreeMap<String, String>,
    /// Default number of rewriting passes.
    pub iterations: u32,
    pub parameters: GrammarParameters,
}

impl Default for GrammarDefinition {
    fn default() -> Self {
        Self {
            start: DEFAULT_START.to_string(),
            rules: BTreeMap::new(),
            iterations: 0,
            parameters: GrammarParameters::default(),
        }
    }
}

/// A validated definition, split into the pieces each stage consumes.
#[derive(Clone, Debug, Default)]
pub struct LoadedGrammar {
    pub grammar: Grammar,
    pub parameters: GrammarParameters,
    pub iterations: u32,
}

impl GrammarDefinition {
    /// Validates the definition and converts rule keys to symbols.
    pub fn into_loaded(self) -> Result<LoadedGrammar> {
        self.parameters.validate()?;
        let mut rules = HashMap::with_capacity(self.rules.len());
        for (key, replacement) in self.rules {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(symbol), None) => {
                    rules.insert(symbol, replacement);
                }
                _ => return Err(LSystemError::MultiSymbolRuleKey(key)),
            }
        }
        Ok(LoadedGrammar {
            grammar: Grammar::new(self.start, rules)?,
            parameters: self.parameters,
            iterations: self.iterations,
        })
    }

    /// Resolves an optional definition, substituting the default grammar
    /// when it is absent or fails validation.
    pub fn load(definition: Option<Self>) -> LoadedGrammar {
        match definition.map(Self::into_loaded) {
            Some(Ok(loaded)) => loaded,
            Some(Err(err)) => {
                warn!(%err, "malformed grammar definition, using default grammar");
                LoadedGrammar::default()
            }
            None => {
                debug!("no grammar definition supplied, using default grammar");
                LoadedGrammar::default()
            }
        }
    }
}

/// An immutable L-System: an axiom plus per-symbol productions.
///
/// Symbols without a production are terminals and pass through expansion
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Grammar {
    start: String,
    rules: HashMap<char, String>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            start: DEFAULT_START.to_string(),
            rules: HashMap::new(),
        }
    }
}

impl Grammar {
    pub fn new<S: Into<String>>(
        start: impl Into<String>,
        rules: impl IntoIterator<Item = (char, S)>,
    ) -> Result<Self> {
        let start = start.into();
        if start.is_empty() {
            return Err(LSystemError::EmptyStart);
        }
        Ok(Self {
            start,
            rules: rules.into_iter().map(|(k, v)| (k, v.into())).collect(),
        })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rule(&self, symbol: char) -> Option<&str> {
        self.rules.get(&symbol).map(String::as_str)
    }

    pub fn rules(&self) -> &HashMap<char, String> {
        &self.rules
    }

    /// Rewrites the axiom `iterations` times without touching any cache.
    ///
    /// The loop runs `iterations + 1` passes. On every pass but the last,
    /// rule symbols are replaced by their production; on the last pass they
    /// are dropped. Terminals are always copied. The result therefore only
    /// contains terminals.
    pub fn expand(&self, iterations: u32) -> String {
        let mut current = self.start.clone();
        for pass in 0..=iterations {
            let mut next = String::with_capacity(current.len());
            for symbol in current.chars() {
                match self.rules.get(&symbol) {
                    Some(replacement) if pass < iterations => next.push_str(replacement),
                    Some(_) => {}
                    None => next.push(symbol),
                }
            }
            current = next;
        }
        current
    }
}

/// The last expansion computed by a [`GrammarEngine`].
#[derive(Clone, Debug)]
pub struct ExpansionCache {
    pub iterations: u32,
    pub expanded: String,
}

/// Expands a [`Grammar`], remembering the most recent result.
///
/// Asking for the same iteration count again returns the cached string.
/// Any other count recomputes from the axiom.
#[derive(Clone, Debug, Default)]
pub struct GrammarEngine {
    grammar: Grammar,
    cache: Option<ExpansionCache>,
}

impl GrammarEngine {
    pub fn new(grammar: Grammar) -> Self {
        Self {
            grammar,
            cache: None,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Iteration count of the cached expansion, if any.
    pub fn cached_iterations(&self) -> Option<u32> {
        self.cache.as_ref().map(|c| c.iterations)
    }

    /// Returns the expansion for `iterations`, computing it on a cache miss.
    ///
    /// Output grows geometrically with `iterations`; callers bound it.
    pub fn expand(&mut self, iterations: u32) -> &str {
        let cache = match self.cache.take() {
            Some(cache) if cache.iterations == iterations => cache,
            _ => {
                let expanded = self.grammar.expand(iterations);
                debug!(iterations, len = expanded.len(), "expanded grammar");
                ExpansionCache {
                    iterations,
                    expanded,
                }
            }
        };
        &self.cache.insert(cache).expanded
    }
}
