//! Comparison operators of the `<field>[<operator>]=<value>` grammar.
//!
//! The set of operators is closed: adding one means adding a variant to
//! [`FilteringOperator`] and listing it in [`FilteringOperator::ALL`]. The
//! registry that resolves wire tokens is built once, before any request is
//! served, and only read afterwards.

use std::{collections::HashMap, fmt, sync::LazyLock};

use crate::{EngineError, ResultEngine};

/// How many values an operator consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Single,
    /// Comma separated on the wire.
    Multiple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilteringOperator {
    Eq,
    /// Greater or equal.
    Goe,
    /// Less or equal.
    Loe,
    In,
}

impl FilteringOperator {
    pub const ALL: [Self; 4] = [Self::Eq, Self::Goe, Self::Loe, Self::In];

    /// The stable token used in query parameter keys.
    pub fn token(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Goe => "goe",
            Self::Loe => "loe",
            Self::In => "in",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Self::In => Arity::Multiple,
            Self::Eq | Self::Goe | Self::Loe => Arity::Single,
        }
    }

    pub fn is_multi_valued(self) -> bool {
        self.arity() == Arity::Multiple
    }

    /// Resolve a wire token through the process-wide registry.
    pub fn lookup(token: &str) -> Option<Self> {
        OperatorRegistry::standard().lookup(token)
    }
}

impl fmt::Display for FilteringOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Token → operator lookup table.
#[derive(Debug)]
pub struct OperatorRegistry {
    by_token: HashMap<&'static str, FilteringOperator>,
}

static STANDARD_REGISTRY: LazyLock<OperatorRegistry> =
    LazyLock::new(|| match OperatorRegistry::new(FilteringOperator::ALL) {
        Ok(registry) => registry,
        Err(err) => panic!("{err}"),
    });

impl OperatorRegistry {
    /// Build a registry, failing if two operators share a token.
    pub fn new(operators: impl IntoIterator<Item = FilteringOperator>) -> ResultEngine<Self> {
        let mut by_token = HashMap::new();
        for operator in operators {
            if by_token.insert(operator.token(), operator).is_some() {
                return Err(EngineError::Configuration(format!(
                    "filtering operator '{}' registered twice",
                    operator.token()
                )));
            }
        }
        Ok(Self { by_token })
    }

    /// The registry holding every [`FilteringOperator`].
    pub fn standard() -> &'static Self {
        &STANDARD_REGISTRY
    }

    pub fn lookup(&self, token: &str) -> Option<FilteringOperator> {
        self.by_token.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}
