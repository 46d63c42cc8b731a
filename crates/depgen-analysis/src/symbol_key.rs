//! Member identity within a candidate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of one element of a candidate's member sets.
///
/// Keys are derived from semantics, never from positions: the same member
/// reached through two partial fragments produces the same key. Fields and
/// properties share one name space, like they do in the declaring class;
/// methods are keyed by name and parameter types so overloads stay distinct.
///
/// | Element | Key |
/// |---|---|
/// | field or property `x` | `V:x` |
/// | method `load(A, B)` | `M:load(A,B)` |
/// | cached class declared by `T` | `T:T` |
/// | cached interface `I` | `I:I` |
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolKey(Arc<str>);

impl SymbolKey {
    #[must_use]
    pub fn value_member(name: &str) -> Self {
        Self(Arc::from(format!("V:{name}")))
    }

    #[must_use]
    pub fn method<S: AsRef<str>>(name: &str, parameter_types: &[S]) -> Self {
        let mut key = format!("M:{name}(");
        for (i, ty) in parameter_types.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(ty.as_ref());
        }
        key.push(')');
        Self(Arc::from(key))
    }

    /// Key of a class-level cache registration; `declaring` is the type whose
    /// `[Cached]` attribute produced it.
    #[must_use]
    pub fn class(declaring: &str) -> Self {
        Self(Arc::from(format!("T:{declaring}")))
    }

    #[must_use]
    pub fn interface(ty: &str) -> Self {
        Self(Arc::from(format!("I:{ty}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
