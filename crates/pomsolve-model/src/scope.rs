//! Maven dependency scopes.

use std::fmt;

/// Maven dependency scope.
///
/// The declaration order is load-bearing: the derived `Ord` places broader
/// scopes first, and the version-selection table relies on that order when
/// it asks "what did an equal-or-broader scope already pin?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    None,
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl Scope {
    /// Every scope, in conflict-resolution order.
    pub const ALL: [Scope; 7] = [
        Scope::None,
        Scope::Compile,
        Scope::Provided,
        Scope::Runtime,
        Scope::Test,
        Scope::System,
        Scope::Import,
    ];

    /// Parse a scope string. A missing scope means `compile`, and so does an
    /// unrecognized one.
    pub fn from_name(name: Option<&str>) -> Scope {
        let Some(name) = name else {
            return Scope::Compile;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Scope::None,
            "provided" => Scope::Provided,
            "runtime" => Scope::Runtime,
            "test" => Scope::Test,
            "system" => Scope::System,
            "import" => Scope::Import,
            _ => Scope::Compile,
        }
    }

    /// The scope a dependency declared as `self` takes on inside the subtree
    /// of a dependency with scope `parent`, or `None` when it does not
    /// propagate at all.
    ///
    /// This is Maven's dependency-scope table: test, provided, and system
    /// dependencies are visible only where they are declared, and a root
    /// (`Scope::None`) subtree keeps the declared scope.
    pub fn transitive_of(self, parent: Scope) -> Option<Scope> {
        match (self, parent) {
            (child, Scope::None) => Some(child),
            (Scope::Compile, Scope::Compile) => Some(Scope::Compile),
            (Scope::Compile, Scope::Provided) => Some(Scope::Provided),
            (Scope::Compile, Scope::Runtime) => Some(Scope::Runtime),
            (Scope::Compile, Scope::Test) => Some(Scope::Test),
            (Scope::Runtime, Scope::Compile) => Some(Scope::Runtime),
            (Scope::Runtime, Scope::Provided) => Some(Scope::Provided),
            (Scope::Runtime, Scope::Runtime) => Some(Scope::Runtime),
            (Scope::Runtime, Scope::Test) => Some(Scope::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::None => "none",
            Scope::Compile => "compile",
            Scope::Provided => "provided",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::System => "system",
            Scope::Import => "import",
        };
        f.write_str(name)
    }
}
