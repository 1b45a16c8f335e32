//! Function catalog
//!
//! Every identifier followed by `(` parses as a function head. The catalog only
//! adds metadata: in which editor contexts a function is offered and whether it
//! yields a typed value (`#cast`, `new`) whose structure can be navigated.

/// Editor contexts a function is offered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionScope {
    /// Offered everywhere except selection-mask (glob) criteria
    AllButGlob,
    /// Never offered; still parsed when typed or loaded
    None,
    /// Only offered in selection-mask (glob) criteria
    GlobOnly,
}

/// Which kind of editor asks for completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionContext {
    #[default]
    Standard,
    Glob,
}

impl FunctionScope {
    pub fn offered_in(self, context: FunctionContext) -> bool {
        match (self, context) {
            (FunctionScope::AllButGlob, FunctionContext::Standard) => true,
            (FunctionScope::GlobOnly, FunctionContext::Glob) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub scope: FunctionScope,
    /// Returns a typed value whose type is the first string literal argument
    pub returns_variable: bool,
    pub description: &'static str,
}

const fn function(name: &'static str, scope: FunctionScope, description: &'static str) -> FunctionInfo {
    FunctionInfo {
        name,
        scope,
        returns_variable: false,
        description,
    }
}

const fn typed(name: &'static str, description: &'static str) -> FunctionInfo {
    FunctionInfo {
        name,
        scope: FunctionScope::AllButGlob,
        returns_variable: true,
        description,
    }
}

pub static FUNCTIONS: &[FunctionInfo] = &[
    typed("#cast", "Reinterpret a value as the given type"),
    typed("new", "Create a new instance of the given type"),
    function("concat", FunctionScope::AllButGlob, "Join texts"),
    function("substring", FunctionScope::AllButGlob, "Part of a text"),
    function("length", FunctionScope::AllButGlob, "Length of a text or list"),
    function("toUpperCase", FunctionScope::AllButGlob, "Upper-case a text"),
    function("toLowerCase", FunctionScope::AllButGlob, "Lower-case a text"),
    function("trim", FunctionScope::AllButGlob, "Strip surrounding whitespace"),
    function("replace", FunctionScope::AllButGlob, "Replace occurrences in a text"),
    function("indexOf", FunctionScope::AllButGlob, "Position of a text in another"),
    function("contains", FunctionScope::AllButGlob, "Whether a text or list contains a value"),
    function("startsWith", FunctionScope::AllButGlob, "Whether a text starts with another"),
    function("endsWith", FunctionScope::AllButGlob, "Whether a text ends with another"),
    function("isNull", FunctionScope::AllButGlob, "Whether a value is null"),
    function("size", FunctionScope::AllButGlob, "Number of list elements"),
    function("append", FunctionScope::AllButGlob, "Add an element to a list"),
    function("format", FunctionScope::AllButGlob, "Format a value as text"),
    function("toNumber", FunctionScope::AllButGlob, "Parse a number"),
    function("toText", FunctionScope::AllButGlob, "Convert a value to text"),
    function("now", FunctionScope::AllButGlob, "Current timestamp"),
    function("today", FunctionScope::AllButGlob, "Current date"),
    function("glob", FunctionScope::GlobOnly, "Match a path pattern"),
    function("matches", FunctionScope::GlobOnly, "Match a regular expression"),
    function("#raw", FunctionScope::None, "Pass-through used by generated expressions"),
    function("#selection", FunctionScope::None, "Selection mask marker"),
];

/// Look a function up by its exact name
pub fn lookup(name: &str) -> Option<&'static FunctionInfo> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Functions offered in the given editor context
pub fn offered(context: FunctionContext) -> impl Iterator<Item = &'static FunctionInfo> {
    FUNCTIONS.iter().filter(move |f| f.scope.offered_in(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_and_new_return_variables() {
        assert!(lookup("#cast").unwrap().returns_variable);
        assert!(lookup("new").unwrap().returns_variable);
        assert!(!lookup("concat").unwrap().returns_variable);
    }

    #[test]
    fn test_glob_functions_are_separate() {
        let standard: Vec<_> = offered(FunctionContext::Standard).map(|f| f.name).collect();
        let glob: Vec<_> = offered(FunctionContext::Glob).map(|f| f.name).collect();

        assert!(standard.contains(&"concat"));
        assert!(!standard.contains(&"glob"));
        assert!(glob.contains(&"glob"));
        assert!(!glob.contains(&"concat"));
    }

    #[test]
    fn test_scope_none_is_never_offered() {
        assert!(!offered(FunctionContext::Standard).any(|f| f.name == "#raw"));
        assert!(!offered(FunctionContext::Glob).any(|f| f.name == "#raw"));
        assert!(lookup("#raw").is_some());
    }
}
