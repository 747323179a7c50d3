/// Directive keywords recognized by the `Expander`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrepperConfig {
    /// Keyword introducing an import, e.g. `#import "common.glsl"`
    pub import_directive: String,

    /// Line marking a file as expandable at most once per run
    pub once_directive: String,
}

impl Default for PrepperConfig {
    fn default() -> Self {
        PrepperConfig {
            import_directive: "#import".to_string(),
            once_directive: "#pragma once".to_string(),
        }
    }
}

impl PrepperConfig {
    pub fn import_directive(mut self, directive: impl Into<String>) -> Self {
        self.import_directive = directive.into();
        self
    }

    pub fn once_directive(mut self, directive: impl Into<String>) -> Self {
        self.once_directive = directive.into();
        self
    }
}
