use crate::ResolvedIncludePath;

pub type BoxedIncludeProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The kind of failure at the bottom of an import chain.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    FileNotFound,
    CircularImport,
    MalformedDirective,
}

#[derive(Debug, thiserror::Error)]
pub enum PrepperError {
    /// The file could not be read by the `IncludeProvider`
    #[error("shader file not found: {path} ({cause})")]
    FileNotFound {
        path: ResolvedIncludePath,
        #[source]
        cause: BoxedIncludeProviderError,
    },

    /// A file transitively imports itself
    #[error("circular import detected: {}", format_chain(.chain))]
    CircularImport {
        /// Files from the first occurrence of the cycle through the repeated one
        chain: Vec<ResolvedIncludePath>,
    },

    /// An `#import`-like line which doesn't parse
    #[error("invalid import syntax in {file} at line {line}: {text}")]
    MalformedDirective {
        file: ResolvedIncludePath,
        line: usize,
        text: String,
    },

    /// Failure inside an imported file, with the import site attached
    #[error("error importing {import:?} from {from} (line {line})")]
    Import {
        /// Path as written in the directive
        import: String,

        /// File containing the directive
        from: ResolvedIncludePath,

        /// Line of the directive in `from`
        line: usize,

        #[source]
        source: Box<PrepperError>,
    },
}

impl PrepperError {
    /// The innermost error, skipping any import context.
    pub fn root_cause(&self) -> &PrepperError {
        let mut err = self;
        while let PrepperError::Import { source, .. } = err {
            err = source;
        }
        err
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PrepperError::FileNotFound { .. } => ErrorKind::FileNotFound,
            PrepperError::CircularImport { .. } => ErrorKind::CircularImport,
            PrepperError::MalformedDirective { .. } => ErrorKind::MalformedDirective,
            PrepperError::Import { source, .. } => source.kind(),
        }
    }

    /// Multi-line message: outermost import context first, innermost cause last.
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        let mut err = self;

        while let PrepperError::Import { source, .. } = err {
            lines.push(format!("{}{}", "  ".repeat(lines.len()), err));
            err = source;
        }

        let indent = "  ".repeat(lines.len());
        match err {
            PrepperError::CircularImport { chain } => {
                lines.push(format!("{}circular import detected:", indent));
                for (i, path) in chain.iter().enumerate() {
                    lines.push(format!("{}  {}-> {}", indent, "  ".repeat(i), path));
                }
            }
            _ => lines.push(format!("{}{}", indent, err)),
        }

        lines.join("\n")
    }
}

fn format_chain(chain: &[ResolvedIncludePath]) -> String {
    chain
        .iter()
        .map(|path| path.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
