use std::path::Path;

use log::{debug, warn};

use crate::scanner::{self, DirectiveScanner, ImportDirective, ImportLine};
use crate::tracker::{Diagnostic, ExpansionState, ImportStack};
use crate::{ExpandedText, IncludeProvider, PrepperConfig, PrepperError, ResolvedIncludePath};

/// Recursively inlines `#import`ed files.
///
/// Guard sets and the expansion record live in an `ExpansionState` owned by the
/// expander. `expand` and `expand_with_stack` start every top-level file from a
/// fresh state; the state is kept afterwards for inspection only. To deduplicate
/// across a batch, use `expand_shared`, optionally seeded through `with_state`.
pub struct Expander<'a> {
    include_provider: &'a mut dyn IncludeProvider,
    scanner: DirectiveScanner,
    state: ExpansionState,
}

impl<'a> Expander<'a> {
    pub fn new(include_provider: &'a mut dyn IncludeProvider) -> Self {
        Self::with_config(include_provider, &PrepperConfig::default())
    }

    pub fn with_config(
        include_provider: &'a mut dyn IncludeProvider,
        config: &PrepperConfig,
    ) -> Self {
        Expander {
            include_provider,
            scanner: DirectiveScanner::new(config),
            state: ExpansionState::default(),
        }
    }

    /// Seed the state used by `expand_shared`, e.g. one taken from another expander.
    pub fn with_state(mut self, state: ExpansionState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &ExpansionState {
        &self.state
    }

    pub fn take_state(&mut self) -> ExpansionState {
        std::mem::take(&mut self.state)
    }

    pub fn reset(&mut self) {
        self.state = ExpansionState::default();
    }

    /// Expand a top-level file with a fresh import stack and fresh guards.
    pub fn expand(&mut self, path: impl AsRef<Path>) -> Result<ExpandedText, PrepperError> {
        let mut stack = ImportStack::new();
        self.expand_with_stack(path, &mut stack)
    }

    /// Expand `path` with fresh guards, as if imported by the files already on `stack`.
    ///
    /// `stack` is left as it was on return, whether or not expansion succeeded.
    pub fn expand_with_stack(
        &mut self,
        path: impl AsRef<Path>,
        stack: &mut ImportStack,
    ) -> Result<ExpandedText, PrepperError> {
        self.reset();
        let path = ResolvedIncludePath::new(path);
        self.expand_file(&path, stack)
    }

    /// Expand a top-level file, keeping the guards and expansion record left by
    /// earlier `expand_shared` calls (or `with_state`). Files already inlined by
    /// an earlier call only get the `// Already imported` marker.
    pub fn expand_shared(&mut self, path: impl AsRef<Path>) -> Result<ExpandedText, PrepperError> {
        let mut stack = ImportStack::new();
        let path = ResolvedIncludePath::new(path);
        self.expand_file(&path, &mut stack)
    }

    fn expand_file(
        &mut self,
        path: &ResolvedIncludePath,
        stack: &mut ImportStack,
    ) -> Result<ExpandedText, PrepperError> {
        stack
            .push(path.clone())
            .map_err(|chain| PrepperError::CircularImport { chain })?;

        let result = self.expand_pushed(path, stack);
        stack.pop();
        result
    }

    fn expand_pushed(
        &mut self,
        path: &ResolvedIncludePath,
        stack: &ImportStack,
    ) -> Result<ExpandedText, PrepperError> {
        debug!("expanding {} (depth {})", path, stack.len());

        let source = self
            .include_provider
            .get_include(path)
            .map_err(|cause| PrepperError::FileNotFound {
                path: path.clone(),
                cause,
            })?;

        let lines = scanner::split_lines(&source);
        let mut output = ExpandedText::default();

        if self.scanner.has_once_guard(&lines) && !self.state.once_guards.insert(path.clone()) {
            debug!("skipping {}: already included", path);
            output.push_marker(&format!("// File already included: {}\n", path.file_name()));
            return Ok(output);
        }

        let mut idx = 0;
        while idx < lines.len() {
            let line = lines[idx];
            let line_no = idx + 1;

            match self.scanner.scan_import(line) {
                Some(ImportLine::Import(import)) => {
                    self.import(&import, path, line_no, stack, &mut output)?;
                    idx += 1;
                    continue;
                }
                Some(ImportLine::Malformed) => {
                    return Err(PrepperError::MalformedDirective {
                        file: path.clone(),
                        line: line_no,
                        text: line.trim().to_string(),
                    });
                }
                None => {}
            }

            if let Some(guard) = self.scanner.named_guard(&lines, idx) {
                if self.state.named_guards.contains(&guard) {
                    debug!("skipping {} in {}: guard already defined", guard, path);
                    idx = scanner::skip_guarded_block(&lines, idx);
                    continue;
                }
                self.state.named_guards.insert(guard);
            }

            output.push_source_line(line, path, line_no);
            idx += 1;
        }

        Ok(output)
    }

    fn import(
        &mut self,
        import: &ImportDirective,
        from: &ResolvedIncludePath,
        line_no: usize,
        stack: &ImportStack,
        output: &mut ExpandedText,
    ) -> Result<(), PrepperError> {
        if let Some(trailing) = &import.trailing {
            let diagnostic = Diagnostic {
                file: from.clone(),
                line: line_no,
                message: format!("ignored text after import of {:?}: {}", import.path, trailing),
            };
            warn!("{}", diagnostic);
            self.state.diagnostics.push(diagnostic);
        }

        let wrap = |source: PrepperError| PrepperError::Import {
            import: import.path.clone(),
            from: from.clone(),
            line: line_no,
            source: Box::new(source),
        };

        let resolved = self
            .include_provider
            .resolve_path(&import.path, from)
            .map_err(|cause| {
                wrap(PrepperError::FileNotFound {
                    path: ResolvedIncludePath::new(&import.path),
                    cause,
                })
            })?;

        // A file on the stack is a cycle, even if a shared state recorded it earlier
        if !stack.contains(&resolved) && self.state.record.contains(&resolved) {
            output.push_marker(&format!("// Already imported: {}\n", import.path));
            return Ok(());
        }

        // Sibling imports must not see each other's frames
        let mut branch = stack.clone();
        let expanded = self.expand_file(&resolved, &mut branch).map_err(wrap)?;

        output.push_marker(&format!(
            "\n// BEGIN IMPORT: {} (from {})\n",
            import.path,
            from.file_name()
        ));
        output.append(&expanded);
        output.push_marker(&format!("// END IMPORT: {}\n\n", import.path));

        self.state.record.record(resolved, &expanded.text);
        Ok(())
    }
}
