use crate::ResolvedIncludePath;

/// Where a line of expanded output came from
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LineOrigin {
    /// Copied from `file`, at 1-based `line`
    Source {
        file: ResolvedIncludePath,
        line: usize,
    },

    /// Inserted by the preprocessor (import markers and placeholders)
    Generated,
}

/// Flattened source text, along with the origin of every line in it.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ExpandedText {
    /// Source text
    pub text: String,

    /// One entry per line of `text`
    pub origins: Vec<LineOrigin>,
}

impl ExpandedText {
    /// Origin of the 1-based `line` of `text`.
    pub fn origin(&self, line: usize) -> Option<&LineOrigin> {
        line.checked_sub(1).and_then(|idx| self.origins.get(idx))
    }

    pub fn line_count(&self) -> usize {
        self.origins.len()
    }

    fn at_line_start(&self) -> bool {
        self.text.is_empty() || self.text.ends_with('\n')
    }

    /// Append a single line copied from `file`. `line` may lack its terminator.
    pub(crate) fn push_source_line(&mut self, line: &str, file: &ResolvedIncludePath, line_no: usize) {
        if line.is_empty() {
            return;
        }

        if self.at_line_start() {
            self.origins.push(LineOrigin::Source {
                file: file.clone(),
                line: line_no,
            });
        }
        self.text.push_str(line);
    }

    /// Append generated text. Markers always begin on a fresh line.
    pub(crate) fn push_marker(&mut self, marker: &str) {
        if !self.at_line_start() {
            self.text.push('\n');
        }

        for _ in marker.split_inclusive('\n') {
            self.origins.push(LineOrigin::Generated);
        }
        self.text.push_str(marker);
    }

    /// Append the expansion of an imported file.
    pub(crate) fn append(&mut self, other: &ExpandedText) {
        let mut origins = other.origins.iter();

        // The first line of `other` continues our unterminated last line
        if !self.at_line_start() && !other.text.is_empty() {
            let _ = origins.next();
        }

        self.origins.extend(origins.cloned());
        self.text.push_str(&other.text);
    }
}

impl std::fmt::Display for ExpandedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_follow_lines() {
        let a = ResolvedIncludePath::new("a.glsl");
        let mut text = ExpandedText::default();

        text.push_source_line("int a;\n", &a, 1);
        text.push_marker("\n// marker\n");
        text.push_source_line("int b;", &a, 3);
        text.push_marker("// end\n");

        assert_eq!(text.text, "int a;\n\n// marker\nint b;\n// end\n");
        assert_eq!(text.line_count(), 5);
        assert_eq!(
            text.origin(4),
            Some(&LineOrigin::Source {
                file: a.clone(),
                line: 3
            })
        );
        assert_eq!(text.origin(2), Some(&LineOrigin::Generated));
        assert_eq!(text.origin(0), None);
        assert_eq!(text.origin(6), None);
    }

    #[test]
    fn append_merges_unterminated_line() {
        let a = ResolvedIncludePath::new("a.glsl");
        let b = ResolvedIncludePath::new("b.glsl");

        let mut child = ExpandedText::default();
        child.push_source_line("b;\n", &b, 1);

        let mut parent = ExpandedText::default();
        parent.push_source_line("a", &a, 7);
        parent.append(&child);

        assert_eq!(parent.text, "ab;\n");
        assert_eq!(
            parent.origins,
            vec![LineOrigin::Source { file: a, line: 7 }]
        );
    }
}
