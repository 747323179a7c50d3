use regex::Regex;

use crate::PrepperConfig;

lazy_static::lazy_static! {
    static ref IFNDEF_RE: Regex = Regex::new(r"^#ifndef\s+(\w+)").unwrap();
}

/// Split into lines, keeping each line's terminator so the text can be
/// reassembled byte for byte.
pub fn split_lines(source: &str) -> Vec<&str> {
    source.split_inclusive('\n').collect()
}

/// A parsed import directive
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImportDirective {
    /// Path between the delimiters, as written
    pub path: String,

    /// Anything following the closing delimiter
    pub trailing: Option<String>,
}

/// Outcome of looking at a line which starts with the import keyword
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ImportLine {
    Import(ImportDirective),
    Malformed,
}

/// Line-level recognizer for the directives the expander acts on.
/// Anything else is opaque text.
pub struct DirectiveScanner {
    import_directive: String,
    once_directive: String,
    import_re: Regex,
}

impl DirectiveScanner {
    pub fn new(config: &PrepperConfig) -> Self {
        let import_re = Regex::new(&format!(
            r#"^{}\s+(?:"([^">]+)"|<([^">]+)>)(.*)$"#,
            regex::escape(&config.import_directive)
        ))
        .expect("escaped import keyword always forms a valid pattern");

        DirectiveScanner {
            import_directive: config.import_directive.clone(),
            once_directive: config.once_directive.clone(),
            import_re,
        }
    }

    /// `None` if the line isn't an import at all.
    pub fn scan_import(&self, line: &str) -> Option<ImportLine> {
        let trimmed = line.trim();
        if !trimmed.starts_with(&self.import_directive) {
            return None;
        }

        let captures = match self.import_re.captures(trimmed) {
            Some(captures) => captures,
            None => return Some(ImportLine::Malformed),
        };

        let path = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_string())?;

        let trailing = captures
            .get(3)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(ImportLine::Import(ImportDirective { path, trailing }))
    }

    /// Whether the first significant line is the once directive.
    /// Blank lines and `//` comments are not significant.
    pub fn has_once_guard(&self, lines: &[&str]) -> bool {
        lines
            .iter()
            .map(|line| line.trim())
            .find(|line| !line.is_empty() && !line.starts_with("//"))
            .map_or(false, |line| line == self.once_directive)
    }

    /// Name of the guard opened at `lines[idx]`, if that line is `#ifndef NAME`
    /// and the very next one is `#define NAME`.
    pub fn named_guard(&self, lines: &[&str], idx: usize) -> Option<String> {
        let captures = IFNDEF_RE.captures(lines[idx].trim())?;
        let name = &captures[1];
        let next = lines.get(idx + 1)?;

        if next.trim() == format!("#define {}", name) {
            Some(name.to_string())
        } else {
            None
        }
    }
}

/// Index of the first line after the conditional block opened at `lines[open_idx]`.
/// Nested `#if*` blocks must close before the guard does; an unterminated
/// block runs to the end of the file.
pub fn skip_guarded_block(lines: &[&str], open_idx: usize) -> usize {
    let mut depth = 1;
    let mut idx = open_idx + 1;

    while idx < lines.len() && depth > 0 {
        let trimmed = lines[idx].trim();
        if trimmed.starts_with("#if") {
            depth += 1;
        } else if trimmed.starts_with("#endif") {
            depth -= 1;
        }
        idx += 1;
    }

    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> DirectiveScanner {
        DirectiveScanner::new(&PrepperConfig::default())
    }

    fn import(path: &str, trailing: Option<&str>) -> Option<ImportLine> {
        Some(ImportLine::Import(ImportDirective {
            path: path.to_string(),
            trailing: trailing.map(str::to_string),
        }))
    }

    #[test]
    fn lines_keep_terminators() {
        assert_eq!(split_lines("a\r\nb\n\nc"), vec!["a\r\n", "b\n", "\n", "c"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn basic_import() {
        let s = scanner();
        assert_eq!(s.scan_import(r#"#import "foo.glsl""#), import("foo.glsl", None));
        assert_eq!(s.scan_import("#import <foo/bar.glsl>\n"), import("foo/bar.glsl", None));
        assert_eq!(s.scan_import("   #import\t\"foo\"\r\n"), import("foo", None));
        assert_eq!(
            s.scan_import(r#"#import "foo" // lighting"#),
            import("foo", Some("// lighting"))
        );
    }

    #[test]
    fn not_an_import() {
        let s = scanner();
        assert_eq!(s.scan_import("int foo;"), None);
        assert_eq!(s.scan_import("// #import \"foo\""), None);
        assert_eq!(s.scan_import("#include \"foo\""), None);
    }

    #[test]
    fn malformed_import() {
        let s = scanner();
        for line in &[
            "#import",
            "#import path_without_quotes",
            "#import \"foo",
            "#import <foo",
            "#import \"foo>",
            "#import \"\"",
            "#import\"foo\"",
            "#imports \"foo\"",
            "#import \"a>b\"",
            "#import <a\"b>",
        ] {
            assert_eq!(s.scan_import(line), Some(ImportLine::Malformed), "{}", line);
        }
    }

    #[test]
    fn custom_import_keyword() {
        let s = DirectiveScanner::new(&PrepperConfig::default().import_directive("#include"));
        assert_eq!(s.scan_import("#include <foo>"), import("foo", None));
        assert_eq!(s.scan_import("#import <foo>"), None);
    }

    #[test]
    fn once_guard() {
        let s = scanner();
        assert!(s.has_once_guard(&split_lines("#pragma once\nint a;")));
        assert!(s.has_once_guard(&split_lines("\n// header\n  #pragma once  \nint a;")));
        assert!(!s.has_once_guard(&split_lines("int a;\n#pragma once\n")));
        assert!(!s.has_once_guard(&split_lines("#pragma once extra\n")));
        assert!(!s.has_once_guard(&split_lines("")));
    }

    #[test]
    fn named_guard_needs_adjacent_define() {
        let s = scanner();
        let lines = split_lines("#ifndef FOO_H\n#define FOO_H\n#endif\n");
        assert_eq!(s.named_guard(&lines, 0), Some("FOO_H".to_string()));

        let lines = split_lines("#ifndef FOO_H\n\n#define FOO_H\n#endif\n");
        assert_eq!(s.named_guard(&lines, 0), None);

        let lines = split_lines("#ifndef FOO_H\n#define BAR_H\n#endif\n");
        assert_eq!(s.named_guard(&lines, 0), None);

        let lines = split_lines("#ifndef FOO_H");
        assert_eq!(s.named_guard(&lines, 0), None);
    }

    #[test]
    fn guarded_block_nesting() {
        let lines = split_lines(
            "#ifndef A\n#define A\n#ifdef B\nb\n#endif\n#if C\n#endif\na\n#endif\nafter\n",
        );
        assert_eq!(lines[skip_guarded_block(&lines, 0)], "after\n");

        let lines = split_lines("#ifndef A\n#define A\n#ifdef B\n#endif\n");
        assert_eq!(skip_guarded_block(&lines, 0), lines.len());
    }
}
