//! Shader compilers only ever see the flattened output of the `Expander`,
//! so the line numbers in their error logs point into text which doesn't exist
//! on disk. The log output format is also vendor-specific.
//!
//! This module provides `compile_expanded`, which hands the expanded text to a
//! user-provided compiler callback, and then parses its output, mapping
//! locations in the flattened text back to the file and line they came from.
//!
//! ```rust,no_run
//! use import_prepper::compiler_log::{compile_expanded, ShaderCompilerOutput};
//!
//! let expanded = import_prepper::process_file(
//!     "shaders/sprite.glsl",
//!     &mut import_prepper::FileIncludeProvider,
//! )?;
//!
//! let compiled = compile_expanded(&expanded, |source| {
//!     // Hand `source` over to glslang, shaderc, sokol-shdc...
//!     ShaderCompilerOutput {
//!         artifact: Some(source.len()),
//!         log: Some("ERROR: 0:12: 'foo' : undeclared identifier".to_string()),
//!     }
//! });
//!
//! if let Some(log) = compiled.log {
//!     log::warn!("Shader compiler output: {}", log);
//! }
//! # Ok::<(), import_prepper::PrepperError>(())
//! ```

use regex::{Captures, Regex};

use crate::{ExpandedText, LineOrigin};

lazy_static::lazy_static! {
    static ref GLSLANG_ERROR_RE: Regex = Regex::new(r"(?m)^(ERROR|WARNING):\s*(\d+):(\d+)").unwrap();
}

lazy_static::lazy_static! {
    static ref NV_ERROR_RE: Regex = Regex::new(r"(?m)^(\d+)\((\d+)\)").unwrap();
}

/// User-defined output of a shader compiler, along with an info log.
pub struct ShaderCompilerOutput<Artifact> {
    pub artifact: Artifact,
    pub log: Option<String>,
}

/// Compile `expanded` via a user-provided shader compiler callback.
///
/// `Artifact` is a user-defined output of the shader compiler, e.g. `Option<GLuint>`.
///
/// `compiler_fn` receives the flattened source text and creates a `ShaderCompilerOutput`.
/// Its log is returned with locations remapped by `remap_compiler_log`.
pub fn compile_expanded<Artifact, CompilerFn>(
    expanded: &ExpandedText,
    compiler_fn: CompilerFn,
) -> ShaderCompilerOutput<Artifact>
where
    CompilerFn: FnOnce(&str) -> ShaderCompilerOutput<Artifact>,
{
    let compiler_output = compiler_fn(&expanded.text);

    ShaderCompilerOutput {
        artifact: compiler_output.artifact,
        log: compiler_output
            .log
            .map(|log| remap_compiler_log(&log, expanded)),
    }
}

/// Rewrite `ERROR: 0:<line>` (glslang, Intel, AMD) and `0(<line>)` (NVIDIA)
/// locations in `log` as `<file>(<line>)` of the original source.
///
/// Locations on generated lines, or past the end of the text, are kept as-is.
pub fn remap_compiler_log(log: &str, expanded: &ExpandedText) -> String {
    let source_location = |line: &str| -> Option<String> {
        let line = line.parse::<usize>().ok()?;
        match expanded.origin(line)? {
            LineOrigin::Source { file, line } => Some(format!("{}({})", file, line)),
            LineOrigin::Generated => None,
        }
    };

    let log = GLSLANG_ERROR_RE.replace_all(log, |captures: &Captures| {
        match source_location(&captures[3]) {
            Some(location) => format!("{}: {}", &captures[1], location),
            None => captures[0].to_string(),
        }
    });

    NV_ERROR_RE
        .replace_all(&log, |captures: &Captures| {
            source_location(&captures[2]).unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryIncludeProvider;

    fn expanded() -> ExpandedText {
        let mut provider: MemoryIncludeProvider = [
            ("main.glsl", "#version 430\n#import \"lib.glsl\"\nvoid main() {}\n"),
            ("lib.glsl", "float lib() {\n    return x;\n}\n"),
        ]
        .into_iter()
        .collect();

        crate::process_file("main.glsl", &mut provider).unwrap()
    }

    #[test]
    fn remap_glslang_log() {
        let expanded = expanded();
        let line = expanded.text.lines().position(|l| l.contains("return x")).unwrap() + 1;

        let log = format!("ERROR: 0:{}: 'x' : undeclared identifier\n", line);
        assert_eq!(
            remap_compiler_log(&log, &expanded),
            "ERROR: lib.glsl(2): 'x' : undeclared identifier\n"
        );
    }

    #[test]
    fn remap_nv_log() {
        let expanded = expanded();
        let line = expanded.text.lines().position(|l| l.contains("main()")).unwrap() + 1;

        let log = format!("0({}) : error C1008: undefined variable", line);
        assert_eq!(
            remap_compiler_log(&log, &expanded),
            "main.glsl(3) : error C1008: undefined variable"
        );
    }

    #[test]
    fn generated_lines_untouched() {
        let expanded = expanded();
        let marker = expanded.text.lines().position(|l| l.starts_with("// BEGIN")).unwrap() + 1;

        let log = format!("ERROR: 0:{}: oops\nERROR: 0:999: oops", marker);
        assert_eq!(remap_compiler_log(&log, &expanded), log);
    }

    #[test]
    fn compile_remaps_log() {
        let expanded = expanded();
        let output = compile_expanded(&expanded, |source| {
            assert!(source.contains("float lib()"));
            ShaderCompilerOutput {
                artifact: 7u32,
                log: Some("ERROR: 0:1: bad version".to_string()),
            }
        });

        assert_eq!(output.artifact, 7);
        assert_eq!(output.log.as_deref(), Some("ERROR: main.glsl(1): bad version"));
    }
}
