//! Path and content modifiers and the chain that runs them.

use std::fmt;
use std::io::{self, BufWriter, Read, Write};
use std::sync::Arc;
use std::thread;

use crate::context::Context;
use crate::error::ModifyError;
use crate::pipe::{PipeWriter, pipe};

/// Rewrites the destination path of a file.
pub trait PathModifier: Send + Sync {
    /// Map a source-relative path to its new relative path.
    fn modify_path(&self, path: &str) -> String;
}

/// Transforms file content.
///
/// Implementations read their whole input from `input` and write the result
/// to `output`. They may stop reading early; upstream stages notice and stop.
pub trait ContentModifier: Send + Sync {
    /// Transform `input` into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`ModifyError`] on I/O failures, unresolvable links or any
    /// stage-specific failure.
    fn modify_content(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        ctx: &Context<'_>,
    ) -> Result<(), ModifyError>;
}

/// Modifier with both path and content capabilities.
pub trait Modifier: PathModifier + ContentModifier {}

impl<T: PathModifier + ContentModifier> Modifier for T {}

/// One element of a [`ModifierChain`], declaring its capabilities.
#[derive(Clone)]
pub enum Stage {
    /// Only rewrites paths.
    Path(Arc<dyn PathModifier>),
    /// Only transforms content.
    Content(Arc<dyn ContentModifier>),
    /// Rewrites paths and transforms content.
    Both(Arc<dyn Modifier>),
}

impl Stage {
    /// Path-only stage.
    pub fn path(modifier: impl PathModifier + 'static) -> Self {
        Self::Path(Arc::new(modifier))
    }

    /// Content-only stage.
    pub fn content(modifier: impl ContentModifier + 'static) -> Self {
        Self::Content(Arc::new(modifier))
    }

    /// Stage with both capabilities.
    pub fn both(modifier: impl Modifier + 'static) -> Self {
        Self::Both(Arc::new(modifier))
    }

    fn as_path(&self) -> Option<&dyn PathModifier> {
        match self {
            Self::Path(m) => Some(m.as_ref()),
            Self::Both(m) => Some(m.as_ref()),
            Self::Content(_) => None,
        }
    }

    fn as_content(&self) -> Option<&dyn ContentModifier> {
        match self {
            Self::Content(m) => Some(m.as_ref()),
            Self::Both(m) => Some(m.as_ref()),
            Self::Path(_) => None,
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(_) => f.write_str("Stage::Path"),
            Self::Content(_) => f.write_str("Stage::Content"),
            Self::Both(_) => f.write_str("Stage::Both"),
        }
    }
}

/// Ordered list of stages applied to every file of a rule.
#[derive(Debug, Clone, Default)]
pub struct ModifierChain {
    stages: Vec<Stage>,
}

impl ModifierChain {
    /// Create an empty chain (identity path, plain copy content).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    #[must_use]
    pub fn with(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a stage in place.
    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Fold every path-capable stage over `path`, left to right.
    #[must_use]
    pub fn modify_path(&self, path: &str) -> String {
        self.stages
            .iter()
            .filter_map(Stage::as_path)
            .fold(path.to_owned(), |path, stage| stage.modify_path(&path))
    }

    /// Stream `input` through every content-capable stage into `output`.
    ///
    /// Stages are connected by bounded pipes. Every stage but the last runs on
    /// its own scoped thread; the last one runs on the calling thread and
    /// writes to `output` directly. A failing stage closes its downstream
    /// pipe with the error, so the whole chain unwinds. The reported error
    /// is the one of the earliest stage that failed for a reason other than
    /// its consumer going away.
    ///
    /// # Errors
    ///
    /// Returns the root-cause [`ModifyError`] of the chain.
    pub fn modify_content(
        &self,
        input: Box<dyn Read + Send>,
        output: &mut dyn Write,
        ctx: &Context<'_>,
    ) -> Result<(), ModifyError> {
        let stages: Vec<&dyn ContentModifier> =
            self.stages.iter().filter_map(Stage::as_content).collect();

        let Some((last, upstream)) = stages.split_last() else {
            let mut input = input;
            io::copy(&mut input, output)?;
            return Ok(());
        };

        thread::scope(|scope| {
            let mut input = input;
            let mut handles = Vec::with_capacity(upstream.len());

            for &stage in upstream {
                let (reader, writer) = pipe();
                let mut stage_input = std::mem::replace(&mut input, Box::new(reader));
                handles.push(scope.spawn(move || run_stage(stage, &mut *stage_input, writer, ctx)));
            }

            let last_result = last.modify_content(&mut *input, output, ctx);
            // Unblock upstream writers before joining them.
            drop(input);

            let mut results: Vec<Result<(), ModifyError>> = handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(ModifyError::other("content stage panicked")))
                })
                .collect();
            results.push(last_result);
            root_cause(results)
        })
    }
}

/// Run one upstream stage, closing its output pipe according to the outcome.
fn run_stage(
    stage: &dyn ContentModifier,
    input: &mut dyn Read,
    writer: PipeWriter,
    ctx: &Context<'_>,
) -> Result<(), ModifyError> {
    let mut output = BufWriter::new(writer);
    let result = stage
        .modify_content(input, &mut output, ctx)
        .and_then(|()| output.flush().map_err(ModifyError::from));

    if let Err(err) = &result {
        let (writer, _) = output.into_parts();
        writer.close_with_error(io::Error::other(err.to_string()));
    }
    result
}

/// Pick the error to report from per-stage results (in stage order).
///
/// Broken pipes of upstream stages only mean a later stage stopped reading
/// and are ignored. The last stage writes to the caller's writer, so all of
/// its errors count.
fn root_cause(results: Vec<Result<(), ModifyError>>) -> Result<(), ModifyError> {
    let last = results.len().saturating_sub(1);
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Err(err) if i < last && err.is_broken_pipe() => {}
            Err(err) => return Err(err),
            Ok(()) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::bundle::tests::with_context;

    /// Appends a suffix to paths.
    pub(crate) struct Suffix(pub &'static str);

    impl PathModifier for Suffix {
        fn modify_path(&self, path: &str) -> String {
            format!("{path}{}", self.0)
        }
    }

    /// Uppercases ASCII content.
    pub(crate) struct Upper;

    impl ContentModifier for Upper {
        fn modify_content(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            _ctx: &Context<'_>,
        ) -> Result<(), ModifyError> {
            let mut buf = [0u8; 7];
            loop {
                let n = input.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                output.write_all(&buf[..n].to_ascii_uppercase())?;
            }
        }
    }

    /// Wraps content in brackets; renames `.txt` to `.out`.
    struct Bracket;

    impl PathModifier for Bracket {
        fn modify_path(&self, path: &str) -> String {
            path.strip_suffix(".txt")
                .map_or_else(|| path.to_owned(), |stem| format!("{stem}.out"))
        }
    }

    impl ContentModifier for Bracket {
        fn modify_content(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            _ctx: &Context<'_>,
        ) -> Result<(), ModifyError> {
            output.write_all(b"[")?;
            io::copy(input, output)?;
            output.write_all(b"]")?;
            Ok(())
        }
    }

    /// Fails after reading some input.
    struct Fail(&'static str);

    impl ContentModifier for Fail {
        fn modify_content(
            &self,
            input: &mut dyn Read,
            _output: &mut dyn Write,
            _ctx: &Context<'_>,
        ) -> Result<(), ModifyError> {
            let mut buf = [0u8; 1];
            input.read_exact(&mut buf)?;
            Err(ModifyError::other(self.0))
        }
    }

    /// Ignores its input entirely.
    struct Constant(&'static str);

    impl ContentModifier for Constant {
        fn modify_content(
            &self,
            _input: &mut dyn Read,
            output: &mut dyn Write,
            _ctx: &Context<'_>,
        ) -> Result<(), ModifyError> {
            output.write_all(self.0.as_bytes())?;
            Ok(())
        }
    }

    fn run(chain: &ModifierChain, input: &[u8]) -> Result<String, ModifyError> {
        with_context(|ctx| {
            let mut out = Vec::new();
            chain.modify_content(Box::new(Cursor::new(input.to_vec())), &mut out, ctx)?;
            Ok(String::from_utf8(out).unwrap())
        })
    }

    #[test]
    fn test_modify_path_folds_left_to_right() {
        let chain = ModifierChain::new()
            .with(Stage::path(Suffix(".a")))
            .with(Stage::content(Upper))
            .with(Stage::both(Bracket))
            .with(Stage::path(Suffix(".b")));

        assert_eq!(chain.modify_path("file.txt"), "file.txt.a.b");
        assert_eq!(chain.modify_path("file"), "file.a.b");

        let chain = ModifierChain::new().with(Stage::both(Bracket)).with(Stage::path(Suffix(".gz")));
        assert_eq!(chain.modify_path("notes.txt"), "notes.out.gz");
    }

    #[test]
    fn test_empty_chain_copies() {
        let chain = ModifierChain::new().with(Stage::path(Suffix(".x")));

        assert_eq!(run(&chain, b"as is").unwrap(), "as is");
    }

    #[test]
    fn test_content_stages_run_in_order() {
        let chain = ModifierChain::new()
            .with(Stage::both(Bracket))
            .with(Stage::content(Upper))
            .with(Stage::both(Bracket));

        assert_eq!(run(&chain, b"hello").unwrap(), "[[HELLO]]");
    }

    #[test]
    fn test_large_input_streams_through() {
        let chain = ModifierChain::new()
            .with(Stage::content(Upper))
            .with(Stage::content(Upper))
            .with(Stage::content(Upper));
        let input = "abc".repeat(100_000);

        assert_eq!(run(&chain, input.as_bytes()).unwrap(), "ABC".repeat(100_000));
    }

    #[test]
    fn test_failing_first_stage_is_reported() {
        let chain = ModifierChain::new()
            .with(Stage::content(Fail("first broke")))
            .with(Stage::content(Upper))
            .with(Stage::both(Bracket));

        let err = run(&chain, b"content").unwrap_err();
        assert_eq!(err.to_string(), "first broke");
    }

    #[test]
    fn test_failing_middle_stage_is_reported() {
        let chain = ModifierChain::new()
            .with(Stage::content(Upper))
            .with(Stage::content(Fail("middle broke")))
            .with(Stage::both(Bracket));
        let input = "x".repeat(100_000);

        let err = run(&chain, input.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "middle broke");
    }

    #[test]
    fn test_stage_ignoring_input_is_not_an_error() {
        let chain = ModifierChain::new()
            .with(Stage::content(Upper))
            .with(Stage::content(Constant("fixed")));
        let input = "x".repeat(100_000);

        assert_eq!(run(&chain, input.as_bytes()).unwrap(), "fixed");
    }

    #[test]
    fn test_root_cause_skips_upstream_broken_pipes() {
        let results = vec![
            Err(ModifyError::from(io::Error::from(io::ErrorKind::BrokenPipe))),
            Err(ModifyError::other("real")),
            Err(ModifyError::from(io::Error::other("upstream failed"))),
        ];
        assert_eq!(root_cause(results).unwrap_err().to_string(), "real");

        let results = vec![
            Err(ModifyError::from(io::Error::from(io::ErrorKind::BrokenPipe))),
            Ok(()),
        ];
        assert!(root_cause(results).is_ok());

        let results = vec![
            Ok(()),
            Err(ModifyError::from(io::Error::from(io::ErrorKind::BrokenPipe))),
        ];
        assert!(root_cause(results).unwrap_err().is_broken_pipe());
    }
}
