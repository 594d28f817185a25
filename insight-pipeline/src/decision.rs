use insight_core::CachePolicy;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::path::Path;
use tracing::warn;

/// Decides whether an existing, non-empty cache is reused instead of crawling.
pub trait CacheDecision: Send {
    fn reuse_cache(&mut self, path: &Path, cached: usize) -> bool;
}

/// Always answers the same way; for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub bool);

impl CacheDecision for FixedDecision {
    fn reuse_cache(&mut self, _path: &Path, _cached: usize) -> bool {
        self.0
    }
}

/// Asks on `output` and reads the answer from `input`.
///
/// An empty line or `y` reuses the cache, `n` crawls again, anything else
/// asks again. End of input counts as the default answer.
pub struct PromptDecision<R, W> {
    input: R,
    output: W,
}

impl PromptDecision<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptDecision<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, path: &Path, cached: usize) -> io::Result<bool> {
        writeln!(
            self.output,
            "Found cache file {} with {} comments",
            path.display(),
            cached
        )?;

        loop {
            write!(self.output, "Use cache? (y/n, default y): ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(true);
            }

            match line.trim().to_lowercase().as_str() {
                "" | "y" => return Ok(true),
                "n" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n")?,
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> CacheDecision for PromptDecision<R, W> {
    fn reuse_cache(&mut self, path: &Path, cached: usize) -> bool {
        match self.ask(path, cached) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Cache prompt failed ({}), reusing cache", e);
                true
            }
        }
    }
}

pub fn decision_for_policy(policy: CachePolicy) -> Box<dyn CacheDecision> {
    match policy {
        CachePolicy::Ask => Box::new(PromptDecision::stdio()),
        CachePolicy::Always => Box::new(FixedDecision(true)),
        CachePolicy::Never => Box::new(FixedDecision(false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let reuse = {
            let mut prompt = PromptDecision::new(Cursor::new(input.as_bytes()), &mut output);
            prompt.reuse_cache(Path::new("danmaku_cache.txt"), 42)
        };
        (reuse, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_empty_answer_reuses() {
        let (reuse, output) = answer("\n");
        assert!(reuse);
        assert!(output.contains("danmaku_cache.txt with 42 comments"));
    }

    #[test]
    fn test_yes_and_no() {
        assert!(answer("y\n").0);
        assert!(answer("  Y  \n").0);
        assert!(!answer("n\n").0);
        assert!(!answer("N\n").0);
    }

    #[test]
    fn test_invalid_answer_asks_again() {
        let (reuse, output) = answer("maybe\nyes\nn\n");
        assert!(!reuse);
        assert_eq!(output.matches("Please answer y or n").count(), 2);
        assert_eq!(output.matches("Use cache?").count(), 3);
    }

    #[test]
    fn test_end_of_input_reuses() {
        assert!(answer("").0);
        assert!(answer("what\n").0);
    }

    #[test]
    fn test_fixed_decision() {
        assert!(FixedDecision(true).reuse_cache(Path::new("c.txt"), 1));
        assert!(!FixedDecision(false).reuse_cache(Path::new("c.txt"), 1));
    }

    #[test]
    fn test_policy_mapping() {
        assert!(decision_for_policy(CachePolicy::Always).reuse_cache(Path::new("c.txt"), 1));
        assert!(!decision_for_policy(CachePolicy::Never).reuse_cache(Path::new("c.txt"), 1));
    }
}
