//! SentencePiece learner.
//!
//! Training is delegated to the external `spm_train` program. Ingested text
//! is staged in a private temporary directory, which is deleted when the
//! learner is dropped or once training finishes, whether it succeeded or not.

use super::learner::{ensure_ingesting, LearnerState, ModelKind, SubwordLearner};
use joinery_core::{PreTokenize, Result, TokenizerError};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Environment variable overriding the trainer program.
pub const TRAINER_ENV: &str = "SPM_TRAIN_BIN";
/// Trainer program looked up on `PATH` by default.
pub const DEFAULT_TRAINER: &str = "spm_train";
/// Option naming the trainer program; never forwarded to it.
pub const TRAINER_OPTION: &str = "trainer_binary";

const INPUT_FILE: &str = "input.txt";
const MODEL_PREFIX: &str = "model";
const RESERVED_OPTIONS: &[&str] = &["input", "model_prefix"];

struct Staging {
    dir: TempDir,
    input: BufWriter<File>,
    lines: u64,
}

impl Staging {
    fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("joinery-spm-")
            .tempdir()
            .map_err(|err| TokenizerError::io(std::env::temp_dir(), err))?;
        let input_path = dir.path().join(INPUT_FILE);
        let file = File::create(&input_path).map_err(|err| TokenizerError::io(&input_path, err))?;
        Ok(Self {
            dir,
            input: BufWriter::new(file),
            lines: 0,
        })
    }

    fn input_path(&self) -> PathBuf {
        self.dir.path().join(INPUT_FILE)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let path = self.input_path();
        writeln!(self.input, "{}", line).map_err(|err| TokenizerError::io(path, err))?;
        self.lines += 1;
        Ok(())
    }
}

/// SentencePiece learner backed by the `spm_train` program.
pub struct SpmLearner {
    /// Options forwarded as `--key=value`
    options: BTreeMap<String, String>,
    trainer: PathBuf,
    staging: Option<Staging>,
    state: LearnerState,
}

impl SpmLearner {
    /// Create a learner with trainer options such as `vocab_size` or
    /// `character_coverage`.
    ///
    /// The trainer program is taken from the `trainer_binary` option, then the
    /// `SPM_TRAIN_BIN` environment variable, then `spm_train` on `PATH`.
    pub fn new(mut options: BTreeMap<String, String>) -> Result<Self> {
        if let Some(key) = RESERVED_OPTIONS.iter().find(|key| options.contains_key(**key)) {
            return Err(TokenizerError::InvalidConfig(format!(
                "the '{}' option is managed by the learner",
                key
            )));
        }
        let trainer = options
            .remove(TRAINER_OPTION)
            .or_else(|| std::env::var(TRAINER_ENV).ok())
            .unwrap_or_else(|| DEFAULT_TRAINER.to_string());

        Ok(Self {
            options,
            trainer: PathBuf::from(trainer),
            staging: Some(Staging::create()?),
            state: LearnerState::Ingesting,
        })
    }

    /// Options forwarded to the trainer.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Program that will be run by [`SubwordLearner::learn`].
    pub fn trainer(&self) -> &Path {
        &self.trainer
    }

    /// Number of lines staged so far.
    pub fn staged_lines(&self) -> u64 {
        self.staging.as_ref().map_or(0, |s| s.lines)
    }

    /// Staging directory, while it exists.
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(|s| s.dir.path())
    }

    /// Arguments passed to the trainer.
    pub fn trainer_args(&self, input: &Path, model_prefix: &Path) -> Vec<String> {
        let mut args = Vec::with_capacity(self.options.len() + 2);
        args.push(format!("--input={}", input.display()));
        args.push(format!("--model_prefix={}", model_prefix.display()));
        for (key, value) in &self.options {
            args.push(format!("--{}={}", key, value));
        }
        args
    }

    fn staging_mut(&mut self) -> Result<&mut Staging> {
        ensure_ingesting(self.state)?;
        self.staging
            .as_mut()
            .ok_or_else(|| TokenizerError::InvalidState("staging area is gone".into()))
    }

    fn run_trainer(&self, staging: &Staging, out: &mut dyn Write, verbose: bool) -> Result<()> {
        let input = staging.input_path();
        let prefix = staging.dir.path().join(MODEL_PREFIX);
        let args = self.trainer_args(&input, &prefix);

        tracing::debug!("Running {} {}", self.trainer.display(), args.join(" "));
        let output = Command::new(&self.trainer)
            .args(&args)
            .output()
            .map_err(|err| TokenizerError::io(&self.trainer, err))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if verbose {
            for line in stderr.lines() {
                tracing::info!("{}", line);
            }
        }
        if !output.status.success() {
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(TokenizerError::Training(format!(
                "{} exited with {}: {}",
                self.trainer.display(),
                output.status,
                tail.join(" | ")
            )));
        }

        let model_path = prefix.with_extension("model");
        let mut model = File::open(&model_path).map_err(|err| {
            TokenizerError::Training(format!(
                "trainer did not produce {}: {}",
                model_path.display(),
                err
            ))
        })?;
        std::io::copy(&mut model, out).map_err(|err| TokenizerError::io(&model_path, err))?;
        Ok(())
    }
}

impl SubwordLearner for SpmLearner {
    fn kind(&self) -> ModelKind {
        ModelKind::SentencePiece
    }

    fn state(&self) -> LearnerState {
        self.state
    }

    /// Stage a token as a line of its own.
    fn ingest_token(&mut self, token: &str) -> Result<()> {
        self.staging_mut()?.write_line(token)
    }

    /// Stage a whole line; with a pre-tokenizer, token surfaces are joined
    /// with single spaces.
    fn ingest_line(&mut self, line: &str, pre_tokenizer: Option<&dyn PreTokenize>) -> Result<usize> {
        let (text, tokens) = match pre_tokenizer {
            Some(pre_tokenizer) => {
                let surfaces: Vec<String> = pre_tokenizer
                    .pre_tokenize(line)
                    .into_iter()
                    .filter(|token| !token.is_placeholder && !token.is_empty())
                    .map(|token| token.surface)
                    .collect();
                (surfaces.join(" "), surfaces.len())
            }
            None => (line.to_string(), line.split_whitespace().count()),
        };
        if text.trim().is_empty() {
            return Ok(0);
        }
        self.staging_mut()?.write_line(&text)?;
        Ok(tokens)
    }

    fn learn(&mut self, out: &mut dyn Write, verbose: bool) -> Result<()> {
        ensure_ingesting(self.state)?;
        self.state = LearnerState::Learned;

        // Dropping the staging area at the end of this scope removes the
        // directory, on every path.
        let Some(mut staging) = self.staging.take() else {
            return Err(TokenizerError::InvalidState("staging area is gone".into()));
        };
        let input_path = staging.input_path();
        staging
            .input
            .flush()
            .map_err(|err| TokenizerError::io(&input_path, err))?;
        if staging.lines == 0 {
            return Err(TokenizerError::Training("no training data was ingested".into()));
        }

        if verbose {
            tracing::info!(
                "Training SentencePiece model on {} lines with {}",
                staging.lines,
                self.trainer.display()
            );
        }
        self.run_trainer(&staging, out, verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reserved_options_rejected() {
        let err = SpmLearner::new(options(&[("input", "x.txt")])).err().unwrap();
        assert!(matches!(err, TokenizerError::InvalidConfig(_)));
    }

    #[test]
    fn test_trainer_args() {
        let learner = SpmLearner::new(options(&[
            ("vocab_size", "17"),
            ("character_coverage", "0.98"),
            (TRAINER_OPTION, "/opt/spm/bin/spm_train"),
        ]))
        .unwrap();
        assert_eq!(learner.trainer(), Path::new("/opt/spm/bin/spm_train"));
        let args = learner.trainer_args(Path::new("/tmp/in.txt"), Path::new("/tmp/model"));
        assert_eq!(
            args,
            vec![
                "--input=/tmp/in.txt",
                "--model_prefix=/tmp/model",
                "--character_coverage=0.98",
                "--vocab_size=17",
            ]
        );
    }

    #[test]
    fn test_staging_counts_lines() {
        let mut learner = SpmLearner::new(BTreeMap::new()).unwrap();
        let mut input: &[u8] = b"hello world\n\n  \nagain\n";
        let stats = learner.ingest(&mut input, None).unwrap();
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.tokens, 3);
        assert_eq!(learner.staged_lines(), 2);
    }

    #[test]
    fn test_staging_dir_removed_on_drop() {
        let learner = SpmLearner::new(BTreeMap::new()).unwrap();
        let dir = learner.staging_dir().unwrap().to_path_buf();
        assert!(dir.exists());
        drop(learner);
        assert!(!dir.exists());
    }

    #[test]
    fn test_learn_without_data_fails_and_cleans_up() {
        let mut learner = SpmLearner::new(options(&[(TRAINER_OPTION, "/bin/true")])).unwrap();
        let dir = learner.staging_dir().unwrap().to_path_buf();
        let err = learner.learn(&mut Vec::new(), false).unwrap_err();
        assert!(matches!(err, TokenizerError::Training(_)));
        assert!(!dir.exists());
        assert_eq!(learner.state(), LearnerState::Learned);
    }

    #[test]
    fn test_missing_trainer_is_io_error() {
        let mut learner = SpmLearner::new(options(&[(
            TRAINER_OPTION,
            "/nonexistent/bin/spm_train",
        )]))
        .unwrap();
        learner.ingest_token("hello").unwrap();
        let err = learner.learn(&mut Vec::new(), false).unwrap_err();
        assert!(matches!(err, TokenizerError::Io { .. }));
    }

    #[cfg(unix)]
    fn fake_trainer(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake_spm_train.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_learn_runs_trainer_and_copies_model() {
        let bin_dir = tempfile::tempdir().unwrap();
        // Writes its arguments and the staged input into <prefix>.model
        let script = fake_trainer(
            bin_dir.path(),
            r#"for arg in "$@"; do
  case "$arg" in
    --input=*) input="${arg#--input=}" ;;
    --model_prefix=*) prefix="${arg#--model_prefix=}" ;;
  esac
done
{ echo "$@" | sed 's/--input=[^ ]* //; s/--model_prefix=[^ ]* //'; cat "$input"; } > "$prefix.model""#,
        );

        let mut learner = SpmLearner::new(options(&[
            ("vocab_size", "17"),
            (TRAINER_OPTION, script.to_str().unwrap()),
        ]))
        .unwrap();
        learner.ingest_token("hello").unwrap();
        learner.ingest_line("big world", None).unwrap();
        let staging = learner.staging_dir().unwrap().to_path_buf();

        let mut out = Vec::new();
        learner.learn(&mut out, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "--vocab_size=17\nhello\nbig world\n"
        );
        assert!(!staging.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_trainer_reports_stderr() {
        let bin_dir = tempfile::tempdir().unwrap();
        let script = fake_trainer(bin_dir.path(), "echo 'bad vocab_size' >&2\nexit 3");
        let mut learner =
            SpmLearner::new(options(&[(TRAINER_OPTION, script.to_str().unwrap())])).unwrap();
        learner.ingest_token("hello").unwrap();
        let err = learner.learn(&mut Vec::new(), false).unwrap_err();
        match err {
            TokenizerError::Training(msg) => assert!(msg.contains("bad vocab_size")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
