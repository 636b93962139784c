//! Legacy external procedure runner.
use super::{Measurer, ProcedureOutput};
use crate::error::{ExecutionError, MeasureResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `program [args..] <image>` and returns its stdout as a transcript.
/// The child is killed when it outlives `timeout`; a non-zero exit status is
/// an execution failure carrying stderr.
#[derive(Clone, Debug)]
pub struct ScriptMeasurer {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    name: String,
}

impl ScriptMeasurer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        let name = args
            .last()
            .or(Some(&program))
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());
        Self {
            program,
            args,
            working_dir: None,
            timeout: Duration::from_secs(120),
            name,
        }
    }

    /// `command[0]` is the program, the rest are leading arguments.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn spawn(&self, image: &Path) -> Result<Child, ExecutionError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.spawn().map_err(|source| ExecutionError::Spawn {
            program: self.program.clone(),
            source,
        })
    }

    pub fn run(&self, image: &Path) -> Result<String, ExecutionError> {
        let mut child = self.spawn(image)?;
        // Drain pipes on helper threads so a chatty child cannot block.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    log::warn!("{}: killed after {:?}", self.name, self.timeout);
                    return Err(ExecutionError::Timeout(self.timeout));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(ExecutionError::Crashed(e.to_string())),
            }
        };

        let collect = |h: Option<thread::JoinHandle<String>>| {
            h.and_then(|h| h.join().ok()).unwrap_or_default()
        };
        let out = collect(stdout);
        let err = collect(stderr);
        if !status.success() {
            return Err(ExecutionError::NonZeroExit {
                code: status.code(),
                stderr: err.trim().to_string(),
            });
        }
        log::debug!("{}: {} bytes of output", self.name, out.len());
        Ok(out)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

impl Measurer for ScriptMeasurer {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, image: &Path) -> MeasureResult<ProcedureOutput> {
        Ok(ProcedureOutput::Transcript(self.run(image)?))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ScriptMeasurer {
        ScriptMeasurer::new("sh", vec!["-c".into(), script.into(), "measure.sh".into()])
    }

    #[test]
    fn captures_stdout_and_passes_image() {
        let m = sh("echo \"Finale Höhe: 7.5 cm\"; echo \"$1\"");
        let out = m.run(Path::new("/tmp/piece.jpg")).unwrap();
        assert!(out.contains("Finale Höhe: 7.5 cm"));
        assert!(out.contains("/tmp/piece.jpg"));
        assert_eq!(m.name(), "measure.sh");
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let err = sh("echo boom >&2; exit 3").run(Path::new("x.jpg")).unwrap_err();
        match err {
            ExecutionError::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn slow_child_is_killed() {
        let m = sh("sleep 5").with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = m.run(Path::new("x.jpg")).unwrap_err();
        assert!(matches!(err, ExecutionError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let m = ScriptMeasurer::new("/nonexistent/measure-bin", Vec::new());
        assert!(matches!(
            m.run(Path::new("x.jpg")),
            Err(ExecutionError::Spawn { .. })
        ));
    }
}
