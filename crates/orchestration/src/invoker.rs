//! Blocking invocation of the external numerical model.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Environment variables overridden so the model resolves its libraries from
/// the bundled runtime instead of whatever is installed on the host.
pub const LIBRARY_PATH_VARS: [&str; 2] = ["R_LIBS", "R_LIBS_USER"];

#[derive(Debug, Error)]
pub enum InvokerError {
    #[error("failed to launch model process {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// The model exited with a nonzero status. Its captured output is
    /// surfaced verbatim; the model is a black box and its errors are not
    /// interpreted here.
    #[error("model process failed ({status})\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    Failed {
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("no working directory: container path {0} has no parent")]
    NoWorkingDirectory(PathBuf),
}

/// How to launch the external model.
#[derive(Debug, Clone)]
pub struct ModelRuntime {
    /// The interpreter or executable that runs the model.
    pub executable: PathBuf,
    /// Flags passed before the script, e.g. `--vanilla`.
    pub run_flags: Vec<String>,
    /// The model script, passed as the first argument after the flags.
    pub script: Option<PathBuf>,
    /// Bundled library directory exported via [`LIBRARY_PATH_VARS`].
    pub library_dir: Option<PathBuf>,
    /// Working directory for the process. Defaults to the container's
    /// parent, the processing directory.
    pub working_dir: Option<PathBuf>,
}

impl ModelRuntime {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            run_flags: Vec::new(),
            script: None,
            library_dir: None,
            working_dir: None,
        }
    }

    /// Run the model against a prepared container and block until it exits.
    ///
    /// The container path is the sole positional argument; everything else
    /// the model needs it reads from inside the container. The call is the
    /// synchronization point that hands container ownership back to the
    /// orchestration.
    pub fn invoke(&self, container_path: &Path) -> Result<(), InvokerError> {
        let working_dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => container_path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| InvokerError::NoWorkingDirectory(container_path.to_path_buf()))?,
        };

        let mut command = Command::new(&self.executable);
        command.args(&self.run_flags);
        if let Some(script) = &self.script {
            command.arg(script);
        }
        command.arg(container_path);
        command.current_dir(&working_dir);
        if let Some(library_dir) = &self.library_dir {
            for variable in LIBRARY_PATH_VARS {
                command.env(variable, library_dir);
            }
        }

        info!(
            executable = %self.executable.display(),
            container = %container_path.display(),
            working_dir = %working_dir.display(),
            "launching model process"
        );
        let output = command.output().map_err(|source| InvokerError::Launch {
            program: self.executable.display().to_string(),
            source,
        })?;
        debug!(status = %output.status, "model process exited");

        if !output.status.success() {
            return Err(InvokerError::Failed {
                status: output.status.to_string(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_failure_names_program() {
        let runtime = ModelRuntime::new("/nonexistent/model-binary");
        let error = runtime.invoke(Path::new("/tmp/sim.x3df")).unwrap_err();
        assert!(matches!(error, InvokerError::Launch { .. }));
        assert!(error.to_string().contains("/nonexistent/model-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_surfaces_output() {
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("sim.x3df");
        std::fs::create_dir(&container).unwrap();

        let mut runtime = ModelRuntime::new("sh");
        runtime.run_flags = vec!["-c".to_string(), "echo oops >&2; exit 3".to_string()];
        let error = runtime.invoke(&container).unwrap_err();
        match error {
            InvokerError::Failed { stderr, .. } => assert!(stderr.contains("oops")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_passes_container_as_argument() {
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("sim.x3df");
        std::fs::create_dir(&container).unwrap();
        let witness = dir.path().join("seen");

        // The container path arrives as $0 of the -c script.
        let mut runtime = ModelRuntime::new("sh");
        runtime.run_flags = vec![
            "-c".to_string(),
            format!("echo \"$0\" > {}", witness.display()),
        ];
        runtime.invoke(&container).unwrap();

        let seen = std::fs::read_to_string(&witness).unwrap();
        assert_eq!(seen.trim(), container.display().to_string());
    }
}
