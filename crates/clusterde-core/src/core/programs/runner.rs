use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// Exit status of an external program run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Launches external programs on behalf of the energy calculator.
///
/// The trait sits between the objective function and the operating system so that
/// tests can substitute a runner that never spawns a process.
pub trait ProgramRunner: Sync {
    /// Resolves `name` to an executable path.
    ///
    /// Names containing a path separator are checked directly; bare names are
    /// searched for on `PATH`.
    fn locate(&self, name: &str) -> Option<PathBuf> {
        locate_executable(name)
    }

    /// Runs `executable input_file` inside `workdir` with stdout and stderr merged
    /// into `log`, blocking until the program exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be created or the process cannot be spawned.
    fn run(
        &self,
        executable: &Path,
        input: &Path,
        log: &Path,
        workdir: &Path,
    ) -> io::Result<RunStatus>;
}

/// Runs programs as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubprocessRunner;

impl ProgramRunner for SubprocessRunner {
    fn run(
        &self,
        executable: &Path,
        input: &Path,
        log: &Path,
        workdir: &Path,
    ) -> io::Result<RunStatus> {
        let stdout = File::create(log)?;
        let stderr = stdout.try_clone()?;
        let input_arg = input.file_name().map(Path::new).unwrap_or(input);

        debug!(
            executable = %executable.display(),
            input = %input_arg.display(),
            workdir = %workdir.display(),
            "Launching external program."
        );
        let status = Command::new(executable)
            .arg(input_arg)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()?;
        trace!(code = ?status.code(), "External program exited.");

        Ok(RunStatus {
            code: status.code(),
        })
    }
}

/// Finds an executable by name, the way a shell would.
///
/// The returned path is absolute, so it stays valid when the program is later
/// launched from a different working directory.
pub fn locate_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    let found = if candidate.components().count() > 1 {
        is_executable(candidate).then(|| candidate.to_path_buf())
    } else {
        let path_var = env::var_os("PATH")?;
        env::split_paths(&path_var)
            .map(|dir| dir.join(name))
            .find(|path| is_executable(path))
    }?;
    std::path::absolute(&found).ok()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_success_requires_exit_code_zero() {
        assert!(RunStatus::from_code(0).success());
        assert!(!RunStatus::from_code(1).success());
        assert!(!RunStatus { code: None }.success());
    }

    #[test]
    fn locate_executable_rejects_missing_programs() {
        assert_eq!(locate_executable("surely-not-a-real-qc-program-42"), None);
        assert_eq!(locate_executable("/nonexistent/dir/orca"), None);
    }

    #[cfg(unix)]
    #[test]
    fn locate_executable_accepts_explicit_executable_path() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("fake-orca");
        std::fs::write(&exe, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(locate_executable(exe.to_str().unwrap()), Some(exe.clone()));

        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(locate_executable(exe.to_str().unwrap()), None);
    }

    #[cfg(unix)]
    #[test]
    fn relative_executable_path_resolves_to_absolute() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::Builder::new()
            .prefix("locate-")
            .tempdir_in(".")
            .unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let exe = bin.join("fake-orca");
        std::fs::write(&exe, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(exe.is_relative());

        let located = locate_executable(exe.to_str().unwrap()).unwrap();

        assert!(located.is_absolute());
        assert!(located.ends_with("bin/fake-orca"));
        assert!(is_executable(&located));
    }

    #[cfg(unix)]
    #[test]
    fn subprocess_runner_merges_output_into_log_and_reports_exit_code() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("fake-qc");
        std::fs::write(
            &exe,
            "#!/bin/sh\necho \"reading $1\"\necho 'oops' 1>&2\nexit 3\n",
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        let input = dir.path().join("molecule.inp");
        std::fs::write(&input, "! hf-3c\n").unwrap();
        let log = dir.path().join("molecule.out");

        let status = SubprocessRunner.run(&exe, &input, &log, dir.path()).unwrap();

        assert_eq!(status.code, Some(3));
        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.contains("reading molecule.inp"));
        assert!(content.contains("oops"));
    }
}
