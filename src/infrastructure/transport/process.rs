//! Delegated Tool Transport
//!
//! Hands a whole run to an external copy tool (rsync by default) and
//! supervises it as a black box. The tool's own delta logic replaces the
//! tree walk, so only what can be expressed as arguments is supported.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::domain::entities::endpoint::credential;
use crate::domain::entities::{DelegateOptions, Endpoint, Locator};
use crate::domain::value_objects::{FilterChain, SyncDirection};
use crate::error::{SyncError, SyncResult};

const DIRECTIONS: &[SyncDirection] = &[SyncDirection::ToDestination];

/// Per-run switches translated into tool flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegatedRun {
    pub force: bool,
    pub delete: bool,
    pub dry_run: bool,
}

/// Captured output of a successful tool run
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Supervises the external tool for one source/destination pair
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    options: DelegateOptions,
    source: Endpoint,
    destination: Endpoint,
}

/// Credential handed to the tool; an inline password lives in a private
/// temp file that is removed on drop
enum CredentialFile {
    Existing(PathBuf),
    Temporary(NamedTempFile),
}

impl CredentialFile {
    fn path(&self) -> &Path {
        match self {
            CredentialFile::Existing(path) => path,
            CredentialFile::Temporary(file) => file.path(),
        }
    }
}

impl ProcessTransport {
    pub fn new(options: DelegateOptions, source: Endpoint, destination: Endpoint) -> Self {
        Self {
            options,
            source,
            destination,
        }
    }

    pub fn supported_directions(&self) -> &'static [SyncDirection] {
        DIRECTIONS
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {} -> {}",
            self.options.tool.display(),
            self.source,
            self.destination
        )
    }

    /// Check that the configured tool binary exists
    pub fn check_available(&self) -> SyncResult<()> {
        if find_executable(&self.options.tool).is_some() {
            Ok(())
        } else {
            Err(SyncError::configuration(format!(
                "delegated tool '{}' not found",
                self.options.tool.display()
            )))
        }
    }

    /// Reject runs the tool cannot express
    pub fn validate(&self, filter: &FilterChain, explicit_paths: bool) -> SyncResult<()> {
        if !self.source.locator().is_local() {
            return Err(SyncError::configuration(format!(
                "delegated tool requires a local source, got '{}'",
                self.source
            )));
        }
        if matches!(self.destination.locator(), Locator::Ssh { .. }) {
            return Err(SyncError::configuration(format!(
                "delegated tool cannot reach ssh endpoint '{}'",
                self.destination
            )));
        }
        if filter.filters().iter().any(|f| f.is_include_gated()) {
            return Err(SyncError::configuration(
                "include prefixes cannot be passed to the delegated tool",
            ));
        }
        if explicit_paths {
            return Err(SyncError::configuration(
                "explicit paths cannot be passed to the delegated tool",
            ));
        }
        Ok(())
    }

    /// Build the argument vector after the tool name:
    /// `[options.., run flags.., excludes.., credential, source, destination]`
    pub fn build_args(
        &self,
        filter: &FilterChain,
        run: DelegatedRun,
        credential_file: Option<&Path>,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.options.options.iter().map(OsString::from).collect();

        if run.force {
            args.push("--ignore-times".into());
        }
        if run.delete {
            args.push("--delete".into());
        }
        if run.dry_run {
            args.push("--dry-run".into());
        }
        for prefix in filter.filters().iter().flat_map(|f| f.excludes()) {
            args.push(format!("--exclude=/{}*", prefix).into());
        }
        if let Some(file) = credential_file {
            let mut flag = OsString::from(&self.options.credential_flag);
            flag.push("=");
            flag.push(file);
            args.push(flag);
        }

        args.push(locator_arg(self.source.locator(), true));
        args.push(locator_arg(self.destination.locator(), false));
        args
    }

    /// Run the tool to completion.
    ///
    /// Both output streams are drained on their own threads so a chatty
    /// tool cannot block on a full pipe.
    pub fn run(&self, filter: &FilterChain, run: DelegatedRun) -> SyncResult<ProcessOutput> {
        self.check_available()?;
        let credential = self.credential_file()?;
        let args = self.build_args(filter, run, credential.as_ref().map(CredentialFile::path));
        let tool = self.options.tool.display().to_string();

        info!(tool = %tool, destination = %self.destination, "starting delegated sync");
        debug!(?args, "delegated tool arguments");

        let child = Command::new(&self.options.tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&tool, e))?;

        let (status, stdout, stderr) = supervise(child).map_err(|e| SyncError::DelegatedTool {
            tool: tool.clone(),
            code: None,
            stderr: e.to_string(),
        })?;
        // credential file must outlive the child
        drop(credential);

        for line in stdout.lines() {
            debug!(target: "treesync::delegate", "{}", line);
        }

        if !status.success() {
            return Err(SyncError::DelegatedTool {
                tool,
                code: status.code(),
                stderr,
            });
        }
        Ok(ProcessOutput { stdout, stderr })
    }

    fn credential_file(&self) -> SyncResult<Option<CredentialFile>> {
        if let Some(password) = self.destination.credential(credential::PASSWORD) {
            let mut file = NamedTempFile::new().map_err(|e| {
                SyncError::configuration(format!("cannot create credential file: {}", e))
            })?;
            restrict_permissions(file.path())
                .and_then(|_| file.write_all(password.as_bytes()))
                .and_then(|_| file.flush())
                .map_err(|e| {
                    SyncError::configuration(format!("cannot write credential file: {}", e))
                })?;
            return Ok(Some(CredentialFile::Temporary(file)));
        }
        Ok(self
            .destination
            .credential(credential::PASSWORD_FILE)
            .map(|path| CredentialFile::Existing(PathBuf::from(path))))
    }
}

fn locator_arg(locator: &Locator, is_source: bool) -> OsString {
    match locator {
        Locator::Local { path } => {
            let mut arg = path.as_os_str().to_os_string();
            // trailing slash copies the directory's contents
            if is_source && !path.as_os_str().to_string_lossy().ends_with('/') {
                arg.push("/");
            }
            arg
        }
        Locator::Rsync { url } => url.into(),
        Locator::Shorthand { spec } => spec.into(),
        Locator::Ssh { .. } => locator.to_string().into(),
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut stream) = stream {
            stream.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> io::Result<String> {
    let bytes = handle
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn supervise(mut child: Child) -> io::Result<(std::process::ExitStatus, String, String)> {
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());
    let status = child.wait();
    let stdout = join_reader(stdout)?;
    let stderr = join_reader(stderr)?;
    Ok((status?, stdout, stderr))
}

fn spawn_error(tool: &str, err: io::Error) -> SyncError {
    if err.kind() == io::ErrorKind::NotFound {
        SyncError::configuration(format!("delegated tool '{}' not found", tool))
    } else {
        SyncError::DelegatedTool {
            tool: tool.to_string(),
            code: None,
            stderr: err.to_string(),
        }
    }
}

fn find_executable(tool: &Path) -> Option<PathBuf> {
    if tool.components().count() > 1 {
        return tool.is_file().then(|| tool.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
