//! SFTP Transport
//!
//! Implements the Transport port for a directory on an SSH host. One
//! authenticated session and SFTP channel is opened per run and shared by
//! every operation; a failed connect or login aborts the run without retry.
//!
//! SFTP v3 only carries whole-second modification times, so this transport
//! reports `TimestampResolution::Seconds`.

use std::fs;
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use ssh2::{
    CheckResult, ErrorCode, FileStat, KnownHostFileKind, RenameFlags, Session, Sftp,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::local::expand_home;
use crate::domain::entities::endpoint::credential;
use crate::domain::entities::{
    Endpoint, HostKeyPolicy, Locator, SshOptions, TimestampResolution, TreeEntry,
};
use crate::domain::ports::{Transport, TransportError, TransportResult};
use crate::domain::value_objects::{relative_path, SyncDirection};
use crate::error::{SyncError, SyncResult};

const DIRECTIONS: &[SyncDirection] = &[SyncDirection::ToDestination, SyncDirection::ToSource];

// sftp status codes (draft-ietf-secsh-filexfer-02)
const FX_NO_SUCH_FILE: i32 = 2;
const FX_PERMISSION_DENIED: i32 = 3;

// libssh2 session errors that mean the socket is gone
const SOCKET_SEND: i32 = -7;
const TIMEOUT: i32 = -9;
const SOCKET_DISCONNECT: i32 = -13;
const SOCKET_TIMEOUT: i32 = -30;
const SOCKET_RECV: i32 = -43;

const PARTIAL_SUFFIX: &str = ".treesync-part";

/// Transport over a directory on an SSH host
pub struct SftpTransport {
    session: Session,
    sftp: Sftp,
    root: String,
    label: String,
}

impl SftpTransport {
    /// Connect, verify the host key and authenticate
    pub fn connect(endpoint: &Endpoint, options: &SshOptions) -> SyncResult<Self> {
        let Locator::Ssh {
            host, port, path, ..
        } = endpoint.locator()
        else {
            return Err(SyncError::configuration(format!(
                "'{}' is not an ssh endpoint",
                endpoint
            )));
        };
        let label = endpoint.to_string();
        let fail = |message: String| SyncError::Transport {
            endpoint: label.clone(),
            message,
        };

        let tcp = connect_tcp(host, *port, options.timeout).map_err(|e| fail(e.to_string()))?;
        let mut session = Session::new().map_err(|e| fail(e.to_string()))?;
        session.set_timeout(options.timeout.as_millis().min(u32::MAX as u128) as u32);
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| fail(format!("handshake failed: {}", e)))?;

        verify_host_key(&session, host, *port, options).map_err(fail)?;
        authenticate(&session, endpoint).map_err(fail)?;

        let sftp = session
            .sftp()
            .map_err(|e| fail(format!("could not open sftp channel: {}", e)))?;

        info!(endpoint = %label, "sftp session established");
        Ok(Self {
            session,
            sftp,
            root: path.clone(),
            label,
        })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match (self.root.as_str(), path) {
            (root, "") => PathBuf::from(root),
            (".", rel) => PathBuf::from(rel),
            (root, rel) => PathBuf::from(format!("{}/{}", root.trim_end_matches('/'), rel)),
        }
    }

    fn entry_from_stat(path: String, stat: &FileStat) -> TreeEntry {
        let modified = UNIX_EPOCH + Duration::from_secs(stat.mtime.unwrap_or(0));
        let entry = if stat.is_dir() {
            TreeEntry::directory(path, modified)
        } else {
            TreeEntry::file(path, modified, stat.size.unwrap_or(0))
        };
        match stat.perm {
            Some(mode) => entry.with_permissions(mode),
            None => entry,
        }
    }

    fn remove_tree(&self, full: &Path, rel: &str) -> TransportResult<()> {
        let stat = match self.sftp.lstat(full) {
            Ok(stat) => stat,
            Err(e) if is_not_found(&e) => return Ok(()),
            Err(e) => return Err(map_error(rel, e)),
        };

        if !stat.is_dir() {
            return self.sftp.unlink(full).map_err(|e| map_error(rel, e));
        }

        let mut failed = 0;
        let mut first = None;
        let children = self.sftp.readdir(full).map_err(|e| map_error(rel, e))?;
        for (child, _) in children {
            let name = child_name(&child, rel)?;
            let child_rel = relative_path::join(rel, &name);
            if let Err(err) = self.remove_tree(&child, &child_rel) {
                if matches!(err, TransportError::Connection(_)) {
                    return Err(err);
                }
                failed += match &err {
                    TransportError::Partial { failed, .. } => *failed,
                    _ => 1,
                };
                first.get_or_insert(err);
            }
        }

        match first {
            None => self.sftp.rmdir(full).map_err(|e| map_error(rel, e)),
            Some(first) => Err(TransportError::Partial {
                path: rel.to_string(),
                failed,
                first: Box::new(first),
            }),
        }
    }

    /// Write `local_source` to the remote `temp` path with its mtime and
    /// permission bits
    fn upload(&self, local_source: &Path, temp: &Path, dest: &str) -> TransportResult<()> {
        let io_err = |e: io::Error| TransportError::from_io(dest, e);
        let metadata = fs::metadata(local_source).map_err(io_err)?;

        let mut source = fs::File::open(local_source).map_err(io_err)?;
        let mut remote = self.sftp.create(temp).map_err(|e| map_error(dest, e))?;
        io::copy(&mut source, &mut remote).map_err(io_err)?;
        remote.flush().map_err(io_err)?;
        drop(remote);

        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());
        let stat = FileStat {
            size: None,
            uid: None,
            gid: None,
            perm: local_mode(&metadata),
            atime: mtime,
            mtime,
        };
        self.sftp
            .setstat(temp, stat)
            .map_err(|e| map_error(dest, e))
    }

    /// Rename the uploaded temp file over the target, falling back to
    /// unlink + rename for servers without overwrite support
    fn replace(&self, temp: &Path, target: &Path, rel: &str) -> TransportResult<()> {
        let flags = RenameFlags::OVERWRITE | RenameFlags::ATOMIC | RenameFlags::NATIVE;
        if self.sftp.rename(temp, target, Some(flags)).is_ok() {
            return Ok(());
        }
        match self.sftp.unlink(target) {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => {}
            Err(e) => {
                let _ = self.sftp.unlink(temp);
                return Err(map_error(rel, e));
            }
        }
        self.sftp.rename(temp, target, None).map_err(|e| {
            let _ = self.sftp.unlink(temp);
            map_error(rel, e)
        })
    }
}

impl Drop for SftpTransport {
    fn drop(&mut self) {
        if let Err(e) = self.session.disconnect(None, "sync finished", None) {
            debug!(endpoint = %self.label, error = %e, "disconnect failed");
        }
    }
}

impl Transport for SftpTransport {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn supported_directions(&self) -> &'static [SyncDirection] {
        DIRECTIONS
    }

    fn timestamp_resolution(&self) -> TimestampResolution {
        TimestampResolution::Seconds
    }

    fn local_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    fn real_path(&self, path: &str) -> TransportResult<Option<PathBuf>> {
        self.sftp
            .realpath(&self.resolve(path))
            .map(Some)
            .map_err(|e| map_error(path, e))
    }

    fn list(&self, dir: &str) -> TransportResult<Vec<TreeEntry>> {
        let children = self
            .sftp
            .readdir(&self.resolve(dir))
            .map_err(|e| map_error(dir, e))?;

        let mut entries = Vec::with_capacity(children.len());
        for (child, stat) in children {
            let name = child_name(&child, dir)?;
            let rel = relative_path::join(dir, &name);
            if stat.file_type().is_symlink() {
                // listing attributes describe the link itself
                match self.sftp.stat(&child) {
                    Ok(target) => entries.push(Self::entry_from_stat(rel, &target)),
                    Err(e) if is_not_found(&e) => {
                        warn!(path = %rel, "skipping dangling symlink");
                    }
                    Err(e) => return Err(map_error(&rel, e)),
                }
            } else {
                entries.push(Self::entry_from_stat(rel, &stat));
            }
        }

        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(entries)
    }

    fn stat(&self, path: &str) -> TransportResult<Option<TreeEntry>> {
        match self.sftp.stat(&self.resolve(path)) {
            Ok(stat) => Ok(Some(Self::entry_from_stat(path.to_string(), &stat))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_error(path, e)),
        }
    }

    fn mkdir(&self, path: &str) -> TransportResult<()> {
        let full = self.resolve(path);
        match self.sftp.mkdir(&full, 0o755) {
            Ok(()) => Ok(()),
            Err(e) => match self.sftp.stat(&full) {
                Ok(stat) if stat.is_dir() => Ok(()),
                _ => Err(map_error(path, e)),
            },
        }
    }

    fn copy_in(&self, local_source: &Path, dest: &str) -> TransportResult<()> {
        let target = self.resolve(dest);
        let temp = partial_path(&target);

        if let Err(err) = self.upload(local_source, &temp, dest) {
            let _ = self.sftp.unlink(&temp);
            return Err(err);
        }
        self.replace(&temp, &target, dest)?;
        debug!(path = dest, "uploaded");
        Ok(())
    }

    fn copy_out(&self, source: &str, local_dest: &Path) -> TransportResult<()> {
        let io_err = |e: io::Error| TransportError::from_io(source, e);
        let full = self.resolve(source);
        let stat = self.sftp.stat(&full).map_err(|e| map_error(source, e))?;

        let mut remote = self.sftp.open(&full).map_err(|e| map_error(source, e))?;
        let parent = local_dest.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
        io::copy(&mut remote, temp.as_file_mut()).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;

        if let Some(mtime) = stat.mtime {
            temp.as_file()
                .set_modified(UNIX_EPOCH + Duration::from_secs(mtime))
                .map_err(io_err)?;
        }
        apply_mode(temp.path(), stat.perm).map_err(io_err)?;

        temp.persist(local_dest).map_err(|e| io_err(e.error))?;
        debug!(path = source, "downloaded");
        Ok(())
    }

    fn delete(&self, path: &str) -> TransportResult<()> {
        self.remove_tree(&self.resolve(path), path)
    }
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve to any address", host),
        )
    }))
}

fn verify_host_key(
    session: &Session,
    host: &str,
    port: u16,
    options: &SshOptions,
) -> Result<(), String> {
    if options.host_key_policy == HostKeyPolicy::Ignore {
        warn!(host, "host key verification disabled");
        return Ok(());
    }

    let file = options
        .known_hosts
        .as_deref()
        .map(expand_home)
        .or_else(|| dirs::home_dir().map(|home| home.join(".ssh/known_hosts")))
        .ok_or_else(|| "no known_hosts file configured".to_string())?;

    let mut known_hosts = session.known_hosts().map_err(|e| e.to_string())?;
    if file.exists() {
        known_hosts
            .read_file(&file, KnownHostFileKind::OpenSSH)
            .map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
    }

    let (key, key_type) = session
        .host_key()
        .ok_or_else(|| "server did not present a host key".to_string())?;

    match known_hosts.check_port(host, port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound if options.host_key_policy == HostKeyPolicy::AcceptNew => {
            let entry = if port == 22 {
                host.to_string()
            } else {
                format!("[{}]:{}", host, port)
            };
            known_hosts
                .add(&entry, key, "added by treesync", key_type.into())
                .map_err(|e| e.to_string())?;
            known_hosts
                .write_file(&file, KnownHostFileKind::OpenSSH)
                .map_err(|e| format!("cannot update {}: {}", file.display(), e))?;
            info!(host, "recorded new host key");
            Ok(())
        }
        CheckResult::NotFound => Err(format!("host key for {} is not in {}", host, file.display())),
        CheckResult::Mismatch => Err(format!(
            "host key for {} does not match {}",
            host,
            file.display()
        )),
        CheckResult::Failure => Err(format!("could not check host key for {}", host)),
    }
}

fn authenticate(session: &Session, endpoint: &Endpoint) -> Result<(), String> {
    let username = endpoint
        .username()
        .map(str::to_string)
        .or_else(|| std::env::var("USER").ok())
        .ok_or_else(|| "no username configured".to_string())?;

    let password = match (
        endpoint.credential(credential::PASSWORD),
        endpoint.credential(credential::PASSWORD_FILE),
    ) {
        (Some(password), _) => Some(password.to_string()),
        (None, Some(file)) => Some(read_password_file(Path::new(file))?),
        (None, None) => None,
    };

    if let Some(identity) = endpoint.credential(credential::IDENTITY_FILE) {
        let identity = expand_home(Path::new(identity));
        if let Err(e) =
            session.userauth_pubkey_file(&username, None, &identity, password.as_deref())
        {
            debug!(error = %e, "public key authentication failed");
        }
    }
    if !session.authenticated() {
        if let Some(password) = &password {
            if let Err(e) = session.userauth_password(&username, password) {
                debug!(error = %e, "password authentication failed");
            }
        }
    }
    if !session.authenticated() {
        if let Err(e) = session.userauth_agent(&username) {
            debug!(error = %e, "agent authentication failed");
        }
    }

    if session.authenticated() {
        Ok(())
    } else {
        Err(format!("authentication failed for user '{}'", username))
    }
}

fn read_password_file(path: &Path) -> Result<String, String> {
    let content = fs::read_to_string(expand_home(path))
        .map_err(|e| format!("cannot read password file {}: {}", path.display(), e))?;
    Ok(content.trim_end_matches(['\r', '\n']).to_string())
}

fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}{}", name, PARTIAL_SUFFIX))
}

fn child_name(child: &Path, dir: &str) -> TransportResult<String> {
    child
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| TransportError::Remote {
            path: dir.to_string(),
            message: format!("entry {:?} has no valid UTF-8 name", child),
        })
}

fn is_not_found(err: &ssh2::Error) -> bool {
    matches!(err.code(), ErrorCode::SFTP(FX_NO_SUCH_FILE))
}

fn map_error(path: &str, err: ssh2::Error) -> TransportError {
    match err.code() {
        ErrorCode::SFTP(FX_NO_SUCH_FILE) => TransportError::NotFound(path.to_string()),
        ErrorCode::SFTP(FX_PERMISSION_DENIED) => TransportError::AccessDenied(path.to_string()),
        ErrorCode::Session(
            SOCKET_SEND | TIMEOUT | SOCKET_DISCONNECT | SOCKET_TIMEOUT | SOCKET_RECV,
        ) => TransportError::Connection(err.message().to_string()),
        _ => TransportError::Remote {
            path: path.to_string(),
            message: err.message().to_string(),
        },
    }
}

#[cfg(unix)]
fn local_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn local_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    match mode {
        Some(mode) => fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}
