//! A `/proc/<pid>/maps` + `/proc/<pid>/mem` backed `Target`, grounded on
//! the source tool's `mem_region_iter_first`/`mem_region_dump` (`mem.c`).
//! Suspension uses `SIGSTOP`/`SIGCONT` rather than `ptrace`, matching the
//! source tool's own choice to leave ptrace attachment to its caller.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use super::{Region, Target};
use crate::error::CoreError;

pub struct LinuxTarget {
    pid: libc::pid_t,
}

impl LinuxTarget {
    pub fn attach(pid: libc::pid_t) -> Result<Self, CoreError> {
        let maps_path = format!("/proc/{pid}/maps");
        if !std::path::Path::new(&maps_path).exists() {
            return Err(CoreError::Target(format!("no such process: {pid}")));
        }
        Ok(LinuxTarget { pid })
    }

    fn mem_path(&self) -> String {
        format!("/proc/{}/mem", self.pid)
    }

    fn open_mem(&self, write: bool) -> Result<File, CoreError> {
        OpenOptions::new()
            .read(true)
            .write(write)
            .open(self.mem_path())
            .map_err(|e| CoreError::Target(format!("failed to open target memory: {e}")))
    }
}

/// Parses one `/proc/<pid>/maps` line:
/// `start-end perms offset dev inode path`.
fn parse_maps_line(line: &str) -> Option<Region> {
    let mut fields = line.splitn(6, char::is_whitespace).filter(|s| !s.is_empty());
    let range = fields.next()?;
    let perms = fields.next()?;
    let (start_str, end_str) = range.split_once('-')?;
    let start = u64::from_str_radix(start_str, 16).ok()?;
    let end = u64::from_str_radix(end_str, 16).ok()?;
    let path = line.splitn(6, char::is_whitespace).nth(5).map(|p| p.trim().to_string());
    let mut perm_bytes = perms.bytes();
    Some(Region {
        start,
        size: end.saturating_sub(start),
        readable: perm_bytes.next() == Some(b'r'),
        writable: perm_bytes.next() == Some(b'w'),
        executable: perm_bytes.next() == Some(b'x'),
        path: path.filter(|p| !p.is_empty()),
    })
}

impl Target for LinuxTarget {
    fn regions(&self) -> Result<Vec<Region>, CoreError> {
        let maps_path = format!("/proc/{}/maps", self.pid);
        let contents = std::fs::read_to_string(&maps_path)
            .map_err(|e| CoreError::Target(format!("failed to read {maps_path}: {e}")))?;
        Ok(contents.lines().filter_map(parse_maps_line).collect())
    }

    fn read(&self, address: u64, len: usize) -> Result<Vec<u8>, CoreError> {
        let mut file = self.open_mem(false)?;
        file.seek(SeekFrom::Start(address))
            .map_err(|e| CoreError::Target(format!("seek to {address:#x} failed: {e}")))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).map_err(|e| {
            CoreError::Target(format!(
                "unexpected end of memory region reading {len} bytes at {address:#x}: {e}"
            ))
        })?;
        Ok(buf)
    }

    fn write(&self, address: u64, bytes: &[u8]) -> Result<(), CoreError> {
        let mut file = self.open_mem(true)?;
        file.seek(SeekFrom::Start(address))
            .map_err(|e| CoreError::Target(format!("seek to {address:#x} failed: {e}")))?;
        file.write_all(bytes)
            .map_err(|e| CoreError::Target(format!("write to {address:#x} failed: {e}")))
    }

    fn suspend(&self) -> Result<(), CoreError> {
        send_signal(self.pid, libc::SIGSTOP)
    }

    fn resume(&self) -> Result<(), CoreError> {
        send_signal(self.pid, libc::SIGCONT)
    }
}

fn send_signal(pid: libc::pid_t, signal: libc::c_int) -> Result<(), CoreError> {
    // SAFETY: signaling a process we hold a pid for and believe to be our
    // attached target; kill(2) itself cannot corrupt memory.
    let rc = unsafe { libc::kill(pid, signal) };
    if rc != 0 {
        return Err(CoreError::Target(format!(
            "kill({pid}, {signal}) failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_readable_writable_region() {
        let line = "00400000-00452000 rw-p 00000000 08:02 173521 /usr/bin/target";
        let region = parse_maps_line(line).unwrap();
        assert_eq!(region.start, 0x400000);
        assert_eq!(region.size, 0x52000);
        assert!(region.readable);
        assert!(region.writable);
        assert!(!region.executable);
        assert_eq!(region.path.as_deref(), Some("/usr/bin/target"));
    }

    #[test]
    fn parses_an_anonymous_region_without_a_path() {
        let line = "7f1234560000-7f1234580000 rw-p 00000000 00:00 0 ";
        let region = parse_maps_line(line).unwrap();
        assert_eq!(region.path, None);
    }
}
