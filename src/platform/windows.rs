//! Windows identities from `GetFileInformationByHandle`.
//!
//! `std` does not expose the volume serial number or file index on stable,
//! so the file is opened and queried through `winapi`.

use std::fs::File;
use std::io;
use std::mem;
use std::os::windows::io::AsRawHandle;
use std::path::Path;

use winapi::um::fileapi::{GetFileInformationByHandle, BY_HANDLE_FILE_INFORMATION};
use winapi::um::winnt::HANDLE;

use super::FileIdentity;

pub(super) fn identity_of(path: &Path) -> io::Result<FileIdentity> {
    let file = File::open(path)?;

    // SAFETY: the handle stays valid while `file` is alive and the struct is
    // plain data that the call fully initializes on success.
    let info = unsafe {
        let mut info: BY_HANDLE_FILE_INFORMATION = mem::zeroed();
        if GetFileInformationByHandle(file.as_raw_handle() as HANDLE, &mut info) == 0 {
            return Err(io::Error::last_os_error());
        }
        info
    };

    let index = (u64::from(info.nFileIndexHigh) << 32) | u64::from(info.nFileIndexLow);
    Ok(FileIdentity::new(u64::from(info.dwVolumeSerialNumber), index))
}
