use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::error::{MutagenError, Result};

/// Upper bound on the buffer used when shifting file contents.
pub const CHUNK_SIZE: u64 = 64 * 1024;

/// Storage whose length can be changed in place.
pub trait Truncate {
    fn set_len(&mut self, new_len: u64) -> std::io::Result<()>;
}

impl Truncate for File {
    fn set_len(&mut self, new_len: u64) -> std::io::Result<()> {
        File::set_len(self, new_len)
    }
}

impl Truncate for Cursor<Vec<u8>> {
    fn set_len(&mut self, new_len: u64) -> std::io::Result<()> {
        self.get_mut().resize(new_len as usize, 0);
        Ok(())
    }
}

/// Anything the region patcher can rewrite: a real file or an in-memory buffer.
pub trait FileLike: Read + Write + Seek + Truncate {}

impl<T> FileLike for T where T: Read + Write + Seek + Truncate {}

pub(crate) fn stream_len<S: Seek>(stream: &mut S) -> Result<u64> {
    let pos = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(pos))?;
    Ok(len)
}

/// Copy `count` bytes from `src` to `dest` inside the same stream.
///
/// The ranges may overlap. A forward move copies from the tail backwards and a
/// backward move copies from the head forwards, so no byte is overwritten
/// before it has been read.
pub fn move_bytes<F: FileLike>(
    fobj: &mut F,
    dest: u64,
    src: u64,
    count: u64,
    chunk_size: u64,
) -> Result<()> {
    if count == 0 || dest == src {
        return Ok(());
    }
    let chunk_size = chunk_size.max(1);
    let mut buf = vec![0u8; chunk_size.min(count) as usize];

    if dest > src {
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(chunk_size);
            remaining -= n;
            let chunk = &mut buf[..n as usize];
            fobj.seek(SeekFrom::Start(src + remaining))?;
            fobj.read_exact(chunk)?;
            fobj.seek(SeekFrom::Start(dest + remaining))?;
            fobj.write_all(chunk)?;
        }
    } else {
        let mut done = 0u64;
        while done < count {
            let n = (count - done).min(chunk_size);
            let chunk = &mut buf[..n as usize];
            fobj.seek(SeekFrom::Start(src + done))?;
            fobj.read_exact(chunk)?;
            fobj.seek(SeekFrom::Start(dest + done))?;
            fobj.write_all(chunk)?;
            done += n;
        }
    }
    fobj.flush()?;
    Ok(())
}

/// Insert `size` bytes at `offset`, shifting everything after it forward.
///
/// The gap is left for the caller to overwrite. An offset past the end of the
/// stream extends it with zeros.
pub fn insert_bytes<F: FileLike>(fobj: &mut F, size: u64, offset: u64) -> Result<()> {
    insert_bytes_chunked(fobj, size, offset, CHUNK_SIZE)
}

pub fn insert_bytes_chunked<F: FileLike>(
    fobj: &mut F,
    size: u64,
    offset: u64,
    chunk_size: u64,
) -> Result<()> {
    if size < 1 {
        return Err(MutagenError::ValueError("size cannot be less than 1".into()));
    }

    let file_len = stream_len(fobj)?;
    let move_size = file_len.saturating_sub(offset);
    let new_len = file_len.max(offset) + size;
    log::trace!("inserting {} bytes at {} ({} bytes to move)", size, offset, move_size);

    fobj.set_len(new_len)?;
    move_bytes(fobj, offset + size, offset, move_size, chunk_size)
}

/// Remove `size` bytes at `offset`, shifting the tail back and truncating.
pub fn delete_bytes<F: FileLike>(fobj: &mut F, size: u64, offset: u64) -> Result<()> {
    delete_bytes_chunked(fobj, size, offset, CHUNK_SIZE)
}

pub fn delete_bytes_chunked<F: FileLike>(
    fobj: &mut F,
    size: u64,
    offset: u64,
    chunk_size: u64,
) -> Result<()> {
    if size < 1 {
        return Err(MutagenError::ValueError("size cannot be less than 1".into()));
    }

    let file_len = stream_len(fobj)?;
    let move_size = file_len
        .checked_sub(offset)
        .and_then(|rest| rest.checked_sub(size))
        .ok_or_else(|| MutagenError::ValueError("can't move less than 0 bytes".into()))?;
    log::trace!("deleting {} bytes at {} ({} bytes to move)", size, offset, move_size);

    move_bytes(fobj, offset, offset + size, move_size, chunk_size)?;
    fobj.set_len(file_len - size)?;
    Ok(())
}

/// Open a file for read/write access.
pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<File> {
    Ok(OpenOptions::new().read(true).write(true).open(path)?)
}

/// Open a file for read/write access, creating it if it does not exist.
pub fn open_rw_create<P: AsRef<Path>>(path: P) -> Result<File> {
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}
