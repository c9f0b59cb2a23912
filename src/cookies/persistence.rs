//! Cookie persistence - save and load cookies to/from a byte stream.
//!
//! Layout, all integers little-endian `u32`:
//!
//! ```text
//! count
//! count x (byte_len, byte_len bytes of cookie text)
//! ```
//!
//! Each block holds cookie text in full attribute form
//! (`name=value; Path=/; Domain=.example.com`). A block parses into zero or
//! more cookies, one per line.

use crate::base::context::IoResultExt;
use crate::base::jarerror::JarError;
use crate::cookies::canonicalcookie::CanonicalCookie;
use crate::cookies::store::CookieStore;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Largest cookie text block accepted on load or written on save.
pub const MAX_RECORD_LEN: usize = 64 * 1024;

/// Write `cookies` in the length-prefixed format.
pub fn write_cookies<W: Write>(mut writer: W, cookies: &[CanonicalCookie]) -> Result<(), JarError> {
    let count = u32::try_from(cookies.len())
        .map_err(|_| JarError::cookie_invalid_data("too many cookies to persist"))?;
    writer.write_all(&count.to_le_bytes()).persist_context("save")?;

    for cookie in cookies {
        let raw = cookie.to_raw_form()?;
        if raw.len() > MAX_RECORD_LEN {
            return Err(JarError::CookieRecordTooLarge { len: raw.len() });
        }
        // Bounded by MAX_RECORD_LEN above.
        let len = raw.len() as u32;
        writer.write_all(&len.to_le_bytes()).persist_context("save")?;
        writer.write_all(raw.as_bytes()).persist_context("save")?;
    }

    writer.flush().persist_context("save")
}

/// Read every cookie from a stream written by [`write_cookies`].
///
/// Fails without partial results on a short read or an oversized block.
/// Blocks that are not valid UTF-8 or hold no parseable cookie contribute
/// nothing.
pub fn read_cookies<R: Read>(mut reader: R) -> Result<Vec<CanonicalCookie>, JarError> {
    let count = read_u32(&mut reader)?;
    let mut cookies = Vec::new();

    for _ in 0..count {
        let len = read_u32(&mut reader)? as usize;
        if len > MAX_RECORD_LEN {
            return Err(JarError::CookieRecordTooLarge { len });
        }

        let block = read_exact_bytes(&mut reader, len)?;
        match String::from_utf8(block) {
            Ok(text) => cookies.extend(CanonicalCookie::parse_cookies(&text)),
            Err(e) => tracing::debug!(error = %e, "skipping non UTF-8 cookie block"),
        }
    }

    tracing::debug!(records = count, cookies = cookies.len(), "cookie data read");
    Ok(cookies)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, JarError> {
    let bytes = read_exact_bytes(reader, 4)?;
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes);
    Ok(u32::from_le_bytes(word))
}

fn read_exact_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>, JarError> {
    let mut buf = Vec::with_capacity(len.min(MAX_RECORD_LEN));
    reader
        .take(len as u64)
        .read_to_end(&mut buf)
        .persist_context("load")?;
    if buf.len() < len {
        return Err(JarError::CookieDataTruncated {
            expected: len as u32,
            available: buf.len(),
        });
    }
    Ok(buf)
}

/// Save every cookie in `store` to `path`.
///
/// Data goes to a sibling `.tmp` file first and is renamed over `path`, so
/// a failed save never leaves a half-written cookie file behind.
pub fn save_cookies(store: &CookieStore, path: &Path) -> Result<usize, JarError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).persist_context("save")?;
    }

    let tmp = temp_path(path);
    let file = File::create(&tmp).persist_context("save")?;
    let written = match store.save_to(BufWriter::new(file)) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
    };
    fs::rename(&tmp, path).persist_context("save")?;

    tracing::debug!(path = %path.display(), cookies = written, "cookies persisted");
    Ok(written)
}

/// Load cookies from `path` into `store`, replacing its contents.
///
/// A missing file is not an error: the store is left as it is and `Ok(0)`
/// is returned.
pub fn load_cookies(store: &CookieStore, path: &Path) -> Result<usize, JarError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no cookie file yet");
            return Ok(0);
        }
        Err(e) => return Err(JarError::cookie_store_io("load", e)),
    };

    let loaded = store.load_from(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), cookies = loaded, "cookies loaded");
    Ok(loaded)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
