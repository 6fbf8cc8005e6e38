//! A `.deb` is an `ar` archive holding `debian-binary`, a `control.tar*`
//! member and a `data.tar*` member. Only the control member is read; the
//! data member is skipped without being buffered.

use super::MetadataReader;
use crate::error::{BuildError, Result};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

const AR_MAGIC: &[u8; 8] = b"!<arch>\n";
const AR_HEADER_LEN: usize = 60;
const CONTROL_MEMBER: &str = "control.tar";

/// Reads control stanzas directly from the archive, without `dpkg-deb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDeb;

impl MetadataReader for NativeDeb {
    fn read_control(&self, archive: &Path) -> Result<String> {
        let file = File::open(archive).map_err(|e| BuildError::io(archive, e))?;
        let len = file.metadata().map_err(|e| BuildError::io(archive, e))?.len();

        let (compression, member) =
            control_member(BufReader::new(file), len).map_err(|e| match e.kind() {
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                    BuildError::malformed(archive, e)
                }
                _ => BuildError::io(archive, e),
            })?;

        // Anything the decompressor or tar reader rejects is bad control data.
        control_from_tar(&compression, &member).map_err(|e| BuildError::malformed(archive, e))
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Walk the `ar` members and return the control member's compression suffix
/// and bytes. `len` is the archive size; member sizes beyond it are rejected
/// before anything is read.
fn control_member<R: Read + Seek>(
    mut reader: BufReader<R>,
    len: u64,
) -> io::Result<(String, Vec<u8>)> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != AR_MAGIC {
        return Err(invalid("not an ar archive"));
    }
    let mut pos = AR_MAGIC.len() as u64;

    loop {
        let mut header = [0u8; AR_HEADER_LEN];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(invalid("no control member"));
            }
            Err(e) => return Err(e),
        }
        pos += AR_HEADER_LEN as u64;

        let (name, size) = parse_member_header(&header)?;
        if size > len.saturating_sub(pos) {
            return Err(invalid(format!(
                "member '{name}' declares {size} bytes, archive has {} left",
                len.saturating_sub(pos)
            )));
        }

        if let Some(compression) = name.strip_prefix(CONTROL_MEMBER) {
            let mut member = Vec::new();
            (&mut reader).take(size).read_to_end(&mut member)?;
            if member.len() as u64 != size {
                return Err(invalid("truncated control member"));
            }
            return Ok((compression.to_string(), member));
        }

        let padded = size + size % 2;
        let offset = i64::try_from(padded).map_err(|_| invalid("member too large"))?;
        reader.seek_relative(offset)?;
        pos += padded;
    }
}

/// Parse a 60-byte `ar` member header into (name, size).
fn parse_member_header(header: &[u8; AR_HEADER_LEN]) -> io::Result<(String, u64)> {
    if &header[58..60] != b"`\n" {
        return Err(invalid("bad ar member header"));
    }
    let name = String::from_utf8_lossy(&header[0..16])
        .trim_end()
        .trim_end_matches('/')
        .to_string();
    let size = std::str::from_utf8(&header[48..58])
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| invalid("bad ar member size"))?;
    Ok((name, size))
}

fn control_from_tar(compression: &str, member: &[u8]) -> io::Result<String> {
    let decoder: Box<dyn Read + '_> = match compression {
        "" => Box::new(member),
        ".gz" => Box::new(flate2::read::GzDecoder::new(member)),
        ".xz" => Box::new(xz2::read::XzDecoder::new(member)),
        ".zst" => Box::new(zstd::stream::read::Decoder::new(member)?),
        other => return Err(invalid(format!("unsupported control compression '{other}'"))),
    };

    let mut tar = tar::Archive::new(decoder);
    for entry in tar.entries()? {
        let mut entry = entry?;
        let is_control = {
            let path = entry.path()?;
            let path = path.to_string_lossy();
            path.trim_start_matches("./") == "control"
        };
        if is_control {
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .map_err(|_| invalid("control file is not valid UTF-8"))?;
            return Ok(text);
        }
    }
    Err(invalid("control member has no control file"))
}
