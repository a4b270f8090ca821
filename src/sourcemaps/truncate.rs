use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

const CHUNK_SIZE: u64 = 4096;

/// Byte length of the last line of a `size`-byte stream.
///
/// The line includes its own trailing newline but not the newline that ends
/// the previous line. A stream without an earlier newline is one line.
pub fn last_line_len<R: Read + Seek>(reader: &mut R, size: u64) -> io::Result<u64> {
    if size == 0 {
        return Ok(0);
    }
    // The final byte belongs to the last line even when it is a newline.
    let mut end = size - 1;
    let mut buf = vec![0; CHUNK_SIZE as usize];
    while end > 0 {
        let start = end.saturating_sub(CHUNK_SIZE);
        let chunk = &mut buf[..(end - start) as usize];
        reader.seek(SeekFrom::Start(start))?;
        reader.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(size - (start + pos as u64 + 1));
        }
        end = start;
    }
    Ok(size)
}

/// Cuts the last line (the `sourceMappingURL` comment of a built script) off
/// the file at `path`. Returns the new length.
pub fn strip_map_reference(path: &Path) -> io::Result<u64> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let size = file.metadata()?.len();
    let remove = last_line_len(&mut file, size)?;
    let new_len = size - remove;
    file.set_len(new_len)?;
    Ok(new_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    fn len_of(content: &[u8]) -> u64 {
        last_line_len(&mut Cursor::new(content), content.len() as u64).unwrap()
    }

    #[test]
    fn measures_last_line() {
        assert_eq!(len_of(b""), 0);
        assert_eq!(len_of(b"abc"), 3);
        assert_eq!(len_of(b"\n"), 1);
        assert_eq!(len_of(b"a\nb"), 1);
        assert_eq!(len_of(b"a\nbc\n"), 3);
        assert_eq!(len_of(b"a\r\nbc\r\n"), 4);
        assert_eq!(len_of(b"a\n\n"), 1);
    }

    #[test]
    fn finds_newline_across_chunks() {
        let mut content = vec![b'x'; 10_000];
        content.push(b'\n');
        content.extend(vec![b'y'; 5_000]);
        assert_eq!(len_of(&content), 5_000);

        let long_last_line = vec![b'z'; 9_000];
        assert_eq!(len_of(&long_last_line), 9_000);
    }

    #[test]
    fn strips_source_mapping_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.js");
        let code = "!function(){console.log(1)}();\n";
        let comment = "//# sourceMappingURL=main.js.map";
        fs::write(&path, format!("{}{}", code, comment)).unwrap();

        let size = fs::metadata(&path).unwrap().len();
        let new_len = strip_map_reference(&path).unwrap();
        assert_eq!(new_len, size - comment.len() as u64);
        assert_eq!(fs::read_to_string(&path).unwrap(), code);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(strip_map_reference(&dir.path().join("nope.js")).is_err());
    }
}
