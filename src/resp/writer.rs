//! RESP command serializer.
//!
//! Encodes a command token plus its filtered argument list into the RESP
//! bulk string array wire format:
//! `*<N>\r\n$<len>\r\nTOKEN\r\n$<len>\r\narg1\r\n…`

use bytes::Bytes;
use itoa::Buffer;

/// Encode one command frame from the wire token and its argument list.
///
/// Every argument is a binary-safe bulk string; the token is the first
/// element of the array.
pub fn encode_command(token: &str, args: &[Bytes]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(frame_capacity(token, args));
    write_command(&mut buf, token, args);
    buf
}

/// Encode multiple command frames into a single contiguous buffer for a
/// pipelined write — one allocation, one `write_all`.
pub fn encode_pipeline(commands: &[(String, Vec<Bytes>)]) -> Vec<u8> {
    let cap = commands
        .iter()
        .map(|(token, args)| frame_capacity(token, args))
        .sum();
    let mut buf = Vec::with_capacity(cap);
    for (token, args) in commands {
        write_command(&mut buf, token, args);
    }
    buf
}

fn frame_capacity(token: &str, args: &[Bytes]) -> usize {
    // '*' + digits + \r\n, then '$' + digits + \r\n + data + \r\n per element
    let mut cap = 1 + 10 + 2 + (1 + 10 + 2 + token.len() + 2);
    for arg in args {
        cap += 1 + 10 + 2 + arg.len() + 2;
    }
    cap
}

fn write_command(buf: &mut Vec<u8>, token: &str, args: &[Bytes]) {
    let mut itoa_buf = Buffer::new();

    buf.push(b'*');
    buf.extend_from_slice(itoa_buf.format(args.len() + 1).as_bytes());
    buf.extend_from_slice(b"\r\n");

    write_bulk(buf, &mut itoa_buf, token.as_bytes());
    for arg in args {
        write_bulk(buf, &mut itoa_buf, arg);
    }
}

#[inline]
fn write_bulk(buf: &mut Vec<u8>, itoa_buf: &mut Buffer, data: &[u8]) {
    buf.push(b'$');
    buf.extend_from_slice(itoa_buf.format(data.len()).as_bytes());
    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&'static str]) -> Vec<Bytes> {
        items
            .iter()
            .map(|s| Bytes::from_static(s.as_bytes()))
            .collect()
    }

    #[test]
    fn encode_no_args() {
        assert_eq!(encode_command("PING", &[]), b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn encode_with_args() {
        assert_eq!(
            encode_command("SET", &args(&["key", "value"])),
            b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n"
        );
    }

    #[test]
    fn encode_empty_arg() {
        assert_eq!(
            encode_command("SET", &args(&["k", ""])),
            b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$0\r\n\r\n"
        );
    }

    #[test]
    fn encode_binary_arg() {
        let frame = encode_command("SET", &[Bytes::from_static(b"k"), Bytes::from_static(&[0, 255, 13, 10])]);
        assert_eq!(
            frame,
            b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$4\r\n\x00\xff\r\n\r\n"
        );
    }

    #[test]
    fn encode_pipeline_concatenates() {
        let commands = vec![
            ("SET".to_string(), args(&["k", "v"])),
            ("GET".to_string(), args(&["k"])),
        ];
        let buf = encode_pipeline(&commands);
        let mut expected = Vec::new();
        expected.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n");
        expected.extend_from_slice(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");
        assert_eq!(buf, expected);
    }
}
