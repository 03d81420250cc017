use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::varint::write_varint;

/// Frame type byte introducing a file-follows payload (spec §4.H,
/// `binary_server.cc`; `SPEC_FULL.md` item 5).
pub const FILE_FRAME_TYPE: u8 = 0xFD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Message(u8),
    File,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub kind: FrameKind,
    pub length: u64,
}

/// Writes `type:u8, length:varint, payload:bytes` (spec §4.H "Framing").
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, type_byte: u8, payload: &[u8]) -> io::Result<()> {
    let mut header = Vec::with_capacity(1 + 10);
    header.push(type_byte);
    write_varint(&mut header, payload.len() as u64);
    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Reads just the `type:u8, length:varint` header, leaving the payload
/// unconsumed so the caller can choose to buffer it or, for
/// [`FILE_FRAME_TYPE`], stream it straight to a temp-file spool.
pub async fn read_frame_header<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<FrameHeader> {
    let type_byte = reader.read_u8().await?;
    let length = read_varint_async(reader).await?;
    let kind = if type_byte == FILE_FRAME_TYPE { FrameKind::File } else { FrameKind::Message(type_byte) };
    Ok(FrameHeader { kind, length })
}

async fn read_varint_async<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift >= 64 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "varint too long"));
        }
    }
}

/// Reads a message-frame's payload in full. Callers must not use this
/// for [`FrameKind::File`] headers (use a streaming copy instead).
pub async fn read_payload<R: AsyncRead + Unpin>(reader: &mut R, length: u64) -> io::Result<Vec<u8>> {
    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_message_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, 5, b"hello").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let header = read_frame_header(&mut cursor).await.unwrap();
        assert_eq!(header.kind, FrameKind::Message(5));
        let payload = read_payload(&mut cursor, header.length).await.unwrap();
        assert_eq!(payload, b"hello");
    }

    #[tokio::test]
    async fn recognizes_file_frame_type() {
        let mut buf = Vec::new();
        write_frame(&mut buf, FILE_FRAME_TYPE, b"filebytes").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let header = read_frame_header(&mut cursor).await.unwrap();
        assert_eq!(header.kind, FrameKind::File);
        assert_eq!(header.length, 9);
    }
}
