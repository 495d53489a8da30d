//! # 提取
//!
//! 与嵌入完全对称：跳过 BMP 头部后按 [`FrameField::ORDER`] 逐个解码字段。
//! 解码过程是一条严格线性的状态链，任何一步失败都会立即返回错误：
//!
//! `Start → MagicChecked → ExtensionLenRead → ExtensionRead → PayloadLenRead → PayloadRead → Done`
//!
//! 除魔数标记外没有任何校验。魔数正确但像素被改动过的载体会解出无意义的长度，
//! 扩展名长度超过上限时报告 [`StegoError::CorruptFrame`]，
//! 载荷长度过大则在载体耗尽时以 `UnexpectedEof` 结束。

use crate::capacity::read_header;
use crate::constants::{
    BMP_HEADER_SIZE, BYTE_CARRIER_LEN, LENGTH_CARRIER_LEN, MAGIC_MARKER, MAX_EXTENSION_LEN,
};
use crate::error::{Result, StegoError};
use crate::frame::{Extension, FrameField};
use crate::steganography::{carrier_to_byte, carrier_to_int};
use std::io::{self, Read, Write};

/// 解码器当前所处的阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Start,
    MagicChecked,
    ExtensionLenRead,
    ExtensionRead,
    PayloadLenRead,
    PayloadRead,
    Done,
}

fn take_byte<R: Read>(source: &mut R) -> io::Result<u8> {
    let mut window = [0u8; BYTE_CARRIER_LEN];
    source.read_exact(&mut window)?;
    Ok(carrier_to_byte(&window))
}

fn take_bytes<R: Read>(source: &mut R, count: usize) -> io::Result<Vec<u8>> {
    (0..count).map(|_| take_byte(source)).collect()
}

fn take_int<R: Read>(source: &mut R) -> io::Result<u32> {
    let mut window = [0u8; LENGTH_CARRIER_LEN];
    source.read_exact(&mut window)?;
    Ok(carrier_to_int(&window))
}

/// 已经解出帧头 (魔数、扩展名、载荷长度) 的提取器，载荷尚未读取。
#[derive(Debug)]
pub struct Extractor<R> {
    source: R,
    state: DecodeState,
    extension: Extension,
    payload_len: u32,
}

impl<R: Read> Extractor<R> {
    /// 跳过 BMP 头部，然后解码帧头。
    ///
    /// # Errors
    ///
    /// * 载体不足 54 字节 ([`StegoError::TruncatedHeader`])。
    /// * 魔数不匹配 ([`StegoError::NotEncoded`])。
    /// * 扩展名长度超出上限 ([`StegoError::CorruptFrame`])。
    /// * 读取失败或载体提前结束。
    pub fn open(mut carrier: R) -> Result<Self> {
        let mut header = [0u8; BMP_HEADER_SIZE];
        let header_len = read_header(&mut carrier, &mut header)?;
        if header_len < BMP_HEADER_SIZE {
            return Err(StegoError::TruncatedHeader { len: header_len });
        }
        Self::from_pixel_region(carrier)
    }

    /// 从已经位于像素区起点的流中解码帧头。
    pub fn from_pixel_region(mut source: R) -> Result<Self> {
        let mut state = DecodeState::Start;
        let mut extension_len = 0u32;
        let mut extension = Extension::default();
        let mut payload_len = 0u32;

        for field in FrameField::ORDER {
            state = match field {
                FrameField::Magic => {
                    let marker = take_bytes(&mut source, MAGIC_MARKER.len())?;
                    if marker != MAGIC_MARKER {
                        return Err(StegoError::NotEncoded);
                    }
                    DecodeState::MagicChecked
                }
                FrameField::ExtensionLen => {
                    extension_len = take_int(&mut source)?;
                    if extension_len as usize > MAX_EXTENSION_LEN {
                        return Err(StegoError::CorruptFrame { extension_len });
                    }
                    DecodeState::ExtensionLenRead
                }
                FrameField::Extension => {
                    extension = Extension::new(take_bytes(&mut source, extension_len as usize)?)?;
                    DecodeState::ExtensionRead
                }
                FrameField::PayloadLen => {
                    payload_len = take_int(&mut source)?;
                    DecodeState::PayloadLenRead
                }
                // 载荷由 `into_payload` 以流的方式读取
                FrameField::Payload => break,
            };
        }

        Ok(Self {
            source,
            state,
            extension,
            payload_len,
        })
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }

    /// 转换为逐字节解码载荷的读取器。
    pub fn into_payload(self) -> PayloadReader<R> {
        PayloadReader {
            source: self.source,
            remaining: u64::from(self.payload_len),
        }
    }
}

/// 按需解码载荷字节，每个字节消耗 8 个载体字节。
#[derive(Debug)]
pub struct PayloadReader<R> {
    source: R,
    remaining: u64,
}

impl<R: Read> PayloadReader<R> {
    /// 尚未解码的载荷字节数。
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn state(&self) -> DecodeState {
        if self.remaining == 0 {
            DecodeState::PayloadRead
        } else {
            DecodeState::PayloadLenRead
        }
    }
}

impl<R: Read> Read for PayloadReader<R> {
    /// 已解码的字节总会以 `Ok(n)` 交给调用方，错误留到下一次调用时再报告。
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        for (filled, slot) in buf[..count].iter_mut().enumerate() {
            match take_byte(&mut self.source) {
                Ok(byte) => {
                    *slot = byte;
                    self.remaining -= 1;
                }
                Err(e) if filled == 0 => return Err(e),
                Err(_) => return Ok(filled),
            }
        }
        Ok(count)
    }
}

/// 提取结果：扩展名与载荷长度。载荷本身已写入调用方提供的输出流。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub extension: Extension,
    pub payload_len: u32,
    pub state: DecodeState,
}

/// 从 `carrier` 中提取隐藏文件，载荷边解码边写入 `sink`。
pub fn extract<R: Read, W: Write>(carrier: R, mut sink: W) -> Result<Extracted> {
    let extractor = Extractor::open(carrier)?;
    let extension = extractor.extension().clone();
    let payload_len = extractor.payload_len();

    let mut payload = extractor.into_payload();
    io::copy(&mut payload, &mut sink)?;
    sink.flush()?;
    debug_assert_eq!(payload.state(), DecodeState::PayloadRead);

    Ok(Extracted {
        extension,
        payload_len,
        state: DecodeState::Done,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{HEIGHT_OFFSET, WIDTH_OFFSET};
    use crate::embed::embed;

    fn carrier(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; BMP_HEADER_SIZE];
        bytes[..2].copy_from_slice(b"BM");
        bytes[WIDTH_OFFSET..WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
        bytes[HEIGHT_OFFSET..HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
        let pixels = (width * height * 3) as usize;
        bytes.extend((0..pixels).map(|i| (i * 31 + 11) as u8));
        bytes
    }

    fn stego(secret: &[u8], extension: &[u8]) -> Vec<u8> {
        let ext = Extension::new(extension.to_vec()).unwrap();
        let mut output = Vec::new();
        embed(carrier(60, 60).as_slice(), secret, &ext, &mut output).unwrap();
        output
    }

    #[test]
    fn header_fields_are_decoded_in_order() {
        let image = stego(b"AB", b".c");
        let extractor = Extractor::open(image.as_slice()).unwrap();
        assert_eq!(extractor.state(), DecodeState::PayloadLenRead);
        assert_eq!(extractor.extension().as_bytes(), b".c");
        assert_eq!(extractor.payload_len(), 2);

        let mut payload = extractor.into_payload();
        let mut out = Vec::new();
        payload.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"AB");
        assert_eq!(payload.state(), DecodeState::PayloadRead);
    }

    #[test]
    fn empty_secret_and_extension_round_trip() {
        let image = stego(b"", b"");
        let mut out = Vec::new();
        let extracted = extract(image.as_slice(), &mut out).unwrap();
        assert!(extracted.extension.is_empty());
        assert_eq!(extracted.payload_len, 0);
        assert_eq!(extracted.state, DecodeState::Done);
        assert!(out.is_empty());
    }

    #[test]
    fn plain_carrier_is_not_encoded() {
        let mut image = carrier(60, 60);
        // 最低位全部清零，保证魔数不可能偶然匹配
        for byte in &mut image[BMP_HEADER_SIZE..] {
            *byte &= 0xFE;
        }
        let err = Extractor::open(image.as_slice()).unwrap_err();
        assert!(matches!(err, StegoError::NotEncoded));
    }

    #[test]
    fn oversized_extension_length_is_corrupt() {
        let mut image = stego(b"data", b".txt");
        // 扩展名长度字段第 3 位 (值 8) 位于魔数之后的第 3 个载体字节
        let bit3 = BMP_HEADER_SIZE + MAGIC_MARKER.len() * BYTE_CARRIER_LEN + 3;
        image[bit3] |= 1;
        let err = Extractor::open(image.as_slice()).unwrap_err();
        assert!(matches!(err, StegoError::CorruptFrame { extension_len: 12 }));
    }

    #[test]
    fn extension_with_path_separator_is_rejected() {
        let mut image = stego(b"data", b".c");
        // '.' (0x2E) 的最低位置 1 即变成 '/' (0x2F)
        let ext_start =
            BMP_HEADER_SIZE + MAGIC_MARKER.len() * BYTE_CARRIER_LEN + LENGTH_CARRIER_LEN;
        image[ext_start] |= 1;
        let err = Extractor::open(image.as_slice()).unwrap_err();
        assert!(matches!(err, StegoError::InvalidExtension { .. }));
    }

    #[test]
    fn payload_longer_than_carrier_ends_with_eof() {
        let mut image = stego(b"xyz", b".h");
        // 帧头占 96 字节，载荷还需要 24 字节
        image.truncate(BMP_HEADER_SIZE + 100);
        let err = extract(image.as_slice(), Vec::<u8>::new()).unwrap_err();
        match err {
            StegoError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn partial_payload_is_returned_before_the_error() {
        let mut image = stego(b"xyz", b".h");
        // 帧头占 96 字节，之后只留下两个完整的载荷字节和半个字节
        image.truncate(BMP_HEADER_SIZE + 96 + 2 * BYTE_CARRIER_LEN + 4);

        let mut payload = Extractor::open(image.as_slice()).unwrap().into_payload();
        let mut buf = [0u8; 16];
        assert_eq!(payload.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"xy");
        assert_eq!(payload.remaining(), 1);

        let err = payload.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(payload.remaining(), 1);
    }

    #[test]
    fn truncated_header_is_reported() {
        let err = Extractor::open(&[0u8; 30][..]).unwrap_err();
        assert!(matches!(err, StegoError::TruncatedHeader { len: 30 }));
    }
}
