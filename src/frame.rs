//! # 帧布局
//!
//! 嵌入帧由五个字段依次组成：魔数标记、扩展名长度、扩展名、载荷长度、载荷。
//! 帧中没有偏移表，每个字段的位置只由它前面字段的长度决定，
//! 因此嵌入与提取都必须按 [`FrameField::ORDER`] 的顺序逐个处理字段。

use crate::constants::{
    BMP_HEADER_SIZE, BYTE_CARRIER_LEN, LENGTH_CARRIER_LEN, MAGIC_MARKER, MAX_EXTENSION_LEN,
};
use crate::error::{Result, StegoError};
use std::fmt;
use std::path::Path;

/// 帧中的字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameField {
    Magic,
    ExtensionLen,
    Extension,
    PayloadLen,
    Payload,
}

impl FrameField {
    /// 字段在载体中的先后顺序，嵌入和提取共用。
    pub const ORDER: [FrameField; 5] = [
        FrameField::Magic,
        FrameField::ExtensionLen,
        FrameField::Extension,
        FrameField::PayloadLen,
        FrameField::Payload,
    ];
}

/// 秘密文件的扩展名 (含前导 `.`)，长度不超过 [`MAX_EXTENSION_LEN`] 字节。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension(Vec<u8>);

impl Extension {
    /// 从原始字节构造扩展名。
    ///
    /// 超长时返回 [`StegoError::ExtensionTooLong`]；含有 `/`、`\` 或 NUL 时返回
    /// [`StegoError::InvalidExtension`]，解码出的扩展名会直接拼到输出文件名上。
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > MAX_EXTENSION_LEN {
            return Err(StegoError::ExtensionTooLong { len: bytes.len() });
        }
        if bytes.iter().any(|&b| matches!(b, b'/' | b'\\' | 0)) {
            return Err(StegoError::InvalidExtension {
                ext: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(Self(bytes))
    }

    /// 取文件名的扩展名并补上前导 `.`，例如 `notes.txt` 得到 `.txt`。
    /// 没有扩展名 (包括以 `.` 结尾) 的文件得到空扩展名。
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().filter(|ext| !ext.is_empty()) {
            Some(ext) => {
                let mut bytes = Vec::with_capacity(ext.len() + 1);
                bytes.push(b'.');
                bytes.extend_from_slice(ext.as_encoded_bytes());
                Self::new(bytes)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// 一个具体帧的布局：各字段占用的载体字节数与起始位置。
///
/// 偏移量相对于像素区起点 (即跳过 BMP 头部之后)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    extension_len: u32,
    payload_len: u32,
}

impl FrameLayout {
    /// 为给定的扩展名长度和载荷长度建立布局。
    ///
    /// # Errors
    ///
    /// * 扩展名超过 [`MAX_EXTENSION_LEN`] 字节。
    /// * 载荷长度无法用 `u32` 表示。
    pub fn new(extension_len: usize, payload_len: u64) -> Result<Self> {
        if extension_len > MAX_EXTENSION_LEN {
            return Err(StegoError::ExtensionTooLong { len: extension_len });
        }
        let payload_len = u32::try_from(payload_len)
            .map_err(|_| StegoError::PayloadTooLarge { len: payload_len })?;

        Ok(Self {
            extension_len: extension_len as u32,
            payload_len,
        })
    }

    pub fn extension_len(&self) -> u32 {
        self.extension_len
    }

    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }

    /// 某个字段占用的载体字节数。
    pub fn field_carrier_len(&self, field: FrameField) -> u64 {
        let byte_len = BYTE_CARRIER_LEN as u64;
        match field {
            FrameField::Magic => MAGIC_MARKER.len() as u64 * byte_len,
            FrameField::ExtensionLen | FrameField::PayloadLen => LENGTH_CARRIER_LEN as u64,
            FrameField::Extension => u64::from(self.extension_len) * byte_len,
            FrameField::Payload => u64::from(self.payload_len) * byte_len,
        }
    }

    /// 某个字段在像素区中的起始偏移量：它前面所有字段长度之和。
    pub fn field_offset(&self, field: FrameField) -> u64 {
        FrameField::ORDER
            .iter()
            .take_while(|&&f| f != field)
            .map(|&f| self.field_carrier_len(f))
            .sum()
    }

    /// 整个帧占用的像素区字节数。
    pub fn carrier_len(&self) -> u64 {
        FrameField::ORDER
            .iter()
            .map(|&f| self.field_carrier_len(f))
            .sum()
    }

    /// 嵌入该帧所需的载体总字节数 (含 BMP 头部)。
    pub fn required_bytes(&self) -> u64 {
        BMP_HEADER_SIZE as u64 + self.carrier_len()
    }
}
