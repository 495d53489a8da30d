//! # 错误类型模块
//!
//! 隐写核心 (容量规划、嵌入、提取) 返回的所有错误都归入 [`StegoError`]。
//! 命令行层再用 `anyhow` 为其附加文件路径等上下文。

use crate::constants::{BMP_HEADER_SIZE, MAX_EXTENSION_LEN};
use std::io;
use thiserror::Error;

/// 隐写核心的错误类型。
#[derive(Debug, Error)]
pub enum StegoError {
    /// 任意文件的打开、读取或写入失败，不做重试。
    /// 载体数据在帧字段读完之前结束时，表现为 `UnexpectedEof`。
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 载体容量不足以容纳整个帧，此时尚未写出任何字节。
    #[error("Not enough space in the image. Required: {required}, Available: {available}")]
    InsufficientCapacity { required: u64, available: u64 },

    /// 魔数标记不匹配：载体中没有嵌入数据。
    #[error("The image does not appear to be encoded (magic marker mismatch)")]
    NotEncoded,

    /// 扩展名超过允许的最大长度。
    #[error(
        "Extension is {len} bytes long, at most {max} bytes are allowed",
        max = MAX_EXTENSION_LEN
    )]
    ExtensionTooLong { len: usize },

    /// 秘密文件超过 `u32` 长度字段所能表示的大小。
    #[error(
        "Secret file is {len} bytes, the frame length field holds at most {max} bytes",
        max = u32::MAX
    )]
    PayloadTooLarge { len: u64 },

    /// 载体不足以容纳一个完整的 BMP 头部。
    #[error(
        "Carrier is only {len} bytes, a {header}-byte BMP header is required",
        header = BMP_HEADER_SIZE
    )]
    TruncatedHeader { len: usize },

    /// 扩展名中含有路径分隔符或 NUL，不能拼接到输出文件名上。
    #[error("Extension {ext:?} contains a path separator or NUL byte")]
    InvalidExtension { ext: String },

    /// 头部声明的宽高之积超出可表示的范围。
    #[error("Image dimensions {width}x{height} are too large")]
    ImageTooLarge { width: u32, height: u32 },

    /// 魔数校验通过，但解出的扩展名长度不合理。
    #[error("Embedded frame is corrupted: extension length {extension_len} is out of range")]
    CorruptFrame { extension_len: u32 },
}

/// 隐写核心使用的 `Result` 别名。
pub type Result<T> = std::result::Result<T, StegoError>;
