//! # 容量规划
//!
//! 在读写任何像素数据之前，根据 BMP 头部中的宽高计算载体容量，
//! 并与帧所需的字节数比较。容量按 `width * height * 3` 计算，
//! 不考虑每行 4 字节对齐的填充。

use crate::constants::{BMP_HEADER_SIZE, BYTES_PER_PIXEL, HEIGHT_OFFSET, WIDTH_OFFSET};
use crate::error::{Result, StegoError};
use crate::frame::{Extension, FrameLayout};
use std::io::{self, Read};

/// BMP 头部中记录的图像尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// 从 BMP 头部读取宽度 (偏移 18) 和高度 (偏移 22)，均为小端 `u32`。
    pub fn from_header(header: &[u8]) -> Result<Self> {
        if header.len() < BMP_HEADER_SIZE {
            return Err(StegoError::TruncatedHeader { len: header.len() });
        }
        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ])
        };

        Ok(Self {
            width: read_u32(WIDTH_OFFSET),
            height: read_u32(HEIGHT_OFFSET),
        })
    }

    /// 载体可用字节数：每个像素 3 个颜色通道字节。
    ///
    /// 头部中的宽高不可信，乘积溢出 `u64` 时返回 [`StegoError::ImageTooLarge`]。
    pub fn capacity(&self) -> Result<u64> {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or(StegoError::ImageTooLarge {
                width: self.width,
                height: self.height,
            })
    }
}

/// 读取头部并返回载体容量。
pub fn carrier_capacity(header: &[u8]) -> Result<u64> {
    Dimensions::from_header(header)?.capacity()
}

/// 嵌入一个秘密文件所需的载体字节数 (含 54 字节头部)。
///
/// `54 + 8 * len(marker) + 32 + 8 * extension_len + 32 + 8 * secret_len`
pub fn required_bytes(secret_len: u64, extension_len: usize) -> Result<u64> {
    FrameLayout::new(extension_len, secret_len).map(|layout| layout.required_bytes())
}

/// 容量必须严格大于所需字节数，恰好相等也会被拒绝。
pub fn check_capacity(capacity: u64, required: u64) -> Result<()> {
    if capacity <= required {
        return Err(StegoError::InsufficientCapacity {
            required,
            available: capacity,
        });
    }
    Ok(())
}

/// 通过容量检查后得到的规划结果，供嵌入器直接使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    pub dimensions: Dimensions,
    pub capacity: u64,
    pub layout: FrameLayout,
}

impl CapacityPlan {
    pub fn required(&self) -> u64 {
        self.layout.required_bytes()
    }
}

/// 检查 `header` 描述的载体能否容纳给定的秘密文件和扩展名。
///
/// # Errors
///
/// * 头部不足 54 字节。
/// * 扩展名或秘密文件过大，无法写入帧。
/// * 载体容量不足 ([`StegoError::InsufficientCapacity`])。
pub fn plan_capacity(
    header: &[u8],
    secret_len: u64,
    extension: &Extension,
) -> Result<CapacityPlan> {
    let dimensions = Dimensions::from_header(header)?;
    let layout = FrameLayout::new(extension.len(), secret_len)?;
    let capacity = dimensions.capacity()?;

    check_capacity(capacity, layout.required_bytes())?;

    Ok(CapacityPlan {
        dimensions,
        capacity,
        layout,
    })
}

/// 尽量读满头部缓冲区，返回实际读到的字节数。
pub(crate) fn read_header<R: Read>(carrier: &mut R, header: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < header.len() {
        match carrier.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
