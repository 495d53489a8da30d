//! # 嵌入
//!
//! 从源载体流中逐段读取字节，按 [`FrameField::ORDER`] 把帧写进各字节的最低位，
//! 再把剩余像素原样复制到输出流。BMP 头部不做任何修改。

use crate::capacity::{CapacityPlan, plan_capacity, read_header};
use crate::constants::{BMP_HEADER_SIZE, BYTE_CARRIER_LEN, LENGTH_CARRIER_LEN, MAGIC_MARKER};
use crate::error::Result;
use crate::frame::{Extension, FrameField};
use crate::steganography::{byte_to_carrier, int_to_carrier};
use std::io::{self, Read, Write};

/// 嵌入完成后的统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedReport {
    pub plan: CapacityPlan,
    /// 写入帧时修改过 (或可能修改过) 最低位的像素字节数。
    pub frame_bytes: u64,
    /// 写到输出流的总字节数。
    pub bytes_written: u64,
}

/// 同时持有源载体和输出流，每次从源中取出一个窗口，编码后写出。
struct CarrierWriter<R, W> {
    source: R,
    sink: W,
    consumed: u64,
}

impl<R: Read, W: Write> CarrierWriter<R, W> {
    fn put_byte(&mut self, value: u8) -> io::Result<()> {
        let mut window = [0u8; BYTE_CARRIER_LEN];
        self.source.read_exact(&mut window)?;
        byte_to_carrier(value, &mut window);
        self.sink.write_all(&window)?;
        self.consumed += BYTE_CARRIER_LEN as u64;
        Ok(())
    }

    fn put_bytes(&mut self, values: &[u8]) -> io::Result<()> {
        values.iter().try_for_each(|&value| self.put_byte(value))
    }

    fn put_int(&mut self, value: u32) -> io::Result<()> {
        let mut window = [0u8; LENGTH_CARRIER_LEN];
        self.source.read_exact(&mut window)?;
        int_to_carrier(value, &mut window);
        self.sink.write_all(&window)?;
        self.consumed += LENGTH_CARRIER_LEN as u64;
        Ok(())
    }

    /// 复制剩余的源字节并冲刷输出流，返回复制的字节数。
    fn finish(mut self) -> io::Result<u64> {
        let copied = io::copy(&mut self.source, &mut self.sink)?;
        self.sink.flush()?;
        Ok(copied)
    }
}

/// 把 `secret` 连同其扩展名嵌入 `carrier`，结果写入 `out`。
///
/// 写出任何字节之前会先读取头部并做容量检查，容量不足时输出流保持为空。
///
/// # Errors
///
/// * 载体不足 54 字节、扩展名过长或容量不足 (此时未写出任何字节)。
/// * 读写失败；若载体的实际像素数据比头部声明的短，表现为 `UnexpectedEof`。
pub fn embed<R: Read, W: Write>(
    mut carrier: R,
    secret: &[u8],
    extension: &Extension,
    mut out: W,
) -> Result<EmbedReport> {
    let mut header = [0u8; BMP_HEADER_SIZE];
    let header_len = read_header(&mut carrier, &mut header)?;
    let plan = plan_capacity(&header[..header_len], secret.len() as u64, extension)?;

    out.write_all(&header)?;

    let mut writer = CarrierWriter {
        source: carrier,
        sink: out,
        consumed: 0,
    };

    for field in FrameField::ORDER {
        match field {
            FrameField::Magic => writer.put_bytes(MAGIC_MARKER)?,
            FrameField::ExtensionLen => writer.put_int(plan.layout.extension_len())?,
            FrameField::Extension => writer.put_bytes(extension.as_bytes())?,
            FrameField::PayloadLen => writer.put_int(plan.layout.payload_len())?,
            FrameField::Payload => writer.put_bytes(secret)?,
        }
    }

    let frame_bytes = writer.consumed;
    debug_assert_eq!(frame_bytes, plan.layout.carrier_len());
    let remaining = writer.finish()?;

    Ok(EmbedReport {
        plan,
        frame_bytes,
        bytes_written: BMP_HEADER_SIZE as u64 + frame_bytes + remaining,
    })
}
