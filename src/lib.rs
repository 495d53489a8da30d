//! # bmp_lsb 库
//!
//! 本库包含 BMP LSB 隐写工具的核心逻辑：位编解码、帧布局、容量规划、嵌入与提取，
//! 以及命令行层的参数定义和命令处理。

// 声明库包含的所有模块。

pub mod capacity;
pub mod cli;
pub mod constants;
pub mod embed;
pub mod error;
pub mod extract;
pub mod frame;
pub mod handler;
pub mod steganography;

pub use capacity::{
    CapacityPlan, Dimensions, carrier_capacity, check_capacity, plan_capacity, required_bytes,
};
pub use embed::{EmbedReport, embed};
pub use error::StegoError;
pub use extract::{DecodeState, Extracted, Extractor, PayloadReader, extract};
pub use frame::{Extension, FrameField, FrameLayout};
