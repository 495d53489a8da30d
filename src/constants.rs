/// BMP 文件的标准头部大小 (字节)。
/// 头部原样复制到输出图像，隐写数据从像素区开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 图像宽度 (`u32`, 小端) 在头部中的偏移量。
pub const WIDTH_OFFSET: usize = 18;

/// 图像高度 (`u32`, 小端) 在头部中的偏移量。
pub const HEIGHT_OFFSET: usize = 22;

/// 每个像素占用的颜色通道字节数 (24 位 BGR，不考虑行填充)。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 帧开头的魔数标记。修改它会使之前生成的隐写图像全部无法解码。
pub const MAGIC_MARKER: &[u8] = b"#*";

/// 隐藏单个字节所需的载体字节数：每个载体字节的最低位存 1 bit。
pub const BYTE_CARRIER_LEN: usize = 8;

/// 隐藏一个 `u32` 长度字段所需的载体字节数 (32 bits)。
pub const LENGTH_CARRIER_LEN: usize = 32;

/// 扩展名 (含前导 `.`) 的最大字节数。
pub const MAX_EXTENSION_LEN: usize = 4;

/// 未指定输出路径时，隐写图像的默认文件名。
pub const DEFAULT_STEGO_NAME: &str = "output.bmp";

/// 未指定输出文件名时，恢复文件的默认基础名 (扩展名由解码结果决定)。
pub const DEFAULT_DECODE_BASE: &str = "Decode";
