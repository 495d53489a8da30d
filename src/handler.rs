//! # 命令处理逻辑模块
//!
//! 包含处理 `encode`、`decode` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::capacity::{Dimensions, check_capacity, plan_capacity, required_bytes};
use crate::cli::{CapacityArgs, DecodeArgs, EncodeArgs};
use crate::constants::{BMP_HEADER_SIZE, DEFAULT_DECODE_BASE, DEFAULT_STEGO_NAME};
use crate::embed::embed;
use crate::error::StegoError;
use crate::extract::Extractor;
use crate::frame::Extension;
use anyhow::{Context, Result};
use colored::Colorize;
use image::ImageFormat;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 未指定 `--dest` 时隐写图像的默认路径：输入图像同目录下的 `output.bmp`。
pub fn default_stego_path(image: &Path) -> PathBuf {
    image.with_file_name(DEFAULT_STEGO_NAME)
}

/// 计算恢复文件的基础名 (不含扩展名)。
///
/// 用户给出的名字只保留第一个 `.` 之前的部分；未给出时使用输入图像同目录下的 `Decode`。
pub fn decode_base(output: Option<&Path>, image: &Path) -> PathBuf {
    match output {
        Some(path) => {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let base = name
                .split('.')
                .next()
                .filter(|base| !base.is_empty())
                .unwrap_or(DEFAULT_DECODE_BASE);
            path.with_file_name(base)
        }
        None => image.with_file_name(DEFAULT_DECODE_BASE),
    }
}

/// 把解码出的扩展名拼接到基础名之后。
pub fn recovered_path(base: &Path, extension: &Extension) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(extension.to_string());
    PathBuf::from(name)
}

/// 读取载体图像并确认其为 BMP 格式。
fn read_carrier(path: &Path) -> Result<Vec<u8>> {
    let picture = fs::read(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;

    anyhow::ensure!(
        picture.len() >= BMP_HEADER_SIZE
            && matches!(image::guess_format(&picture), Ok(ImageFormat::Bmp)),
        "The file is not a valid 24-bit BMP image: {}",
        path.to_string_lossy().red().bold()
    );

    Ok(picture)
}

/// 目标文件已存在且未指定 `--force` 时拒绝继续。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 处理 'Encode' 命令的执行逻辑。
///
/// 负责读取载体图像和秘密文件、检查隐写空间是否足够、调用嵌入核心函数，
/// 最后将结果写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像或秘密文件，或图像不是 BMP。
/// * 秘密文件的扩展名超过 4 字节。
/// * 目标文件已存在且未指定 `--force`。
/// * 图像文件没有足够的空间来隐藏秘密文件 (此时不会创建目标文件)。
/// * 无法写入到目标图像文件。
pub fn handle_encode(args: EncodeArgs) -> Result<()> {
    let picture = read_carrier(&args.image)?;

    let secret = fs::read(&args.secret).with_context(|| {
        format!(
            "Unable to read secret file: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;

    let extension = Extension::from_path(&args.secret).with_context(|| {
        format!(
            "Unsupported secret file name: {}",
            args.secret.to_string_lossy().red().bold()
        )
    })?;

    let dest = args
        .dest
        .unwrap_or_else(|| default_stego_path(&args.image));
    ensure_writable(&dest, args.force)?;

    let plan = match plan_capacity(&picture, secret.len() as u64, &extension) {
        Ok(plan) => plan,
        Err(StegoError::InsufficientCapacity {
            required,
            available,
        }) => anyhow::bail!(
            "Not enough space in the image to hide the secret file. \nRequired: {}, Available: {}",
            required.to_string().red().bold(),
            available.to_string().green().bold()
        ),
        Err(e) => Err(e).with_context(|| {
            format!(
                "Unable to embed {} into {}",
                args.secret.to_string_lossy().red().bold(),
                args.image.to_string_lossy().red().bold()
            )
        })?,
    };

    println!(
        "Carrier {} is {}x{} pixels, capacity {} bytes, frame needs {} bytes.",
        args.image.to_string_lossy().green(),
        plan.dimensions.width,
        plan.dimensions.height,
        plan.capacity.to_string().green(),
        plan.required().to_string().green()
    );

    let file = File::create(&dest).with_context(|| {
        format!(
            "Unable to create target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    let report = embed(picture.as_slice(), &secret, &extension, BufWriter::new(file))
        .with_context(|| {
            format!(
                "Failed to write the stego image: {}. \nThe image file may be corrupt or write-protected.",
                dest.to_string_lossy().red().bold()
            )
        })?;

    println!("Header copied, magic marker embedded.");
    println!(
        "Extension encoded: {}",
        extension.to_string().green().bold()
    );
    println!(
        "Secret file size: {} bytes encoded, {} pixel bytes carry the frame.",
        report.plan.layout.payload_len().to_string().green(),
        report.frame_bytes.to_string().green()
    );
    println!(
        "The secret file has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、校验魔数、解出扩展名和载荷长度，
/// 再将载荷逐字节写入 `<基础名><扩展名>`。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `DecodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件，或图像不是 BMP。
/// * 图像中没有隐藏数据 (魔数不匹配)。
/// * 隐藏的帧已损坏或图像数据不完整。
/// * 目标文件已存在且未指定 `--force`，或无法写入。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    let picture = read_carrier(&args.image)?;

    let extractor = match Extractor::open(picture.as_slice()) {
        Ok(extractor) => extractor,
        Err(StegoError::NotEncoded) => anyhow::bail!(
            "The provided file does not appear to be encoded: {}. \nPlease supply a valid encoded BMP.",
            args.image.to_string_lossy().red().bold()
        ),
        Err(e) => Err(e).with_context(|| {
            format!(
                "Failed to read the hidden frame from '{}'. \nThe image may be corrupted.",
                args.image.to_string_lossy().red().bold()
            )
        })?,
    };

    println!("Magic marker verified, the image contains hidden data.");
    println!(
        "Reconstructing the hidden file (ext: {}, {} bytes)...",
        extractor.extension().to_string().green().bold(),
        extractor.payload_len().to_string().green()
    );

    let base = decode_base(args.output.as_deref(), &args.image);
    let target = recovered_path(&base, extractor.extension());
    ensure_writable(&target, args.force)?;

    let file = File::create(&target).with_context(|| {
        format!(
            "Unable to create target file: {}",
            target.to_string_lossy().red().bold()
        )
    })?;
    let mut writer = BufWriter::new(file);
    let mut payload = extractor.into_payload();

    io::copy(&mut payload, &mut writer)
        .and_then(|_| writer.flush())
        .with_context(|| {
            format!(
                "Failed to extract the hidden file into {}. \n{} bytes were still missing when the image data ran out or the write failed.",
                target.to_string_lossy().red().bold(),
                payload.remaining().to_string().red().bold()
            )
        })?;

    println!(
        "The hidden file has been successfully recovered and saved: {}",
        target.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 'capacity' 命令对某个秘密文件的检查结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretFit {
    /// 嵌入该文件所需的载体字节数 (含头部)。
    pub required: u64,
    pub fits: bool,
}

/// 'capacity' 命令的检查结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub dimensions: Dimensions,
    pub capacity: u64,
    pub secret: Option<SecretFit>,
}

/// 读取图像头部计算容量；给出秘密文件时，再判断它能否放入。
///
/// # Errors
///
/// * 无法读取图像或秘密文件，或图像不是 BMP。
/// * 头部声明的尺寸过大。
/// * 秘密文件的扩展名不合法。
pub fn capacity_report(image: &Path, secret: Option<&Path>) -> Result<CapacityReport> {
    let picture = read_carrier(image)?;
    let dimensions = Dimensions::from_header(&picture)?;
    let capacity = dimensions.capacity().with_context(|| {
        format!(
            "Unable to compute the capacity of {}",
            image.to_string_lossy().red().bold()
        )
    })?;

    let secret = match secret {
        Some(secret) => {
            let secret_len = fs::metadata(secret)
                .with_context(|| {
                    format!(
                        "Unable to read secret file: {}",
                        secret.to_string_lossy().red().bold()
                    )
                })?
                .len();
            let extension = Extension::from_path(secret)?;
            let required = required_bytes(secret_len, extension.len())?;
            Some(SecretFit {
                required,
                fits: check_capacity(capacity, required).is_ok(),
            })
        }
        None => None,
    };

    Ok(CapacityReport {
        dimensions,
        capacity,
        secret,
    })
}

/// 处理 'Capacity' 命令的执行逻辑。
///
/// 打印图像尺寸与容量；若给出了秘密文件，再报告所需字节数以及能否放入。
///
/// # Errors
///
/// 与 [`capacity_report`] 相同。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let report = capacity_report(&args.image, args.secret.as_deref())?;

    println!(
        "{}: {}x{} pixels, capacity {} bytes.",
        args.image.to_string_lossy().green().bold(),
        report.dimensions.width,
        report.dimensions.height,
        report.capacity.to_string().green()
    );

    let (Some(secret), Some(fit)) = (args.secret, report.secret) else {
        return Ok(());
    };

    if fit.fits {
        println!(
            "{} fits: {} of {} bytes required.",
            secret.to_string_lossy().green().bold(),
            fit.required.to_string().green(),
            report.capacity
        );
    } else {
        println!(
            "{} does not fit: {} bytes required, {} available.",
            secret.to_string_lossy().red().bold(),
            fit.required.to_string().red().bold(),
            report.capacity
        );
    }

    Ok(())
}
