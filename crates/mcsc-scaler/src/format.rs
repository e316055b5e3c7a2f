//! Pixel format validation and DMA image format mapping

use mcsc_core::param::{DmaFormat, DmaOrder, OtfFormat};
use mcsc_core::FormatError;

use crate::ratio::ScaleLimits;

/// A scaler I/O path with its requested format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
    OtfInput(OtfFormat),
    OtfOutput(OtfFormat),
    DmaInput(DmaFormat),
    DmaOutput(DmaFormat),
}

impl IoType {
    fn name(&self) -> &'static str {
        match self {
            IoType::OtfInput(_) => "OTF input",
            IoType::OtfOutput(_) => "OTF output",
            IoType::DmaInput(_) => "DMA input",
            IoType::DmaOutput(_) => "DMA output",
        }
    }
}

fn format_name(format: DmaFormat) -> &'static str {
    match format {
        DmaFormat::Yuv422 => "YUV422",
        DmaFormat::Yuv420 => "YUV420",
        DmaFormat::Y => "Y",
        DmaFormat::Rgb => "RGB",
    }
}

/// Check format, bit depth and size of one path
pub fn check_format(
    io: IoType,
    bit_width: u32,
    width: u32,
    height: u32,
    limits: &ScaleLimits,
) -> Result<(), FormatError> {
    let range = limits.min_size..=limits.max_size;
    if !range.contains(&width) || !range.contains(&height) {
        tracing::error!("Invalid MCSC {} size {}x{}", io.name(), width, height);
        return Err(FormatError::Size { width, height });
    }

    let (format_ok, bits_ok) = match io {
        IoType::OtfInput(f) => (matches!(f, OtfFormat::Yuv422 | OtfFormat::Y), bit_width == 8),
        IoType::OtfOutput(f) => (f == OtfFormat::Yuv422, bit_width == 8),
        IoType::DmaInput(f) => (
            matches!(f, DmaFormat::Yuv422 | DmaFormat::Y),
            matches!(bit_width, 8 | 10 | 16),
        ),
        IoType::DmaOutput(_) => (true, matches!(bit_width, 8 | 10 | 16 | 32)),
    };

    if !format_ok {
        let format = match io {
            IoType::OtfInput(_) | IoType::OtfOutput(_) => "Y",
            IoType::DmaInput(f) | IoType::DmaOutput(f) => format_name(f),
        };
        tracing::error!("Invalid MCSC {} format {}", io.name(), format);
        return Err(FormatError::Unsupported { format, planes: 0 });
    }
    if !bits_ok {
        tracing::error!("Invalid MCSC {} bit width {}", io.name(), bit_width);
        return Err(FormatError::BitWidth(bit_width));
    }
    Ok(())
}

/// Image format code understood by the DMA engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum ImgFormat {
    Yuv420CbCr2P = 0,
    Yuv420CrCb2P = 1,
    Yuv420P3 = 2,
    #[default]
    Yuv422Yuyv = 3,
    Yuv422Yvyu = 4,
    Yuv422Uyvy = 5,
    Yuv422Vyuy = 6,
    Yuv422CbCr2P = 7,
    Yuv422CrCb2P = 8,
    Yuv422P3 = 9,
    Argb8888 = 10,
    Bgra8888 = 11,
    Rgba8888 = 12,
    Abgr8888 = 13,
    MonoY8 = 14,
}

fn unsupported(format: DmaFormat, planes: u32) -> FormatError {
    FormatError::Unsupported {
        format: format_name(format),
        planes,
    }
}

fn yuv_format(format: DmaFormat, plane: u32, order: DmaOrder) -> Result<ImgFormat, FormatError> {
    let is_420 = format == DmaFormat::Yuv420;
    match (plane, order) {
        (2 | 4, DmaOrder::CbCr) if is_420 => Ok(ImgFormat::Yuv420CbCr2P),
        (2 | 4, DmaOrder::CrCb) if is_420 => Ok(ImgFormat::Yuv420CrCb2P),
        (3, _) if is_420 => Ok(ImgFormat::Yuv420P3),
        (1, DmaOrder::YCbYCr) if !is_420 => Ok(ImgFormat::Yuv422Yuyv),
        (1, DmaOrder::YCrYCb) if !is_420 => Ok(ImgFormat::Yuv422Yvyu),
        (1, DmaOrder::CbYCrY) if !is_420 => Ok(ImgFormat::Yuv422Uyvy),
        (1, DmaOrder::CrYCbY) if !is_420 => Ok(ImgFormat::Yuv422Vyuy),
        (2 | 4, DmaOrder::CbCr) => Ok(ImgFormat::Yuv422CbCr2P),
        (2 | 4, DmaOrder::CrCb) => Ok(ImgFormat::Yuv422CrCb2P),
        (3, _) => Ok(ImgFormat::Yuv422P3),
        _ => Err(unsupported(format, plane)),
    }
}

/// Image format of the read DMA
pub fn input_img_format(format: DmaFormat, plane: u32, order: DmaOrder) -> Result<ImgFormat, FormatError> {
    match format {
        DmaFormat::Yuv420 | DmaFormat::Yuv422 => yuv_format(format, plane, order),
        DmaFormat::Y => Ok(ImgFormat::MonoY8),
        DmaFormat::Rgb => Err(unsupported(format, plane)),
    }
}

/// Image format of a write DMA and whether 4:2:0 conversion is needed
pub fn output_img_format(
    format: DmaFormat,
    plane: u32,
    order: DmaOrder,
) -> Result<(ImgFormat, bool), FormatError> {
    match format {
        DmaFormat::Yuv420 => Ok((yuv_format(format, plane, order)?, true)),
        DmaFormat::Yuv422 => Ok((yuv_format(format, plane, order)?, false)),
        DmaFormat::Rgb => {
            let img = match order {
                DmaOrder::Argb => ImgFormat::Argb8888,
                DmaOrder::Bgra => ImgFormat::Bgra8888,
                DmaOrder::Abgr => ImgFormat::Abgr8888,
                _ => ImgFormat::Rgba8888,
            };
            Ok((img, false))
        }
        DmaFormat::Y => Ok((ImgFormat::MonoY8, false)),
    }
}

/// 10-bit storage type of a DMA path
pub fn bit_type_10(bit_width: u32, plane: u32) -> u32 {
    match bit_width {
        16 => 2,
        10 if plane == 4 => 1,
        10 => 3,
        _ => 0,
    }
}

/// Stride of the separate 2-bit planes in 8+2 layouts
pub fn stride_2bit(width: u32) -> u32 {
    (width / 4).div_ceil(16) * 16
}

/// The post-chain output must match the DMA output size once committed
pub fn check_post_size(post_w: u32, post_h: u32, out_w: u32, out_h: u32) -> Result<(), FormatError> {
    if post_w != 0 && post_h != 0 && (post_w != out_w || post_h != out_h) {
        return Err(FormatError::SizeMismatch {
            post_w,
            post_h,
            out_w,
            out_h,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_sizes() {
        let limits = ScaleLimits::default();
        let io = IoType::DmaOutput(DmaFormat::Yuv420);
        assert!(check_format(io, 8, 16, 16, &limits).is_ok());
        assert!(check_format(io, 8, 8192, 8192, &limits).is_ok());
        assert_eq!(
            check_format(io, 8, 15, 100, &limits),
            Err(FormatError::Size { width: 15, height: 100 })
        );
        assert!(check_format(io, 8, 100, 8193, &limits).is_err());
    }

    #[test]
    fn test_check_formats() {
        let limits = ScaleLimits::default();
        assert!(check_format(IoType::OtfInput(OtfFormat::Y), 8, 64, 64, &limits).is_ok());
        assert!(check_format(IoType::OtfOutput(OtfFormat::Y), 8, 64, 64, &limits).is_err());
        assert_eq!(
            check_format(IoType::OtfInput(OtfFormat::Yuv422), 10, 64, 64, &limits),
            Err(FormatError::BitWidth(10))
        );
        assert!(check_format(IoType::DmaInput(DmaFormat::Yuv420), 8, 64, 64, &limits).is_err());
        assert!(check_format(IoType::DmaInput(DmaFormat::Y), 16, 64, 64, &limits).is_ok());
        assert!(check_format(IoType::DmaOutput(DmaFormat::Rgb), 32, 64, 64, &limits).is_ok());
        assert!(check_format(IoType::DmaOutput(DmaFormat::Rgb), 12, 64, 64, &limits).is_err());
    }

    #[test]
    fn test_input_mapping() {
        assert_eq!(
            input_img_format(DmaFormat::Yuv422, 1, DmaOrder::CbYCrY),
            Ok(ImgFormat::Yuv422Uyvy)
        );
        assert_eq!(
            input_img_format(DmaFormat::Yuv422, 4, DmaOrder::CrCb),
            Ok(ImgFormat::Yuv422CrCb2P)
        );
        assert_eq!(input_img_format(DmaFormat::Y, 1, DmaOrder::CbCr), Ok(ImgFormat::MonoY8));
        assert!(input_img_format(DmaFormat::Yuv422, 1, DmaOrder::CbCr).is_err());
        assert!(input_img_format(DmaFormat::Yuv422, 5, DmaOrder::CbCr).is_err());
    }

    #[test]
    fn test_output_mapping() {
        assert_eq!(
            output_img_format(DmaFormat::Yuv420, 2, DmaOrder::CbCr),
            Ok((ImgFormat::Yuv420CbCr2P, true))
        );
        assert_eq!(
            output_img_format(DmaFormat::Yuv420, 3, DmaOrder::Argb),
            Ok((ImgFormat::Yuv420P3, true))
        );
        assert!(output_img_format(DmaFormat::Yuv420, 1, DmaOrder::YCbYCr).is_err());
        assert_eq!(
            output_img_format(DmaFormat::Rgb, 1, DmaOrder::CbCr),
            Ok((ImgFormat::Rgba8888, false))
        );
        assert_eq!(
            output_img_format(DmaFormat::Rgb, 1, DmaOrder::Bgra),
            Ok((ImgFormat::Bgra8888, false))
        );
    }

    #[test]
    fn test_bit_type_and_strides() {
        assert_eq!(bit_type_10(16, 2), 2);
        assert_eq!(bit_type_10(10, 4), 1);
        assert_eq!(bit_type_10(10, 2), 3);
        assert_eq!(bit_type_10(8, 2), 0);
        assert_eq!(stride_2bit(1920), 480);
        assert_eq!(stride_2bit(1000), 256);
    }

    #[test]
    fn test_post_size_consistency() {
        assert!(check_post_size(0, 0, 640, 480).is_ok());
        assert!(check_post_size(640, 480, 640, 480).is_ok());
        assert!(matches!(
            check_post_size(640, 360, 640, 480),
            Err(FormatError::SizeMismatch { .. })
        ));
    }
}
