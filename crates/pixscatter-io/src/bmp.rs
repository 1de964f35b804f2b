//! BMP image format support
//!
//! Reads uncompressed Windows Bitmap files (1, 4 and 8 bpp palette images,
//! 24 and 32 bpp direct color) into an RGB [`Raster`], and writes rasters
//! as 24 bpp bottom-up bitmaps.

use crate::{IoError, IoResult};
use pixscatter_core::{Pixel, Raster};
use std::io::{self, Read, Write};

/// BMP file header size
const BMP_FILE_HEADER_SIZE: usize = 14;

/// BMP info header size (BITMAPINFOHEADER)
const BMP_INFO_HEADER_SIZE: u32 = 40;

/// Bits per pixel of written files
const BMP_OUTPUT_BPP: u16 = 24;

fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn le_i32(b: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// Bytes per stored row; BMP rows are 4-byte aligned.
fn row_stride(width: u32, bits_per_pixel: u16) -> usize {
    (width as usize * bits_per_pixel as usize).div_ceil(32) * 4
}

/// Discard the next `n` bytes of `reader`.
fn skip<R: Read>(reader: &mut R, n: u64) -> IoResult<()> {
    let skipped = io::copy(&mut reader.take(n), &mut io::sink())?;
    if skipped < n {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(())
}

/// Read a BMP image
pub fn read_bmp<R: Read>(mut reader: R) -> IoResult<Raster> {
    let mut file_header = [0u8; BMP_FILE_HEADER_SIZE];
    reader.read_exact(&mut file_header)?;

    if &file_header[0..2] != b"BM" {
        return Err(IoError::InvalidData("not a BMP file".to_string()));
    }

    let pixel_offset = le_u32(&file_header, 10) as usize;

    let mut info_header = [0u8; BMP_INFO_HEADER_SIZE as usize];
    reader.read_exact(&mut info_header)?;

    let header_size = le_u32(&info_header, 0);
    if header_size < BMP_INFO_HEADER_SIZE {
        return Err(IoError::InvalidData(format!(
            "unsupported BMP header size: {}",
            header_size
        )));
    }

    let width = le_i32(&info_header, 4);
    let height = le_i32(&info_header, 8);

    let planes = le_u16(&info_header, 12);
    if planes != 1 {
        return Err(IoError::InvalidData(format!(
            "unsupported number of planes: {}",
            planes
        )));
    }

    let bits_per_pixel = le_u16(&info_header, 14);
    let compression = le_u32(&info_header, 16);
    let colors_used = le_u32(&info_header, 32) as usize;

    // BI_RGB, or BI_BITFIELDS with the standard BGRA masks
    if compression != 0 && compression != 3 {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported BMP compression: {}",
            compression
        )));
    }

    if width <= 0 || height == 0 {
        return Err(IoError::InvalidData(format!(
            "invalid BMP dimensions: {}x{}",
            width, height
        )));
    }
    let width = width.unsigned_abs();
    let top_down = height < 0;
    let height = height.unsigned_abs();

    if !matches!(bits_per_pixel, 1 | 4 | 8 | 24 | 32) {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported BMP bit depth: {}",
            bits_per_pixel
        )));
    }

    skip(&mut reader, u64::from(header_size - BMP_INFO_HEADER_SIZE))?;

    // Palette for 1, 4 and 8 bit images
    let palette: Vec<Pixel> = if bits_per_pixel <= 8 {
        let max_colors = 1usize << bits_per_pixel;
        let num_colors = match colors_used {
            0 => max_colors,
            n if n <= max_colors => n,
            n => {
                return Err(IoError::InvalidData(format!(
                    "palette of {} colors for {} bpp",
                    n, bits_per_pixel
                )));
            }
        };
        let mut raw = vec![0u8; num_colors * 4];
        reader.read_exact(&mut raw)?;
        raw.chunks_exact(4)
            .map(|c| Pixel::new(c[2], c[1], c[0]))
            .collect()
    } else {
        Vec::new()
    };

    // Skip to pixel data
    let current_pos = BMP_FILE_HEADER_SIZE + header_size as usize + palette.len() * 4;
    if pixel_offset > current_pos {
        skip(&mut reader, (pixel_offset - current_pos) as u64)?;
    }

    let mut raster = Raster::new(width, height)?;
    let lookup = |index: u8| -> IoResult<Pixel> {
        palette.get(index as usize).copied().ok_or_else(|| {
            IoError::InvalidData(format!("palette index {} out of range", index))
        })
    };

    let stride = row_stride(width, bits_per_pixel);
    let mut row_buffer = Vec::new();
    row_buffer
        .try_reserve_exact(stride)
        .map_err(|_| pixscatter_core::Error::AllocationFailed { width, height })?;
    row_buffer.resize(stride, 0);
    let w = width as usize;

    for row in 0..height {
        reader.read_exact(&mut row_buffer)?;

        let y = if top_down { row } else { height - 1 - row };
        let start = y as usize * w;
        let dst = &mut raster.pixels_mut()[start..start + w];

        match bits_per_pixel {
            1 => {
                for (x, px) in dst.iter_mut().enumerate() {
                    let val = (row_buffer[x / 8] >> (7 - (x % 8))) & 1;
                    *px = lookup(val)?;
                }
            }
            4 => {
                for (x, px) in dst.iter_mut().enumerate() {
                    let byte = row_buffer[x / 2];
                    let val = if x % 2 == 0 { byte >> 4 } else { byte & 0xF };
                    *px = lookup(val)?;
                }
            }
            8 => {
                for (x, px) in dst.iter_mut().enumerate() {
                    *px = lookup(row_buffer[x])?;
                }
            }
            24 => {
                for (px, bgr) in dst.iter_mut().zip(row_buffer.chunks_exact(3)) {
                    *px = Pixel::new(bgr[2], bgr[1], bgr[0]);
                }
            }
            32 => {
                for (px, bgra) in dst.iter_mut().zip(row_buffer.chunks_exact(4)) {
                    *px = Pixel::new(bgra[2], bgra[1], bgra[0]);
                }
            }
            _ => unreachable!(),
        }
    }

    Ok(raster)
}

/// Write a raster as a 24 bpp bottom-up BMP image
pub fn write_bmp<W: Write>(raster: &Raster, mut writer: W) -> IoResult<()> {
    let width = raster.width();
    let height = raster.height();

    let stride = row_stride(width, BMP_OUTPUT_BPP);
    let pixel_data_size = stride * height as usize;
    let pixel_offset = BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE as usize;
    let file_size = u32::try_from(pixel_offset + pixel_data_size).map_err(|_| {
        IoError::UnsupportedFormat(format!("{}x{} is too large for BMP", width, height))
    })?;

    // File header
    writer.write_all(b"BM")?;
    writer.write_all(&file_size.to_le_bytes())?;
    writer.write_all(&[0u8; 4])?; // Reserved
    writer.write_all(&(pixel_offset as u32).to_le_bytes())?;

    // Info header
    writer.write_all(&BMP_INFO_HEADER_SIZE.to_le_bytes())?;
    writer.write_all(&(width as i32).to_le_bytes())?;
    writer.write_all(&(height as i32).to_le_bytes())?; // Bottom-up
    writer.write_all(&1u16.to_le_bytes())?; // Planes
    writer.write_all(&BMP_OUTPUT_BPP.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?; // Compression
    writer.write_all(&(pixel_data_size as u32).to_le_bytes())?;
    writer.write_all(&0i32.to_le_bytes())?; // X pixels per meter
    writer.write_all(&0i32.to_le_bytes())?; // Y pixels per meter
    writer.write_all(&0u32.to_le_bytes())?; // Colors used
    writer.write_all(&0u32.to_le_bytes())?; // Important colors

    let mut row_buffer = vec![0u8; stride];
    for y in (0..height).rev() {
        if let Some(row) = raster.row(y) {
            for (bgr, px) in row_buffer.chunks_exact_mut(3).zip(row) {
                bgr[0] = px.b;
                bgr[1] = px.g;
                bgr[2] = px.r;
            }
        }
        writer.write_all(&row_buffer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bmp_roundtrip_24bit() {
        let mut raster = Raster::new(5, 3).unwrap();
        raster.set(0, 0, Pixel::new(255, 0, 0)).unwrap();
        raster.set(1, 1, Pixel::new(0, 255, 0)).unwrap();
        raster.set(4, 2, Pixel::new(0, 0, 255)).unwrap();

        let mut buffer = Vec::new();
        write_bmp(&raster, &mut buffer).unwrap();
        // 5 * 3 = 15 bytes per row, padded to 16
        assert_eq!(buffer.len(), 54 + 16 * 3);

        let back = read_bmp(Cursor::new(buffer)).unwrap();
        assert_eq!(back, raster);
    }

    #[test]
    fn test_not_a_bmp() {
        let err = read_bmp(Cursor::new(b"PNG-not-a-bitmap-at-all".to_vec())).unwrap_err();
        assert!(matches!(err, IoError::InvalidData(_)));
    }

    #[test]
    fn test_truncated_file() {
        let raster = Raster::filled(4, 4, Pixel::gray(9)).unwrap();
        let mut buffer = Vec::new();
        write_bmp(&raster, &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 5);
        assert!(matches!(
            read_bmp(Cursor::new(buffer)),
            Err(IoError::Io(_))
        ));
    }

    #[test]
    fn test_read_8bit_palette_top_down() {
        // 2x2, 8 bpp, two palette entries, top-down (negative height)
        let mut data = Vec::new();
        let stride = 4usize;
        let offset = 14 + 40 + 2 * 4;
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&((offset + stride * 2) as u32).to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&(offset as u32).to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&(-2i32).to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&2u32.to_le_bytes()); // colors used
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[0, 0, 0, 0]); // black
        data.extend_from_slice(&[30, 20, 10, 0]); // BGR -> (10, 20, 30)
        data.extend_from_slice(&[1, 0, 0, 0]);
        data.extend_from_slice(&[0, 1, 0, 0]);

        let raster = read_bmp(Cursor::new(data)).unwrap();
        assert_eq!(raster.dimensions(), (2, 2));
        assert_eq!(raster.get(0, 0), Some(Pixel::new(10, 20, 30)));
        assert_eq!(raster.get(1, 0), Some(Pixel::new(0, 0, 0)));
        assert_eq!(raster.get(1, 1), Some(Pixel::new(10, 20, 30)));
    }

    fn header(width: i32, height: i32, header_size: u32, pixel_offset: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&pixel_offset.to_le_bytes());
        data.extend_from_slice(&header_size.to_le_bytes());
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 24]);
        data
    }

    #[test]
    fn test_huge_dimensions_fail_cleanly() {
        let data = header(i32::MAX, i32::MAX, 40, 54);
        assert_eq!(data.len(), 54);
        assert!(matches!(
            read_bmp(Cursor::new(data)),
            Err(IoError::Core(pixscatter_core::Error::AllocationFailed { .. }))
        ));

        let data = header(i32::MAX, i32::MIN, 40, 54);
        assert!(read_bmp(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_huge_skips_hit_end_of_file() {
        let data = header(2, 2, 40, u32::MAX);
        match read_bmp(Cursor::new(data)) {
            Err(IoError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected end of file, got {:?}", other.map(|r| r.dimensions())),
        }

        let data = header(2, 2, u32::MAX, 54);
        assert!(matches!(read_bmp(Cursor::new(data)), Err(IoError::Io(_))));
    }
}
