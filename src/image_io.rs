//! PPM (P6, raw binary) image sink.

use std::io::{self, Write};

use crate::pipeline::{channel_to_byte, Framebuffer};

/// Writes `framebuffer` to `writer` as a binary PPM (P6): the three-line
/// ASCII header `P6\n<width> <height>\n255\n`, followed by one RGB byte
/// triple per pixel in row-major order, gamma-corrected on the way out.
pub fn write_ppm(framebuffer: &Framebuffer, writer: &mut impl Write) -> io::Result<()> {
    write!(writer, "P6\n{} {}\n255\n", framebuffer.width, framebuffer.height)?;
    let mut bytes = Vec::with_capacity(framebuffer.pixels.len() * 3);
    for pixel in &framebuffer.pixels {
        bytes.push(channel_to_byte(pixel.x));
        bytes.push(channel_to_byte(pixel.y));
        bytes.push(channel_to_byte(pixel.z));
    }
    writer.write_all(&bytes)
}
