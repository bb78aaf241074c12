use crate::framebuffer::Pixel;
use monoio::{
    io::{AsyncWriteRent, AsyncWriteRentExt},
    net::TcpStream,
};
use rand::seq::SliceRandom;
use std::{mem, net::SocketAddr};

const HEX: &[u8; 16] = b"0123456789abcdef";

macro_rules! attempt {
    ($io:expr) => {{
        let (result, buf) = { $io };
        result?;
        buf
    }};
}

async fn connect(addr: SocketAddr) -> anyhow::Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Append `PX <x> <y> <rrggbb>\n` for one pixel.
fn encode_pixel(
    buf: &mut Vec<u8>,
    num_buf: &mut itoa::Buffer,
    pixel: &Pixel,
    (x_offset, y_offset): (usize, usize),
) {
    buf.extend_from_slice(b"PX ");
    buf.extend_from_slice(num_buf.format(pixel.x + x_offset).as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(num_buf.format(pixel.y + y_offset).as_bytes());
    buf.push(b' ');

    // alpha is dropped
    let [r, g, b, _] = pixel.rgba.to_be_bytes();
    for channel in [r, g, b] {
        buf.push(HEX[usize::from(channel >> 4)]);
        buf.push(HEX[usize::from(channel & 0xF)]);
    }
    buf.push(b'\n');
}

/// Connection to a pixelflut server acting as the viewer's display.
pub struct Pixelflut {
    addr: SocketAddr,
    stream: TcpStream,
    offset: (usize, usize),
    shuffle: bool,
    buf: Vec<u8>,
}

impl Pixelflut {
    pub async fn connect(
        addr: SocketAddr,
        offset: (usize, usize),
        shuffle: bool,
    ) -> anyhow::Result<Self> {
        info!(%addr, "connecting to pixelflut server");

        Ok(Self {
            addr,
            stream: connect(addr).await?,
            offset,
            shuffle,
            buf: Vec::new(),
        })
    }

    pub async fn reconnect(&mut self) -> anyhow::Result<()> {
        self.stream = connect(self.addr).await?;
        Ok(())
    }

    pub async fn send(&mut self, mut pixels: Vec<Pixel>) -> anyhow::Result<()> {
        debug!(pixels = pixels.len(), "sending pixels..");

        if self.shuffle {
            pixels.shuffle(&mut rand::thread_rng());
        }

        let mut buf = mem::take(&mut self.buf);
        buf.clear();

        let mut num_buf = itoa::Buffer::new();
        for pixel in &pixels {
            encode_pixel(&mut buf, &mut num_buf, pixel, self.offset);
        }

        self.buf = attempt!(self.stream.write_all(buf).await);
        self.stream.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pixel() {
        let mut buf = Vec::new();
        let mut num_buf = itoa::Buffer::new();

        let pixel = Pixel {
            x: 3,
            y: 17,
            rgba: 0x0A_FF_80_FF,
        };
        encode_pixel(&mut buf, &mut num_buf, &pixel, (0, 0));
        encode_pixel(&mut buf, &mut num_buf, &pixel, (100, 1));

        assert_eq!(buf, b"PX 3 17 0aff80\nPX 103 18 0aff80\n");
    }
}
