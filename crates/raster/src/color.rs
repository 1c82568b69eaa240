/// RGBA8 colour as stored in bitmaps and the frame buffer.
pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Unpack `0xRRGGBBAA`.
pub const fn rgba_from_packed(packed: u32) -> Rgba {
    [
        (packed >> 24) as u8,
        (packed >> 16) as u8,
        (packed >> 8) as u8,
        packed as u8,
    ]
}

/// Unpack `0xRRGGBBAA` ignoring the alpha byte. Cell colours are painted opaque.
pub const fn opaque_from_packed(packed: u32) -> Rgba {
    let [r, g, b, _] = rgba_from_packed(packed);
    [r, g, b, 0xff]
}

/// Source-over blend of `src` onto `dst`.
pub fn blend_over(dst: Rgba, src: Rgba) -> Rgba {
    match src[3] {
        0xff => src,
        0 => dst,
        a => {
            let a = a as u32;
            let inv = 255 - a;
            let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
            let out_a = a + (dst[3] as u32 * inv + 127) / 255;
            [
                mix(src[0], dst[0]),
                mix(src[1], dst[1]),
                mix(src[2], dst[2]),
                out_a.min(255) as u8,
            ]
        }
    }
}
