// src/preprocess.rs

/// Preprocess a raw RGB frame for model input: stretch-resize to the
/// model's square input resolution (no letterboxing), scale to [0, 1]
/// and convert HWC -> CHW.
pub fn preprocess(src: &[u8], src_width: usize, src_height: usize, dst_size: usize) -> Vec<f32> {
    let resized = resize_bilinear(src, src_width, src_height, dst_size, dst_size);

    let mut output = vec![0.0f32; 3 * dst_size * dst_size];
    for c in 0..3 {
        for h in 0..dst_size {
            for w in 0..dst_size {
                let hwc_idx = (h * dst_size + w) * 3 + c;
                let chw_idx = c * dst_size * dst_size + h * dst_size + w;
                output[chw_idx] = resized[hwc_idx] as f32 / 255.0;
            }
        }
    }

    output
}

/// Bilinear image resize over packed RGB bytes.
fn resize_bilinear(src: &[u8], src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Vec<u8> {
    let mut dst = vec![0u8; dst_h * dst_w * 3];

    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx as f32 * x_ratio;
            let sy = dy as f32 * y_ratio;
            let sx0 = sx.floor() as usize;
            let sy0 = sy.floor() as usize;
            let sx1 = (sx0 + 1).min(src_w - 1);
            let sy1 = (sy0 + 1).min(src_h - 1);
            let fx = sx - sx0 as f32;
            let fy = sy - sy0 as f32;

            for c in 0..3 {
                let p00 = src[(sy0 * src_w + sx0) * 3 + c] as f32;
                let p10 = src[(sy0 * src_w + sx1) * 3 + c] as f32;
                let p01 = src[(sy1 * src_w + sx0) * 3 + c] as f32;
                let p11 = src[(sy1 * src_w + sx1) * 3 + c] as f32;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                dst[(dy * dst_w + dx) * 3 + c] = val.round() as u8;
            }
        }
    }

    dst
}
