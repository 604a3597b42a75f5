//! Tensor primitives for the fixed VGG-style forward pass. Plain `f32`
//! buffers in CHW layout; no inference runtime behind this, every op is
//! written out directly.

/// Dense CHW tensor.
#[derive(Debug, Clone)]
pub struct Tensor3 {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

impl Tensor3 {
    pub fn zeros(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
            data: vec![0.0; channels * height * width],
        }
    }

    pub fn from_vec(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), channels * height * width);
        Self {
            channels,
            height,
            width,
            data,
        }
    }

    #[inline]
    pub fn get(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, c: usize, y: usize, x: usize, v: f32) {
        self.data[(c * self.height + y) * self.width + x] = v;
    }
}

/// 3×3 convolution with padding 1 and stride 1 followed by ReLU. Weight
/// layout is (out, in, 3, 3) row-major; `bias.len()` fixes the output
/// channel count.
pub fn conv3x3_relu(input: &Tensor3, weight: &[f32], bias: &[f32]) -> Tensor3 {
    let (c_in, h, w) = (input.channels, input.height, input.width);
    let c_out = bias.len();
    debug_assert_eq!(weight.len(), c_out * c_in * 9);

    let mut out = Tensor3::zeros(c_out, h, w);
    for oc in 0..c_out {
        for y in 0..h {
            for x in 0..w {
                let mut acc = bias[oc];
                for ic in 0..c_in {
                    for ky in 0..3 {
                        let iy = y + ky;
                        if iy == 0 || iy > h {
                            continue;
                        }
                        for kx in 0..3 {
                            let ix = x + kx;
                            if ix == 0 || ix > w {
                                continue;
                            }
                            acc += input.get(ic, iy - 1, ix - 1)
                                * weight[((oc * c_in + ic) * 3 + ky) * 3 + kx];
                        }
                    }
                }
                out.set(oc, y, x, acc.max(0.0));
            }
        }
    }
    out
}

/// 2×2 max-pooling with stride 2; trailing odd rows/columns are dropped.
pub fn max_pool2(input: &Tensor3) -> Tensor3 {
    let oh = input.height / 2;
    let ow = input.width / 2;
    let mut out = Tensor3::zeros(input.channels, oh, ow);
    for c in 0..input.channels {
        for y in 0..oh {
            for x in 0..ow {
                let m = input
                    .get(c, 2 * y, 2 * x)
                    .max(input.get(c, 2 * y, 2 * x + 1))
                    .max(input.get(c, 2 * y + 1, 2 * x))
                    .max(input.get(c, 2 * y + 1, 2 * x + 1));
                out.set(c, y, x, m);
            }
        }
    }
    out
}

/// Global average pooling: one mean per channel.
pub fn global_avg_pool(input: &Tensor3) -> Vec<f32> {
    let plane = (input.height * input.width) as f32;
    (0..input.channels)
        .map(|c| {
            let start = c * input.height * input.width;
            let end = start + input.height * input.width;
            input.data[start..end].iter().sum::<f32>() / plane
        })
        .collect()
}

/// Fully connected layer. Weight layout is (out, in) row-major.
pub fn dense(input: &[f32], weight: &[f32], bias: &[f32]) -> Vec<f32> {
    let in_dim = input.len();
    debug_assert_eq!(weight.len(), bias.len() * in_dim);
    bias.iter()
        .enumerate()
        .map(|(o, b)| {
            let row = &weight[o * in_dim..(o + 1) * in_dim];
            b + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>()
        })
        .collect()
}

pub fn relu_in_place(xs: &mut [f32]) {
    for x in xs {
        *x = x.max(0.0);
    }
}

#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
