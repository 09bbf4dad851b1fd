// ============================================================
// Layer 5 — SqueezeNet
// ============================================================
// SqueezeNet-style network sized for 28×28 inputs.
//
//   conv 3×3 /2 (1 → 64), relu, max pool 3×3 /2     28 → 14 → 7
//   fire(16, 64+64) × 2                              7
//   max pool 3×3 /2                                  4
//   fire(32, 128+128) × 2                            4
//   dropout, conv 1×1 → classes, relu, global avg pool

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::model::SignClassifier;

#[derive(Config, Debug)]
pub struct SqueezeNetConfig {
    pub num_classes: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl SqueezeNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SqueezeNet<B> {
        let pool = || {
            MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init()
        };

        SqueezeNet {
            stem: Conv2dConfig::new([1, 64], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            pool1: pool(),
            fires_a: vec![
                Fire::new(64, 16, 64, device),
                Fire::new(128, 16, 64, device),
            ],
            pool2: pool(),
            fires_b: vec![
                Fire::new(128, 32, 128, device),
                Fire::new(256, 32, 128, device),
            ],
            dropout:    DropoutConfig::new(self.dropout).init(),
            classifier: Conv2dConfig::new([256, self.num_classes], [1, 1]).init(device),
            avg_pool:   AdaptiveAvgPool2dConfig::new([1, 1]).init(),
        }
    }
}

/// Squeeze with 1×1, then expand with parallel 1×1 and 3×3 branches
/// whose outputs are concatenated along the channel axis.
#[derive(Module, Debug)]
pub struct Fire<B: Backend> {
    squeeze:   Conv2d<B>,
    expand1x1: Conv2d<B>,
    expand3x3: Conv2d<B>,
}

impl<B: Backend> Fire<B> {
    fn new(channels_in: usize, squeeze: usize, expand: usize, device: &B::Device) -> Self {
        Self {
            squeeze:   Conv2dConfig::new([channels_in, squeeze], [1, 1]).init(device),
            expand1x1: Conv2dConfig::new([squeeze, expand], [1, 1]).init(device),
            expand3x3: Conv2dConfig::new([squeeze, expand], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let s = relu(self.squeeze.forward(x));
        let a = relu(self.expand1x1.forward(s.clone()));
        let b = relu(self.expand3x3.forward(s));
        Tensor::cat(vec![a, b], 1)
    }
}

#[derive(Module, Debug)]
pub struct SqueezeNet<B: Backend> {
    stem:       Conv2d<B>,
    pool1:      MaxPool2d,
    fires_a:    Vec<Fire<B>>,
    pool2:      MaxPool2d,
    fires_b:    Vec<Fire<B>>,
    dropout:    Dropout,
    classifier: Conv2d<B>,
    avg_pool:   AdaptiveAvgPool2d,
}

impl<B: Backend> SignClassifier<B> for SqueezeNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.pool1.forward(relu(self.stem.forward(images)));
        for fire in &self.fires_a {
            x = fire.forward(x);
        }
        let mut x = self.pool2.forward(x);
        for fire in &self.fires_b {
            x = fire.forward(x);
        }
        let x = relu(self.classifier.forward(self.dropout.forward(x)));
        self.avg_pool.forward(x).flatten::<2>(1, 3)
    }
}
