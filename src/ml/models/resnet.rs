// ============================================================
// Layer 5 — ResNet
// ============================================================
// ResNet-18 with a single-channel stem.
//
//   stem    conv 7×7 /2 (1 → 64), BN, relu, max pool 3×3 /2   28 → 14 → 7
//   layer1  2 × BasicBlock(64)                                  7
//   layer2  2 × BasicBlock(128), first /2                       4
//   layer3  2 × BasicBlock(256), first /2                       2
//   layer4  2 × BasicBlock(512), first /2                       1
//   head    global average pool, linear 512 → classes

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::model::SignClassifier;

const STAGES: [(usize, usize); 4] = [(64, 1), (128, 2), (256, 2), (512, 2)];
const BLOCKS_PER_STAGE: usize = 2;

#[derive(Config, Debug)]
pub struct ResNetConfig {
    pub num_classes: usize,
}

impl ResNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let mut blocks = Vec::new();
        let mut channels_in = 64;
        for (channels_out, stride) in STAGES {
            for i in 0..BLOCKS_PER_STAGE {
                let stride = if i == 0 { stride } else { 1 };
                blocks.push(BasicBlock::new(channels_in, channels_out, stride, device));
                channels_in = channels_out;
            }
        }

        ResNet {
            stem_conv: Conv2dConfig::new([1, 64], [7, 7])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(3, 3))
                .with_bias(false)
                .init(device),
            stem_norm: BatchNormConfig::new(64).init(device),
            stem_pool: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),
            blocks,
            avg_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc:       LinearConfig::new(channels_in, self.num_classes).init(device),
        }
    }
}

fn conv3x3<B: Backend>(channels_in: usize, channels_out: usize, stride: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([channels_in, channels_out], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .init(device)
}

/// 1×1 projection used when a block changes resolution or width.
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
}

impl<B: Backend> Downsample<B> {
    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.norm.forward(self.conv.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    conv1:      Conv2d<B>,
    norm1:      BatchNorm<B, 2>,
    conv2:      Conv2d<B>,
    norm2:      BatchNorm<B, 2>,
    downsample: Option<Downsample<B>>,
}

impl<B: Backend> BasicBlock<B> {
    fn new(channels_in: usize, channels_out: usize, stride: usize, device: &B::Device) -> Self {
        let downsample = (stride != 1 || channels_in != channels_out).then(|| Downsample {
            conv: Conv2dConfig::new([channels_in, channels_out], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device),
            norm: BatchNormConfig::new(channels_out).init(device),
        });

        Self {
            conv1: conv3x3(channels_in, channels_out, stride, device),
            norm1: BatchNormConfig::new(channels_out).init(device),
            conv2: conv3x3(channels_out, channels_out, 1, device),
            norm2: BatchNormConfig::new(channels_out).init(device),
            downsample,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(down) => down.forward(x.clone()),
            None => x.clone(),
        };
        let out = relu(self.norm1.forward(self.conv1.forward(x)));
        let out = self.norm2.forward(self.conv2.forward(out));
        relu(out + identity)
    }
}

#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    stem_conv: Conv2d<B>,
    stem_norm: BatchNorm<B, 2>,
    stem_pool: MaxPool2d,
    blocks:    Vec<BasicBlock<B>>,
    avg_pool:  AdaptiveAvgPool2d,
    fc:        Linear<B>,
}

impl<B: Backend> SignClassifier<B> for ResNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.stem_norm.forward(self.stem_conv.forward(images)));
        let mut x = self.stem_pool.forward(x);
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = self.avg_pool.forward(x).flatten::<2>(1, 3);
        self.fc.forward(x)
    }
}
