// ============================================================
// Layer 5 — Simple CNN
// ============================================================
// LeNet-style baseline without normalization or dropout.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::model::SignClassifier;

/// LeNet-style network: two unpadded 5×5 convolutions, three dense layers.
#[derive(Config, Debug)]
pub struct SimpleCnnConfig {
    pub num_classes: usize,
}

impl SimpleCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SimpleCnn<B> {
        SimpleCnn {
            conv1: Conv2dConfig::new([1, 6], [5, 5]).init(device),
            conv2: Conv2dConfig::new([6, 16], [5, 5]).init(device),
            pool:  MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            // 28 → 24 → 12 → 8 → 4
            fc1:   LinearConfig::new(16 * 4 * 4, 120).init(device),
            fc2:   LinearConfig::new(120, 84).init(device),
            fc3:   LinearConfig::new(84, self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct SimpleCnn<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    pool:  MaxPool2d,
    fc1:   Linear<B>,
    fc2:   Linear<B>,
    fc3:   Linear<B>,
}

impl<B: Backend> SignClassifier<B> for SimpleCnn<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(relu(self.conv1.forward(images)));
        let x = self.pool.forward(relu(self.conv2.forward(x)));
        let x = x.flatten::<2>(1, 3);
        let x = relu(self.fc1.forward(x));
        let x = relu(self.fc2.forward(x));
        self.fc3.forward(x)
    }
}
