use burn::module::Module;
use burn::nn::{BiLstm, BiLstmConfig, Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig};
use burn::prelude::Backend;
use burn::tensor::activation::softmax;
use burn::tensor::Tensor;

use crate::model::{LstmSpec, ModelVariant};

/// Stacked lstm layers with dropout between them. Only one of the two
/// layer lists is filled, depending on direction.
#[derive(Module, Debug)]
pub struct LstmStack<B: Backend> {
	layers: Vec<Lstm<B>>,
	bidir_layers: Vec<BiLstm<B>>,
	dropout: Dropout,
}

impl<B: Backend> LstmStack<B> {
	fn new(spec: &LstmSpec, input_size: usize, device: &B::Device) -> Self {
		let mut layers = Vec::new();
		let mut bidir_layers = Vec::new();
		let mut d_input = input_size;

		for _ in 0..spec.num_layers {
			if spec.bidirectional {
				bidir_layers.push(BiLstmConfig::new(d_input, spec.hidden_size, true).init(device));
				d_input = 2 * spec.hidden_size;
			} else {
				layers.push(LstmConfig::new(d_input, spec.hidden_size, true).init(device));
				d_input = spec.hidden_size;
			}
		}

		Self {
			layers,
			bidir_layers,
			dropout: DropoutConfig::new(spec.dropout).init(),
		}
	}

	/// `[batch, seq, input]` to `[batch, seq, hidden * directions]`
	pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
		let mut x = input;

		for (i, layer) in self.layers.iter().enumerate() {
			if i > 0 {
				x = self.dropout.forward(x);
			}
			x = layer.forward(x, None).0;
		}

		for (i, layer) in self.bidir_layers.iter().enumerate() {
			if i > 0 {
				x = self.dropout.forward(x);
			}
			x = layer.forward(x, None).0;
		}

		x
	}
}

#[derive(Module, Debug)]
pub struct HandLstm<B: Backend> {
	/// One stack over both hands, or one per hand.
	hands: Vec<LstmStack<B>>,
	attention: Option<Linear<B>>,
	verb_head: Linear<B>,
	noun_head: Option<Linear<B>>,
}

#[derive(Debug, Clone)]
pub struct HandLstmOutput<B: Backend> {
	pub verb: Tensor<B, 2>,
	pub noun: Option<Tensor<B, 2>>,
}

impl LstmSpec {
	pub fn init<B: Backend>(&self, device: &B::Device) -> HandLstm<B> {
		let stacks = match self.variant {
			ModelVariant::PerHand => 2,
			ModelVariant::Hands | ModelVariant::Attention => 1,
		};
		let directions = if self.bidirectional { 2 } else { 1 };
		let stack_output = directions * self.hidden_size;
		let summary = stacks * stack_output;

		HandLstm {
			hands: (0..stacks)
				.map(|_| LstmStack::new(self, self.input_size / stacks, device))
				.collect(),
			attention: (self.variant == ModelVariant::Attention)
				.then(|| LinearConfig::new(stack_output, 1).init(device)),
			verb_head: LinearConfig::new(summary, self.verb_classes).init(device),
			noun_head: self
				.double_output
				.then(|| LinearConfig::new(summary, self.noun_classes).init(device)),
		}
	}
}

impl<B: Backend> HandLstm<B> {
	/// Class logits for `[batch, seq, features]` tracks. A per-hand model
	/// gives the first half of the features to the left hand stack.
	pub fn forward(&self, input: Tensor<B, 3>) -> HandLstmOutput<B> {
		let [_, _, width] = input.dims();
		let per_stack = width / self.hands.len();

		let summaries = self
			.hands
			.iter()
			.enumerate()
			.map(|(i, stack)| self.summarize(stack.forward(input.clone().narrow(2, i * per_stack, per_stack))))
			.collect();
		let summary = Tensor::cat(summaries, 1);

		HandLstmOutput {
			verb: self.verb_head.forward(summary.clone()),
			noun: self.noun_head.as_ref().map(|head| head.forward(summary)),
		}
	}

	/// Last output step, or the attention-weighted sum of all steps.
	fn summarize(&self, outputs: Tensor<B, 3>) -> Tensor<B, 2> {
		let [batch, seq, hidden] = outputs.dims();

		match &self.attention {
			Some(attention) => {
				let weights = softmax(attention.forward(outputs.clone()), 1).expand([batch, seq, hidden]);
				(outputs * weights).sum_dim(1).reshape([batch, hidden])
			}
			None => outputs.narrow(1, seq - 1, 1).reshape([batch, hidden]),
		}
	}
}
