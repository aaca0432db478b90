use crate::error::Result;

/// Token ids and attention mask (1 = real token, 0 = padding) for one review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of non-padding tokens.
    pub fn real_tokens(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m != 0).count()
    }
}

/// Raw outputs of the two heads for a batch of one.
#[derive(Debug, Clone)]
pub struct HeadOutputs {
    /// Sentiment logits, shape `[1, 2]`; index 1 is positive.
    pub sentiment_logits: candle_core::Tensor,
    /// Rating regression output, shape `[1, 1]`.
    pub rating: candle_core::Tensor,
}

/// An encoder with a sentiment head and a rating head, run in inference mode.
///
/// Implementations must not mutate shared state in `forward`: one instance serves every
/// request, possibly from several threads at once.
pub trait ReviewModel: Send + Sync {
    fn forward(&self, input: &EncodedInput) -> Result<HeadOutputs>;

    fn device(&self) -> &candle_core::Device;
}

impl<M: ReviewModel + ?Sized> ReviewModel for Box<M> {
    fn forward(&self, input: &EncodedInput) -> Result<HeadOutputs> {
        (**self).forward(input)
    }

    fn device(&self) -> &candle_core::Device {
        (**self).device()
    }
}
