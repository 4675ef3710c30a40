//! Inverted dropout driven by a caller-supplied RNG.

use candle_core::Tensor;
use kmer_common::{EmbedError, Mode, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Element-wise inverted dropout.
///
/// In [`Mode::Training`] each element is zeroed with probability `drop_prob`
/// and survivors are scaled by `1 / (1 - drop_prob)`. In
/// [`Mode::Evaluation`] the input is returned untouched. The mask lives only
/// for the duration of one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropout {
    drop_prob: f32,
}

impl Dropout {
    pub fn new(drop_prob: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&drop_prob) {
            return Err(EmbedError::config(format!(
                "drop_prob must be in [0, 1), got {drop_prob}"
            )));
        }
        Ok(Self { drop_prob })
    }

    pub fn drop_prob(&self) -> f32 {
        self.drop_prob
    }

    /// Scale applied to surviving elements.
    pub fn keep_scale(&self) -> f32 {
        1.0 / (1.0 - self.drop_prob)
    }

    /// Apply dropout to `xs` according to `mode`.
    ///
    /// The mask is drawn host-side from `rng` and applied with a single
    /// tensor multiply. candle's `Tensor::rand` draws from the device's own
    /// generator, which cannot be seeded from a caller-owned RNG, so a
    /// device-side mask would lose reproducibility for a given seed.
    pub fn forward<R: Rng + ?Sized>(&self, xs: &Tensor, mode: Mode, rng: &mut R) -> Result<Tensor> {
        if !mode.is_training() || self.drop_prob == 0.0 {
            return Ok(xs.clone());
        }

        let mask = self.mask(xs.elem_count(), rng);
        let mask = Tensor::from_vec(mask, xs.dims(), xs.device())?.to_dtype(xs.dtype())?;
        Ok(xs.mul(&mask)?)
    }

    fn mask<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<f32> {
        let p = f64::from(self.drop_prob);
        let scale = self.keep_scale();
        (0..len).map(|_| if rng.gen_bool(p) { 0.0 } else { scale }).collect()
    }
}

/// Dropout RNG: seeded when `seed` is given, otherwise from OS entropy.
pub fn dropout_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
