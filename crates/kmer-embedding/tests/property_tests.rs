//! Property-based tests for `kmer-embedding`.

use candle_core::{DType, Device, Tensor};
use kmer_embedding::{
    Dropout, EmbedError, EmbeddingComposer, Mode, PositionalEncoding, TokenEmbedding, dropout_rng,
};
use proptest::prelude::*;

fn arange_composer(vocab: usize, d_model: usize, max_len: usize, p: f32) -> EmbeddingComposer {
    let values: Vec<f32> = (0..vocab * d_model).map(|v| v as f32 * 0.01).collect();
    let table = Tensor::from_vec(values, (vocab, d_model), &Device::Cpu).unwrap();
    EmbeddingComposer::from_parts(
        TokenEmbedding::from_table(table).unwrap(),
        PositionalEncoding::new(max_len, d_model, &Device::Cpu).unwrap(),
        Dropout::new(p).unwrap(),
    )
    .unwrap()
}

proptest! {
    /// Output is [batch, seq_len, d_model] and equals table row + position row.
    #[test]
    fn eval_output_is_row_plus_position(
        vocab in 1usize..=32,
        d_model in 1usize..=16,
        max_len in 1usize..=16,
        batch in 1usize..=3,
        seed in any::<u64>(),
    ) {
        let composer = arange_composer(vocab, d_model, max_len, 0.2);
        let seq_len = 1 + (seed as usize % max_len);
        let ids: Vec<u32> =
            (0..batch * seq_len).map(|i| ((seed as usize % vocab + i * 7) % vocab) as u32).collect();
        let ids_t = Tensor::from_vec(ids.clone(), (batch, seq_len), &Device::Cpu).unwrap();

        let out = composer.forward_eval(&ids_t).unwrap();
        prop_assert_eq!(out.dims(), &[batch, seq_len, d_model]);

        let out = out.to_vec3::<f32>().unwrap();
        let table = composer.token().table().to_vec2::<f32>().unwrap();
        let pos = composer.position().table().to_vec2::<f32>().unwrap();
        for b in 0..batch {
            for s in 0..seq_len {
                let id = ids[b * seq_len + s] as usize;
                for d in 0..d_model {
                    prop_assert_eq!(out[b][s][d], table[id][d] + pos[s][d]);
                }
            }
        }
    }

    /// Any sequence longer than max_len is rejected.
    #[test]
    fn longer_than_max_len_is_rejected(max_len in 1usize..=16, extra in 1usize..=8) {
        let composer = arange_composer(4, 4, max_len, 0.0);
        let ids = Tensor::zeros((1, max_len + extra), DType::U32, &Device::Cpu).unwrap();
        let rejected = matches!(
            composer.forward_eval(&ids),
            Err(EmbedError::SequenceTooLong { .. })
        );
        prop_assert!(rejected);
    }

    /// Dropout zero fraction tracks drop_prob.
    #[test]
    fn dropout_fraction_tracks_probability(p in 0.05f32..0.95, seed in any::<u64>()) {
        let dropout = Dropout::new(p).unwrap();
        let xs = Tensor::ones((8, 1024), DType::F32, &Device::Cpu).unwrap();
        let out = dropout.forward(&xs, Mode::Training, &mut dropout_rng(Some(seed))).unwrap();
        let values = out.flatten_all().unwrap().to_vec1::<f32>().unwrap();
        let zeros = values.iter().filter(|&&v| v == 0.0).count() as f32 / values.len() as f32;
        prop_assert!((zeros - p).abs() < 0.05, "zero fraction {zeros} vs p={p}");
    }
}
