/// Fitness sharing across species.
///
/// Each score is divided by the size of its genome's species, then the
/// shared scores are renormalised into a probability distribution. NaN
/// scores count as zero, and a zero (or non-finite) total falls back to the
/// uniform distribution so the downstream sampler stays defined.
pub fn normalise(scores: &[f64], species_ids: &[usize]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let species_count = species_ids.iter().max().map_or(0, |&max| max + 1);
    let mut sizes = vec![0usize; species_count];
    for &species in species_ids {
        sizes[species] += 1;
    }

    let shared: Vec<f64> = scores
        .iter()
        .zip(species_ids)
        .map(|(&score, &species)| {
            let score = if score.is_nan() { 0.0 } else { score };
            score / sizes[species] as f64
        })
        .collect();

    let total: f64 = shared.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return vec![1.0 / scores.len() as f64; scores.len()];
    }
    shared.iter().map(|&value| value / total).collect()
}

#[cfg(test)]
mod tests {
    use super::normalise;

    #[test]
    fn scores_are_divided_by_species_size() {
        // Species 0 has two members, species 1 has one.
        let probs = normalise(&[4.0, 4.0, 2.0], &[0, 0, 1]);
        // Shared: 2, 2, 2 -> uniform thirds.
        for &p in &probs {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn result_is_a_probability_distribution() {
        let probs = normalise(&[1.0, 5.0, 3.0, 7.0], &[0, 1, 1, 2]);
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(probs.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn zero_totals_fall_back_to_uniform() {
        let probs = normalise(&[0.0, 0.0, 0.0, 0.0], &[0, 0, 1, 1]);
        assert_eq!(probs, vec![0.25; 4]);
    }

    #[test]
    fn nan_scores_count_as_zero() {
        let probs = normalise(&[f64::NAN, 3.0], &[0, 1]);
        assert_eq!(probs, vec![0.0, 1.0]);
    }

    #[test]
    fn empty_population_yields_no_probabilities() {
        assert!(normalise(&[], &[]).is_empty());
    }
}
