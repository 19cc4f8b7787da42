use super::tables::KarlinParams;

/// Bit score of a raw score: `(lambda * S - ln K) / ln 2`.
pub fn bit_score(raw_score: i32, params: &KarlinParams) -> f64 {
    (params.lambda * raw_score as f64 - params.log_k()) / std::f64::consts::LN_2
}

/// Expected number of chance alignments scoring at least `raw_score` in a
/// search space of `search_space` cells: `m * n * K * exp(-lambda * S)`.
pub fn evalue(raw_score: i32, params: &KarlinParams, search_space: f64) -> f64 {
    search_space * 2.0_f64.powf(-bit_score(raw_score, params))
}

/// Smallest raw score whose e-value does not exceed `e_value`.
pub fn raw_score_from_evalue(e_value: f64, params: &KarlinParams, search_space: f64) -> i32 {
    if e_value <= 0.0 {
        return i32::MAX;
    }
    let score = (params.log_k() + search_space.ln() - e_value.ln()) / params.lambda;
    score.ceil() as i32
}

/// Raw score equivalent of a bit score.
pub fn raw_score_from_bit_score(bits: f64, params: &KarlinParams) -> i32 {
    ((bits * std::f64::consts::LN_2 + params.log_k()) / params.lambda).ceil() as i32
}

/// Raw x-drop of a drop-off expressed in bits.
pub fn x_drop_from_bits(bits: f64, params: &KarlinParams) -> i32 {
    (bits * std::f64::consts::LN_2 / params.lambda).ceil() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blosum62_11_1() -> KarlinParams {
        KarlinParams {
            lambda: 0.267,
            k: 0.041,
            h: 0.14,
            alpha: 1.9,
            beta: -30.0,
        }
    }

    #[test]
    fn test_bit_score() {
        let p = blosum62_11_1();
        let expected = (0.267 * 100.0 - 0.041_f64.ln()) / 2.0_f64.ln();
        assert!((bit_score(100, &p) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_evalue_decreases_with_score() {
        let p = blosum62_11_1();
        assert!(evalue(60, &p, 1e6) < evalue(40, &p, 1e6));
        let e = evalue(50, &p, 1e6);
        let direct = 1e6 * p.k * (-p.lambda * 50.0).exp();
        assert!((e - direct).abs() / direct < 1e-9);
    }

    #[test]
    fn test_raw_score_from_evalue_is_threshold() {
        let p = blosum62_11_1();
        let s = raw_score_from_evalue(10.0, &p, 1e6);
        assert!(evalue(s, &p, 1e6) <= 10.0);
        assert!(evalue(s - 1, &p, 1e6) > 10.0);
    }

    #[test]
    fn test_x_drop_from_bits() {
        let p = blosum62_11_1();
        // 7 bits with lambda 0.267 is 18.17 raw
        assert_eq!(x_drop_from_bits(7.0, &p), 19);
    }
}
