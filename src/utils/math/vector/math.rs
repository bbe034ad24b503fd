use std::cmp::Ordering;

use num::Num;

use super::SpRow;

impl<N> SpRow<'_, N>
where
    N: Num + Copy + Into<f64>,
{
    /// ドット積を計算するメソッド
    /// 両方のindicesを昇順にマージしながら一致した列だけ掛け合わせる
    ///
    /// # Arguments
    /// * `other` - 他の行
    ///
    /// # Returns
    /// * `f64` - ドット積の結果
    #[inline]
    pub fn dot(&self, other: &SpRow<'_, N>) -> f64 {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "Rows must be of the same length to compute dot product."
        );

        let self_inds = self.indices();
        let self_vals = self.values();
        let other_inds = other.indices();
        let other_vals = other.values();

        let mut result = 0_f64;
        let mut i = 0;
        let mut j = 0;
        while i < self_inds.len() && j < other_inds.len() {
            match self_inds[i].cmp(&other_inds[j]) {
                Ordering::Equal => {
                    let a: f64 = self_vals[i].into();
                    let b: f64 = other_vals[j].into();
                    result += a * b;
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        result
    }

    /// 最大絶対値 (空なら0)
    #[inline]
    pub fn max_abs(&self) -> f64 {
        self.values().iter().fold(0.0_f64, |acc, &v| {
            let v: f64 = v.into();
            acc.max(v.abs())
        })
    }

    /// L2ノルム
    /// 最大絶対値で割ってから二乗するので、極端に大きい・小さい値でも
    /// オーバーフロー・アンダーフローしない
    #[inline]
    pub fn norm(&self) -> f64 {
        let scale = self.max_abs();
        if scale == 0.0 || !scale.is_finite() {
            return scale;
        }
        let sum: f64 = self
            .values()
            .iter()
            .map(|&v| {
                let v: f64 = v.into();
                let v = v / scale;
                v * v
            })
            .sum();
        scale * sum.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::CsrMatrix;

    fn rows() -> CsrMatrix<f64> {
        CsrMatrix::from_dense(&[
            vec![1.0, 0.0, 2.0, 0.0],
            vec![0.0, 3.0, 4.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn dot_only_counts_shared_columns() {
        let m = rows();
        let a = m.row(0).unwrap();
        let b = m.row(1).unwrap();
        assert_relative_eq!(a.dot(&b), 8.0);
        assert_relative_eq!(b.dot(&a), 8.0);
    }

    #[test]
    fn norm_is_euclidean() {
        let m = rows();
        assert_relative_eq!(m.row(1).unwrap().norm(), 5.0);
        assert_relative_eq!(m.row(0).unwrap().norm(), 5.0_f64.sqrt());
        assert_eq!(m.row(2).unwrap().norm(), 0.0);
    }

    #[test]
    fn max_abs_ignores_sign() {
        let m = CsrMatrix::from_dense(&[[-7.0, 2.0, 0.0]]).unwrap();
        assert_eq!(m.row(0).unwrap().max_abs(), 7.0);
        assert_eq!(rows().row(2).unwrap().max_abs(), 0.0);
    }

    #[test]
    fn norm_survives_extreme_magnitudes() {
        let big = CsrMatrix::from_dense(&[[3e200, 4e200]]).unwrap();
        assert_relative_eq!(big.row(0).unwrap().norm(), 5e200, max_relative = 1e-12);
        let tiny = CsrMatrix::from_dense(&[[3e-200, 4e-200]]).unwrap();
        assert_relative_eq!(tiny.row(0).unwrap().norm(), 5e-200, max_relative = 1e-12);
    }

    #[test]
    fn get_reads_stored_and_implicit_zeros() {
        let m = rows();
        let a = m.row(0).unwrap();
        assert_eq!(a.get(0), Some(1.0));
        assert_eq!(a.get(1), Some(0.0));
        assert_eq!(a.get(4), None);
    }
}
