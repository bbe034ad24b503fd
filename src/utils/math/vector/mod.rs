pub mod math;

use std::fmt::{self, Debug};

use num::Num;

/// SpRowは疎行列の1行を借用するビューです
/// indices と valuesを持ち
/// indicesは非ゼロ要素の列インデックスを保持し、
/// valuesは要素の値を保持します
///
/// 要素はindicesの昇順でソートされていることを保証します
/// (`CsrMatrix` からしか作られないため)
#[derive(Clone, Copy)]
pub struct SpRow<'a, N>
where N: Num
{
    len: usize,
    indices: &'a [usize],
    values: &'a [N],
}

impl<'a, N> SpRow<'a, N>
where N: Num
{
    #[inline]
    pub(crate) fn new(len: usize, indices: &'a [usize], values: &'a [N]) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]), "indices must be strictly ascending");
        SpRow { len, indices, values }
    }

    /// 論理的な長さ (列数)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    #[inline]
    pub fn values(&self) -> &'a [N] {
        self.values
    }

    /// 論理インデックス `index` の値を返す
    /// 範囲外なら None、格納されていなければ 0
    #[inline]
    pub fn get(&self, index: usize) -> Option<N>
    where N: Copy
    {
        if index >= self.len {
            return None;
        }
        match self.indices.binary_search(&index) {
            Ok(pos) => Some(self.values[pos]),
            Err(_) => Some(N::zero()),
        }
    }

    /// (index, value) の非ゼロ要素を昇順で返す
    #[inline]
    pub fn raw_iter(&self) -> impl Iterator<Item = (usize, &'a N)> + 'a {
        let (indices, values) = (self.indices, self.values);
        indices.iter().copied().zip(values.iter())
    }
}

impl<N: Num + Copy + Debug> Debug for SpRow<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "SpRow(len: {}, {:?})", self.len, self.raw_iter().collect::<Vec<_>>())
        } else {
            f.debug_list().entries((0..self.len).filter_map(|i| self.get(i))).finish()
        }
    }
}
