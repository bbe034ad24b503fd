use num::Num;
use serde::de::Error as DeError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

use super::CsrMatrix;

impl<N> Serialize for CsrMatrix<N>
where
    N: Num + Serialize + Copy,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where S: Serializer {
        // シリアライズするフィールドは rows, cols, indptr, entries とする
        let mut state = serializer.serialize_struct("CsrMatrix", 4)?;
        state.serialize_field("rows", &(self.rows() as u64))?;
        state.serialize_field("cols", &(self.cols as u64))?;
        state.serialize_field("indptr", &self.indptr)?;

        // entries: (index, value) のVecとして行順に出力する
        let entries: Vec<(u64, N)> = self
            .indices
            .iter()
            .zip(&self.values)
            .map(|(&idx, &val)| (idx as u64, val))
            .collect();
        state.serialize_field("entries", &entries)?;
        state.end()
    }
}

impl<'de, N> Deserialize<'de> for CsrMatrix<N>
where
    N: Num + Deserialize<'de> + Copy,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where D: Deserializer<'de> {
        // 内部表現用の一時構造体
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct CsrMatrixData<N> {
            rows: usize,
            cols: usize,
            indptr: Vec<usize>,
            entries: Vec<(u64, N)>,
        }

        let data: CsrMatrixData<N> = CsrMatrixData::deserialize(deserializer)?;
        let (indices, values): (Vec<usize>, Vec<N>) = data
            .entries
            .into_iter()
            .map(|(idx, val)| (idx as usize, val))
            .unzip();
        // 壊れたデータはここで弾く
        CsrMatrix::try_from_raw(data.rows, data.cols, data.indptr, indices, values)
            .map_err(DeError::custom)
    }
}

impl<N> CsrMatrix<N>
where
    N: Num + Copy + Serialize + for<'de> Deserialize<'de>,
{
    /// CBOR にエンコードする
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}
