use num::{CheckedAdd, CheckedMul, Num};

/// 行列の組み立て時に使う重みの加算・乗算
/// 整数型は桁あふれを `None` で返し、浮動小数点型は通常の演算をします
pub trait CheckedWeight: Num + Copy {
    fn weight_add(self, rhs: Self) -> Option<Self>;
    fn weight_mul(self, rhs: Self) -> Option<Self>;
}

macro_rules! checked_integer_weight {
    ($($t:ty),*) => {
        $(
            impl CheckedWeight for $t {
                #[inline]
                fn weight_add(self, rhs: Self) -> Option<Self> {
                    CheckedAdd::checked_add(&self, &rhs)
                }

                #[inline]
                fn weight_mul(self, rhs: Self) -> Option<Self> {
                    CheckedMul::checked_mul(&self, &rhs)
                }
            }
        )*
    };
}

checked_integer_weight!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl CheckedWeight for f32 {
    #[inline]
    fn weight_add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs)
    }

    #[inline]
    fn weight_mul(self, rhs: Self) -> Option<Self> {
        Some(self * rhs)
    }
}

impl CheckedWeight for f64 {
    #[inline]
    fn weight_add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs)
    }

    #[inline]
    fn weight_mul(self, rhs: Self) -> Option<Self> {
        Some(self * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_report_overflow() {
        assert_eq!(200u8.weight_add(55), Some(255));
        assert_eq!(200u8.weight_add(100), None);
        assert_eq!(i16::MIN.weight_mul(-1), None);
        assert_eq!((-3i32).weight_mul(4), Some(-12));
    }

    #[test]
    fn floats_never_fail() {
        assert_eq!(f64::MAX.weight_add(f64::MAX), Some(f64::INFINITY));
        assert_eq!(1.5f32.weight_mul(2.0), Some(3.0));
    }
}
