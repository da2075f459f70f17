//! Integer operator vocabulary for fold and filter node types.

use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::integer::Int;

/// Binary integer operators, folded left to right over a node's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoldOp {
    Add,
    Sub,
    Mul,
    /// Truncates toward zero.
    Div,
    /// Remainder of truncating division; its sign matches the dividend.
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl FoldOp {
    pub const ALL: [FoldOp; 8] = [
        FoldOp::Add,
        FoldOp::Sub,
        FoldOp::Mul,
        FoldOp::Div,
        FoldOp::Rem,
        FoldOp::BitAnd,
        FoldOp::BitOr,
        FoldOp::BitXor,
    ];

    /// The surface token this operator is written as.
    pub fn symbol(&self) -> &'static str {
        match self {
            FoldOp::Add => "+",
            FoldOp::Sub => "-",
            FoldOp::Mul => "*",
            FoldOp::Div => "/",
            FoldOp::Rem => "%",
            FoldOp::BitAnd => "&",
            FoldOp::BitOr => "|",
            FoldOp::BitXor => "^",
        }
    }

    /// Applies the operator. Returns `None` when dividing by zero.
    pub fn apply(&self, lhs: &Int, rhs: &Int) -> Option<Int> {
        match self {
            FoldOp::Add => Some(lhs + rhs),
            FoldOp::Sub => Some(lhs - rhs),
            FoldOp::Mul => Some(lhs * rhs),
            FoldOp::Div => (!rhs.is_zero()).then(|| lhs / rhs),
            FoldOp::Rem => (!rhs.is_zero()).then(|| lhs % rhs),
            FoldOp::BitAnd => Some(lhs & rhs),
            FoldOp::BitOr => Some(lhs | rhs),
            FoldOp::BitXor => Some(lhs ^ rhs),
        }
    }
}

/// Relations checked pairwise by filter node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub const ALL: [RelOp; 6] = [
        RelOp::Eq,
        RelOp::Ne,
        RelOp::Lt,
        RelOp::Le,
        RelOp::Gt,
        RelOp::Ge,
    ];

    /// The surface token this relation is written as.
    pub fn symbol(&self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }

    pub fn holds(&self, lhs: &Int, rhs: &Int) -> bool {
        match self {
            RelOp::Eq => lhs == rhs,
            RelOp::Ne => lhs != rhs,
            RelOp::Lt => lhs < rhs,
            RelOp::Le => lhs <= rhs,
            RelOp::Gt => lhs > rhs,
            RelOp::Ge => lhs >= rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_truncates_toward_zero() {
        let res = FoldOp::Div.apply(&Int::from(-7), &Int::from(2)).unwrap();
        assert_eq!(res, Int::from(-3));
    }

    #[test]
    fn remainder_sign_matches_dividend() {
        let res = FoldOp::Rem.apply(&Int::from(-7), &Int::from(2)).unwrap();
        assert_eq!(res, Int::from(-1));

        let res = FoldOp::Rem.apply(&Int::from(7), &Int::from(-2)).unwrap();
        assert_eq!(res, Int::from(1));
    }

    #[test]
    fn zero_divisor_is_refused() {
        assert_eq!(FoldOp::Div.apply(&Int::from(1), &Int::from(0)), None);
        assert_eq!(FoldOp::Rem.apply(&Int::from(1), &Int::from(0)), None);
    }

    #[test]
    fn bit_operators() {
        assert_eq!(
            FoldOp::BitAnd.apply(&Int::from(0b1100), &Int::from(0b1010)),
            Some(Int::from(0b1000))
        );
        assert_eq!(
            FoldOp::BitOr.apply(&Int::from(0b1100), &Int::from(0b1010)),
            Some(Int::from(0b1110))
        );
        assert_eq!(
            FoldOp::BitXor.apply(&Int::from(0b1100), &Int::from(0b1010)),
            Some(Int::from(0b0110))
        );
    }

    #[test]
    fn relations_hold_pairwise() {
        assert!(RelOp::Eq.holds(&Int::from(3), &Int::from(3)));
        assert!(!RelOp::Eq.holds(&Int::from(3), &Int::from(5)));
        assert!(RelOp::Lt.holds(&Int::from(-1), &Int::from(0)));
        assert!(RelOp::Ge.holds(&Int::from(4), &Int::from(4)));
    }

    #[test]
    fn symbols_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for op in FoldOp::ALL {
            assert!(seen.insert(op.symbol()));
        }
        for rel in RelOp::ALL {
            assert!(seen.insert(rel.symbol()));
        }
    }
}
