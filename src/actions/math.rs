use crate::error::RevertReason;
use crate::utils::word::word_from_u256;
use alloy::primitives::{B256, U256};

pub fn sum_inputs(a: U256, b: U256) -> Result<B256, RevertReason> {
    a.checked_add(b)
        .map(word_from_u256)
        .ok_or(RevertReason::ArithmeticOverflow { a, b })
}

pub fn sub_inputs(a: U256, b: U256) -> Result<B256, RevertReason> {
    a.checked_sub(b)
        .map(word_from_u256)
        .ok_or(RevertReason::ArithmeticUnderflow { a, b })
}
