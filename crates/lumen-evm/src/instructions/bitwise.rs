//! Comparison, bitwise and shift instructions

use super::arithmetic::is_negative;
use super::InstructionResult;
use crate::state::ExecutionState;
use lumen_primitives::U256;

#[inline]
fn bool_word(b: bool) -> U256 {
    if b {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Signed less-than on two's-complement words
#[inline]
fn signed_lt(a: &U256, b: &U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// LT
pub fn lt(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = bool_word(a < *b);
    Ok(())
}

/// GT
pub fn gt(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = bool_word(a > *b);
    Ok(())
}

/// SLT
pub fn slt(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = bool_word(signed_lt(&a, b));
    Ok(())
}

/// SGT
pub fn sgt(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = bool_word(signed_lt(b, &a));
    Ok(())
}

/// EQ
pub fn eq(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = bool_word(a == *b);
    Ok(())
}

/// ISZERO
pub fn iszero(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.top();
    *a = bool_word(a.is_zero());
    Ok(())
}

/// AND
pub fn and(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = *b & a;
    Ok(())
}

/// OR
pub fn or(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = *b | a;
    Ok(())
}

/// XOR
pub fn xor(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = *b ^ a;
    Ok(())
}

/// NOT
pub fn not(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.top();
    *a = !*a;
    Ok(())
}

/// BYTE; byte 0 is the most significant, indexes past 31 yield zero
pub fn byte(state: &mut ExecutionState<'_>) -> InstructionResult {
    let n = state.stack.pop();
    let x = state.stack.top();
    *x = if n < U256::from(32) {
        U256::from(x.byte(31 - n.low_u64() as usize))
    } else {
        U256::zero()
    };
    Ok(())
}

/// SHL; shifts of 256 or more yield zero
pub fn shl(state: &mut ExecutionState<'_>) -> InstructionResult {
    let shift = state.stack.pop();
    let x = state.stack.top();
    *x = if shift < U256::from(256) {
        *x << shift.low_u64() as usize
    } else {
        U256::zero()
    };
    Ok(())
}

/// SHR; shifts of 256 or more yield zero
pub fn shr(state: &mut ExecutionState<'_>) -> InstructionResult {
    let shift = state.stack.pop();
    let x = state.stack.top();
    *x = if shift < U256::from(256) {
        *x >> shift.low_u64() as usize
    } else {
        U256::zero()
    };
    Ok(())
}

/// SAR; arithmetic shift filling with the sign bit
pub fn sar(state: &mut ExecutionState<'_>) -> InstructionResult {
    let shift = state.stack.pop();
    let x = state.stack.top();
    let negative = is_negative(x);
    *x = if shift >= U256::from(256) {
        if negative {
            U256::MAX
        } else {
            U256::zero()
        }
    } else {
        let shift = shift.low_u64() as usize;
        let shifted = *x >> shift;
        if negative && shift > 0 {
            shifted | (U256::MAX << (256 - shift))
        } else {
            shifted
        }
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::arithmetic::negate;
    use crate::instructions::test_utils::*;
    use crate::mocked_host::MockedHost;
    use crate::revision::Revision;

    /// Stack operands are given top first
    fn top_of(f: fn(&mut ExecutionState<'_>) -> InstructionResult, args: &[U256]) -> U256 {
        let stack: Vec<U256> = args.iter().rev().copied().collect();
        let mut host = MockedHost::new();
        let msg = message();
        with_state(&mut host, &msg, Revision::LATEST, &stack, |state| {
            f(state).unwrap();
            *state.stack.get(0)
        })
    }

    fn sign_bit() -> U256 {
        U256::one() << 255
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(top_of(lt, &[u(1), u(2)]), u(1));
        assert_eq!(top_of(lt, &[u(2), u(1)]), u(0));
        assert_eq!(top_of(gt, &[u(2), u(1)]), u(1));
        assert_eq!(top_of(eq, &[u(7), u(7)]), u(1));
        assert_eq!(top_of(iszero, &[u(0)]), u(1));
        assert_eq!(top_of(iszero, &[u(5)]), u(0));
    }

    #[test]
    fn test_signed_comparisons() {
        let minus_one = U256::MAX;
        assert_eq!(top_of(slt, &[minus_one, u(1)]), u(1));
        assert_eq!(top_of(slt, &[u(1), minus_one]), u(0));
        assert_eq!(top_of(sgt, &[u(1), minus_one]), u(1));
        assert_eq!(top_of(slt, &[negate(u(5)), negate(u(3))]), u(1));
        assert_eq!(top_of(slt, &[u(3), u(3)]), u(0));
    }

    #[test]
    fn test_logic() {
        assert_eq!(top_of(and, &[u(0b1100), u(0b1010)]), u(0b1000));
        assert_eq!(top_of(or, &[u(0b1100), u(0b1010)]), u(0b1110));
        assert_eq!(top_of(xor, &[u(0b1100), u(0b1010)]), u(0b0110));
        assert_eq!(top_of(not, &[u(0)]), U256::MAX);
    }

    #[test]
    fn test_byte() {
        let x = U256::from_big_endian(&[
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
            24, 25, 26, 27, 28, 29, 30, 31, 32,
        ]);
        assert_eq!(top_of(byte, &[u(0), x]), u(1));
        assert_eq!(top_of(byte, &[u(31), x]), u(32));
        assert_eq!(top_of(byte, &[u(32), x]), u(0));
        assert_eq!(top_of(byte, &[U256::MAX, x]), u(0));
    }

    #[test]
    fn test_shift_vectors() {
        assert_eq!(top_of(shl, &[u(0), u(1)]), u(1));
        assert_eq!(top_of(shl, &[u(255), u(1)]), sign_bit());
        assert_eq!(top_of(shl, &[u(256), u(1)]), u(0));
        assert_eq!(top_of(shl, &[u(1), U256::MAX]), U256::MAX - U256::one());
        assert_eq!(top_of(shr, &[u(255), sign_bit()]), u(1));
        assert_eq!(top_of(shr, &[u(256), U256::MAX]), u(0));
        assert_eq!(top_of(shr, &[U256::MAX, U256::MAX]), u(0));
    }

    #[test]
    fn test_sar_vectors() {
        assert_eq!(top_of(sar, &[u(0), sign_bit()]), sign_bit());
        assert_eq!(top_of(sar, &[u(1), sign_bit()]), U256::from(3) << 254);
        assert_eq!(top_of(sar, &[u(255), sign_bit()]), U256::MAX);
        assert_eq!(top_of(sar, &[u(256), sign_bit()]), U256::MAX);
        assert_eq!(top_of(sar, &[U256::MAX, U256::MAX]), U256::MAX);
        assert_eq!(top_of(sar, &[u(256), u(1)]), u(0));
        assert_eq!(top_of(sar, &[u(1), u(4)]), u(2));
        assert_eq!(top_of(sar, &[u(0), U256::MAX]), U256::MAX);
    }
}
