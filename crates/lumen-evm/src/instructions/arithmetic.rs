//! Arithmetic instructions (256-bit wraparound, two's complement for signed ops)

use super::InstructionResult;
use crate::gas::cost;
use crate::revision::Revision;
use crate::state::ExecutionState;
use lumen_primitives::{U256, U512};

/// Whether the sign bit is set
#[inline]
pub(crate) fn is_negative(v: &U256) -> bool {
    v.bit(255)
}

/// Two's-complement negation
#[inline]
pub(crate) fn negate(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

#[inline]
fn abs(v: U256) -> U256 {
    if is_negative(&v) {
        negate(v)
    } else {
        v
    }
}

fn low_u256(v: U512) -> U256 {
    U256([v.0[0], v.0[1], v.0[2], v.0[3]])
}

/// ADD
pub fn add(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = a.overflowing_add(*b).0;
    Ok(())
}

/// MUL
pub fn mul(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = a.overflowing_mul(*b).0;
    Ok(())
}

/// SUB
pub fn sub(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = a.overflowing_sub(*b).0;
    Ok(())
}

/// DIV; division by zero yields zero
pub fn div(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = if b.is_zero() { U256::zero() } else { a / *b };
    Ok(())
}

/// SDIV; `MIN / -1` wraps to `MIN`
pub fn sdiv(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = if b.is_zero() {
        U256::zero()
    } else {
        let quotient = abs(a) / abs(*b);
        if is_negative(&a) != is_negative(b) {
            negate(quotient)
        } else {
            quotient
        }
    };
    Ok(())
}

/// MOD
pub fn modulo(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = if b.is_zero() { U256::zero() } else { a % *b };
    Ok(())
}

/// SMOD; the result takes the sign of the dividend
pub fn smod(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.top();
    *b = if b.is_zero() {
        U256::zero()
    } else {
        let rem = abs(a) % abs(*b);
        if is_negative(&a) {
            negate(rem)
        } else {
            rem
        }
    };
    Ok(())
}

/// ADDMOD; computed in 512 bits so the sum never wraps
pub fn addmod(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.pop();
    let m = state.stack.top();
    *m = if m.is_zero() {
        U256::zero()
    } else {
        low_u256((U512::from(a) + U512::from(b)) % U512::from(*m))
    };
    Ok(())
}

/// MULMOD; computed in 512 bits so the product never wraps
pub fn mulmod(state: &mut ExecutionState<'_>) -> InstructionResult {
    let a = state.stack.pop();
    let b = state.stack.pop();
    let m = state.stack.top();
    *m = if m.is_zero() {
        U256::zero()
    } else {
        low_u256((U512::from(a) * U512::from(b)) % U512::from(*m))
    };
    Ok(())
}

/// EXP; charges per significant byte of the exponent
pub fn exp(state: &mut ExecutionState<'_>) -> InstructionResult {
    let base = state.stack.pop();
    let exponent = *state.stack.get(0);

    let byte_cost = if state.rev >= Revision::SpuriousDragon {
        cost::EXP_BYTE
    } else {
        cost::EXP_BYTE_FRONTIER
    };
    let significant_bytes = exponent.bits().div_ceil(8) as i64;
    state.consume_gas(significant_bytes * byte_cost)?;

    *state.stack.top() = base.overflowing_pow(exponent).0;
    Ok(())
}

/// SIGNEXTEND; an index of 31 or more leaves the value unchanged
pub fn signextend(state: &mut ExecutionState<'_>) -> InstructionResult {
    let ext = state.stack.pop();
    let x = state.stack.top();
    if ext < U256::from(31) {
        let sign_bit = ext.low_u64() as usize * 8 + 7;
        let mask = (U256::one() << sign_bit) - U256::one();
        *x = if x.bit(sign_bit) { *x | !mask } else { *x & mask };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusCode;
    use crate::instructions::test_utils::*;
    use crate::mocked_host::MockedHost;

    fn run(
        f: fn(&mut ExecutionState<'_>) -> InstructionResult,
        rev: Revision,
        stack: &[U256],
    ) -> (InstructionResult, U256, i64) {
        let mut host = MockedHost::new();
        let msg = message();
        with_state(&mut host, &msg, rev, stack, |state| {
            let res = f(state);
            (res, *state.stack.get(0), state.gas_left)
        })
    }

    /// Stack operands are given top first
    fn top_of(f: fn(&mut ExecutionState<'_>) -> InstructionResult, args: &[U256]) -> U256 {
        let stack: Vec<U256> = args.iter().rev().copied().collect();
        run(f, Revision::LATEST, &stack).1
    }

    fn minus(v: u64) -> U256 {
        negate(U256::from(v))
    }

    #[test]
    fn test_add_sub_wrap() {
        assert_eq!(top_of(add, &[U256::MAX, u(2)]), u(1));
        assert_eq!(top_of(sub, &[u(1), u(2)]), U256::MAX);
        assert_eq!(top_of(sub, &[u(10), u(3)]), u(7));
        assert_eq!(top_of(mul, &[U256::MAX, u(2)]), U256::MAX - U256::one());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(top_of(div, &[u(10), u(0)]), u(0));
        assert_eq!(top_of(sdiv, &[u(10), u(0)]), u(0));
        assert_eq!(top_of(modulo, &[u(10), u(0)]), u(0));
        assert_eq!(top_of(smod, &[u(10), u(0)]), u(0));
        assert_eq!(top_of(addmod, &[u(1), u(2), u(0)]), u(0));
        assert_eq!(top_of(mulmod, &[u(1), u(2), u(0)]), u(0));
    }

    #[test]
    fn test_signed_division() {
        assert_eq!(top_of(sdiv, &[minus(10), u(3)]), minus(3));
        assert_eq!(top_of(sdiv, &[minus(10), minus(3)]), u(3));
        let min = U256::one() << 255;
        assert_eq!(top_of(sdiv, &[min, U256::MAX]), min);
        assert_eq!(top_of(smod, &[minus(10), u(3)]), minus(1));
        assert_eq!(top_of(smod, &[u(10), minus(3)]), u(1));
    }

    #[test]
    fn test_modular_arithmetic_does_not_wrap() {
        assert_eq!(top_of(addmod, &[U256::MAX, u(2), u(2)]), u(1));
        assert_eq!(top_of(mulmod, &[U256::MAX, U256::MAX, u(12)]), u(9));
        assert_eq!(top_of(addmod, &[u(5), u(6), u(7)]), u(4));
    }

    #[test]
    fn test_exp_gas() {
        let stack = [u(0x100), u(2)];
        let (res, value, gas) = run(exp, Revision::London, &stack);
        assert_eq!(res, Ok(()));
        assert_eq!(value, U256::zero());
        assert_eq!(gas, GAS - 2 * 50);

        let (_, _, gas) = run(exp, Revision::Frontier, &stack);
        assert_eq!(gas, GAS - 2 * 10);

        let (_, value, gas) = run(exp, Revision::London, &[u(0), u(7)]);
        assert_eq!(value, u(1));
        assert_eq!(gas, GAS);
    }

    #[test]
    fn test_exp_out_of_gas() {
        let mut host = MockedHost::new();
        let mut msg = message();
        msg.gas = 49;
        let res = with_state(&mut host, &msg, Revision::London, &[u(1), u(3)], |state| {
            exp(state)
        });
        assert_eq!(res, Err(StatusCode::OutOfGas));
    }

    #[test]
    fn test_signextend() {
        assert_eq!(top_of(signextend, &[u(0), u(0xFF)]), U256::MAX);
        assert_eq!(top_of(signextend, &[u(0), u(0x7F)]), u(0x7F));
        assert_eq!(top_of(signextend, &[u(1), u(0x80FF)]), minus(0x7F01));
        assert_eq!(top_of(signextend, &[u(31), u(0xFF)]), u(0xFF));
        assert_eq!(top_of(signextend, &[U256::MAX, u(0xFF)]), u(0xFF));
        assert_eq!(top_of(signextend, &[u(0), u(0x1FF)]), U256::MAX);
    }
}
