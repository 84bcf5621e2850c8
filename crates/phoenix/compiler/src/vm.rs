//! Bytecode interpreter.

use crate::bytecode::Op;
use crate::context::{ExecutionContext, Resolved};
use crate::host::{ensure_string_fits, CallEnv};
use crate::value::Value;
use phoenix_types::ServiceError;

struct Frame {
    unit: usize,
    func: usize,
    ip: usize,
    base: usize,
}

fn fault(msg: impl Into<String>) -> ServiceError {
    ServiceError::Fault(msg.into())
}

pub(crate) fn run(
    ctx: &ExecutionContext,
    unit: usize,
    func: usize,
    args: Vec<Value>,
    env: &CallEnv<'_>,
) -> Result<Value, ServiceError> {
    let limits = ctx.limits;
    let mut fuel = limits.fuel;
    let mut stack: Vec<Value> = args;
    let mut frames: Vec<Frame> = Vec::new();
    push_frame(ctx, &mut stack, &mut frames, unit, func, limits.max_call_depth)?;

    loop {
        if fuel == 0 {
            return Err(ServiceError::LimitExceeded("fuel exhausted".into()));
        }
        fuel -= 1;
        if stack.len() > limits.max_stack {
            return Err(ServiceError::LimitExceeded("stack overflow".into()));
        }

        let frame = frames.last_mut().ok_or_else(|| fault("no active frame"))?;
        let linked = &ctx.units[frame.unit];
        let function = &linked.functions[frame.func];
        let op = *function
            .code
            .get(frame.ip)
            .ok_or_else(|| fault("instruction pointer out of range"))?;
        frame.ip += 1;
        let base = frame.base;
        let current_unit = frame.unit;

        match op {
            Op::Const(i) => stack.push(linked.constants[usize::from(i)].clone()),
            Op::Nil => stack.push(Value::Nil),
            Op::True => stack.push(Value::Bool(true)),
            Op::False => stack.push(Value::Bool(false)),
            Op::Load(i) => {
                let v = stack
                    .get(base + usize::from(i))
                    .cloned()
                    .ok_or_else(|| fault("local out of range"))?;
                stack.push(v);
            }
            Op::Store(i) => {
                let v = pop(&mut stack)?;
                let slot = stack
                    .get_mut(base + usize::from(i))
                    .ok_or_else(|| fault("local out of range"))?;
                *slot = v;
            }
            Op::Pop => {
                pop(&mut stack)?;
            }
            Op::Not => {
                let v = pop(&mut stack)?;
                stack.push(Value::Bool(!v.is_truthy()));
            }
            Op::Neg => match pop(&mut stack)? {
                Value::Int(i) => stack.push(Value::Int(
                    i.checked_neg().ok_or_else(|| fault("integer overflow"))?,
                )),
                other => return Err(fault(format!("cannot negate {}", other.type_name()))),
            },
            Op::Jump(t) => {
                if let Some(f) = frames.last_mut() {
                    f.ip = t as usize;
                }
            }
            Op::JumpIfFalse(t) => {
                let v = pop(&mut stack)?;
                if !v.is_truthy() {
                    if let Some(f) = frames.last_mut() {
                        f.ip = t as usize;
                    }
                }
            }
            Op::CallLocal(i, _) => {
                push_frame(
                    ctx,
                    &mut stack,
                    &mut frames,
                    current_unit,
                    usize::from(i),
                    limits.max_call_depth,
                )?;
            }
            Op::CallSymbol(i, argc) => match &linked.symbols[usize::from(i)] {
                Resolved::Host(h) => {
                    let split = stack
                        .len()
                        .checked_sub(usize::from(argc))
                        .ok_or_else(|| fault("stack underflow"))?;
                    let call_args = stack.split_off(split);
                    let result = (h.call)(&call_args, env)?;
                    stack.push(result);
                }
                Resolved::Unit { unit, func } => {
                    let (u, f) = (*unit, *func);
                    push_frame(ctx, &mut stack, &mut frames, u, f, limits.max_call_depth)?;
                }
                Resolved::Import => return Err(fault("call through an import symbol")),
            },
            Op::Return | Op::ReturnNil => {
                let ret = if op == Op::Return {
                    pop(&mut stack)?
                } else {
                    Value::Nil
                };
                stack.truncate(base);
                frames.pop();
                if frames.is_empty() {
                    return Ok(ret);
                }
                stack.push(ret);
            }
            Op::Add
            | Op::Sub
            | Op::Mul
            | Op::Div
            | Op::Rem
            | Op::Eq
            | Op::Ne
            | Op::Lt
            | Op::Le
            | Op::Gt
            | Op::Ge => {
                let rhs = pop(&mut stack)?;
                let lhs = pop(&mut stack)?;
                stack.push(binary(op, lhs, rhs, limits.max_string_bytes)?);
            }
        }
    }
}

fn push_frame(
    ctx: &ExecutionContext,
    stack: &mut Vec<Value>,
    frames: &mut Vec<Frame>,
    unit: usize,
    func: usize,
    max_depth: usize,
) -> Result<(), ServiceError> {
    if frames.len() >= max_depth {
        return Err(ServiceError::LimitExceeded("call depth exceeded".into()));
    }
    let f = ctx
        .units
        .get(unit)
        .and_then(|u| u.functions.get(func))
        .ok_or_else(|| fault("call target out of range"))?;
    let arity = usize::from(f.arity);
    let base = stack
        .len()
        .checked_sub(arity)
        .ok_or_else(|| fault("stack underflow"))?;
    for _ in arity..usize::from(f.locals) {
        stack.push(Value::Nil);
    }
    frames.push(Frame {
        unit,
        func,
        ip: 0,
        base,
    });
    Ok(())
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, ServiceError> {
    stack.pop().ok_or_else(|| fault("stack underflow"))
}

fn binary(
    op: Op,
    lhs: Value,
    rhs: Value,
    max_string_bytes: usize,
) -> Result<Value, ServiceError> {
    use Value::{Int, Str};
    let overflow = || fault("integer overflow");
    Ok(match (op, lhs, rhs) {
        (Op::Eq, a, b) => Value::Bool(a == b),
        (Op::Ne, a, b) => Value::Bool(a != b),
        (Op::Add, Int(a), Int(b)) => Int(a.checked_add(b).ok_or_else(overflow)?),
        (Op::Add, a @ Str(_), b) | (Op::Add, a, b @ Str(_)) => {
            let len = a.display_len().saturating_add(b.display_len());
            ensure_string_fits(len, max_string_bytes)?;
            Str(format!("{a}{b}"))
        }
        (Op::Sub, Int(a), Int(b)) => Int(a.checked_sub(b).ok_or_else(overflow)?),
        (Op::Mul, Int(a), Int(b)) => Int(a.checked_mul(b).ok_or_else(overflow)?),
        (Op::Div, Int(_), Int(0)) | (Op::Rem, Int(_), Int(0)) => {
            return Err(fault("division by zero"))
        }
        (Op::Div, Int(a), Int(b)) => Int(a.checked_div(b).ok_or_else(overflow)?),
        (Op::Rem, Int(a), Int(b)) => Int(a.checked_rem(b).ok_or_else(overflow)?),
        (Op::Lt, Int(a), Int(b)) => Value::Bool(a < b),
        (Op::Le, Int(a), Int(b)) => Value::Bool(a <= b),
        (Op::Gt, Int(a), Int(b)) => Value::Bool(a > b),
        (Op::Ge, Int(a), Int(b)) => Value::Bool(a >= b),
        (Op::Lt, Str(a), Str(b)) => Value::Bool(a < b),
        (Op::Le, Str(a), Str(b)) => Value::Bool(a <= b),
        (Op::Gt, Str(a), Str(b)) => Value::Bool(a > b),
        (Op::Ge, Str(a), Str(b)) => Value::Bool(a >= b),
        (op, a, b) => {
            return Err(fault(format!(
                "unsupported operands for {op:?}: {} and {}",
                a.type_name(),
                b.type_name()
            )))
        }
    })
}
