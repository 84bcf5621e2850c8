//! The host library every unit may import.
//!
//! All functions are declared so the compiler can resolve and arity-check
//! calls. Only pure functions are linkable: the `sys::*` namespace compiles
//! but is refused when linking into an [`ExecutionContext`](crate::ExecutionContext).

use crate::value::Value;
use phoenix_types::{Request, ServiceError};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Accepted argument counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(u8),
    AtLeast(u8),
}

impl Arity {
    pub fn accepts(&self, argc: usize) -> bool {
        match *self {
            Arity::Exact(n) => argc == usize::from(n),
            Arity::AtLeast(n) => argc >= usize::from(n),
        }
    }
}

/// Per-call environment visible to host functions.
pub struct CallEnv<'a> {
    pub request: &'a Request,
    pub max_string_bytes: usize,
}

impl CallEnv<'_> {
    /// Refuses to build a string of `len` bytes past the call's limit.
    pub fn ensure_fits(&self, len: usize) -> Result<(), ServiceError> {
        ensure_string_fits(len, self.max_string_bytes)
    }
}

pub(crate) fn ensure_string_fits(len: usize, max: usize) -> Result<(), ServiceError> {
    if len > max {
        return Err(ServiceError::LimitExceeded("string too large".into()));
    }
    Ok(())
}

pub type HostFn = fn(&[Value], &CallEnv<'_>) -> Result<Value, ServiceError>;

#[derive(Clone, Copy)]
pub struct HostFunction {
    pub path: &'static str,
    pub arity: Arity,
    pub linkable: bool,
    pub call: HostFn,
}

impl std::fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunction")
            .field("path", &self.path)
            .field("arity", &self.arity)
            .field("linkable", &self.linkable)
            .finish()
    }
}

#[derive(Debug)]
pub struct HostLibrary {
    functions: HashMap<&'static str, HostFunction>,
}

impl HostLibrary {
    /// The shared declaration table.
    pub fn global() -> &'static HostLibrary {
        static LIBRARY: OnceLock<HostLibrary> = OnceLock::new();
        LIBRARY.get_or_init(HostLibrary::build)
    }

    pub fn lookup(&self, path: &str) -> Option<&HostFunction> {
        self.functions.get(path)
    }

    /// True when `path` names a declared function or a namespace that
    /// contains one.
    pub fn declares_namespace(&self, path: &str) -> bool {
        let prefix = format!("{path}::");
        self.functions.keys().any(|k| k.starts_with(&prefix))
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    fn build() -> Self {
        let pure: [(&'static str, Arity, HostFn); 16] = [
            ("std::text::concat", Arity::AtLeast(0), text_concat),
            ("std::text::contains", Arity::Exact(2), text_contains),
            ("std::text::starts_with", Arity::Exact(2), text_starts_with),
            ("std::text::ends_with", Arity::Exact(2), text_ends_with),
            ("std::text::upper", Arity::Exact(1), text_upper),
            ("std::text::lower", Arity::Exact(1), text_lower),
            ("std::text::trim", Arity::Exact(1), text_trim),
            ("std::text::len", Arity::Exact(1), text_len),
            ("std::text::replace", Arity::Exact(3), text_replace),
            ("std::text::to_string", Arity::Exact(1), text_to_string),
            ("std::text::is_nil", Arity::Exact(1), text_is_nil),
            ("std::attrs::get", Arity::Exact(1), attrs_get),
            ("std::attrs::has", Arity::Exact(1), attrs_has),
            ("std::int::parse", Arity::Exact(1), int_parse),
            ("std::check::fail", Arity::Exact(1), check_fail),
            ("std::check::assert", Arity::Exact(2), check_assert),
        ];
        let privileged: [(&'static str, Arity); 9] = [
            ("sys::process::exec", Arity::AtLeast(1)),
            ("sys::process::spawn", Arity::AtLeast(1)),
            ("sys::fs::read", Arity::Exact(1)),
            ("sys::fs::write", Arity::Exact(2)),
            ("sys::net::connect", Arity::Exact(2)),
            ("sys::env::var", Arity::Exact(1)),
            ("sys::reflect::lookup", Arity::Exact(1)),
            ("sys::reflect::invoke", Arity::AtLeast(1)),
            ("sys::unsafe::peek", Arity::Exact(1)),
        ];

        let mut functions = HashMap::new();
        for (path, arity, call) in pure {
            functions.insert(
                path,
                HostFunction {
                    path,
                    arity,
                    linkable: true,
                    call,
                },
            );
        }
        for (path, arity) in privileged {
            functions.insert(
                path,
                HostFunction {
                    path,
                    arity,
                    linkable: false,
                    call: privileged_denied,
                },
            );
        }
        Self { functions }
    }
}

fn text(v: &Value) -> String {
    v.to_string()
}

fn arg<'v>(args: &'v [Value], idx: usize) -> Result<&'v Value, ServiceError> {
    args.get(idx)
        .ok_or_else(|| ServiceError::Fault(format!("missing argument {idx}")))
}

fn text_concat(args: &[Value], env: &CallEnv<'_>) -> Result<Value, ServiceError> {
    let len = args
        .iter()
        .fold(0usize, |acc, v| acc.saturating_add(v.display_len()));
    env.ensure_fits(len)?;
    Ok(Value::Str(args.iter().map(text).collect()))
}

fn text_contains(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Ok(Value::Bool(text(arg(args, 0)?).contains(&text(arg(args, 1)?))))
}

fn text_starts_with(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Ok(Value::Bool(
        text(arg(args, 0)?).starts_with(&text(arg(args, 1)?)),
    ))
}

fn text_ends_with(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Ok(Value::Bool(text(arg(args, 0)?).ends_with(&text(arg(args, 1)?))))
}

fn text_upper(args: &[Value], env: &CallEnv<'_>) -> Result<Value, ServiceError> {
    let out = text(arg(args, 0)?).to_uppercase();
    env.ensure_fits(out.len())?;
    Ok(Value::Str(out))
}

fn text_lower(args: &[Value], env: &CallEnv<'_>) -> Result<Value, ServiceError> {
    let out = text(arg(args, 0)?).to_lowercase();
    env.ensure_fits(out.len())?;
    Ok(Value::Str(out))
}

fn text_trim(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Ok(Value::Str(text(arg(args, 0)?).trim().to_string()))
}

fn text_len(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    let n = text(arg(args, 0)?).chars().count();
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn text_replace(args: &[Value], env: &CallEnv<'_>) -> Result<Value, ServiceError> {
    let haystack = text(arg(args, 0)?);
    let from = text(arg(args, 1)?);
    if from.is_empty() {
        return Ok(Value::Str(haystack));
    }
    let to = text(arg(args, 2)?);
    let hits = haystack.matches(from.as_str()).count();
    let len = (haystack.len() - hits * from.len()).saturating_add(hits.saturating_mul(to.len()));
    env.ensure_fits(len)?;
    Ok(Value::Str(haystack.replace(&from, &to)))
}

fn text_to_string(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Ok(Value::Str(text(arg(args, 0)?)))
}

fn text_is_nil(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Ok(Value::Bool(matches!(arg(args, 0)?, Value::Nil)))
}

fn attrs_get(args: &[Value], env: &CallEnv<'_>) -> Result<Value, ServiceError> {
    let key = text(arg(args, 0)?);
    Ok(env.request.attributes.get(&key).cloned().into())
}

fn attrs_has(args: &[Value], env: &CallEnv<'_>) -> Result<Value, ServiceError> {
    let key = text(arg(args, 0)?);
    Ok(Value::Bool(env.request.attributes.contains_key(&key)))
}

fn int_parse(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Ok(match arg(args, 0)? {
        Value::Int(i) => Value::Int(*i),
        other => text(other)
            .trim()
            .parse::<i64>()
            .map_or(Value::Nil, Value::Int),
    })
}

fn check_fail(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Err(ServiceError::CheckFailed(text(arg(args, 0)?)))
}

fn check_assert(args: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    if arg(args, 0)?.is_truthy() {
        Ok(Value::Nil)
    } else {
        Err(ServiceError::CheckFailed(text(arg(args, 1)?)))
    }
}

fn privileged_denied(_: &[Value], _: &CallEnv<'_>) -> Result<Value, ServiceError> {
    Err(ServiceError::Fault(
        "privileged host function is not available".into(),
    ))
}
