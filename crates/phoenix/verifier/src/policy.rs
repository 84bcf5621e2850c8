/// Namespaces rejected in both passes regardless of constraints.
pub const HARD_DENYLIST: &[&str] = &["sys::process", "sys::unsafe", "sys::reflect"];

/// Namespaces rejected in compiled artifacts regardless of constraints.
pub const ALWAYS_DENIED_IN_ARTIFACTS: &[&str] = &["sys::fs", "sys::net", "sys::reflect"];

pub const REFLECTION_MARKERS: &[&str] = &["reflect::", "invoke(", "lookup("];

pub const PROCESS_MARKERS: &[&str] = &["process::", "exec(", "spawn("];

/// Accepts `a.b` or `a::b` and returns `a::b`.
pub fn normalize_package(pkg: &str) -> String {
    pkg.trim().replace('.', "::")
}
