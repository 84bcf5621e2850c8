use phoenix_types::{ConstraintSpec, StructuredRequirements};
use std::fmt;
use std::fmt::Write as _;

/// Which generation stage a prompt is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Plan,
    CodeGen,
}

impl PromptKind {
    /// Shape of the JSON document the model must return.
    pub fn schema(&self) -> &'static str {
        match self {
            Self::Plan => PLAN_SCHEMA,
            Self::CodeGen => CODEGEN_SCHEMA,
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plan => "PLAN",
            Self::CodeGen => "CODEGEN",
        })
    }
}

const PLAN_SCHEMA: &str = r#"{
  "versionId": "string",
  "targetUnit": "impl::v1::service",
  "units": [
    {"name": "string", "role": "string"}
  ],
  "invariants": ["string"],
  "notes": "string"
}"#;

const CODEGEN_SCHEMA: &str = r#"{
  "versionId": "string",
  "units": {
    "impl::v1::service": "unit source text"
  },
  "notes": "string"
}"#;

const LANGUAGE_GUIDE: &str = "\
Units are written in the Phoenix unit language: `fn name(args) { ... }`, \
`let`, `if`/`else`, `while`, `return`, string concatenation with `+`. \
The target unit must export `fn process(input)` returning a string. \
Request attributes are available through `std::attrs::get(key)`. \
Only `std::*` host functions may be used.\n";

/// Renders the requirements into a model prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(
        &self,
        req: &StructuredRequirements,
        kind: PromptKind,
        iteration: u32,
        target_unit: Option<&str>,
    ) -> String {
        let mut p = String::new();
        p.push_str("You are an offline code generation model. ");
        p.push_str("Output MUST be strict JSON only, no markdown, no prose, no comments.\n");
        let _ = writeln!(p, "Task: {kind}");
        let _ = writeln!(p, "Spec hash: {}", req.spec_hash);
        let _ = writeln!(p, "Iteration: {iteration}");
        if let Some(target) = target_unit {
            let _ = writeln!(p, "Target unit: {target}");
        }
        p.push('\n');

        p.push_str("Meta:\n");
        let _ = writeln!(p, "- name: {}", req.meta.name);
        let _ = writeln!(p, "- version: {}", req.meta.version);
        let _ = writeln!(p, "- description: {}\n", req.meta.description);

        p.push_str("Functional requirements:\n");
        for fr in &req.functional_requirements {
            let _ = writeln!(p, "- {}: {}", fr.id, fr.title);
            let _ = writeln!(p, "  {}", fr.description);
            if !fr.acceptance_criteria.is_empty() {
                let _ = writeln!(p, "  acceptance: {}", fr.acceptance_criteria.join("; "));
            }
        }

        p.push_str("\nInvariants:\n");
        for inv in &req.invariants {
            let _ = writeln!(p, "- {} ({}): {}", inv.id, inv.kind, inv.description);
        }

        p.push_str("\nExamples:\n");
        for ex in &req.examples {
            let _ = writeln!(
                p,
                "- input: {} -> output contains: {}",
                ex.input,
                bracketed(&ex.expected_output_contains)
            );
        }

        p.push_str("\nConstraints:\n");
        p.push_str(&render_constraints(&req.constraints));
        p.push_str("\n\n");

        if kind == PromptKind::CodeGen {
            p.push_str("Language:\n");
            p.push_str(LANGUAGE_GUIDE);
            p.push('\n');
        }

        p.push_str("Schema:\n");
        p.push_str(kind.schema());
        p.push_str("\nRemember: JSON only.");
        p
    }
}

fn bracketed(values: &[String]) -> String {
    format!("[{}]", values.join(", "))
}

fn render_constraints(c: &ConstraintSpec) -> String {
    format!(
        "allowed_packages={}, forbidden_packages={}, forbidden_classes={}",
        bracketed(&c.allowed_packages),
        bracketed(&c.forbidden_packages),
        bracketed(&c.forbidden_classes)
    )
}
