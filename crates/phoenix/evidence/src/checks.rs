//! Standard regression checks. Each returns `Err` with a short reason.

use phoenix_compiler::{ExecutionContext, LinkError, SourceCompiler, UnitCompiler, Value};
use phoenix_evolution_engine::extract_json;
use phoenix_swap_gate::{build_corpus, SYNTHETIC_INPUTS};
use phoenix_types::{
    truncate_error, ConstraintSpec, ContentHash, DefaultService, ExampleSpec,
    GeneratedSourceBundle, Meta, Request, Service, StructuredRequirements, MAX_ERROR_CHARS,
};
use phoenix_verifier::PolicyVerifier;
use std::collections::BTreeMap;

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<(), String> {
    if cond {
        Ok(())
    } else {
        Err(msg())
    }
}

fn compile(bundle: &GeneratedSourceBundle) -> Result<BTreeMap<String, Vec<u8>>, String> {
    let result = UnitCompiler::new().compile(bundle);
    if result.success {
        Ok(result.artifacts)
    } else {
        Err(result.diagnostics.join("; "))
    }
}

pub fn verifier_denylist() -> Result<(), String> {
    let bundle = GeneratedSourceBundle::new().with_unit(
        "check::spawn",
        "fn process(input) { return sys::process::exec(input); }",
    );
    let report = PolicyVerifier::new().verify_sources(&bundle, &ConstraintSpec::default());
    ensure(!report.passed, || "process execution passed source verification".into())?;

    let constraints = ConstraintSpec {
        forbidden_packages: vec!["std.attrs".into()],
        ..Default::default()
    };
    let bundle = GeneratedSourceBundle::new().with_unit(
        "check::attrs",
        "fn process(input) { return std::attrs::get(\"k\"); }",
    );
    let report = PolicyVerifier::new().verify_sources(&bundle, &constraints);
    ensure(!report.passed, || "forbidden package passed source verification".into())
}

pub fn verifier_artifact_rescan() -> Result<(), String> {
    let bundle = GeneratedSourceBundle::new().with_unit(
        "check::net",
        "use sys :: net as wire;\nfn process(input) { return wire::connect(input, 80); }",
    );
    let verifier = PolicyVerifier::new();
    let none = ConstraintSpec::default();
    ensure(verifier.verify_sources(&bundle, &none).passed, || {
        "aliased network use should evade the textual pass".into()
    })?;
    let artifacts = compile(&bundle)?;
    ensure(!verifier.verify_artifact(&artifacts, &none).passed, || {
        "aliased network use passed artifact verification".into()
    })?;

    let garbage = BTreeMap::from([("check::junk".to_string(), vec![0xde, 0xad])]);
    ensure(!verifier.verify_artifact(&garbage, &none).passed, || {
        "unreadable artifact passed verification".into()
    })
}

pub fn compiler_reference_program() -> Result<(), String> {
    let bundle = GeneratedSourceBundle::new()
        .with_unit(
            "ref::math",
            "fn fact(n) {\n    if n <= 1 { return 1; }\n    return n * fact(n - 1);\n}\n",
        )
        .with_unit(
            "ref::main",
            "use ref::math as math;\n\
             fn process(input) {\n\
             \x20   let i = 0;\n\
             \x20   let acc = \"\";\n\
             \x20   while i < 3 {\n\
             \x20       acc = acc + std::text::upper(input);\n\
             \x20       i = i + 1;\n\
             \x20   }\n\
             \x20   if std::text::len(acc) == 6 && !false {\n\
             \x20       return acc + \":\" + math::fact(5);\n\
             \x20   }\n\
             \x20   return nil;\n\
             }\n",
        );
    let artifacts = compile(&bundle)?;
    let ctx = ExecutionContext::link(&artifacts).map_err(|e| e.to_string())?;
    let out = ctx
        .call("ref::main", "process", vec![Value::from("ab")], &Request::new("ab"))
        .map_err(|e| e.to_string())?;
    ensure(out == Value::from("ABABAB:120"), || {
        format!("reference program returned {out}")
    })?;

    let broken = GeneratedSourceBundle::new().with_unit("ref::bad", "fn process(input) { return missing(input); }");
    ensure(compile(&broken).is_err(), || "unresolved call compiled".into())
}

pub fn sandbox_refuses_privileged_imports() -> Result<(), String> {
    let bundle = GeneratedSourceBundle::new().with_unit(
        "check::fs",
        "fn process(input) { return sys::fs::read(input); }",
    );
    let artifacts = compile(&bundle)?;
    match ExecutionContext::link(&artifacts) {
        Err(LinkError::ForbiddenImport { .. }) => Ok(()),
        Err(e) => Err(format!("unexpected link error: {e}")),
        Ok(_) => Err("privileged host function linked".into()),
    }
}

pub fn default_service() -> Result<(), String> {
    let out = DefaultService
        .process(&Request::new("ping"))
        .map_err(|e| e.to_string())?;
    ensure(out.output.as_deref() == Some("OK:ping:default"), || {
        format!("default service returned {:?}", out.output)
    })
}

pub fn json_extraction() -> Result<(), String> {
    let v = extract_json("noise {\"src\": \"fn f() { }\"} tail").map_err(|e| e.to_string())?;
    ensure(v["src"] == "fn f() { }", || format!("extracted {v}"))?;
    ensure(extract_json("no json").is_err(), || "extracted JSON from prose".into())
}

pub fn registry_error_truncation() -> Result<(), String> {
    let long = "e".repeat(MAX_ERROR_CHARS + 100);
    let t = truncate_error(&long);
    ensure(t.chars().count() == MAX_ERROR_CHARS + 3 && t.ends_with("..."), || {
        format!("truncated to {} chars", t.chars().count())
    })?;
    ensure(truncate_error("short") == "short", || "short message altered".into())
}

pub fn shadow_corpus_determinism() -> Result<(), String> {
    let req = StructuredRequirements {
        spec_hash: ContentHash::hash(b"regression-corpus"),
        meta: Meta::default(),
        functional_requirements: vec![],
        invariants: vec![],
        examples: vec![ExampleSpec {
            id: "ex".into(),
            input: "hello".into(),
            expected_output_contains: vec![],
        }],
        constraints: ConstraintSpec::default(),
    };
    let a = build_corpus(&req);
    let b = build_corpus(&req);
    ensure(a == b, || "corpus differs between runs".into())?;
    ensure(a.len() == SYNTHETIC_INPUTS + 1, || format!("corpus has {} entries", a.len()))
}
