//! Whole-pipeline properties: phase gating, diagnostics rendering,
//! determinism and the structure of the emitted IR.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use uc_compiler::common::{CompileError, CompileResult, DiagnosticReporter, Diagnostics, ErrorKind, Phase};
use uc_compiler::frontend::{FrontendConfig, UcFrontend};
use uc_compiler::ir::{Inst, IrModule};

fn compile(source: &str) -> (CompileResult<IrModule>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let result = UcFrontend::new().compile_with(source, &FrontendConfig::default(), &mut diagnostics);
    (result, diagnostics)
}

fn corpus(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/corpus").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e))
}

const CORPUS: [&str; 12] = [
    "8queens.c",
    "bubble.c",
    "circle.c",
    "fac-b.c",
    "fib.c",
    "primes.c",
    "quick.c",
    "sim04.c",
    "sim05.c",
    "sim07.c",
    "sim08.c",
    "sim09.c",
];

#[test]
fn test_corpus_compiles_without_errors() {
    for name in CORPUS {
        let (result, diagnostics) = compile(&corpus(name));
        assert!(result.is_ok(), "{}: {:?}", name, diagnostics.errors());
    }
}

#[test]
fn test_compilation_is_deterministic() {
    for name in CORPUS {
        let source = corpus(name);
        let first = compile(&source).0.unwrap().to_string();
        let second = compile(&source).0.unwrap().to_string();
        assert_eq!(first, second, "{}", name);
    }
}

#[test]
fn test_calculator_is_missing_a_return() {
    // `expr` ends in an `else if` chain without a final `else`
    let (result, diagnostics) = compile(&corpus("eval.c"));
    assert!(matches!(
        result,
        Err(CompileError::PhaseFailed { phase: Phase::Analysis, errors: 1 })
    ));
    assert_eq!(diagnostics.kinds(), vec![ErrorKind::MissingReturn]);
}

#[test]
fn test_out_of_bounds_stores_only_warn() {
    let (result, diagnostics) = compile(&corpus("sim05.c"));
    assert!(result.is_ok());
    assert_eq!(diagnostics.warnings().len(), 1);
    assert!(diagnostics.warnings()[0].message.contains("`cr`"));
}

#[test]
fn test_every_category_is_reported() {
    let cases: [(&str, ErrorKind); 9] = [
        ("int main(void) { return 0 # }", ErrorKind::Lexical),
        ("int main(void) { return 0 }", ErrorKind::Syntax),
        ("int x; char x; int main(void) { return 0; }", ErrorKind::Redeclaration),
        ("int main(void) { return y; }", ErrorKind::Undeclared),
        ("int a[2]; int main(void) { return a; }", ErrorKind::TypeMismatch),
        ("int f(int x) { return x; } int main(void) { return f(); }", ErrorKind::Arity),
        ("int main(void) { 1 = 2; return 0; }", ErrorKind::NotLvalue),
        ("int f(void) { } int main(void) { return 0; }", ErrorKind::MissingReturn),
        ("int a[0]; int main(void) { return 0; }", ErrorKind::ConstantOutOfRange),
    ];
    for (source, kind) in cases {
        let (result, diagnostics) = compile(source);
        assert!(result.is_err(), "{}", source);
        assert_eq!(diagnostics.kinds(), vec![kind], "{}", source);
    }
}

#[test]
fn test_errors_are_collected_across_functions() {
    let source = "int f(void) { return x; }
        int g(void) { return h(); }
        void k(void) { int a[3]; a = 1; }
        int main(void) { return 0; }";
    let (result, diagnostics) = compile(source);
    assert!(matches!(result, Err(CompileError::PhaseFailed { phase: Phase::Analysis, errors: 3 })));
    assert_eq!(
        diagnostics.kinds(),
        vec![ErrorKind::Undeclared, ErrorKind::Undeclared, ErrorKind::NotLvalue]
    );
}

#[test]
fn test_rendered_diagnostics_point_at_source() {
    let source = "int main(void) {\n  putint(count);\n  return 0;\n}\n";
    let (_, diagnostics) = compile(source);
    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file("count.c", source);
    let rendered = reporter.render(file_id, &diagnostics);
    assert!(rendered.contains("error: undeclared identifier"), "{}", rendered);
    assert!(rendered.contains("count.c:2:10"), "{}", rendered);
}

#[test]
fn test_short_circuit_guards_right_operand() {
    let source = "int a(void); int b(void);
        int main(void) {
            int r;
            r = a() && b();
            r = a() || b();
            return r;
        }";
    let module = compile(source).0.unwrap();
    let body = &module.function("main").unwrap().body;

    let calls: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, inst)| matches!(inst, Inst::Call { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(calls.len(), 4);

    // The instruction after `a`'s result is set up is the branch; `b` is
    // only reached through the label that branch selects for the deciding edge.
    for (pair, is_and) in [(0, true), (2, false)] {
        let (a, b) = (calls[pair], calls[pair + 1]);
        let branch = body[a..b]
            .iter()
            .find_map(|inst| match inst {
                Inst::Cbr { then_label, else_label, .. } => Some((then_label, else_label)),
                _ => None,
            })
            .unwrap();
        let rhs = if is_and { branch.0 } else { branch.1 };
        assert_eq!(body[b - 1], Inst::Label(rhs.clone()));
    }
}

#[test]
fn test_runtime_calls_lower_to_plain_calls() {
    let module = compile("int main(void) { char s[4]; getstring(s); putstring(s); putint(1); return 0; }")
        .0
        .unwrap();
    let text = module.to_string();
    assert!(text.contains("  call @getstring(&%0)\n"), "{}", text);
    assert!(text.contains("  call @putstring(&%0)\n"), "{}", text);
    assert!(text.contains("  call @putint(1)\n"), "{}", text);
    // Prototypes produce no functions
    assert_eq!(module.functions.len(), 1);
}

#[test]
fn test_global_records() {
    let module = compile(&corpus("8queens.c")).0.unwrap();
    let names: Vec<(&str, usize)> = module.globals.iter().map(|g| (g.name.as_str(), g.size)).collect();
    assert_eq!(names, vec![("n", 4), ("board", 32)]);
    let functions: Vec<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(functions, vec!["printboard", "check", "queen", "main"]);
}
