use brackc::compile;
use std::fs;
use std::path::Path;

fn compile_ok(source: &str) -> String {
    compile(source).unwrap_or_else(|e| panic!("compilation failed: {}", e))
}

#[test]
fn test_demo_program_compiles() {
    let path = Path::new("demos/arithmetic.brk");
    let source = fs::read_to_string(path).expect("Failed to read demo file");
    let ir = compile_ok(&source);

    println!("Generated IR:\n{}", ir);

    assert!(ir.starts_with("%Pair = type { i32, double }\n\n"));
    for header in [
        "define double @scale(i32 %n.in, double %factor.in)",
        "define i32 @clamp(i32 %value.in, i32 %low.in, i32 %high.in)",
        "define i8 @low_byte(i32 %value.in)",
        "define i32 @main()",
    ] {
        assert!(ir.contains(header), "missing {}", header);
    }

    // n * factor promotes the int operand
    assert!(ir.contains("sitofp i32"));
    assert!(ir.contains("fmul double"));
    // returning an int from a char function truncates
    assert!(ir.contains("trunc i32"));
    // total - c widens the char
    assert!(ir.contains("zext i8"));
    // p[second] / 3 divides in floating point with a folded constant
    assert!(ir.contains("fdiv double"));
    assert!(ir.contains(", 3.0\n"));
    assert!(ir.contains("call double @scale(i32 "));
    assert!(ir.contains(", double 0.5)"));
}

#[test]
fn test_int_float_promotion() {
    let ir = compile_ok("[float f: int a] { return a / 2.0; }");

    assert!(ir.contains("%t.1 = load i32, i32* %a.arg"), "{}", ir);
    assert!(ir.contains("%t.2 = sitofp i32 %t.1 to double"), "{}", ir);
    assert!(ir.contains("%t.3 = fdiv double %t.2, 2.0"), "{}", ir);
    assert!(ir.contains("ret double %t.3"), "{}", ir);
}

#[test]
fn test_integer_division_is_signed() {
    let ir = compile_ok("[int f: int a, int b] { return a / b; }");
    assert!(ir.contains("sdiv i32"), "{}", ir);
}

#[test]
fn test_narrowing_and_widening() {
    let ir = compile_ok("[char f: int a] { return a; }");
    assert!(ir.contains("%t.2 = trunc i32 %t.1 to i8"), "{}", ir);
    assert!(ir.contains("ret i8 %t.2"), "{}", ir);

    let ir = compile_ok("[int f: char c] { return c; }");
    assert!(ir.contains("%t.1 = load i8, i8* %c.arg"), "{}", ir);
    assert!(ir.contains("%t.2 = zext i8 %t.1 to i32"), "{}", ir);

    let ir = compile_ok("[int f: float x] { return x; }");
    assert!(ir.contains("%t.2 = fptosi double %t.1 to i32"), "{}", ir);
}

#[test]
fn test_mixed_expression_promotes_stepwise() {
    let ir = compile_ok("[float f: char c, int i] { return c * i + 1.5; }");

    assert!(ir.contains("%t.2 = zext i8 %t.1 to i32"), "{}", ir);
    assert!(ir.contains("%t.4 = mul i32 %t.2, %t.3"), "{}", ir);
    assert!(ir.contains("%t.5 = sitofp i32 %t.4 to double"), "{}", ir);
    assert!(ir.contains("%t.6 = fadd double %t.5, 1.5"), "{}", ir);
}

#[test]
fn test_constants_fold_without_instructions() {
    // 300 wraps to 44 as a char
    let ir = compile_ok("[char f] { return 300; }");
    assert!(ir.contains("ret i8 44"), "{}", ir);
    assert!(!ir.contains("trunc"), "{}", ir);

    let ir = compile_ok("[float f] { return 2; }");
    assert!(ir.contains("ret double 2.0"), "{}", ir);

    let ir = compile_ok("[int f] { return 2.9; }");
    assert!(ir.contains("ret i32 2"), "{}", ir);

    let ir = compile_ok("[int f] { return -7; }");
    assert!(ir.contains("ret i32 -7"), "{}", ir);
}

#[test]
fn test_negation() {
    let ir = compile_ok("[int f: int a] { return -a; }");
    assert!(ir.contains("%t.2 = sub i32 0, %t.1"), "{}", ir);

    let ir = compile_ok("[float f: float a] { return -a; }");
    assert!(ir.contains("%t.2 = fneg double %t.1"), "{}", ir);

    // double negation cancels
    let ir = compile_ok("[int f: int a] { return - -a; }");
    assert!(!ir.contains("sub i32 0"), "{}", ir);
}

#[test]
fn test_float_comparison() {
    let ir = compile_ok("[bool f: float x, int n] { return x <= n; }");
    assert!(ir.contains("sitofp i32"), "{}", ir);
    assert!(ir.contains("fcmp ole double"), "{}", ir);
}
